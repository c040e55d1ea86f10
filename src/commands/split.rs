use anyhow::Result;

use crate::batch::{collect_documents, BatchRunner, BatchSummary};
use crate::cli::SplitArgs;
use crate::config::Config;
use crate::metadata::{BookMetadata, GoogleBooks, NoMetadata};
use crate::prompt::{LinePrompt, NoPrompt, RangePrompt};

pub async fn run(args: &SplitArgs) -> Result<()> {
    let config = args.config();
    let documents = collect_documents(args.path.as_deref(), &config.input_dir)?;

    tracing::info!("=== PDF Splitter Started ===");
    if documents.is_empty() {
        tracing::info!("No PDF files found in {}", config.input_dir.display());
    } else {
        tracing::info!("Found {} file(s) to process", documents.len());
    }

    let supplied = args.metadata();
    let summary = if config.background {
        run_batch(config, NoPrompt, supplied, &documents).await?
    } else {
        run_batch(config, LinePrompt::terminal(), supplied, &documents).await?
    };

    tracing::info!(
        split = summary.split,
        unsplit = summary.passed_through,
        skipped = summary.skipped,
        already_done = summary.already_done,
        "=== PDF Splitter Completed ==="
    );
    Ok(())
}

async fn run_batch<P: RangePrompt>(
    config: Config,
    prompt: P,
    supplied: BookMetadata,
    documents: &[std::path::PathBuf],
) -> Result<BatchSummary> {
    if config.fetch_metadata {
        let mut runner = BatchRunner::new(config, prompt, GoogleBooks::new()?, supplied);
        Ok(runner.run(documents).await)
    } else {
        let mut runner = BatchRunner::new(config, prompt, NoMetadata, supplied);
        Ok(runner.run(documents).await)
    }
}
