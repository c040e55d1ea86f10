use anyhow::{Context, Result};
use chrono::{Local, TimeDelta};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::config::Config;
use crate::metadata::{isbn_from_filename, BookMetadata, MetadataProvider};
use crate::output::{materialize, OutputOptions};
use crate::outline::TocModel;
use crate::page_range::SplitPlan;
use crate::pdf::PdfDocument;
use crate::progress::{ProgressEntry, ProgressStore, Status};
use crate::prompt::RangePrompt;
use crate::resolver::{Resolver, Strategy};

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Split(Vec<PathBuf>),
    /// Left as is, either because it is small or because splitting failed.
    PassedThrough(PathBuf),
    Skipped,
}

impl Outcome {
    pub fn chunk_count(&self) -> usize {
        match self {
            Outcome::Split(files) => files.len(),
            Outcome::PassedThrough(_) => 1,
            Outcome::Skipped => 0,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub split: usize,
    pub passed_through: usize,
    pub skipped: usize,
    pub already_done: usize,
}

/// Splits documents one at a time; a failing document never stops the batch.
pub struct BatchRunner<P, M> {
    config: Config,
    prompt: P,
    provider: M,
    supplied: BookMetadata,
    progress: ProgressStore,
}

impl<P: RangePrompt, M: MetadataProvider> BatchRunner<P, M> {
    pub fn new(config: Config, prompt: P, provider: M, supplied: BookMetadata) -> Self {
        let progress = ProgressStore::load(&config.progress_file);
        BatchRunner {
            config,
            prompt,
            provider,
            supplied,
            progress,
        }
    }

    pub async fn run(&mut self, documents: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut eta = Eta::start(documents.len());

        for path in documents {
            let stem = document_stem(path);
            tracing::info!("Processing: {}", display_name(path));

            if !self.config.force && self.progress.is_done(&stem) {
                tracing::info!("Skipping {} (already processed). Use --force to reprocess.", stem);
                summary.already_done += 1;
                eta.tick();
                continue;
            }

            let output_dir = self.config.output_dir.join(&stem);
            let outcome = self.process_document(path, &output_dir).await;

            match &outcome {
                Outcome::Split(files) => {
                    summary.split += 1;
                    tracing::info!("Split into {} chunk(s)", files.len());
                }
                Outcome::PassedThrough(original) => {
                    summary.passed_through += 1;
                    tracing::info!("Left unsplit: {}", original.display());
                }
                Outcome::Skipped => {
                    summary.skipped += 1;
                    tracing::info!("Skipped: {}", display_name(path));
                }
            }

            let status = match outcome {
                Outcome::Skipped => Status::Skipped,
                _ => Status::Done,
            };
            self.progress.record(
                &stem,
                ProgressEntry {
                    status,
                    chunks: outcome.chunk_count(),
                    output_dir: output_dir.display().to_string(),
                },
            );
            if let Err(e) = self.progress.save() {
                tracing::warn!(error = %format!("{:#}", e), "Progress not saved");
            }

            eta.tick();
        }

        summary
    }

    /// Split one document into `output_dir`.
    pub async fn process_document(&mut self, path: &Path, output_dir: &Path) -> Outcome {
        let name = display_name(path);

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::error!(file = %name, error = %e, "Cannot read file, leaving it unsplit");
                return Outcome::PassedThrough(path.to_path_buf());
            }
        };
        let size_mb = size as f64 / 1024.0 / 1024.0;
        if !self.config.force && size < self.config.size_threshold_bytes {
            tracing::info!("File {} is small ({:.2} MB). No split needed.", name, size_mb);
            return Outcome::PassedThrough(path.to_path_buf());
        }
        tracing::info!("File {} is {:.2} MB. Initiating split...", name, size_mb);

        let doc = match PdfDocument::open(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(file = %name, stage = "load", error = ?e, "Split failed");
                return Outcome::PassedThrough(path.to_path_buf());
            }
        };

        let Some(plan) = self.plan_document(&doc) else {
            return Outcome::Skipped;
        };

        let metadata = self.metadata_for(path).await;
        let options = OutputOptions {
            output_dir,
            write_sidecars: self.config.write_sidecars,
            metadata: &metadata,
            split_date: Local::now().date_naive(),
        };
        match materialize(&doc, &plan, &options) {
            Ok(files) => Outcome::Split(files),
            Err(e) => {
                tracing::error!(file = %name, stage = "extract", error = ?e, "Split failed");
                Outcome::PassedThrough(path.to_path_buf())
            }
        }
    }

    /// Bookmarks first, then the user's ranges, then fixed-size chunks.
    fn plan_document(&mut self, doc: &PdfDocument) -> Option<SplitPlan> {
        let name = doc.file_name();
        let total_pages = doc.page_count();

        let toc = doc.outline().unwrap_or_else(|e| {
            tracing::warn!(file = %name, error = %format!("{:#}", e), "Ignoring unreadable bookmarks");
            TocModel::default()
        });
        tracing::debug!(file = %name, bookmarks = toc.len(), pages = total_pages, "Read outline");
        let outline = Strategy::Outline {
            toc: &toc,
            resolver: Resolver::new(self.config.max_pages, self.config.policy),
        };
        match outline.plan(total_pages) {
            Ok(Some(plan)) => {
                tracing::info!(
                    file = %name,
                    ranges = plan.ranges.len(),
                    chapters = plan.total_chapters,
                    "Using {}",
                    outline.name()
                );
                return Some(plan);
            }
            Ok(None) => tracing::warn!(file = %name, "No suitable bookmarks found for splitting."),
            Err(e) => tracing::warn!(file = %name, error = %e, "Malformed bookmarks, falling back"),
        }

        if self.config.skip_without_bookmarks {
            tracing::warn!("Skipping '{}' - no bookmarks available.", name);
            return None;
        }

        if self.config.background {
            tracing::info!(
                "Background mode: Splitting by {} pages.",
                self.config.chunk_pages
            );
        } else {
            match self.prompt.request_manual_ranges(&name, total_pages) {
                Some(expr) => match Strategy::Manual(&expr).plan(total_pages) {
                    Ok(Some(plan)) => return Some(plan),
                    _ => tracing::warn!(ranges = %expr, "No usable ranges entered"),
                },
                None => tracing::info!(
                    "No ranges specified. Splitting by {} pages.",
                    self.config.chunk_pages
                ),
            }
        }

        match Strategy::FixedSize(self.config.chunk_pages).plan(total_pages) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Cannot split document");
                None
            }
        }
    }

    /// Command-line metadata, completed by a lookup when enabled.
    async fn metadata_for(&self, path: &Path) -> BookMetadata {
        let mut metadata = self.supplied.clone();
        if !self.config.fetch_metadata {
            return metadata;
        }

        let isbn = match &self.supplied.isbn {
            Some(isbn) => Ok(isbn.clone()),
            None => isbn_from_filename(path),
        };
        match isbn {
            Ok(isbn) => {
                if let Some(found) = self.provider.lookup(&isbn).await {
                    metadata.fill_missing(found);
                }
            }
            Err(e) => tracing::warn!(file = %display_name(path), error = %e, "Cannot look up metadata"),
        }
        metadata
    }
}

/// The documents to process: `input` if given, otherwise every PDF directly
/// inside `input_dir` (created when missing), in name order.
pub fn collect_documents(input: Option<&Path>, input_dir: &Path) -> Result<Vec<PathBuf>> {
    if let Some(path) = input {
        return Ok(vec![path.to_path_buf()]);
    }

    if !input_dir.exists() {
        std::fs::create_dir_all(input_dir)
            .with_context(|| format!("Failed to create directory: {}", input_dir.display()))?;
        tracing::info!("Created input directory: {}", input_dir.display());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read directory entry");
                continue;
            }
        };
        let is_pdf = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            documents.push(entry.into_path());
        }
    }
    Ok(documents)
}

fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_name(path))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Logs throughput and an estimated finish time after each document.
struct Eta {
    started: Instant,
    total: usize,
    processed: usize,
}

impl Eta {
    fn start(total: usize) -> Self {
        Eta {
            started: Instant::now(),
            total,
            processed: 0,
        }
    }

    fn tick(&mut self) {
        self.processed += 1;
        let Some((avg, remaining)) = estimate(self.started.elapsed(), self.processed, self.total)
        else {
            return;
        };
        let finish = Local::now()
            + TimeDelta::from_std(remaining).unwrap_or_else(|_| TimeDelta::zero());
        tracing::info!(
            "Progress: {}/{}. Avg: {:.1}s/item. Est. Finish: {}",
            self.processed,
            self.total,
            avg,
            finish.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

/// Average seconds per item and the remaining time at that pace.
fn estimate(elapsed: Duration, processed: usize, total: usize) -> Option<(f64, Duration)> {
    if processed == 0 {
        return None;
    }
    let avg = elapsed.as_secs_f64() / processed as f64;
    let remaining = total.saturating_sub(processed) as f64 * avg;
    Some((avg, Duration::from_secs_f64(remaining)))
}
