use clap::{Args, Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::config::{Config, INPUT_DIR, LOG_FILE, OUTPUT_DIR, PROGRESS_FILE};
use crate::metadata::{normalize_isbn, BookMetadata};
use crate::resolver::SplitPolicy;

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(about = "Split large PDF books into chapter-sized files using their bookmarks")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub split: SplitArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the bookmarks as the splitter sees them
    Toc {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Show the ranges a PDF would be split into, without writing anything
    Plan {
        /// PDF file to inspect
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// How ranges are cut.
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Maximum pages per output file before a range is force-split
    #[arg(long, default_value = "50")]
    pub max_pages: NonZeroU32,

    /// Pages per file when a document is split without bookmarks
    #[arg(long, default_value = "50")]
    pub chunk_pages: NonZeroU32,

    /// whole-chapter or section-first
    #[arg(long, default_value = "whole-chapter")]
    pub policy: SplitPolicy,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// PDF file to split (default: every PDF in the input directory)
    pub path: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = OUTPUT_DIR)]
    pub output: PathBuf,

    /// Directory scanned when no PDF is given
    #[arg(long, default_value = INPUT_DIR)]
    pub input_dir: PathBuf,

    /// Never prompt and log only to the log file
    #[arg(long)]
    pub background: bool,

    /// Reprocess finished documents and split files of any size
    #[arg(long)]
    pub force: bool,

    /// Skip documents without usable bookmarks
    #[arg(long)]
    pub no_split: bool,

    /// Book title for the metadata files
    #[arg(long)]
    pub title: Option<String>,

    /// ISBN-13, hyphens allowed
    #[arg(long, value_parser = normalize_isbn)]
    pub isbn: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long)]
    pub published_date: Option<String>,

    #[arg(long)]
    pub genre: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Look up missing metadata by ISBN (flag value or file name prefix)
    #[arg(long)]
    pub fetch_metadata: bool,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Files smaller than this many MiB are left unsplit
    #[arg(long, default_value = "45")]
    pub size_threshold_mb: u64,

    /// Do not write .yaml metadata next to each output file
    #[arg(long)]
    pub no_sidecar: bool,

    #[arg(long, default_value = PROGRESS_FILE)]
    pub progress_file: PathBuf,

    #[arg(long, default_value = LOG_FILE)]
    pub log_file: PathBuf,
}

impl SplitArgs {
    pub fn config(&self) -> Config {
        Config {
            input_dir: self.input_dir.clone(),
            output_dir: self.output.clone(),
            progress_file: self.progress_file.clone(),
            size_threshold_bytes: self.size_threshold_mb.saturating_mul(1024 * 1024),
            max_pages: self.layout.max_pages,
            chunk_pages: self.layout.chunk_pages,
            policy: self.layout.policy,
            background: self.background,
            force: self.force,
            skip_without_bookmarks: self.no_split,
            write_sidecars: !self.no_sidecar,
            fetch_metadata: self.fetch_metadata,
        }
    }

    /// Metadata given on the command line.
    pub fn metadata(&self) -> BookMetadata {
        BookMetadata {
            parent_title: self.title.clone(),
            isbn: self.isbn.clone(),
            author: self.author.clone(),
            publisher: self.publisher.clone(),
            published_date: self.published_date.clone(),
            genre: self.genre.clone(),
            description: self.description.clone(),
            language: None,
        }
    }
}
