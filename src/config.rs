use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::resolver::SplitPolicy;

/// Directory scanned when no document is given on the command line.
pub const INPUT_DIR: &str = "input_pdf";

/// Root of the per-document output directories.
pub const OUTPUT_DIR: &str = "split_pdf";

pub const LOG_FILE: &str = "pdf-split.log";

pub const PROGRESS_FILE: &str = "split_progress.json";

/// Files smaller than this are passed through unsplit (45 MiB).
pub const SIZE_THRESHOLD_BYTES: u64 = 45 * 1024 * 1024;

/// Maximum pages in a leaf range before it is force-split.
pub const MAX_PAGES_PER_SPLIT: u32 = 50;

/// Chunk size for the fixed-size fallback.
pub const CHUNK_PAGES: u32 = 50;

/// Output labels are cut to this many characters.
pub const MAX_LABEL_CHARS: usize = 50;

pub const METADATA_TIMEOUT_SECS: u64 = 10;

pub const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub progress_file: PathBuf,
    pub size_threshold_bytes: u64,
    pub max_pages: NonZeroU32,
    pub chunk_pages: NonZeroU32,
    pub policy: SplitPolicy,
    /// No interactive prompt; documents without bookmarks get fixed-size chunks.
    pub background: bool,
    /// Reprocess finished documents and ignore the size threshold.
    pub force: bool,
    /// Skip documents without usable bookmarks instead of falling back.
    pub skip_without_bookmarks: bool,
    pub write_sidecars: bool,
    pub fetch_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::from(INPUT_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
            progress_file: PathBuf::from(PROGRESS_FILE),
            size_threshold_bytes: SIZE_THRESHOLD_BYTES,
            max_pages: NonZeroU32::new(MAX_PAGES_PER_SPLIT).unwrap_or(NonZeroU32::MIN),
            chunk_pages: NonZeroU32::new(CHUNK_PAGES).unwrap_or(NonZeroU32::MIN),
            policy: SplitPolicy::default(),
            background: false,
            force: false,
            skip_without_bookmarks: false,
            write_sidecars: true,
            fetch_metadata: false,
        }
    }
}
