use thiserror::Error;

/// Why a document's outline could not be turned into page ranges.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("document has no pages")]
    EmptyDocument,

    #[error("bookmark '{title}' points at page {page}, outside 1-{total}")]
    PageOutOfBounds { title: String, page: u32, total: u32 },

    #[error("bookmark '{title}' starts on page {start} but the next boundary is page {next}")]
    InvertedSpan { title: String, start: u32, next: u32 },

    #[error("section '{title}' on page {page} lies outside its chapter (pages {chapter_start}-{chapter_end})")]
    ChildOutsideChapter {
        title: String,
        page: u32,
        chapter_start: u32,
        chapter_end: u32,
    },
}

/// ISBN validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IsbnError {
    #[error("Invalid ISBN: '{0}'. Expected 13 digits (e.g., 978-1493221851)")]
    Invalid(String),

    #[error("No ISBN prefix in file name: '{0}'")]
    MissingPrefix(String),
}
