pub mod document;
pub mod toc;

#[cfg(test)]
pub mod test_support;

pub use document::PdfDocument;
