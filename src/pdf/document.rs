use anyhow::{Context, Result};
use lopdf::{Document, Object};
use std::path::{Path, PathBuf};

use crate::outline::TocModel;
use crate::pdf::toc::read_outline;

pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument {
            doc,
            path: path.to_path_buf(),
        })
    }

    /// File name of the source, for logs and sidecars.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Bookmarks flattened into a [`TocModel`].
    pub fn outline(&self) -> Result<TocModel> {
        let entries = read_outline(&self.doc)
            .with_context(|| format!("Failed to read bookmarks of {}", self.path.display()))?;
        Ok(TocModel::new(entries))
    }

    /// Copy the inclusive 0-based page span `[start, end]` into a new document.
    ///
    /// The copy carries no outline; objects only the dropped pages used are
    /// pruned.
    pub fn extract_range(&self, start: u32, end: u32) -> Result<Document> {
        let total = self.page_count();
        if start > end || end >= total {
            anyhow::bail!(
                "Pages {}-{} are out of range (1-{})",
                start + 1,
                end + 1,
                total
            );
        }

        let mut new_doc = self.doc.clone();

        let pages_to_delete: Vec<u32> = (1..=total)
            .filter(|page| *page < start + 1 || *page > end + 1)
            .collect();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }

        // The outline would still point at the deleted pages.
        if let Ok(root_id) = new_doc.trailer.get(b"Root").and_then(Object::as_reference) {
            if let Ok(catalog) = new_doc.get_dictionary_mut(root_id) {
                catalog.remove(b"Outlines");
            }
        }
        new_doc.prune_objects();

        Ok(new_doc)
    }

    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        doc.save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}
