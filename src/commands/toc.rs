use crate::outline::TocModel;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let toc = doc.outline()?;

    if toc.is_empty() {
        println!("No table of contents found.");
        return Ok(());
    }

    print!("{}", render(&toc));
    Ok(())
}

fn render(toc: &TocModel) -> String {
    let mut out = String::new();
    for entry in toc.entries() {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        out.push_str(&format!("{}{} (p. {})\n", indent, entry.title, entry.start_page));
    }
    out
}
