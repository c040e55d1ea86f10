use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::metadata::BookMetadata;
use crate::page_range::{sanitize_label, SplitPlan};
use crate::pdf::PdfDocument;

/// Characters that force a sidecar value into double quotes.
const SPECIAL_CHARS: &[char] = &[
    ':', '#', '{', '}', '[', ']', '&', '*', '?', '|', '-', '<', '>', '=', '!', '%', '@', '\\',
];

pub struct OutputOptions<'a> {
    pub output_dir: &'a Path,
    pub write_sidecars: bool,
    pub metadata: &'a BookMetadata,
    pub split_date: NaiveDate,
}

/// Extract every range of `plan` from `doc` into `options.output_dir`.
///
/// Returns the written PDF paths in plan order. Existing files are overwritten.
/// If any range fails, the files already written for this plan are removed.
pub fn materialize(doc: &PdfDocument, plan: &SplitPlan, options: &OutputOptions<'_>) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(options.output_dir).with_context(|| {
        format!("Failed to create directory: {}", options.output_dir.display())
    })?;

    let mut written = Vec::new();
    match write_ranges(doc, plan, options, &mut written) {
        Ok(files) => Ok(files),
        Err(e) => {
            for path in &written {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    tracing::warn!(file = %path.display(), error = %remove_err, "Cannot remove partial output");
                }
            }
            Err(e)
        }
    }
}

/// Writes each range, pushing every created file onto `written` as it goes.
fn write_ranges(
    doc: &PdfDocument,
    plan: &SplitPlan,
    options: &OutputOptions<'_>,
    written: &mut Vec<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let parent_document = doc.file_name();
    let mut files = Vec::with_capacity(plan.ranges.len());

    for (i, range) in plan.ranges.iter().enumerate() {
        let file_name = output_file_name(i, &range.label);
        let path = options.output_dir.join(&file_name);

        let mut part = doc
            .extract_range(range.start, range.end)
            .with_context(|| format!("Failed to extract pages for {}", file_name))?;
        PdfDocument::save(&mut part, &path)?;
        written.push(path.clone());

        tracing::info!(
            pages = range.page_count(),
            "Created chunk: {} (Pages {}-{})",
            file_name,
            range.start + 1,
            range.end + 1
        );

        if options.write_sidecars {
            let sidecar = Sidecar {
                parent_document: &parent_document,
                metadata: options.metadata,
                chapter_number: range.chapter_number,
                chapter_title: &range.chapter_title,
                total_chapters: plan.total_chapters,
                split_index: i + 1,
                split_date: options.split_date,
            };
            let sidecar_path = path.with_extension("yaml");
            std::fs::write(&sidecar_path, sidecar.render()).with_context(|| {
                format!("Failed to write metadata: {}", sidecar_path.display())
            })?;
            written.push(sidecar_path.clone());
            tracing::debug!(file = %sidecar_path.display(), "Created metadata");
        }

        files.push(path);
    }

    Ok(files)
}

/// `<index:03>_<label>.pdf` with the label made file-name safe.
pub fn output_file_name(index: usize, label: &str) -> String {
    format!("{:03}_{}.pdf", index, sanitize_label(label))
}

/// Metadata block written next to each output PDF.
pub struct Sidecar<'a> {
    pub parent_document: &'a str,
    pub metadata: &'a BookMetadata,
    pub chapter_number: u32,
    pub chapter_title: &'a str,
    pub total_chapters: u32,
    /// 1-based position among the outputs of one document.
    pub split_index: usize,
    pub split_date: NaiveDate,
}

impl Sidecar<'_> {
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        push_str(&mut out, "parent_document", self.parent_document);

        let m = self.metadata;
        let optional = [
            ("parent_title", &m.parent_title),
            ("isbn", &m.isbn),
            ("author", &m.author),
            ("publisher", &m.publisher),
            ("published_date", &m.published_date),
            ("genre", &m.genre),
            ("description", &m.description),
            ("language", &m.language),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                push_str(&mut out, key, value);
            }
        }

        let _ = writeln!(out, "chapter_number: {}", self.chapter_number);
        push_str(&mut out, "chapter_title", self.chapter_title);
        let _ = writeln!(out, "total_chapters: {}", self.total_chapters);
        let _ = writeln!(out, "split_index: {}", self.split_index);
        let _ = writeln!(out, "split_date: {}", self.split_date.format("%Y-%m-%d"));
        out.push_str("---\n");
        out
    }
}

fn push_str(out: &mut String, key: &str, value: &str) {
    if needs_quotes(value) {
        let mut escaped = String::with_capacity(value.len() + 2);
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                c => escaped.push(c),
            }
        }
        let _ = writeln!(out, "{}: \"{}\"", key, escaped);
    } else {
        let _ = writeln!(out, "{}: {}", key, value);
    }
}

fn needs_quotes(value: &str) -> bool {
    value.contains(SPECIAL_CHARS)
        || value.contains(['\n', '\r', '\t'])
        || value.starts_with(['"', '\''])
}
