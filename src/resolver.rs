//! Turns an outline into a contiguous partition of the document's pages.
//!
//! The primary split level is 2 (chapters) when the outline has any level-2
//! bookmarks and 1 otherwise. Every primary bookmark covers the pages up to
//! the next primary bookmark. Pages before the first one become a synthetic
//! front-matter range with chapter number 0. Depending on [`SplitPolicy`], a
//! chapter is further cut at its level+1 bookmarks, and anything still longer
//! than the page limit is chopped into fixed-size parts.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::PlanError;
use crate::outline::TocModel;
use crate::page_range::{fixed_chunks, force_subdivide, parse_manual_ranges, PageRange, SplitPlan};

/// How sub-chapter bookmarks are used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Keep chapters whole unless they exceed the page limit; only then cut
    /// at their sections.
    #[default]
    WholeChapter,
    /// Always cut at sections when a chapter has them.
    SectionFirst,
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitPolicy::WholeChapter => f.write_str("whole-chapter"),
            SplitPolicy::SectionFirst => f.write_str("section-first"),
        }
    }
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole-chapter" | "chapter" => Ok(SplitPolicy::WholeChapter),
            "section-first" | "section" => Ok(SplitPolicy::SectionFirst),
            other => Err(format!(
                "unknown split policy '{}' (expected whole-chapter or section-first)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    pub max_pages: NonZeroU32,
    pub policy: SplitPolicy,
}

impl Resolver {
    pub fn new(max_pages: NonZeroU32, policy: SplitPolicy) -> Self {
        Resolver { max_pages, policy }
    }

    /// Resolve `toc` against a document of `total_pages` pages.
    ///
    /// `Ok(None)` means the outline has no level-1 or level-2 bookmarks.
    pub fn resolve(&self, toc: &TocModel, total_pages: u32) -> Result<Option<SplitPlan>, PlanError> {
        let Some(level) = toc.primary_level() else {
            return Ok(None);
        };
        if total_pages == 0 {
            return Err(PlanError::EmptyDocument);
        }

        let primaries = toc.indices_at_level(level);
        let mut ranges = Vec::new();

        let first_start = zero_based_start(toc, primaries[0], total_pages)?;
        if first_start > 0 {
            ranges.push(PageRange::new(0, first_start - 1, "00_Frontmatter", 0, "Front Matter"));
        }

        for (pos, &idx) in primaries.iter().enumerate() {
            let chapter_number = pos as u32 + 1;
            let title = toc.get(idx).map(|e| e.title.as_str()).unwrap_or_default();
            let start = zero_based_start(toc, idx, total_pages)?;
            let end = match primaries.get(pos + 1) {
                Some(&next) => end_before(toc, idx, start, zero_based_start(toc, next, total_pages)?)?,
                None => total_pages - 1,
            };

            let children = toc.children(idx);
            let use_children = !children.is_empty()
                && match self.policy {
                    SplitPolicy::SectionFirst => true,
                    SplitPolicy::WholeChapter => span(start, end) > self.max_pages.get(),
                };

            if use_children {
                let chapter = Chapter {
                    number: chapter_number,
                    title,
                    start,
                    end,
                };
                self.push_sections(&mut ranges, toc, &chapter, &children, total_pages)?;
            } else {
                self.push_leaf(&mut ranges, start, end, title, chapter_number, title);
            }
        }

        let plan = SplitPlan {
            ranges,
            total_chapters: primaries.len() as u32,
        };
        debug_assert!(plan.is_contiguous(total_pages));
        Ok(Some(plan))
    }

    fn push_sections(
        &self,
        ranges: &mut Vec<PageRange>,
        toc: &TocModel,
        chapter: &Chapter<'_>,
        children: &[usize],
        total_pages: u32,
    ) -> Result<(), PlanError> {
        let mut starts = Vec::with_capacity(children.len());
        for &child in children {
            let start = zero_based_start(toc, child, total_pages)?;
            if start < chapter.start || start > chapter.end {
                return Err(PlanError::ChildOutsideChapter {
                    title: entry_title(toc, child),
                    page: start + 1,
                    chapter_start: chapter.start + 1,
                    chapter_end: chapter.end + 1,
                });
            }
            starts.push(start);
        }

        if starts[0] > chapter.start {
            ranges.push(PageRange::new(
                chapter.start,
                starts[0] - 1,
                format!("{}_Intro", chapter.title),
                chapter.number,
                chapter.title,
            ));
        }

        for (j, &child) in children.iter().enumerate() {
            let start = starts[j];
            let end = match starts.get(j + 1) {
                Some(&next) => end_before(toc, child, start, next)?,
                None => chapter.end,
            };
            let title = entry_title(toc, child);
            self.push_leaf(ranges, start, end, &title, chapter.number, chapter.title);
        }
        Ok(())
    }

    fn push_leaf(
        &self,
        ranges: &mut Vec<PageRange>,
        start: u32,
        end: u32,
        label: &str,
        chapter_number: u32,
        chapter_title: &str,
    ) {
        if span(start, end) > self.max_pages.get() {
            ranges.extend(force_subdivide(
                start,
                end,
                label,
                self.max_pages,
                chapter_number,
                chapter_title,
            ));
        } else {
            ranges.push(PageRange::new(start, end, label, chapter_number, chapter_title));
        }
    }
}

struct Chapter<'a> {
    number: u32,
    title: &'a str,
    start: u32,
    end: u32,
}

fn span(start: u32, end: u32) -> u32 {
    end - start + 1
}

fn entry_title(toc: &TocModel, index: usize) -> String {
    toc.get(index).map(|e| e.title.clone()).unwrap_or_default()
}

/// 0-based start page of entry `index`, checked against the document.
fn zero_based_start(toc: &TocModel, index: usize, total_pages: u32) -> Result<u32, PlanError> {
    let entry = toc.get(index).ok_or(PlanError::EmptyDocument)?;
    if entry.start_page == 0 || entry.start_page > total_pages {
        return Err(PlanError::PageOutOfBounds {
            title: entry.title.clone(),
            page: entry.start_page,
            total: total_pages,
        });
    }
    Ok(entry.start_page - 1)
}

/// Last page of a span starting at `start` when the next one starts at `next`.
fn end_before(toc: &TocModel, index: usize, start: u32, next: u32) -> Result<u32, PlanError> {
    if next <= start {
        return Err(PlanError::InvertedSpan {
            title: entry_title(toc, index),
            start: start + 1,
            next: next + 1,
        });
    }
    Ok(next - 1)
}

/// One way of producing a [`SplitPlan`] for a document.
#[derive(Debug, Clone)]
pub enum Strategy<'a> {
    Outline { toc: &'a TocModel, resolver: Resolver },
    Manual(&'a str),
    FixedSize(NonZeroU32),
}

impl Strategy<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Outline { .. } => "bookmarks",
            Strategy::Manual(_) => "manual ranges",
            Strategy::FixedSize(_) => "fixed-size chunks",
        }
    }

    /// `Ok(None)` means the strategy has nothing to offer for this document.
    pub fn plan(&self, total_pages: u32) -> Result<Option<SplitPlan>, PlanError> {
        match self {
            Strategy::Outline { toc, resolver } => resolver.resolve(toc, total_pages),
            Strategy::Manual(expr) => Ok(parse_manual_ranges(expr, total_pages)),
            Strategy::FixedSize(chunk_pages) => {
                if total_pages == 0 {
                    return Err(PlanError::EmptyDocument);
                }
                Ok(Some(fixed_chunks(total_pages, *chunk_pages)))
            }
        }
    }
}
