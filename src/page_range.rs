use std::num::NonZeroU32;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_LABEL_CHARS;

/// An inclusive, 0-based span of pages destined for one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
    pub label: String,
    /// 0 is reserved for the synthetic front-matter range.
    pub chapter_number: u32,
    pub chapter_title: String,
}

impl PageRange {
    pub fn new(
        start: u32,
        end: u32,
        label: impl Into<String>,
        chapter_number: u32,
        chapter_title: impl Into<String>,
    ) -> Self {
        PageRange {
            start,
            end,
            label: label.into(),
            chapter_number,
            chapter_title: chapter_title.into(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Ordered ranges for one document plus the chapter count reported in sidecars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub ranges: Vec<PageRange>,
    pub total_chapters: u32,
}

impl SplitPlan {
    /// True when the ranges tile `[0, total_pages - 1]` exactly.
    pub fn is_contiguous(&self, total_pages: u32) -> bool {
        let (Some(first), Some(last)) = (self.ranges.first(), self.ranges.last()) else {
            return false;
        };
        first.start == 0
            && last.end + 1 == total_pages
            && self.ranges.iter().all(|r| r.start <= r.end)
            && self
                .ranges
                .windows(2)
                .all(|pair| pair[0].end + 1 == pair[1].start)
    }
}

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ILLEGAL_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex"));

/// Strip characters that are illegal in file names.
pub fn clean_filename(name: &str) -> String {
    ILLEGAL_FILENAME_CHARS.replace_all(name, "").into_owned()
}

/// Turn a range label into an output file stem.
pub fn sanitize_label(label: &str) -> String {
    clean_filename(label).chars().take(MAX_LABEL_CHARS).collect()
}

/// Cut `[start, end]` into chunks of `limit` pages labeled `<base>_part<N>`.
pub fn force_subdivide(
    start: u32,
    end: u32,
    base_title: &str,
    limit: NonZeroU32,
    chapter_number: u32,
    chapter_title: &str,
) -> Vec<PageRange> {
    let mut ranges = Vec::new();
    let mut current = start;
    let mut part = 1;
    while current <= end {
        let chunk_end = current.saturating_add(limit.get() - 1).min(end);
        ranges.push(PageRange::new(
            current,
            chunk_end,
            format!("{}_part{}", base_title, part),
            chapter_number,
            chapter_title,
        ));
        if chunk_end == u32::MAX {
            break;
        }
        current = chunk_end + 1;
        part += 1;
    }
    ranges
}

/// Split a whole document into consecutive chunks of `chunk_pages` pages.
pub fn fixed_chunks(total_pages: u32, chunk_pages: NonZeroU32) -> SplitPlan {
    let mut ranges = Vec::new();
    let mut current = 0;
    let mut part = 1;
    while current < total_pages {
        let end = (current + chunk_pages.get() - 1).min(total_pages - 1);
        ranges.push(PageRange::new(
            current,
            end,
            format!("Part_{:03}", part),
            part,
            format!("Part {:03}", part),
        ));
        current = end + 1;
        part += 1;
    }
    let total_chapters = ranges.len() as u32;
    SplitPlan {
        ranges,
        total_chapters,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageRef {
    Number(u32),
    End,
    Invalid,
}

fn parse_page_ref(s: &str) -> PageRef {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        PageRef::End
    } else {
        s.parse::<u32>().map(PageRef::Number).unwrap_or(PageRef::Invalid)
    }
}

/// Parse a user range expression like "1-50, 51-100, 101-end".
///
/// Pages are 1-based and inclusive. Unparseable starts fall back to page 1 and
/// unparseable ends to the last page. Ranges may overlap or leave gaps.
/// Returns `None` when nothing usable remains.
pub fn parse_manual_ranges(s: &str, total_pages: u32) -> Option<SplitPlan> {
    if total_pages == 0 {
        return None;
    }

    let mut ranges = Vec::new();
    for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (start_ref, end_ref) = match token.split_once('-') {
            Some((start, end)) => (parse_page_ref(start), parse_page_ref(end)),
            None => {
                let page = parse_page_ref(token);
                (page, page)
            }
        };

        let start = match start_ref {
            PageRef::Number(n) => n,
            PageRef::End => total_pages,
            PageRef::Invalid => {
                tracing::warn!(token, "Unreadable start page, using page 1");
                1
            }
        };
        let end = match end_ref {
            PageRef::Number(n) => n,
            PageRef::End => total_pages,
            PageRef::Invalid => {
                tracing::warn!(token, "Unreadable end page, using last page");
                total_pages
            }
        };

        let clamped_start = start.clamp(1, total_pages);
        let clamped_end = end.clamp(1, total_pages);
        if (clamped_start, clamped_end) != (start, end) {
            tracing::warn!(
                token,
                total_pages,
                "Range reaches outside the document, clamped to {}-{}",
                clamped_start,
                clamped_end
            );
        }

        if clamped_start > clamped_end {
            tracing::warn!(token, "Range starts after it ends, ignoring it");
            continue;
        }

        let part_num = ranges.len() as u32 + 1;
        ranges.push(PageRange::new(
            clamped_start - 1,
            clamped_end - 1,
            format!("Part_{}-{}", clamped_start, clamped_end),
            part_num,
            format!("Part {}-{}", clamped_start, clamped_end),
        ));
    }

    if ranges.is_empty() {
        return None;
    }
    let total_chapters = ranges.len() as u32;
    Some(SplitPlan {
        ranges,
        total_chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn spans(plan: &SplitPlan) -> Vec<(u32, u32)> {
        plan.ranges.iter().map(|r| (r.start, r.end)).collect()
    }

    #[test]
    fn test_manual_ranges_with_end_keyword() {
        let plan = parse_manual_ranges("1-10, 11-20, 21-end", 25).unwrap();
        assert_eq!(spans(&plan), vec![(0, 9), (10, 19), (20, 24)]);
        assert_eq!(plan.total_chapters, 3);
        assert_eq!(plan.ranges[2].label, "Part_21-25");
        assert_eq!(plan.ranges[2].chapter_title, "Part 21-25");
        assert_eq!(plan.ranges[2].chapter_number, 3);
    }

    #[test]
    fn test_manual_single_page() {
        let plan = parse_manual_ranges("7", 10).unwrap();
        assert_eq!(spans(&plan), vec![(6, 6)]);
    }

    #[test]
    fn test_manual_malformed_tokens_default() {
        let plan = parse_manual_ranges("abc-5, 3-xyz", 12).unwrap();
        assert_eq!(spans(&plan), vec![(0, 4), (2, 11)]);
    }

    #[test]
    fn test_manual_end_keyword_case_insensitive_and_as_start() {
        let plan = parse_manual_ranges("END-end, 2-End", 9).unwrap();
        assert_eq!(spans(&plan), vec![(8, 8), (1, 8)]);
    }

    #[test]
    fn test_manual_allows_overlap_and_gaps() {
        let plan = parse_manual_ranges("1-5, 3-4, 9-10", 10).unwrap();
        assert_eq!(spans(&plan), vec![(0, 4), (2, 3), (8, 9)]);
        assert!(!plan.is_contiguous(10));
    }

    #[test]
    fn test_manual_clamps_and_drops_inverted() {
        let plan = parse_manual_ranges("0-3, 8-200, 9-2", 10).unwrap();
        assert_eq!(spans(&plan), vec![(0, 2), (7, 9)]);
        assert_eq!(plan.ranges[1].chapter_number, 2);
    }

    #[test]
    fn test_manual_empty_expression() {
        assert!(parse_manual_ranges("", 10).is_none());
        assert!(parse_manual_ranges(" , ,", 10).is_none());
        assert!(parse_manual_ranges("1-5", 0).is_none());
    }

    #[test]
    fn test_fixed_chunks_cover_document() {
        let plan = fixed_chunks(120, nz(50));
        assert_eq!(spans(&plan), vec![(0, 49), (50, 99), (100, 119)]);
        assert!(plan.is_contiguous(120));
        assert_eq!(plan.ranges[0].label, "Part_001");
        assert_eq!(plan.ranges[2].chapter_title, "Part 003");
        assert_eq!(plan.total_chapters, 3);
    }

    #[test]
    fn test_fixed_chunk_counts() {
        for (total, size) in [(1, 1), (1, 50), (49, 7), (100, 10), (101, 10), (3, 2)] {
            let plan = fixed_chunks(total, nz(size));
            assert_eq!(plan.ranges.len() as u32, total.div_ceil(size));
            assert!(plan.is_contiguous(total));
        }
    }

    #[test]
    fn test_force_subdivide_lengths() {
        let parts = force_subdivide(0, 119, "Chapter", nz(50), 1, "Chapter");
        let lengths: Vec<u32> = parts.iter().map(PageRange::page_count).collect();
        assert_eq!(lengths, vec![50, 50, 20]);
        let labels: Vec<&str> = parts.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Chapter_part1", "Chapter_part2", "Chapter_part3"]);
    }

    #[test]
    fn test_force_subdivide_exact_multiple() {
        let parts = force_subdivide(10, 29, "S", nz(10), 4, "Four");
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[1].start, parts[1].end), (20, 29));
        assert!(parts.iter().all(|p| p.chapter_number == 4 && p.chapter_title == "Four"));
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
        let long = "x".repeat(80);
        assert_eq!(sanitize_label(&long).chars().count(), 50);
        assert_eq!(sanitize_label("Kapitel 1: Übersicht"), "Kapitel 1 Übersicht");
    }

    #[test]
    fn test_contiguity_check() {
        let plan = SplitPlan {
            ranges: vec![PageRange::new(0, 4, "a", 1, "a"), PageRange::new(6, 9, "b", 2, "b")],
            total_chapters: 2,
        };
        assert!(!plan.is_contiguous(10));
        assert!(!SplitPlan { ranges: vec![], total_chapters: 0 }.is_contiguous(0));
    }
}
