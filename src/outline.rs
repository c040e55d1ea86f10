/// One bookmark: nesting level (1 = top), title, and 1-based start page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u32,
    pub title: String,
    pub start_page: u32,
}

impl TocEntry {
    pub fn new(level: u32, title: impl Into<String>, start_page: u32) -> Self {
        TocEntry {
            level,
            title: title.into(),
            start_page,
        }
    }
}

/// Read-only index over the outline entries of one document, in source order.
#[derive(Debug, Clone, Default)]
pub struct TocModel {
    entries: Vec<TocEntry>,
}

impl TocModel {
    pub fn new(entries: Vec<TocEntry>) -> Self {
        TocModel { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TocEntry> {
        self.entries.get(index)
    }

    /// Indices of all entries at `level`, in document order.
    pub fn indices_at_level(&self, level: u32) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.level == level)
            .map(|(i, _)| i)
            .collect()
    }

    /// The level used for top-level splits: 2 when present, otherwise 1.
    ///
    /// `None` means the outline is unusable for splitting.
    pub fn primary_level(&self) -> Option<u32> {
        [2, 1]
            .into_iter()
            .find(|&level| self.entries.iter().any(|e| e.level == level))
    }

    /// Index of the next entry after `index` on the same level.
    pub fn sibling_boundary(&self, index: usize) -> Option<usize> {
        let level = self.entries.get(index)?.level;
        self.entries[index + 1..]
            .iter()
            .position(|e| e.level == level)
            .map(|offset| index + 1 + offset)
    }

    /// Entries one level below `index`, up to its sibling boundary.
    pub fn children(&self, index: usize) -> Vec<usize> {
        let Some(parent) = self.entries.get(index) else {
            return Vec::new();
        };
        let end = self.sibling_boundary(index).unwrap_or(self.entries.len());
        (index + 1..end)
            .filter(|&i| self.entries[i].level == parent.level + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TocModel {
        TocModel::new(vec![
            TocEntry::new(1, "Book", 1),
            TocEntry::new(2, "Ch1", 2),
            TocEntry::new(3, "1.1", 3),
            TocEntry::new(4, "1.1.1", 4),
            TocEntry::new(3, "1.2", 10),
            TocEntry::new(2, "Ch2", 40),
            TocEntry::new(3, "2.1", 41),
        ])
    }

    #[test]
    fn test_empty_model() {
        let toc = TocModel::default();
        assert!(toc.is_empty());
        assert_eq!(toc.primary_level(), None);
        assert!(toc.children(0).is_empty());
        assert_eq!(toc.sibling_boundary(0), None);
    }

    #[test]
    fn test_primary_level_prefers_two() {
        assert_eq!(sample().primary_level(), Some(2));
    }

    #[test]
    fn test_primary_level_falls_back_to_one() {
        let toc = TocModel::new(vec![
            TocEntry::new(1, "A", 1),
            TocEntry::new(1, "B", 5),
        ]);
        assert_eq!(toc.primary_level(), Some(1));
    }

    #[test]
    fn test_no_primary_level_for_deep_only_outline() {
        let toc = TocModel::new(vec![TocEntry::new(3, "Deep", 1)]);
        assert_eq!(toc.primary_level(), None);
    }

    #[test]
    fn test_indices_at_level() {
        assert_eq!(sample().indices_at_level(2), vec![1, 5]);
        assert_eq!(sample().indices_at_level(3), vec![2, 4, 6]);
    }

    #[test]
    fn test_sibling_boundary() {
        let toc = sample();
        assert_eq!(toc.sibling_boundary(1), Some(5));
        assert_eq!(toc.sibling_boundary(5), None);
        assert_eq!(toc.sibling_boundary(2), Some(4));
    }

    #[test]
    fn test_children_skip_grandchildren() {
        let toc = sample();
        assert_eq!(toc.children(1), vec![2, 4]);
        assert_eq!(toc.children(5), vec![6]);
        assert!(toc.children(6).is_empty());
    }
}
