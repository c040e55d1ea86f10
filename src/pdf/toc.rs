use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

use crate::outline::TocEntry;

/// Guards against pathological outlines and name trees.
const MAX_DEPTH: u32 = 64;

/// Flatten the outline of `doc` in reading order with 1-based levels.
///
/// Bookmarks whose destination does not resolve to a page are dropped; their
/// children are still read.
pub fn read_outline(doc: &Document) -> Result<Vec<TocEntry>> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    let Some(outlines) = resolve_dict(doc, catalog.get(b"Outlines").ok()) else {
        return Ok(Vec::new());
    };
    let Ok(Object::Reference(first)) = outlines.get(b"First") else {
        return Ok(Vec::new());
    };

    let mut reader = OutlineReader {
        doc,
        pages: doc
            .get_pages()
            .into_iter()
            .map(|(num, id)| (id, num))
            .collect(),
        visited: HashSet::new(),
        entries: Vec::new(),
    };
    reader.walk_siblings(*first, 1);
    Ok(reader.entries)
}

struct OutlineReader<'a> {
    doc: &'a Document,
    /// Page object id to 1-based page number.
    pages: HashMap<ObjectId, u32>,
    visited: HashSet<ObjectId>,
    entries: Vec<TocEntry>,
}

impl OutlineReader<'_> {
    fn walk_siblings(&mut self, first: ObjectId, level: u32) {
        if level > MAX_DEPTH {
            tracing::warn!(level, "Outline nesting too deep, ignoring the rest");
            return;
        }

        let doc = self.doc;
        let mut current = Some(first);
        while let Some(id) = current {
            if !self.visited.insert(id) {
                tracing::warn!(?id, "Outline item visited twice, stopping this branch");
                return;
            }
            let Ok(item) = doc.get_dictionary(id) else {
                return;
            };

            let title = match item.get(b"Title") {
                Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
                _ => "Untitled".to_string(),
            };

            match self.item_page(item) {
                Some(start_page) => self.entries.push(TocEntry::new(level, title, start_page)),
                None => tracing::debug!(title = %title, "Bookmark has no resolvable page, skipping"),
            }

            if let Ok(Object::Reference(child)) = item.get(b"First") {
                self.walk_siblings(*child, level + 1);
            }

            current = match item.get(b"Next") {
                Ok(Object::Reference(next)) => Some(*next),
                _ => None,
            };
        }
    }

    /// Page of an outline item, from `/Dest` or a `/GoTo` action.
    fn item_page(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.destination_page(dest, 0);
        }

        let action = resolve_dict(self.doc, item.get(b"A").ok())?;
        match action.get(b"S") {
            Ok(Object::Name(kind)) if kind == b"GoTo" => {
                self.destination_page(action.get(b"D").ok()?, 0)
            }
            _ => None,
        }
    }

    fn destination_page(&self, dest: &Object, depth: u32) -> Option<u32> {
        if depth > MAX_DEPTH {
            return None;
        }
        match dest {
            Object::Array(parts) => match parts.first() {
                Some(Object::Reference(page_id)) => self.pages.get(page_id).copied(),
                // Some writers store a 0-based page index instead of a reference.
                Some(Object::Integer(index)) => u32::try_from(*index)
                    .ok()
                    .map(|i| i + 1)
                    .filter(|&p| p as usize <= self.pages.len()),
                _ => None,
            },
            Object::String(name, _) | Object::Name(name) => self.named_destination(name, depth),
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|obj| self.destination_page(obj, depth + 1)),
            // A named destination may map to a dictionary holding the array in /D.
            Object::Dictionary(dict) => self.destination_page(dict.get(b"D").ok()?, depth + 1),
            _ => None,
        }
    }

    fn named_destination(&self, name: &[u8], depth: u32) -> Option<u32> {
        let catalog = self.doc.catalog().ok()?;

        let names_tree = resolve_dict(self.doc, catalog.get(b"Names").ok())
            .and_then(|names| resolve_dict(self.doc, names.get(b"Dests").ok()));
        if let Some(root) = names_tree {
            if let Some(dest) = self.search_name_tree(root, name, 0) {
                return self.destination_page(dest, depth + 1);
            }
        }

        // PDF 1.1 style /Dests dictionary on the catalog.
        let legacy = resolve_dict(self.doc, catalog.get(b"Dests").ok())?;
        self.destination_page(legacy.get(name).ok()?, depth + 1)
    }

    fn search_name_tree<'d>(
        &'d self,
        node: &'d Dictionary,
        name: &[u8],
        depth: u32,
    ) -> Option<&'d Object> {
        if depth > MAX_DEPTH {
            return None;
        }

        if let Ok(Object::Array(pairs)) = node.get(b"Names") {
            for pair in pairs.chunks_exact(2) {
                if matches!(&pair[0], Object::String(key, _) if key == name) {
                    return Some(&pair[1]);
                }
            }
        }

        if let Ok(Object::Array(kids)) = node.get(b"Kids") {
            for kid in kids {
                let Some(kid) = resolve_dict(self.doc, Some(kid)) else {
                    continue;
                };
                if let Some(found) = self.search_name_tree(kid, name, depth + 1) {
                    return Some(found);
                }
            }
        }

        None
    }
}

/// Follow at most one indirect reference to a dictionary.
fn resolve_dict<'a>(doc: &'a Document, obj: Option<&'a Object>) -> Option<&'a Dictionary> {
    match obj? {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, otherwise Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
