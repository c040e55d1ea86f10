use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

/// Build a document with `num_pages` blank pages and an outline given as
/// `(level, title, 1-based page)` in reading order, level 1 being the top.
pub fn build_pdf(num_pages: u32, outline: &[(u32, &str, u32)]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..num_pages {
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        page_ids.push(doc.add_object(page));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", name("Pages"));
    pages.set("Count", Object::Integer(num_pages as i64));
    pages.set(
        "Kids",
        Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", name("Catalog"));
    catalog.set("Pages", Object::Reference(pages_id));

    if !outline.is_empty() {
        let outlines_id = doc.new_object_id();
        let item_ids: Vec<ObjectId> = outline.iter().map(|_| doc.new_object_id()).collect();

        let mut parents = Vec::new();
        let mut children: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();
        let mut stack: Vec<(u32, ObjectId)> = Vec::new();
        for (i, &(level, _, _)) in outline.iter().enumerate() {
            while stack.last().is_some_and(|&(l, _)| l >= level) {
                stack.pop();
            }
            let parent = stack.last().map(|&(_, id)| id).unwrap_or(outlines_id);
            parents.push(parent);
            children.entry(parent).or_default().push(item_ids[i]);
            stack.push((level, item_ids[i]));
        }

        for (i, &(_, title, page)) in outline.iter().enumerate() {
            let id = item_ids[i];
            let mut item = Dictionary::new();
            item.set(
                "Title",
                Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
            );
            item.set("Parent", Object::Reference(parents[i]));
            item.set(
                "Dest",
                Object::Array(vec![
                    Object::Reference(page_ids[(page - 1) as usize]),
                    name("Fit"),
                ]),
            );

            let siblings = &children[&parents[i]];
            let pos = siblings.iter().position(|&s| s == id).unwrap();
            if pos > 0 {
                item.set("Prev", Object::Reference(siblings[pos - 1]));
            }
            if let Some(&next) = siblings.get(pos + 1) {
                item.set("Next", Object::Reference(next));
            }
            if let Some(kids) = children.get(&id) {
                item.set("First", Object::Reference(kids[0]));
                item.set("Last", Object::Reference(kids[kids.len() - 1]));
                item.set("Count", Object::Integer(kids.len() as i64));
            }
            doc.objects.insert(id, Object::Dictionary(item));
        }

        let top = &children[&outlines_id];
        let mut outlines = Dictionary::new();
        outlines.set("Type", name("Outlines"));
        outlines.set("First", Object::Reference(top[0]));
        outlines.set("Last", Object::Reference(top[top.len() - 1]));
        outlines.set("Count", Object::Integer(outline.len() as i64));
        doc.objects.insert(outlines_id, Object::Dictionary(outlines));

        catalog.set("Outlines", Object::Reference(outlines_id));
    }

    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn write_pdf(dir: &Path, file_name: &str, doc: &Document) -> PathBuf {
    let path = dir.join(file_name);
    let mut doc = doc.clone();
    doc.save(&path).unwrap();
    path
}
