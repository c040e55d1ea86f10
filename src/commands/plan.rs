use anyhow::Result;
use std::path::Path;

use crate::cli::LayoutArgs;
use crate::output::output_file_name;
use crate::page_range::SplitPlan;
use crate::pdf::PdfDocument;
use crate::resolver::{Resolver, Strategy};

/// Print the ranges the bookmarks yield, or the fixed-size fallback.
pub fn run<P: AsRef<Path>>(path: P, layout: &LayoutArgs) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let total_pages = doc.page_count();
    let toc = doc.outline()?;

    let outline = Strategy::Outline {
        toc: &toc,
        resolver: Resolver::new(layout.max_pages, layout.policy),
    };
    let fallback = Strategy::FixedSize(layout.chunk_pages);
    let (strategy, plan) = match outline.plan(total_pages) {
        Ok(Some(plan)) => (&outline, plan),
        Ok(None) => {
            println!("No usable bookmarks.");
            match fallback.plan(total_pages)? {
                Some(plan) => (&fallback, plan),
                None => return Ok(()),
            }
        }
        Err(e) => {
            println!("Bookmarks are malformed: {}", e);
            match fallback.plan(total_pages)? {
                Some(plan) => (&fallback, plan),
                None => return Ok(()),
            }
        }
    };

    println!(
        "{} pages, {} files using {}:",
        total_pages,
        plan.ranges.len(),
        strategy.name()
    );
    print!("{}", render(&plan));
    Ok(())
}

fn render(plan: &SplitPlan) -> String {
    let mut out = String::new();
    for (i, range) in plan.ranges.iter().enumerate() {
        out.push_str(&format!(
            "{:>5}-{:<5} ch {:>2}/{}  {}\n",
            range.start + 1,
            range.end + 1,
            range.chapter_number,
            plan.total_chapters,
            output_file_name(i, &range.label)
        ));
    }
    out
}
