use std::io::{self, BufRead, Write};

pub trait RangePrompt {
    /// A range expression such as `1-50, 51-end`, or `None` if the user gave none.
    fn request_manual_ranges(&mut self, doc_name: &str, page_count: u32) -> Option<String>;
}

/// Never asks; used for background runs.
pub struct NoPrompt;

impl RangePrompt for NoPrompt {
    fn request_manual_ranges(&mut self, _doc_name: &str, _page_count: u32) -> Option<String> {
        None
    }
}

/// Reads one line from a reader after printing a question to a writer.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LinePrompt { input, output }
    }
}

impl<R: BufRead, W: Write> RangePrompt for LinePrompt<R, W> {
    fn request_manual_ranges(&mut self, doc_name: &str, page_count: u32) -> Option<String> {
        let asked = writeln!(
            self.output,
            "'{}' has no bookmarks.\nTotal Pages: {}\n\nEnter split ranges (e.g. '1-50, 51-100, 101-end'), or leave empty:",
            doc_name, page_count
        )
        .and_then(|_| self.output.flush());
        if let Err(e) = asked {
            tracing::warn!(error = %e, "Cannot show range prompt");
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => {
                let line = line.trim();
                (!line.is_empty()).then(|| line.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read range prompt answer");
                None
            }
        }
    }
}
