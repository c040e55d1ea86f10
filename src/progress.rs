use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Done,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub status: Status,
    pub chunks: usize,
    pub output_dir: String,
}

/// Progress keyed by document stem.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    entries: BTreeMap<String, ProgressEntry>,
}

impl ProgressStore {
    /// Load the record at `path`. Missing or unreadable files start empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "Progress file is corrupt, starting fresh"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "Cannot read progress file, starting fresh"
                );
                BTreeMap::new()
            }
        };
        ProgressStore { path, entries }
    }

    pub fn get(&self, name: &str) -> Option<&ProgressEntry> {
        self.entries.get(name)
    }

    pub fn is_done(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.status == Status::Done)
    }

    pub fn record(&mut self, name: &str, entry: ProgressEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    /// Rewrite the whole record via a temp file and a rename.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path).with_context(|| {
                format!("Failed to create progress file: {}", temp_path.display())
            })?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to write progress file: {}", self.path.display()))?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
