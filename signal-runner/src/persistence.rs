use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use trading_core::SignalRecord;
use trading_strategy::{strategy::utc_timestamp, RecordSink};

/// Writes each record as pretty JSON under `<runs_dir>/<YYYY-MM-DD>/`.
///
/// File names start with the run timestamp with `:` replaced by `-`, so a
/// whole run sorts together on disk.
pub struct JsonRunWriter {
    dir: PathBuf,
    file_stamp: String,
    written: Vec<PathBuf>,
}

impl JsonRunWriter {
    pub fn new(runs_dir: &Path, now: DateTime<Utc>) -> Result<Self> {
        let dir = runs_dir.join(now.format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create run directory {}", dir.display()))?;

        Ok(Self {
            dir,
            file_stamp: utc_timestamp(now).replace(':', "-"),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write the combined `<timestamp>_all.json`
    pub fn write_all(&mut self, records: &[SignalRecord]) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}_all.json", self.file_stamp));
        self.write_json(&path, records)?;
        Ok(path)
    }

    fn record_path(&self, symbol: &str, prompt_name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.json",
            self.file_stamp,
            file_component(symbol),
            file_component(prompt_name)
        ))
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved {}", path.display());
        self.written.push(path.to_path_buf());
        Ok(())
    }
}

/// Keep a name inside the run directory
fn file_component(name: &str) -> String {
    name.replace(|c: char| c == '/' || c == '\\', "-")
}

impl RecordSink for JsonRunWriter {
    fn persist(&mut self, symbol: &str, prompt_name: &str, record: &SignalRecord) -> Result<()> {
        let path = self.record_path(symbol, prompt_name);
        self.write_json(&path, record)
    }
}
