/// XgStat Live - Logger
/// JSONL event stream (jeden soubor na den)

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ScrapeOkEvent {
    pub ts:          String,
    pub event:       &'static str,   // "SCRAPE_OK"
    pub url:         String,
    pub fixture_id:  i64,
    pub gameweek:    u32,
    pub home:        String,
    pub away:        String,
    pub home_shots:  usize,
    pub away_shots:  usize,
    pub elapsed_ms:  u64,
}

#[derive(Serialize, Debug)]
pub struct ScrapeFailedEvent {
    pub ts:          String,
    pub event:       &'static str,   // "SCRAPE_FAILED"
    pub url:         String,
    pub kind:        String,         // RenderError::kind()
    pub message:     String,
    pub elapsed_ms:  u64,
}

#[derive(Serialize, Debug)]
pub struct FixtureSavedEvent {
    pub ts:          String,
    pub event:       &'static str,   // "FIXTURE_SAVED"
    pub fixture_id:  i64,
    pub gameweek:    u32,
    pub shots:       usize,
}
