//! Results directory: one record file per session plus the verified summary.
//!
//! The summary (`stats.txt`) is never appended to. Every save rescans all
//! `stats<timestamp>.txt` records, re-verifies them, and rewrites it whole,
//! so it only ever lists records that currently verify.
//!
//! Record files are named with seconds resolution: two sessions saved within
//! the same second share a file and the later one wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::{format_timestamp, StatsRecord, ValidRecord};
use crate::session::SessionResult;
use crate::signing::{verify_contents, SigningKey};
use crate::summary::SummaryEntry;

pub const SUMMARY_FILE: &str = "stats.txt";
const RECORD_PREFIX: &str = "stats";
const RECORD_SUFFIX: &str = ".txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RecordKind {
    #[strum(serialize = "signed")]
    Signed,
    #[strum(serialize = "flagged")]
    Flagged,
}

/// Where a session's record landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHandle {
    pub path: PathBuf,
    pub kind: RecordKind,
    pub timestamp: NaiveDateTime,
}

pub fn record_file_name(timestamp: &NaiveDateTime) -> String {
    format!("{RECORD_PREFIX}{}{RECORD_SUFFIX}", format_timestamp(timestamp))
}

fn is_record_file_name(name: &str) -> bool {
    name != SUMMARY_FILE && name.starts_with(RECORD_PREFIX) && name.ends_with(RECORD_SUFFIX)
}

#[derive(Debug)]
pub struct ResultsStore {
    dir: PathBuf,
    key: SigningKey,
}

impl ResultsStore {
    pub fn open(dir: impl Into<PathBuf>, key: SigningKey) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| StoreError::io("failed to create results directory", &dir, err))?;
        Ok(Self { dir, key })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    /// Persist a finished session stamped with the local time.
    pub fn record_session(&self, result: &SessionResult) -> Result<RecordHandle, StoreError> {
        self.record_session_at(result, Local::now().naive_local())
    }

    /// Persist a finished session, then rebuild the summary.
    pub fn record_session_at(
        &self,
        result: &SessionResult,
        timestamp: NaiveDateTime,
    ) -> Result<RecordHandle, StoreError> {
        // Seconds resolution is the file name granularity
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        let record = StatsRecord::from_result(result, timestamp);
        let path = self.dir.join(record_file_name(&timestamp));

        if path.exists() {
            warn!(path = %path.display(), "overwriting record saved within the same second");
        }

        let kind = match &record {
            StatsRecord::Valid(_) => RecordKind::Signed,
            StatsRecord::Flagged(flagged) => {
                warn!(hash = %flagged.content_hash, "automated input detected, storing invalid record");
                RecordKind::Flagged
            }
        };

        fs::write(&path, record.render(&self.key))
            .map_err(|err| StoreError::io("failed to write record", &path, err))?;
        info!(path = %path.display(), %kind, wpm = result.wpm, "saved session record");

        self.rebuild_cumulative_summary()?;

        Ok(RecordHandle {
            path,
            kind,
            timestamp,
        })
    }

    /// Re-verify every record and rewrite the summary with the survivors.
    pub fn rebuild_cumulative_summary(&self) -> Result<Vec<SummaryEntry>, StoreError> {
        let read_dir = fs::read_dir(&self.dir)
            .map_err(|err| StoreError::io("failed to list results directory", &self.dir, err))?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for dir_entry in read_dir {
            let dir_entry = dir_entry
                .map_err(|err| StoreError::io("failed to list results directory", &self.dir, err))?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_record_file_name(name) {
                continue;
            }

            match self.load_verified(&dir_entry.path()) {
                Some(record) => entries.push(SummaryEntry::from(&record)),
                None => {
                    debug!(file = name, "excluding unverified record");
                    skipped += 1;
                }
            }
        }

        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        self.write_summary(&entries)?;
        debug!(verified = entries.len(), skipped, "rebuilt cumulative summary");

        Ok(entries)
    }

    /// Read the summary as last written; no verification happens here.
    pub fn load_cumulative_summary(&self) -> Result<Vec<SummaryEntry>, StoreError> {
        let path = self.summary_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io("failed to read summary", &path, err)),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match line.parse::<SummaryEntry>() {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(%err, "skipping malformed summary line");
                    None
                }
            })
            .collect())
    }

    /// Read, verify and parse one record file; any failure means "not verified".
    fn load_verified(&self, path: &Path) -> Option<ValidRecord> {
        let contents = fs::read_to_string(path).ok()?;
        let body = verify_contents(&contents, &self.key)?;
        ValidRecord::from_lines(&body).ok()
    }

    fn write_summary(&self, entries: &[SummaryEntry]) -> Result<(), StoreError> {
        let path = self.summary_path();
        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|err| StoreError::io("failed to create temp summary in", &self.dir, err))?;
        for entry in entries {
            writeln!(temp, "{entry}")
                .map_err(|err| StoreError::io("failed to write summary", &path, err))?;
        }
        temp.persist(&path)
            .map_err(|err| StoreError::io("failed to replace summary", &path, err.error))?;
        Ok(())
    }
}
