//! Per-session result records and their on-disk label format.

use std::str::FromStr;

use chrono::NaiveDateTime;
use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::error::RecordError;
use crate::metrics::elapsed_seconds_at;
use crate::session::SessionResult;
use crate::signing::{sign, SigningKey, INVALID_TAG, TAG_PREFIX};

/// `YYYYMMDD_HHMMSS`, used in record bodies, file names and the summary
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub const WPM_LABEL: &str = "WPM: ";
pub const ACCURACY_LABEL: &str = "Accuracy: ";
pub const TIMESTAMP_LABEL: &str = "Timestamp: ";
pub const AVG_INTERVAL_LABEL: &str = "Avg Time Between Letters: ";
pub const SENTENCE_LABEL: &str = "Sentence: ";
pub const INTERVALS_LABEL: &str = "Time Between Letters (s): ";

const CHEAT_MARKER: &str = "CHEAT DETECTED";
const CHEAT_EXPLANATION: &str =
    "This session's stats are invalid due to detected macro or automated input.";

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RecordError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| RecordError::Malformed {
        label: "Timestamp",
        value: value.to_string(),
    })
}

/// A legitimate session, signed when written
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    pub wpm: f64,
    pub accuracy_percent: f64,
    pub timestamp: NaiveDateTime,
    pub avg_interval: f64,
    pub sentence: String,
    pub intervals: Vec<f64>,
}

impl ValidRecord {
    pub fn from_result(result: &SessionResult, timestamp: NaiveDateTime) -> Self {
        Self {
            wpm: result.wpm,
            accuracy_percent: result.accuracy_percent,
            timestamp,
            avg_interval: result.avg_interval(),
            sentence: result.target_text.clone(),
            intervals: result.intervals.clone(),
        }
    }

    /// The lines covered by the integrity tag, in file order
    pub fn body_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{WPM_LABEL}{:.2}", self.wpm),
            format!("{ACCURACY_LABEL}{:.2}%", self.accuracy_percent),
            format!("{TIMESTAMP_LABEL}{}", format_timestamp(&self.timestamp)),
            format!("{AVG_INTERVAL_LABEL}{:.3} sec", self.avg_interval),
            format!("{SENTENCE_LABEL}{}", self.sentence),
        ];
        if !self.intervals.is_empty() {
            lines.push(format!(
                "{INTERVALS_LABEL}{}",
                self.intervals.iter().map(|t| format!("{t:.3}")).join(", ")
            ));
        }
        lines
    }

    /// Full file contents: body lines followed by the tag line
    pub fn render(&self, key: &SigningKey) -> String {
        let lines = self.body_lines();
        let tag = sign(&lines, key);

        let mut out = String::new();
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(TAG_PREFIX);
        out.push_str(&tag);
        out.push('\n');
        out
    }

    /// Parse the body lines of a record that already passed verification.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, RecordError> {
        let wpm = parse_number(labeled(lines, WPM_LABEL)?, "WPM")?;
        let accuracy = labeled(lines, ACCURACY_LABEL)?;
        let accuracy_percent = parse_number(strip(accuracy, "%", "Accuracy")?, "Accuracy")?;
        let timestamp = parse_timestamp(labeled(lines, TIMESTAMP_LABEL)?)?;
        let avg = labeled(lines, AVG_INTERVAL_LABEL)?;
        let avg_interval = parse_number(
            strip(avg, " sec", "Avg Time Between Letters")?,
            "Avg Time Between Letters",
        )?;
        let sentence = labeled(lines, SENTENCE_LABEL)?.to_string();
        let intervals = match labeled(lines, INTERVALS_LABEL) {
            Ok(values) => values
                .split(", ")
                .map(|value| parse_number(value, "Time Between Letters (s)"))
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            wpm,
            accuracy_percent,
            timestamp,
            avg_interval,
            sentence,
            intervals,
        })
    }

    /// Start signal to completion, recovered from the stored WPM and sentence
    pub fn elapsed_seconds(&self) -> f64 {
        elapsed_seconds_at(self.sentence.chars().count(), self.wpm)
    }
}

/// A session the cheat heuristic rejected; never signed, never summarized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedRecord {
    pub timestamp: NaiveDateTime,
    /// Identifies the session for debugging; carries no trust
    pub content_hash: String,
}

impl FlaggedRecord {
    pub fn from_result(result: &SessionResult, timestamp: NaiveDateTime) -> Self {
        let material = format!(
            "{:.2}{:.2}{}",
            result.wpm,
            result.accuracy_percent,
            format_timestamp(&timestamp)
        );
        Self {
            timestamp,
            content_hash: hex::encode(Sha256::digest(material.as_bytes())),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{CHEAT_MARKER}\nHash: {}\n{CHEAT_EXPLANATION}\n{TAG_PREFIX}{INVALID_TAG}\n",
            self.content_hash
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsRecord {
    Valid(ValidRecord),
    Flagged(FlaggedRecord),
}

impl StatsRecord {
    pub fn from_result(result: &SessionResult, timestamp: NaiveDateTime) -> Self {
        if result.is_flagged {
            StatsRecord::Flagged(FlaggedRecord::from_result(result, timestamp))
        } else {
            StatsRecord::Valid(ValidRecord::from_result(result, timestamp))
        }
    }

    pub fn render(&self, key: &SigningKey) -> String {
        match self {
            StatsRecord::Valid(record) => record.render(key),
            StatsRecord::Flagged(record) => record.render(),
        }
    }
}

fn labeled<'a, S: AsRef<str>>(lines: &'a [S], label: &'static str) -> Result<&'a str, RecordError> {
    lines
        .iter()
        .find_map(|line| line.as_ref().strip_prefix(label))
        .ok_or(RecordError::MissingLabel(label.trim_end_matches(": ")))
}

fn strip<'a>(value: &'a str, suffix: &str, label: &'static str) -> Result<&'a str, RecordError> {
    value.strip_suffix(suffix).ok_or_else(|| RecordError::Malformed {
        label,
        value: value.to_string(),
    })
}

pub(crate) fn parse_number(value: &str, label: &'static str) -> Result<f64, RecordError> {
    f64::from_str(value.trim())
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RecordError::Malformed {
            label,
            value: value.to_string(),
        })
}
