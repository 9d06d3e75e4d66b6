use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::RecordError;
use crate::record::{format_timestamp, parse_number, parse_timestamp, ValidRecord};

/// One verified session as it appears in the cumulative summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub timestamp: NaiveDateTime,
    pub wpm: f64,
    pub elapsed_secs: f64,
    pub accuracy_percent: f64,
    pub avg_interval: f64,
}

impl From<&ValidRecord> for SummaryEntry {
    fn from(record: &ValidRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            wpm: record.wpm,
            elapsed_secs: record.elapsed_seconds(),
            accuracy_percent: record.accuracy_percent,
            avg_interval: record.avg_interval,
        }
    }
}

impl fmt::Display for SummaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, WPM: {:.2}, Time: {:.2}s, Accuracy: {:.2}%, AvgTimeBetweenLetters: {:.3}s",
            format_timestamp(&self.timestamp),
            self.wpm,
            self.elapsed_secs,
            self.accuracy_percent,
            self.avg_interval
        )
    }
}

impl FromStr for SummaryEntry {
    type Err = RecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.trim_end().split(", ").collect();
        let [timestamp, wpm, time, accuracy, avg] = parts.as_slice() else {
            return Err(RecordError::Malformed {
                label: "summary line",
                value: line.to_string(),
            });
        };

        Ok(Self {
            timestamp: parse_timestamp(timestamp)?,
            wpm: parse_number(field(wpm, "WPM: ", "")?, "WPM")?,
            elapsed_secs: parse_number(field(time, "Time: ", "s")?, "Time")?,
            accuracy_percent: parse_number(field(accuracy, "Accuracy: ", "%")?, "Accuracy")?,
            avg_interval: parse_number(
                field(avg, "AvgTimeBetweenLetters: ", "s")?,
                "AvgTimeBetweenLetters",
            )?,
        })
    }
}

fn field<'a>(part: &'a str, prefix: &'static str, suffix: &str) -> Result<&'a str, RecordError> {
    part.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .ok_or_else(|| RecordError::Malformed {
            label: prefix.trim_end_matches(": "),
            value: part.to_string(),
        })
}
