use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::recording::{FilteredRecording, Recording, Snapshot};

/// Timestamps throughout a recording use this fixed, zero-padded layout.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Start of the exercise unless overridden on the command line.
pub const DEFAULT_START_TIME: &str = "2024-10-26 14:00:00";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("snapshot {index}: timestamp {value:?} is not in YYYY-MM-DD HH:MM:SS form")]
    MalformedTimestamp { index: usize, value: String },

    #[error("snapshot {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("minute offset {0} is out of range")]
    OffsetOutOfRange(i64),
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

/// Reduce a recording to the snapshots taken at or before `minutes` past
/// `start_time`, sorted by timestamp.
///
/// The cutoff is inclusive, and `minutes` may be zero or negative. Every
/// entry's timestamp is parsed, kept or not; the first malformed timestamp
/// or missing required field aborts the whole transform.
pub fn filter_by_elapsed(
    recording: &Recording,
    minutes: i64,
    start_time: NaiveDateTime,
) -> Result<FilteredRecording, FilterError> {
    let target_time = Duration::try_minutes(minutes)
        .and_then(|offset| start_time.checked_add_signed(offset))
        .ok_or(FilterError::OffsetOutOfRange(minutes))?;

    let mut kept = Vec::new();
    for (index, entry) in recording.code_snapshots.entries.iter().enumerate() {
        let timestamp = require(index, "timestamp", &entry.timestamp)?;
        let taken_at =
            parse_timestamp(timestamp).map_err(|_| FilterError::MalformedTimestamp {
                index,
                value: timestamp.to_string(),
            })?;

        if taken_at > target_time {
            continue;
        }

        kept.push(Snapshot {
            student_id: require(index, "student_id", &entry.student_id)?.to_string(),
            content: require(index, "content", &entry.content)?.to_string(),
            timestamp: timestamp.to_string(),
            snapshot_id: require(index, "snapshot_id", &entry.snapshot_id)?.to_string(),
            grade: entry.grade.clone().unwrap_or_default(),
        });
    }

    // Fixed-width timestamps compare the same as their parsed values, and
    // the sort is stable: equal timestamps keep their input order.
    kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let meta = &recording.problem_description;
    Ok(FilteredRecording {
        problem_description: meta.problem_description.clone().unwrap_or_default(),
        problem_start_time: meta
            .timestamp
            .clone()
            .unwrap_or_else(|| start_time.format(TIMESTAMP_FORMAT).to_string()),
        snapshots: kept,
        target_timestamp: target_time.format(TIMESTAMP_FORMAT).to_string(),
    })
}

fn require<'a>(
    index: usize,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, FilterError> {
    value
        .as_deref()
        .ok_or(FilterError::MissingField { index, field })
}
