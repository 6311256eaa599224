use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A coding-exercise recording as written by the capture backend.
///
/// Either section may be missing entirely; an absent section reads as
/// empty. Per-snapshot field presence is checked when snapshots are
/// projected into the output document, not here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recording {
    pub code_snapshots: SnapshotLog,
    pub problem_description: ProblemMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotLog {
    pub entries: Vec<RawSnapshot>,
}

/// One captured editor state, as found on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSnapshot {
    #[serde(deserialize_with = "deserialize_id")]
    pub student_id: Option<String>,
    pub content: Option<String>,
    pub timestamp: Option<String>,
    #[serde(deserialize_with = "deserialize_id")]
    pub snapshot_id: Option<String>,
    pub grade: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProblemMeta {
    pub problem_description: Option<String>,
    pub timestamp: Option<String>,
}

/// The reduced document emitted by the filter and latest operations.
/// Struct order fixes the serialized field order.
#[derive(Debug, PartialEq, Serialize)]
pub struct FilteredRecording {
    pub problem_description: String,
    pub problem_start_time: String,
    pub snapshots: Vec<Snapshot>,
    pub target_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub student_id: String,
    pub content: String,
    pub timestamp: String,
    pub snapshot_id: String,
    pub grade: String,
}

// this is a leniency given, the capture backend
// declares student and snapshot ids as integers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}
