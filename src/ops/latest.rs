use std::collections::BTreeMap;

use crate::recording::{FilteredRecording, Snapshot};

/// Reduce a filtered document to each student's newest snapshot.
///
/// A later timestamp displaces an earlier one; an equal timestamp does not.
/// The result stays sorted ascending by timestamp, with ties across
/// students in student id order.
pub fn latest_per_student(mut document: FilteredRecording) -> FilteredRecording {
    let mut newest: BTreeMap<String, Snapshot> = BTreeMap::new();

    for snapshot in document.snapshots.drain(..) {
        match newest.get(&snapshot.student_id) {
            Some(current) if current.timestamp >= snapshot.timestamp => {}
            _ => {
                newest.insert(snapshot.student_id.clone(), snapshot);
            }
        }
    }

    let mut snapshots: Vec<Snapshot> = newest.into_values().collect();
    snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    document.snapshots = snapshots;
    document
}
