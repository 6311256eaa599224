use std::collections::HashMap;

/// Tally snapshots by grade. Ungraded snapshots count under the empty
/// string.
pub fn get_counts<'a, I>(grades: I, counts: &mut HashMap<String, usize>)
where
    I: IntoIterator<Item = &'a str>,
{
    for grade in grades {
        counts
            .entry(grade.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }
}
