use std::collections::HashSet;

use crate::model::{JobRecord, RecordStore};

pub struct DiffOutcome {
    /// Records from the current scrape whose id was not in the previous
    /// store, in scrape order.
    pub new_records: Vec<JobRecord>,
    /// Previous store with every current record written over it. On id
    /// overlap the current run's data wins, so `scrapedAt` and any field
    /// drift always reflect the latest scrape.
    pub merged: RecordStore,
}

/// Pure set-difference of the current scrape against the previous store.
pub fn diff(current: Vec<JobRecord>, previous: RecordStore) -> DiffOutcome {
    let seen: HashSet<String> = previous.ids().map(str::to_string).collect();

    let mut merged = previous;
    let mut new_records = Vec::new();
    for record in current {
        if !seen.contains(&record.id) {
            new_records.push(record.clone());
        }
        merged.insert(record);
    }

    DiffOutcome { new_records, merged }
}
