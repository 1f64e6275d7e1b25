use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// One job posting as scraped from the search results page.
///
/// `id` deduplicates postings across runs: the detail-page path with any query
/// string removed, or a slug of the title when the listing carried no link.
/// Every descriptive field defaults to empty string when absent from the
/// source markup; only `title` is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub grade: String,
    pub employer: String,
    pub location: String,
    pub speciality: String,
    pub salary: String,
    pub link: String,
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
}

/// Fallback id for a listing with no extractable link: lowercase the title
/// and collapse every run of non-alphanumerics into a single hyphen.
///
/// Lossy on purpose — two distinct postings sharing a title collide, and the
/// second is treated as already seen. Stronger identity (hashing the full
/// record, say) would change which postings get notified.
pub fn title_slug(title: &str) -> String {
    SLUG_RE
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// The full persisted set of postings, keyed by id.
///
/// Insertion order is kept (and survives a save/load round trip) so the store
/// file diffs cleanly between runs. At most one record per id; inserting an
/// existing id overwrites in place without moving it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordStore {
    records: IndexMap<String, JobRecord>,
}

impl RecordStore {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.records.get(id)
    }

    /// Insert or overwrite by the record's own id.
    pub fn insert(&mut self, record: JobRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl FromIterator<JobRecord> for RecordStore {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        let mut store = Self::default();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

// The file's top-level shape is a plain JSON array of records; the id keys
// are reconstructed on load.
impl Serialize for RecordStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.values())
    }
}

impl<'de> Deserialize<'de> for RecordStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<JobRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) fn test_record(id: &str, title: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        title: title.to_string(),
        grade: String::new(),
        employer: String::new(),
        location: String::new(),
        speciality: String::new(),
        salary: String::new(),
        link: String::new(),
        scraped_at: DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    }
}
