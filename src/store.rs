use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::RecordStore;

/// Read the persisted store. A missing or unreadable file is first-run
/// territory, not an error: the run proceeds with an empty prior set and the
/// next successful save rewrites the file.
pub fn load(path: &Path) -> RecordStore {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            info!("no store file at {}, starting fresh", path.display());
            return RecordStore::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(store) => store,
        Err(e) => {
            warn!("store file at {} is unparsable ({}), treating as empty", path.display(), e);
            RecordStore::default()
        }
    }
}

/// Overwrite the store file in full with pretty-printed JSON, creating parent
/// directories as needed. Write failures propagate and fail the run.
pub fn save(path: &Path, store: &RecordStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(store)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_record;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("jobwatch-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn missing_file_is_empty_store() {
        let store = load(Path::new("/nonexistent/jobwatch/jobs.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_store() {
        let path = scratch_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let store = load(&path);
        assert!(store.is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = scratch_path("roundtrip");
        let mut record = test_record("a", "Consultant Dermatologist");
        record.salary = "£93,666 to £126,281 a year".to_string();
        let store: RecordStore = [record, test_record("b", "Specialty Doctor")]
            .into_iter()
            .collect();

        save(&path, &store).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded, store);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("jobwatch-nested-{}", std::process::id()));
        let path = dir.join("deeper").join("jobs.json");
        save(&path, &RecordStore::default()).unwrap();
        assert_eq!(load(&path), RecordStore::default());
        fs::remove_dir_all(&dir).unwrap();
    }
}
