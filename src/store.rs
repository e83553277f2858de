use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, WikiError};

/// Record key -> record value, persisted as one JSON document.
pub type Records = BTreeMap<String, Value>;

/// Records accumulated by a fetch run, bound to the document they persist to.
///
/// Ids loaded from an existing document may be refreshed once by the run;
/// an id first seen during the run must never come back with a different value.
pub struct RecordStore {
    path: PathBuf,
    records: Records,
    preloaded: HashSet<String>,
}

impl RecordStore {
    /// Empty store writing to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore {
            path: path.into(),
            records: Records::new(),
            preloaded: HashSet::new(),
        }
    }

    /// Load the document at `path`; it must exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records: Records = read_json(&path)?;
        debug!("Loaded {} records from {:?}", records.len(), path);
        let preloaded = records.keys().cloned().collect();
        Ok(RecordStore {
            path,
            records,
            preloaded,
        })
    }

    /// Load the document at `path`, or start empty if there is none yet.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => Ok(store),
            Err(e) if e.is_not_found() => Ok(Self::new(path)),
            Err(e) => Err(e),
        }
    }

    pub fn insert(&mut self, id: String, record: Value) -> Result<()> {
        if self.preloaded.remove(&id) {
            self.records.insert(id, record);
            return Ok(());
        }
        match self.records.get(&id) {
            Some(existing) if *existing != record => Err(WikiError::DuplicateRecord { id }),
            Some(_) => Ok(()),
            None => {
                self.records.insert(id, record);
                Ok(())
            }
        }
    }

    /// Overwrite the backing document with the full current contents.
    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write `value` as 2-space indented JSON, non-ASCII kept literal.
///
/// The document is written to a sibling `.tmp` file and renamed over `path`,
/// so a failed write leaves the previous contents in place.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    if let Err(e) = write_to(&tmp, value) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_to<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_with_different_value_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::new(dir.path().join("wiki_data.json"));
        store.insert("Data:A.x".into(), json!({"v": 1})).unwrap();
        store.insert("Data:A.x".into(), json!({"v": 1})).unwrap();

        let err = store.insert("Data:A.x".into(), json!({"v": 2})).unwrap_err();
        assert!(matches!(err, WikiError::DuplicateRecord { ref id } if id == "Data:A.x"));
        assert_eq!(store.records()["Data:A.x"], json!({"v": 1}));
    }

    #[test]
    fn preloaded_records_are_refreshed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki_data.json");
        write_json(&path, &json!({"Data:A.x": {"v": 1}})).unwrap();

        let mut store = RecordStore::open(&path).unwrap();
        store.insert("Data:A.x".into(), json!({"v": 2})).unwrap();
        assert_eq!(store.records()["Data:A.x"], json!({"v": 2}));

        assert!(store.insert("Data:A.x".into(), json!({"v": 3})).is_err());
    }

    struct FailsAfterFirst;

    impl Serialize for FailsAfterFirst {
        fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
            use serde::ser::{Error, SerializeMap};
            let mut map = s.serialize_map(None)?;
            map.serialize_entry("Data:A.a", &1)?;
            Err(S::Error::custom("serializer gave up"))
        }
    }

    #[test]
    fn failed_save_keeps_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki_data.json");
        let mut store = RecordStore::new(&path);
        store.insert("Data:A.a".into(), json!(1)).unwrap();
        store.insert("Data:A.b".into(), json!(2)).unwrap();
        store.save().unwrap();

        assert!(write_json(&path, &FailsAfterFirst).is_err());

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(!dir.path().join("wiki_data.json.tmp").exists());
    }

    #[test]
    fn open_or_empty_without_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open_or_empty(dir.path().join("missing.json")).unwrap();
        assert!(store.is_empty());
        assert!(RecordStore::open(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn save_keeps_non_ascii_literal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let mut store = RecordStore::new(&path);
        store.insert("Data:DSTMobInfo.pig".into(), json!({"name_cn": "猪人"})).unwrap();
        store.save().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("猪人"));
        assert!(text.contains("\n  \"Data:DSTMobInfo.pig\": {"));

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
    }
}
