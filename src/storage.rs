//! Key-value store of string values, persisted as one JSON object file.
//!
//! Plays the part of browser local storage: values are strings, structured
//! data is JSON-encoded by the caller, last write wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StorageError;

type Items = BTreeMap<String, String>;

pub struct LocalStorage {
    /// Backing file (None keeps everything in memory)
    path: Option<PathBuf>,
    items: Mutex<Items>,
}

impl LocalStorage {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Items::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Items::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Local storage at {} ({} keys)", path.display(), items.len());

        Ok(Self {
            path: Some(path),
            items: Mutex::new(items),
        })
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            path: None,
            items: Mutex::new(Items::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Items> {
        // a poisoned map is still a valid map
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut items = self.lock();
        let mut next = items.clone();
        next.insert(key.to_string(), value.into());
        self.commit(&mut items, next)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.lock();
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.commit(&mut items, next)
    }

    /// Read a JSON-encoded value; missing keys give `None`
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key) {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, raw)
    }

    /// Read-modify-write of a JSON value under one lock.
    /// The new value is saved only if `f` succeeds.
    pub fn update_json<T, R, E, F>(&self, key: &str, f: F) -> Result<R, E>
    where
        T: DeserializeOwned + Serialize + Default,
        E: From<StorageError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let mut items = self.lock();

        let mut value: T = match items.get(key) {
            Some(raw) => serde_json::from_str(raw).map_err(StorageError::from)?,
            None => T::default(),
        };

        let result = f(&mut value)?;

        let raw = serde_json::to_string(&value).map_err(StorageError::from)?;
        let mut next = items.clone();
        next.insert(key.to_string(), raw);
        self.commit(&mut items, next)?;

        Ok(result)
    }

    /// Write `next` to disk, then make it the live map
    fn commit(&self, items: &mut Items, next: Items) -> Result<(), StorageError> {
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    /// Write the whole map through a temp file and rename
    fn persist(&self, items: &Items) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(items)?)?;
        fs::rename(&tmp, path)?;

        debug!("Local storage saved ({} keys)", items.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_get_set_remove() {
        let store = LocalStorage::in_memory();
        assert_eq!(store.get_item("a"), None);

        store.set_item("a", "1").unwrap();
        assert_eq!(store.get_item("a").as_deref(), Some("1"));

        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a"), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = LocalStorage::open(&path).unwrap();
            store.set_item("snakeHighScore", "120").unwrap();
            store.set_json("table", &vec![1, 2, 3]).unwrap();
        }

        let store = LocalStorage::open(&path).unwrap();
        assert_eq!(store.get_item("snakeHighScore").as_deref(), Some("120"));
        assert_eq!(store.get_json::<Vec<i32>>("table").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(LocalStorage::open(&path), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("data");
        let store = LocalStorage::open(blocked.join("store.json")).unwrap();
        store.set_item("kept", "1").unwrap();

        // the data directory turns into a plain file
        fs::remove_dir_all(&blocked).unwrap();
        fs::write(&blocked, "not a directory").unwrap();

        assert!(store.set_item("snakeHighScore", "50").is_err());
        assert_eq!(store.get_item("snakeHighScore"), None);

        assert!(store.remove_item("kept").is_err());
        assert_eq!(store.get_item("kept").as_deref(), Some("1"));

        let updated: Result<(), StorageError> = store.update_json("m", |m: &mut HashMap<String, i32>| {
            m.insert("k".to_string(), 1);
            Ok(())
        });
        assert!(updated.is_err());
        assert_eq!(store.get_item("m"), None);
    }

    #[test]
    fn test_update_json_rolls_back_on_error() {
        let store = LocalStorage::in_memory();
        store.set_json("m", &HashMap::from([("k".to_string(), 1)])).unwrap();

        let failed: Result<(), StorageError> =
            store.update_json("m", |m: &mut HashMap<String, i32>| {
                m.insert("k".to_string(), 2);
                Err(StorageError::Io(std::io::Error::other("boom")))
            });
        assert!(failed.is_err());

        let m: HashMap<String, i32> = store.get_json("m").unwrap().unwrap();
        assert_eq!(m["k"], 1);

        let n: Result<usize, StorageError> = store.update_json("m", |m: &mut HashMap<String, i32>| {
            m.insert("j".to_string(), 3);
            Ok(m.len())
        });
        assert_eq!(n.unwrap(), 2);
    }
}
