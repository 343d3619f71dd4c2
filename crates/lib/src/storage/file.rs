//! JSON-file-backed store.
//!
//! The whole map lives in memory and is written back to disk after every
//! mutation, so the file always reflects the last successful write.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::{KvStore, StoreError};
use crate::Result;

/// The current file format version.
const FILE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_file_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != FILE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported store file version {version}; only version {FILE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_file_version"
    )]
    version: u8,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// A [`KvStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is missing.
    ///
    /// A file that is not valid JSON is logged and replaced by an empty
    /// store on the next write. A file from an unknown format version is an
    /// error, so newer data is never overwritten.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => Self::parse(&path, &raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file missing, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                }
                .into());
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(path: &Path, raw: &str) -> Result<BTreeMap<String, String>> {
        // Check the version on its own first so that a version mismatch is
        // reported instead of being swallowed as corruption.
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw)
            && let Some(found) = value.get("_v").and_then(|v| v.as_u64())
            && found != u64::from(FILE_VERSION)
        {
            return Err(StoreError::UnsupportedVersion {
                found: u8::try_from(found).unwrap_or(u8::MAX),
                supported: FILE_VERSION,
            }
            .into());
        }

        match serde_json::from_str::<StoreFile>(raw) {
            Ok(file) => Ok(file.entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed store file");
                Ok(BTreeMap::new())
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned.into())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let file = StoreFile {
            version: FILE_VERSION,
            entries: entries.clone(),
        };
        let raw = serde_json::to_string_pretty(&file).map_err(|e| StoreError::Serialize {
            reason: e.to_string(),
        })?;

        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write to a sibling file and rename so a crash never leaves a
        // truncated store behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}
