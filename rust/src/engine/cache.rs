// Processed-record cache: which record ids are done and where their documents landed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::RecordId;

/// Stored value for a record: `Some(path)` when saved, `None` when the portal had nothing.
pub type CacheEntry = Option<PathBuf>;

/// Key-presence store consulted before every fetch.
///
/// Any key present, whatever its value, means the record must not be attempted again.
pub trait RecordCache: Send {
    fn contains(&self, id: &RecordId) -> bool;
    fn get(&self, id: &RecordId) -> Option<CacheEntry>;
    fn set(&mut self, id: RecordId, entry: CacheEntry) -> Result<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local cache, lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: BTreeMap<RecordId, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordCache for MemoryCache {
    fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    fn get(&self, id: &RecordId) -> Option<CacheEntry> {
        self.entries.get(id).cloned()
    }

    fn set(&mut self, id: RecordId, entry: CacheEntry) -> Result<()> {
        self.entries.insert(id, entry);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache persisted as a JSON object `{ "<id>": "<path>" | null }`.
///
/// Every `set` rewrites the file through a temp file and rename, so an interrupted
/// process leaves either the old or the new state on disk.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<RecordId, CacheEntry>,
}

impl JsonFileCache {
    /// Load the cache at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading cache {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing cache {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!("cache {} opened with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let json = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing cache {}", self.path.display()))?;
        Ok(())
    }
}

impl RecordCache for JsonFileCache {
    fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    fn get(&self, id: &RecordId) -> Option<CacheEntry> {
        self.entries.get(id).cloned()
    }

    fn set(&mut self, id: RecordId, entry: CacheEntry) -> Result<()> {
        self.entries.insert(id, entry);
        self.persist()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
