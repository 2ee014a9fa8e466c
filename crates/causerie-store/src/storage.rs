use std::sync::Arc;

use crate::database::Database;
use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::memory::MemoryStore;

/// Typed facade over a [`KeyValueStore`].
///
/// Accessors are grouped by concern in `preferences`, `history`, `session`
/// and `export`.
#[derive(Clone)]
pub struct Storage {
    kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Storage backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Storage backed by the SQLite database in `dir`, or in the platform
    /// data directory when `dir` is `None`.
    pub fn open(dir: Option<&std::path::Path>) -> Result<Self> {
        let db = match dir {
            Some(dir) => Database::open_in_dir(dir)?,
            None => Database::new()?,
        };
        Ok(Self::new(Arc::new(db)))
    }

    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    /// Wipe every key, device id included.
    pub fn clear_all(&self) -> Result<()> {
        self.kv.clear()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
