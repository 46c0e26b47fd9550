//! Snapshot persistence backends (sled and in-memory)

use crate::errors::*;
use crate::snapshot::RegistrySnapshot;
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

const SNAPSHOT_KEY: &[u8] = b"registry_snapshot";

/// Durable home for a registry snapshot.
pub trait SnapshotStore {
    fn load(&self) -> Result<Option<RegistrySnapshot>>;
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()>;
}

/// Sled-backed store. The snapshot lives JSON-encoded under one key of the
/// `registry` tree.
pub struct SledSnapshotStore {
    db: Db,
    tree: Tree,
}

impl SledSnapshotStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree("registry")?;
        Ok(Self { db, tree })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl SnapshotStore for SledSnapshotStore {
    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        self.tree
            .get(SNAPSHOT_KEY)?
            .map(|v| RegistrySnapshot::from_json(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        self.tree.insert(SNAPSHOT_KEY, snapshot.to_json()?)?;
        self.flush()
    }
}

/// In-memory testing backend
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshot: Arc<RwLock<Option<RegistrySnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<RegistrySnapshot>> {
        Ok(self.snapshot.read().clone())
    }

    fn save(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }
}
