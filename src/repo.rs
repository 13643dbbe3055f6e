//! Snapshot repositories for roster stores.
//!
//! A roster kind persists as one JSON array under its namespaced key
//! (`edutrack-students`, ...). Absence of the key means "use the seed".

use crate::db;
use crate::error::RepositoryError;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::rc::Rc;

pub trait Repository<E> {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<E>>, RepositoryError>;
    fn save(&self, items: &[E]) -> Result<(), RepositoryError>;
    fn clear(&self) -> Result<(), RepositoryError>;
}

/// String-keyed snapshot storage shared by all roster kinds.
pub trait SnapshotBackend {
    fn read(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn write(&self, key: &str, json: &str) -> Result<(), RepositoryError>;
    fn remove(&self, key: &str) -> Result<(), RepositoryError>;
}

pub struct SnapshotRepository<E, B> {
    backend: B,
    key: &'static str,
    _entity: PhantomData<E>,
}

impl<E, B: SnapshotBackend> SnapshotRepository<E, B> {
    pub fn new(backend: B, key: &'static str) -> Self {
        Self {
            backend,
            key,
            _entity: PhantomData,
        }
    }
}

impl<E, B> Repository<E> for SnapshotRepository<E, B>
where
    E: Serialize + DeserializeOwned,
    B: SnapshotBackend,
{
    fn load(&self) -> Result<Option<Vec<E>>, RepositoryError> {
        match self.backend.read(self.key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, items: &[E]) -> Result<(), RepositoryError> {
        let text = serde_json::to_string(items)?;
        self.backend.write(self.key, &text)
    }

    fn clear(&self) -> Result<(), RepositoryError> {
        self.backend.remove(self.key)
    }
}

/// Workspace database backend (`snapshots` table).
#[derive(Clone)]
pub struct SqliteSnapshots {
    conn: Rc<Connection>,
}

impl SqliteSnapshots {
    pub fn new(conn: Rc<Connection>) -> Self {
        Self { conn }
    }
}

impl SnapshotBackend for SqliteSnapshots {
    fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(db::snapshot_get(&self.conn, key)?)
    }

    fn write(&self, key: &str, json: &str) -> Result<(), RepositoryError> {
        Ok(db::snapshot_put(&self.conn, key, json)?)
    }

    fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        Ok(db::snapshot_delete(&self.conn, key)?)
    }
}

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;

/// In-process backend. Clones share the same cells, so a test can keep a
/// handle and inspect what the store wrote.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemorySnapshots {
    cells: Rc<RefCell<HashMap<String, String>>>,
}

#[cfg(test)]
impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cells.borrow().contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.cells.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, json: &str) {
        self.cells
            .borrow_mut()
            .insert(key.to_string(), json.to_string());
    }
}

#[cfg(test)]
impl SnapshotBackend for MemorySnapshots {
    fn read(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.cells.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, json: &str) -> Result<(), RepositoryError> {
        self.put_raw(key, json);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        self.cells.borrow_mut().remove(key);
        Ok(())
    }
}
