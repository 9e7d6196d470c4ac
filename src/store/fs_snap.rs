//! store::fs_snap
//!
//! Path-keyed filesystem snapshots and three-way diffs.
//!
//! A snapshot records the SHA-256 hash of every regular file reachable from
//! the given paths; contents are never retained. Diffing two snapshots
//! compares by path key: `added` and `removed` partition the key sets,
//! `changed` holds keys present in both with different hashes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::core::types::{random_id, ContentHash, UtcTimestamp};

use super::error::DomainError;

/// An immutable filesystem snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsSnapshot {
    pub id: String,
    pub reason: String,
    pub created_at: UtcTimestamp,
    /// Path -> content hash, sorted by path.
    pub files: BTreeMap<String, ContentHash>,
}

/// The difference between two snapshots, by path key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FsDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

/// The snapshot store.
#[derive(Debug, Default)]
pub struct FsSnapshotStore {
    snapshots: Vec<FsSnapshot>,
}

impl FsSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every regular file reachable from `paths`.
    ///
    /// # Errors
    ///
    /// - `not_found` when a given path does not exist
    /// - `io` when a file or directory cannot be read
    pub fn create(
        &mut self,
        paths: &[String],
        reason: Option<String>,
    ) -> Result<&FsSnapshot, DomainError> {
        let mut files = BTreeMap::new();
        for path in paths {
            collect(Path::new(path), &mut files)?;
        }
        self.snapshots.push(FsSnapshot {
            id: random_id("fs-snap-"),
            reason: reason.unwrap_or_default(),
            created_at: UtcTimestamp::now(),
            files,
        });
        Ok(self.snapshots.last().expect("just pushed"))
    }

    /// Look up a snapshot by id.
    pub fn get(&self, id: &str) -> Result<&FsSnapshot, DomainError> {
        self.snapshots
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| DomainError::not_found("snapshot"))
    }

    /// Diff two snapshots by path key.
    pub fn diff(&self, from_id: &str, to_id: &str) -> Result<FsDiff, DomainError> {
        let from = self.get(from_id)?;
        let to = self.get(to_id)?;

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut changed = Vec::new();

        for (path, hash) in &to.files {
            match from.files.get(path) {
                None => added.push(path.clone()),
                Some(old) if old != hash => changed.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in from.files.keys() {
            if !to.files.contains_key(path) {
                removed.push(path.clone());
            }
        }

        Ok(FsDiff {
            added,
            removed,
            changed,
        })
    }
}

fn collect(path: &Path, files: &mut BTreeMap<String, ContentHash>) -> Result<(), DomainError> {
    let meta = fs::metadata(path)
        .map_err(|_| DomainError::not_found(format!("path '{}'", path.display())))?;

    if meta.is_file() {
        files.insert(path.display().to_string(), hash_file(path)?);
        return Ok(());
    }

    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| DomainError::Io {
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() {
            files.insert(
                entry.path().display().to_string(),
                hash_file(entry.path())?,
            );
        }
    }
    Ok(())
}

fn hash_file(path: &Path) -> Result<ContentHash, DomainError> {
    let bytes = fs::read(path).map_err(|e| DomainError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    Ok(ContentHash::compute(&bytes))
}
