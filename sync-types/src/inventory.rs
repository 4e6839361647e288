//! Inventory snapshots.
//!
//! An [`Inventory`] maps relative path to [`FileRecord`] for one side of a
//! sync. It is built fresh on every run and never persisted. Iteration is
//! always in lexicographic path order, so anything derived from an
//! inventory is reproducible across runs.

use std::collections::BTreeMap;

use crate::{FileRecord, SourceKind, SyncError};

/// A path-keyed snapshot of files on one side of the sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    kind: SourceKind,
    records: BTreeMap<String, FileRecord>,
}

impl Inventory {
    /// Create an empty inventory for the given side.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            records: BTreeMap::new(),
        }
    }

    /// Build an inventory from records, rejecting duplicate paths.
    pub fn from_records<I>(kind: SourceKind, records: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut inventory = Self::new(kind);
        for record in records {
            inventory.insert(record)?;
        }
        Ok(inventory)
    }

    /// Add a record.
    ///
    /// Fails if the path is already present or the record was observed on
    /// the other side.
    pub fn insert(&mut self, record: FileRecord) -> Result<(), SyncError> {
        if record.source != self.kind {
            return Err(SyncError::WrongSource {
                path: record.relative_path,
                expected: self.kind,
                found: record.source,
            });
        }
        if self.records.contains_key(&record.relative_path) {
            return Err(SyncError::DuplicatePath(record.relative_path));
        }
        self.records.insert(record.relative_path.clone(), record);
        Ok(())
    }

    /// Which side this snapshot describes.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Look up a record by relative path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no files.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in path order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Paths in lexicographic order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Sum of all file sizes.
    pub fn total_bytes(&self) -> u64 {
        self.records.values().map(|r| r.size_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentHash;

    fn local(path: &str) -> FileRecord {
        FileRecord::local(path, ContentHash::from_hex("01").unwrap(), 3).unwrap()
    }

    #[test]
    fn empty_inventory_is_valid() {
        let inv = Inventory::new(SourceKind::Local);
        assert!(inv.is_empty());
        assert_eq!(inv.len(), 0);
        assert_eq!(inv.total_bytes(), 0);
    }

    #[test]
    fn rejects_duplicate_path() {
        let mut inv = Inventory::new(SourceKind::Local);
        inv.insert(local("a.txt")).unwrap();

        let result = inv.insert(local("./a.txt"));
        assert!(matches!(result, Err(SyncError::DuplicatePath(p)) if p == "a.txt"));
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn rejects_wrong_source() {
        let mut inv = Inventory::new(SourceKind::Remote);
        let result = inv.insert(local("a.txt"));
        assert!(matches!(result, Err(SyncError::WrongSource { .. })));
    }

    #[test]
    fn iterates_in_path_order() {
        let inv = Inventory::from_records(
            SourceKind::Local,
            vec![local("z.html"), local("a/b.css"), local("m.js")],
        )
        .unwrap();

        let paths: Vec<&str> = inv.paths().collect();
        assert_eq!(paths, vec!["a/b.css", "m.js", "z.html"]);
        assert_eq!(inv.total_bytes(), 9);
    }
}
