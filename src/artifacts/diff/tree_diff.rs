//! Path-restricted comparison of several trees at once
//!
//! The history simplification stage compares a commit's tree against each
//! parent tree. Only path presence and identity matter, so entries are
//! compared by mode and object id and blob contents are never read.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::path_filter::{PathFilter, PathScope};
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::walk::error::{load_expected, WalkError};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::ops::ControlFlow;

/// Deepest tree nesting followed before the store is considered corrupt
pub const MAX_TREE_DEPTH: usize = 4096;

pub type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

/// A path whose entries are not identical across the compared trees
///
/// `entries[i]` is the entry of the i-th tree at `path`, `None` when that
/// tree has nothing there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub path: String,
    pub entries: Vec<Option<DatabaseEntry>>,
}

impl PathChange {
    /// Whether tree `i` differs from tree `j` at this path
    pub fn differs(&self, i: usize, j: usize) -> bool {
        self.entries[i] != self.entries[j]
    }

    /// Whether the path is missing from tree `from` but present in tree `to`
    pub fn is_addition(&self, from: usize, to: usize) -> bool {
        self.entries[from].is_none() && self.entries[to].is_some()
    }
}

/// Load and parse a tree, mapping every failure to a typed walk error
pub(crate) fn load_tree(store: &dyn ObjectStore, oid: &ObjectId) -> Result<Tree, WalkError> {
    let data = load_expected(store, oid, ObjectType::Tree)?;
    Tree::deserialize(Cursor::new(data)).map_err(|err| WalkError::corrupt(*oid, ObjectType::Tree, err))
}

#[derive(Debug)]
pub struct TreeDiff<'r> {
    store: &'r dyn ObjectStore,
    recursive: bool,
}

impl<'r> TreeDiff<'r> {
    pub fn new(store: &'r dyn ObjectStore, recursive: bool) -> Self {
        TreeDiff { store, recursive }
    }

    /// Compare `trees` under `filter`, reporting every differing path to
    /// `visitor` in path order until it breaks
    ///
    /// With a single tree every selected path is reported.
    pub fn compare(
        &self,
        trees: &[Option<ObjectId>],
        filter: &PathFilter,
        visitor: &mut dyn FnMut(&PathChange) -> ControlFlow<()>,
    ) -> Result<(), WalkError> {
        self.compare_oids(trees, filter.scope(), "", 0, visitor)
            .map(|_| ())
    }

    /// Collect every differing path
    pub fn changes(
        &self,
        trees: &[Option<ObjectId>],
        filter: &PathFilter,
    ) -> Result<Vec<PathChange>, WalkError> {
        let mut changes = Vec::new();
        self.compare(trees, filter, &mut |change| {
            changes.push(change.clone());
            ControlFlow::Continue(())
        })?;
        Ok(changes)
    }

    fn compare_oids(
        &self,
        trees: &[Option<ObjectId>],
        scope: PathScope<'_>,
        prefix: &str,
        depth: usize,
        visitor: &mut dyn FnMut(&PathChange) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>, WalkError> {
        if depth > MAX_TREE_DEPTH {
            let oid = trees.iter().flatten().next().copied().unwrap_or_default();
            tracing::warn!(%oid, path = prefix, "tree nesting exceeds {MAX_TREE_DEPTH} levels");
            return Err(WalkError::corrupt(
                oid,
                ObjectType::Tree,
                format!("tree nesting exceeds {MAX_TREE_DEPTH} levels at {prefix:?}"),
            ));
        }

        let entry_maps = trees
            .iter()
            .map(|oid| self.inflate_oid_to_tree_entries(oid.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let names = entry_maps
            .iter()
            .flat_map(|entries| entries.keys())
            .filter(|name| scope.includes(name))
            .collect::<BTreeSet<_>>();

        for name in names {
            let entries = entry_maps
                .iter()
                .map(|map| map.get(name).copied())
                .collect::<Vec<_>>();

            if trees.len() > 1 && entries.iter().all(|entry| *entry == entries[0]) {
                continue;
            }

            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            let child_scope = scope.descend(name);

            let has_tree = entries.iter().flatten().any(DatabaseEntry::is_tree);
            let expand = has_tree && (self.recursive || !child_scope.is_matched());
            if !expand {
                let change = PathChange { path, entries };
                if visitor(&change).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
                continue;
            }

            let subtrees = entries
                .iter()
                .map(|entry| entry.filter(DatabaseEntry::is_tree).map(|entry| entry.oid))
                .collect::<Vec<_>>();
            if self
                .compare_oids(&subtrees, child_scope, &path, depth + 1, visitor)?
                .is_break()
            {
                return Ok(ControlFlow::Break(()));
            }

            // entries that stopped or started being directories still count
            if entries.iter().flatten().any(|entry| !entry.is_tree()) {
                let leaves = entries
                    .iter()
                    .map(|entry| entry.filter(|entry| !entry.is_tree()))
                    .collect::<Vec<_>>();
                let change = PathChange {
                    path,
                    entries: leaves,
                };
                if visitor(&change).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    fn inflate_oid_to_tree_entries(&self, oid: Option<&ObjectId>) -> Result<TreeEntryMap, WalkError> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(load_tree(self.store, oid)?.into_entries().collect()),
        }
    }
}
