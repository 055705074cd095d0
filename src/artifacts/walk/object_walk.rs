//! Commit traversal followed by the trees and blobs the commits reach
//!
//! [`ObjectWalk::next`] yields commits exactly like [`RevWalk::next`] while
//! queueing the root tree of every produced commit. Once the commits are
//! exhausted, [`ObjectWalk::next_object`] streams every tree and blob
//! reachable from those roots that is not reachable from an uninteresting
//! start, each once.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::{load_tree, MAX_TREE_DEPTH};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::walk::config::WalkConfig;
use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::flags::{SEEN, UNINTERESTING};
use crate::artifacts::walk::pool::{RevCommit, RevObject, RevTree};
use crate::artifacts::walk::queue::block::shared_arena;
use crate::artifacts::walk::queue::fifo::FifoQueue;
use crate::artifacts::walk::rev_walk::{RevSort, RevWalk};
use std::collections::HashSet;

#[derive(Debug)]
struct TreeFrame {
    entries: Vec<(String, DatabaseEntry)>,
    position: usize,
    path: String,
}

#[derive(Debug)]
pub struct ObjectWalk<'r> {
    walk: RevWalk<'r>,
    pending_objects: FifoQueue,
    in_pending: HashSet<u32>,
    frames: Vec<TreeFrame>,
    /// Tree returned last; its entries are streamed on the next call
    enter: Option<(u32, String)>,
    current_path: Option<String>,
}

impl<'r> ObjectWalk<'r> {
    pub fn new(store: &'r dyn ObjectStore) -> Self {
        Self::with_config(store, WalkConfig::default())
    }

    pub fn with_config(store: &'r dyn ObjectStore, config: WalkConfig) -> Self {
        let mut walk = RevWalk::with_config(store, config);
        walk.set_object_mode();
        ObjectWalk {
            walk,
            pending_objects: FifoQueue::new(shared_arena()),
            in_pending: HashSet::new(),
            frames: Vec::new(),
            enter: None,
            current_path: None,
        }
    }

    /// The underlying commit walk, for lookups, flags and configuration
    pub fn walk(&self) -> &RevWalk<'r> {
        &self.walk
    }

    /// Mutable access to the commit walk
    ///
    /// Commits pulled through it directly do not queue their trees.
    pub fn walk_mut(&mut self) -> &mut RevWalk<'r> {
        &mut self.walk
    }

    /// Start from any object; tags are queued and followed to their target
    pub fn mark_start(&mut self, object: impl Into<RevObject>) -> Result<(), WalkError> {
        self.walk.ensure_idle()?;
        let mut slot = self.walk.pool().slot(object);
        self.walk.pool_mut().parse_headers(slot)?;

        let mut hops = 0;
        while self.walk.pool().object_type(slot) == ObjectType::Tag {
            self.add_object(slot);
            slot = self.tag_target(slot, &mut hops)?;
        }

        match self.walk.pool().object_type(slot) {
            ObjectType::Commit => {
                let commit = self.walk.pool().commit_handle(slot);
                self.walk.mark_start(commit)
            }
            _ => {
                self.add_object(slot);
                Ok(())
            }
        }
    }

    /// Exclude any object and everything it reaches
    pub fn mark_uninteresting(&mut self, object: impl Into<RevObject>) -> Result<(), WalkError> {
        self.walk.ensure_idle()?;
        let mut slot = self.walk.pool().slot(object);
        self.walk.pool_mut().parse_headers(slot)?;

        let mut hops = 0;
        while self.walk.pool().object_type(slot) == ObjectType::Tag {
            self.walk.pool_mut().add_flags(slot, UNINTERESTING);
            slot = self.tag_target(slot, &mut hops)?;
        }

        match self.walk.pool().object_type(slot) {
            ObjectType::Commit => {
                let commit = self.walk.pool().commit_handle(slot);
                self.walk.mark_uninteresting(commit)?;
                match self.walk.pool().tree(slot) {
                    Some(tree) => self.mark_tree_slot_uninteresting(tree),
                    None => Ok(()),
                }
            }
            ObjectType::Tree => self.mark_tree_slot_uninteresting(slot),
            _ => {
                self.walk.pool_mut().add_flags(slot, UNINTERESTING);
                Ok(())
            }
        }
    }

    /// Parsed target of a parsed tag
    fn tag_target(&mut self, tag: u32, hops: &mut usize) -> Result<u32, WalkError> {
        let pool = self.walk.pool_mut();
        *hops += 1;
        if *hops > pool.len() {
            tracing::warn!(oid = %pool.oid(tag), "tag chain loops");
            return Err(WalkError::corrupt(pool.oid(tag), ObjectType::Tag, "tag chain loops"));
        }
        let Some(target) = pool.tag(tag).and_then(|tag| tag.target) else {
            return Err(WalkError::corrupt(pool.oid(tag), ObjectType::Tag, "tag has no target"));
        };
        pool.parse_headers(target)?;
        Ok(target)
    }

    /// Flag a tree and everything below it uninteresting
    pub fn mark_tree_uninteresting(&mut self, tree: RevTree) -> Result<(), WalkError> {
        let slot = self.walk.pool().slot(tree);
        self.mark_tree_slot_uninteresting(slot)
    }

    fn mark_tree_slot_uninteresting(&mut self, tree: u32) -> Result<(), WalkError> {
        let pool = self.walk.pool_mut();
        if pool.has_any(tree, UNINTERESTING) {
            return Ok(());
        }
        pool.add_flags(tree, UNINTERESTING);

        let mut stack = vec![tree];
        while let Some(tree) = stack.pop() {
            let entries = load_tree(pool.store(), &pool.oid(tree))?;
            for (_, entry) in entries.into_entries() {
                if entry.is_gitlink() {
                    continue;
                }
                if !entry.is_tree() {
                    let blob = pool.lookup(entry.oid, ObjectType::Blob)?;
                    pool.add_flags(blob, UNINTERESTING);
                    continue;
                }
                let subtree = pool.lookup(entry.oid, ObjectType::Tree)?;
                if !pool.has_any(subtree, UNINTERESTING) {
                    pool.add_flags(subtree, UNINTERESTING);
                    stack.push(subtree);
                }
            }
        }

        Ok(())
    }

    fn add_object(&mut self, slot: u32) {
        if self.in_pending.insert(slot) {
            self.pending_objects.add(slot);
        }
    }

    /// Next commit; the root tree of every interesting commit is queued
    pub fn next(&mut self) -> Result<Option<RevCommit>, WalkError> {
        loop {
            let Some(commit) = self.walk.next()? else {
                return Ok(None);
            };
            let pool = self.walk.pool();
            let slot = pool.slot(commit);
            let tree = pool.tree(slot);

            if pool.has_any(slot, UNINTERESTING) {
                if let Some(tree) = tree {
                    self.mark_tree_slot_uninteresting(tree)?;
                }
                if self.walk.sort_options().contains(RevSort::BOUNDARY) {
                    return Ok(Some(commit));
                }
                continue;
            }

            if let Some(tree) = tree {
                self.add_object(tree);
            }
            return Ok(Some(commit));
        }
    }

    /// Next tree or blob; call once [`ObjectWalk::next`] is exhausted
    pub fn next_object(&mut self) -> Result<Option<RevObject>, WalkError> {
        if let Some((tree, path)) = self.enter.take() {
            self.enter_tree(tree, path)?;
        }

        while let Some(frame) = self.frames.last_mut() {
            let Some((name, entry)) = frame.entries.get(frame.position).cloned() else {
                self.frames.pop();
                continue;
            };
            frame.position += 1;
            if entry.is_gitlink() {
                continue;
            }
            let path = if frame.path.is_empty() {
                name
            } else {
                format!("{}/{name}", frame.path)
            };

            let pool = self.walk.pool_mut();
            let object_type = if entry.is_tree() {
                ObjectType::Tree
            } else {
                ObjectType::Blob
            };
            let slot = pool.lookup(entry.oid, object_type)?;
            if pool.has_any(slot, SEEN) {
                continue;
            }
            pool.add_flags(slot, SEEN);
            if pool.has_any(slot, UNINTERESTING) {
                continue;
            }

            let handle = pool.handle(slot);
            if object_type == ObjectType::Tree {
                self.enter = Some((slot, path.clone()));
            }
            self.current_path = Some(path);
            return Ok(Some(handle));
        }

        while let Some(slot) = self.pending_objects.next() {
            let pool = self.walk.pool_mut();
            if pool.has_any(slot, SEEN) {
                continue;
            }
            pool.add_flags(slot, SEEN);
            if pool.has_any(slot, UNINTERESTING) {
                continue;
            }

            let handle = pool.handle(slot);
            if pool.object_type(slot) == ObjectType::Tree {
                self.enter = Some((slot, String::new()));
            }
            self.current_path = None;
            return Ok(Some(handle));
        }

        self.current_path = None;
        Ok(None)
    }

    fn enter_tree(&mut self, tree: u32, path: String) -> Result<(), WalkError> {
        let pool = self.walk.pool();
        let oid = pool.oid(tree);
        if self.frames.len() >= MAX_TREE_DEPTH {
            tracing::warn!(%oid, path = %path, "tree nesting exceeds {MAX_TREE_DEPTH} levels");
            return Err(WalkError::corrupt(
                oid,
                ObjectType::Tree,
                format!("tree nesting exceeds {MAX_TREE_DEPTH} levels at {path:?}"),
            ));
        }

        let entries = load_tree(pool.store(), &oid)?.into_entries().collect();
        self.frames.push(TreeFrame {
            entries,
            position: 0,
            path,
        });
        Ok(())
    }

    /// Path of the last object returned by [`ObjectWalk::next_object`],
    /// `None` for root trees and objects started from directly
    pub fn path_of_current(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    /// Walk everything and fail on the first object the store lacks
    pub fn check_connectivity(&mut self) -> Result<(), WalkError> {
        while self.next()?.is_some() {}

        while let Some(object) = self.next_object()? {
            let pool = self.walk.pool();
            let slot = pool.slot(object);
            if pool.object_type(slot) != ObjectType::Blob {
                continue;
            }
            let oid = pool.oid(slot);
            if !pool.store().contains(&oid)? {
                return Err(WalkError::MissingObject {
                    oid,
                    expected: Some(ObjectType::Blob),
                });
            }
        }

        Ok(())
    }

    pub fn reset(&mut self) {
        self.clear_objects();
        self.walk.reset();
    }

    pub fn dispose(&mut self) {
        self.clear_objects();
        self.walk.dispose();
    }

    fn clear_objects(&mut self) {
        self.pending_objects.clear();
        self.in_pending.clear();
        self.frames.clear();
        self.enter = None;
        self.current_path = None;
    }
}
