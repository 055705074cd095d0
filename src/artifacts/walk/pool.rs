//! Walk-scoped object pool
//!
//! Every id looked up during a walk maps to exactly one slot in the pool. The
//! slot owns the node's flag word and, once parsed, its graph edges. Stages
//! and callers refer to nodes by slot; public handles pair the slot with the
//! pool's id so that handles of two walks never compare equal.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::objects::commit::CommitHeader;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::TagHeader;
use crate::artifacts::walk::error::{load_expected, WalkError};
use crate::artifacts::walk::flags::{FlagAllocator, PARSED};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to any node of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevObject {
    pool: PoolId,
    slot: u32,
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(RevObject);

        impl $name {
            pub fn as_object(&self) -> RevObject {
                self.0
            }
        }

        impl From<$name> for RevObject {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

typed_handle!(
    /// Handle to a commit of a walk
    RevCommit
);
typed_handle!(
    /// Handle to a tree of a walk
    RevTree
);
typed_handle!(
    /// Handle to a blob of a walk
    RevBlob
);
typed_handle!(
    /// Handle to an annotated tag of a walk
    RevTag
);

#[derive(Debug, Default)]
pub(crate) struct CommitNode {
    pub(crate) tree: Option<u32>,
    pub(crate) parents: Vec<u32>,
    /// Parents as read from the store, kept once path simplification edits
    /// `parents`
    pub(crate) original_parents: Option<Vec<u32>>,
    pub(crate) commit_time: i64,
    pub(crate) buffer: Option<Bytes>,
    pub(crate) in_degree: u32,
}

#[derive(Debug, Default)]
pub(crate) struct TagNode {
    pub(crate) target: Option<u32>,
    pub(crate) name: String,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Commit(CommitNode),
    Tree,
    Blob,
    Tag(TagNode),
}

impl NodeKind {
    fn empty(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Commit => NodeKind::Commit(CommitNode::default()),
            ObjectType::Tree => NodeKind::Tree,
            ObjectType::Blob => NodeKind::Blob,
            ObjectType::Tag => NodeKind::Tag(TagNode::default()),
        }
    }

    fn object_type(&self) -> ObjectType {
        match self {
            NodeKind::Commit(_) => ObjectType::Commit,
            NodeKind::Tree => ObjectType::Tree,
            NodeKind::Blob => ObjectType::Blob,
            NodeKind::Tag(_) => ObjectType::Tag,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) oid: ObjectId,
    pub(crate) flags: u32,
    pub(crate) kind: NodeKind,
}

pub(crate) struct ObjectPool<'r> {
    store: &'r dyn ObjectStore,
    id: PoolId,
    slots: Vec<Node>,
    index: HashMap<ObjectId, u32>,
    retain_body: bool,
    pub(crate) allocator: FlagAllocator,
}

impl<'r> ObjectPool<'r> {
    pub(crate) fn new(store: &'r dyn ObjectStore, retain_body: bool) -> Self {
        ObjectPool {
            store,
            id: PoolId::next(),
            slots: Vec::new(),
            index: HashMap::new(),
            retain_body,
            allocator: FlagAllocator::default(),
        }
    }

    pub(crate) fn id(&self) -> PoolId {
        self.id
    }

    pub(crate) fn store(&self) -> &'r dyn ObjectStore {
        self.store
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn set_retain_body(&mut self, retain_body: bool) {
        self.retain_body = retain_body;
    }

    pub(crate) fn handle(&self, slot: u32) -> RevObject {
        RevObject {
            pool: self.id,
            slot,
        }
    }

    pub(crate) fn commit_handle(&self, slot: u32) -> RevCommit {
        RevCommit(self.handle(slot))
    }

    pub(crate) fn tree_handle(&self, slot: u32) -> RevTree {
        RevTree(self.handle(slot))
    }

    pub(crate) fn blob_handle(&self, slot: u32) -> RevBlob {
        RevBlob(self.handle(slot))
    }

    pub(crate) fn tag_handle(&self, slot: u32) -> RevTag {
        RevTag(self.handle(slot))
    }

    /// Slot of a handle created by this pool
    ///
    /// # Panics
    ///
    /// When the handle comes from another walk, or from this walk before it
    /// was disposed.
    pub(crate) fn slot(&self, object: impl Into<RevObject>) -> u32 {
        let object = object.into();
        assert!(
            object.pool == self.id,
            "object handle used with a walk that did not create it"
        );
        object.slot
    }

    /// Slot for `oid`, created unparsed on first sight
    pub(crate) fn lookup(&mut self, oid: ObjectId, object_type: ObjectType) -> Result<u32, WalkError> {
        if let Some(&slot) = self.index.get(&oid) {
            let actual = self.object_type(slot);
            if actual != object_type {
                return Err(WalkError::IncorrectType {
                    oid,
                    expected: object_type,
                    actual,
                });
            }
            return Ok(slot);
        }

        Ok(self.insert(oid, object_type))
    }

    pub(crate) fn find(&self, oid: &ObjectId) -> Option<u32> {
        self.index.get(oid).copied()
    }

    fn insert(&mut self, oid: ObjectId, object_type: ObjectType) -> u32 {
        let slot = self.slots.len() as u32;
        self.slots.push(Node {
            oid,
            flags: 0,
            kind: NodeKind::empty(object_type),
        });
        self.index.insert(oid, slot);
        slot
    }

    /// Load `oid` without knowing its type up front and parse its header
    pub(crate) fn parse_any(&mut self, oid: ObjectId) -> Result<u32, WalkError> {
        if let Some(slot) = self.find(&oid) {
            self.parse_headers(slot)?;
            return Ok(slot);
        }

        let raw = self.store.load(&oid)?.ok_or(WalkError::MissingObject {
            oid,
            expected: None,
        })?;
        let slot = self.insert(oid, raw.object_type);
        self.parse_data(slot, raw.data)?;
        Ok(slot)
    }

    pub(crate) fn parse_headers(&mut self, slot: u32) -> Result<(), WalkError> {
        if self.is_parsed(slot) {
            return Ok(());
        }

        let node = &self.slots[slot as usize];
        let (oid, object_type) = (node.oid, node.kind.object_type());
        let data = load_expected(self.store, &oid, object_type)?;
        self.parse_data(slot, data)
    }

    fn parse_data(&mut self, slot: u32, data: Bytes) -> Result<(), WalkError> {
        let oid = self.oid(slot);

        match self.object_type(slot) {
            ObjectType::Commit => {
                let header = CommitHeader::parse(&data)
                    .map_err(|err| WalkError::corrupt(oid, ObjectType::Commit, format!("{err:#}")))?;
                let tree = self.lookup(header.tree, ObjectType::Tree)?;
                let parents = header
                    .parents
                    .iter()
                    .map(|parent| self.lookup(*parent, ObjectType::Commit))
                    .collect::<Result<Vec<_>, _>>()?;

                let retain_body = self.retain_body;
                if let NodeKind::Commit(commit) = &mut self.slots[slot as usize].kind {
                    commit.tree = Some(tree);
                    commit.parents = parents;
                    commit.original_parents = None;
                    commit.commit_time = header.commit_time;
                    commit.buffer = retain_body.then_some(data);
                }
            }
            ObjectType::Tag => {
                let header = TagHeader::parse(&data)
                    .map_err(|err| WalkError::corrupt(oid, ObjectType::Tag, format!("{err:#}")))?;
                let target = self.lookup(header.target, header.target_type)?;

                if let NodeKind::Tag(tag) = &mut self.slots[slot as usize].kind {
                    tag.target = Some(target);
                    tag.name = header.name;
                }
            }
            ObjectType::Tree | ObjectType::Blob => {}
        }

        self.slots[slot as usize].flags |= PARSED;
        Ok(())
    }

    pub(crate) fn oid(&self, slot: u32) -> ObjectId {
        self.slots[slot as usize].oid
    }

    pub(crate) fn object_type(&self, slot: u32) -> ObjectType {
        self.slots[slot as usize].kind.object_type()
    }

    pub(crate) fn is_parsed(&self, slot: u32) -> bool {
        self.flags(slot) & PARSED != 0
    }

    pub(crate) fn flags(&self, slot: u32) -> u32 {
        self.slots[slot as usize].flags
    }

    pub(crate) fn has_any(&self, slot: u32, mask: u32) -> bool {
        self.flags(slot) & mask != 0
    }

    pub(crate) fn has_all(&self, slot: u32, mask: u32) -> bool {
        self.flags(slot) & mask == mask
    }

    pub(crate) fn add_flags(&mut self, slot: u32, mask: u32) {
        self.slots[slot as usize].flags |= mask;
    }

    pub(crate) fn remove_flags(&mut self, slot: u32, mask: u32) {
        self.slots[slot as usize].flags &= !mask;
    }

    pub(crate) fn commit(&self, slot: u32) -> Option<&CommitNode> {
        match &self.slots[slot as usize].kind {
            NodeKind::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub(crate) fn commit_mut(&mut self, slot: u32) -> Option<&mut CommitNode> {
        match &mut self.slots[slot as usize].kind {
            NodeKind::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub(crate) fn tag(&self, slot: u32) -> Option<&TagNode> {
        match &self.slots[slot as usize].kind {
            NodeKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Parents of a parsed commit; empty for anything else
    pub(crate) fn parents(&self, slot: u32) -> &[u32] {
        self.commit(slot).map_or(&[], |commit| &commit.parents)
    }

    pub(crate) fn commit_time(&self, slot: u32) -> i64 {
        self.commit(slot).map_or(0, |commit| commit.commit_time)
    }

    pub(crate) fn tree(&self, slot: u32) -> Option<u32> {
        self.commit(slot).and_then(|commit| commit.tree)
    }

    /// Replace a commit's parent list, remembering the stored one
    pub(crate) fn set_parents(&mut self, slot: u32, parents: Vec<u32>) {
        if let Some(commit) = self.commit_mut(slot) {
            let previous = std::mem::replace(&mut commit.parents, parents);
            commit.original_parents.get_or_insert(previous);
        }
    }

    /// Raw commit body, reloaded from the store when it was released
    pub(crate) fn load_body(&mut self, slot: u32) -> Result<Bytes, WalkError> {
        if let Some(buffer) = self.commit(slot).and_then(|commit| commit.buffer.clone()) {
            return Ok(buffer);
        }

        let oid = self.oid(slot);
        let data = load_expected(self.store, &oid, ObjectType::Commit)?;
        let retain_body = self.retain_body;
        if let Some(commit) = self.commit_mut(slot) {
            if retain_body {
                commit.buffer = Some(data.clone());
            }
        }
        Ok(data)
    }

    pub(crate) fn dispose_body(&mut self, slot: u32) {
        if let Some(commit) = self.commit_mut(slot) {
            commit.buffer = None;
        }
    }

    /// Add `carry` to every parsed ancestor of `slot`
    ///
    /// A commit that already has every carried bit is not descended into,
    /// so each ancestor is visited at most once.
    pub(crate) fn carry_flags(&mut self, slot: u32, carry: u32) {
        let mut stack = vec![slot];
        while let Some(commit) = stack.pop() {
            for index in 0..self.parents(commit).len() {
                let parent = self.parents(commit)[index];
                if self.has_all(parent, carry) {
                    continue;
                }
                self.add_flags(parent, carry);
                stack.push(parent);
            }
        }
    }

    /// Clear every flag outside `retain | PARSED` and undo edge rewrites
    pub(crate) fn reset(&mut self, retain: u32) {
        let retain = retain | PARSED;
        for node in &mut self.slots {
            node.flags &= retain;
            if let NodeKind::Commit(commit) = &mut node.kind {
                commit.in_degree = 0;
                if let Some(parents) = commit.original_parents.take() {
                    commit.parents = parents;
                }
            }
        }
    }

    /// Drop every node; handles issued so far become invalid
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.id = PoolId::next();
        self.allocator = FlagAllocator::default();
    }
}
