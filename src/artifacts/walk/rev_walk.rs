//! Commit traversal entry point
//!
//! A [`RevWalk`] owns the object pool of one traversal. Start commits are
//! registered with [`RevWalk::mark_start`] and [`RevWalk::mark_uninteresting`];
//! the first call to [`RevWalk::next`] freezes the configuration and builds
//! the stage pipeline. [`RevWalk::reset`] returns the walk to the
//! configurable state while keeping every parsed commit.

use crate::areas::object_store::ObjectStore;
use crate::artifacts::diff::path_filter::TreeFilter;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::walk::config::WalkConfig;
use crate::artifacts::walk::error::{Interrupt, WalkError};
use crate::artifacts::walk::filter::{CommitInfo, RevFilter};
use crate::artifacts::walk::flags::{RevFlag, RevFlagSet, SEEN, UNINTERESTING};
use crate::artifacts::walk::generator::start::{compose, Pipeline};
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::{ObjectPool, RevBlob, RevCommit, RevObject, RevTag, RevTree};
use crate::artifacts::walk::queue::block::{shared_arena, SharedArena};
use crate::artifacts::walk::queue::date::DateQueue;
use bitflags::bitflags;
use bytes::Bytes;
use std::fmt;

bitflags! {
    /// Output ordering options; any combination is allowed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RevSort: u8 {
        /// Whatever order the commits are found in
        const NONE = 0;
        const COMMIT_TIME_DESC = 1 << 0;
        /// No commit before any of its children
        const TOPO = 1 << 1;
        /// Reverse of the order selected by the other options
        const REVERSE = 1 << 2;
        /// Append the uninteresting parents of produced commits; ignored
        /// when no start commit is uninteresting
        const BOUNDARY = 1 << 3;
    }
}

enum WalkState {
    Idle,
    Running(Generator),
}

pub struct RevWalk<'r> {
    pool: ObjectPool<'r>,
    config: WalkConfig,
    sort: RevSort,
    rev_filter: RevFilter,
    tree_filter: TreeFilter,
    roots: Vec<u32>,
    queue: DateQueue,
    state: WalkState,
    arena: SharedArena,
    objects: bool,
}

impl fmt::Debug for RevWalk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevWalk")
            .field("config", &self.config)
            .field("sort", &self.sort)
            .field("rev_filter", &self.rev_filter)
            .field("tree_filter", &self.tree_filter)
            .field("roots", &self.roots.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl<'r> RevWalk<'r> {
    pub fn new(store: &'r dyn ObjectStore) -> Self {
        Self::with_config(store, WalkConfig::default())
    }

    pub fn with_config(store: &'r dyn ObjectStore, config: WalkConfig) -> Self {
        RevWalk {
            pool: ObjectPool::new(store, config.retain_body),
            config,
            sort: RevSort::NONE,
            rev_filter: RevFilter::All,
            tree_filter: TreeFilter::All,
            roots: Vec::new(),
            queue: DateQueue::new(),
            state: WalkState::Idle,
            arena: shared_arena(),
            objects: false,
        }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn set_retain_body(&mut self, retain_body: bool) {
        self.config.retain_body = retain_body;
        self.pool.set_retain_body(retain_body);
    }

    pub(crate) fn pool(&self) -> &ObjectPool<'r> {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut ObjectPool<'r> {
        &mut self.pool
    }

    pub(crate) fn set_object_mode(&mut self) {
        self.objects = true;
    }

    pub(crate) fn is_running(&self) -> bool {
        matches!(self.state, WalkState::Running(_))
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), WalkError> {
        if self.is_running() {
            return Err(WalkError::WalkStarted);
        }
        Ok(())
    }

    // ---- configuration ----

    pub fn sort_options(&self) -> RevSort {
        self.sort
    }

    /// Replace every sort option at once
    pub fn set_sort(&mut self, sort: RevSort) -> Result<(), WalkError> {
        self.ensure_idle()?;
        self.sort = sort;
        Ok(())
    }

    /// Toggle one sort option
    pub fn sort(&mut self, option: RevSort, enabled: bool) -> Result<(), WalkError> {
        self.ensure_idle()?;
        self.sort.set(option, enabled);
        Ok(())
    }

    pub fn rev_filter(&self) -> &RevFilter {
        &self.rev_filter
    }

    pub fn set_rev_filter(&mut self, filter: RevFilter) -> Result<(), WalkError> {
        self.ensure_idle()?;
        self.rev_filter = filter;
        Ok(())
    }

    pub fn tree_filter(&self) -> &TreeFilter {
        &self.tree_filter
    }

    pub fn set_tree_filter(&mut self, filter: TreeFilter) -> Result<(), WalkError> {
        self.ensure_idle()?;
        self.tree_filter = filter;
        Ok(())
    }

    // ---- objects ----

    pub fn lookup_commit(&mut self, oid: ObjectId) -> Result<RevCommit, WalkError> {
        let slot = self.pool.lookup(oid, ObjectType::Commit)?;
        Ok(self.pool.commit_handle(slot))
    }

    pub fn lookup_tree(&mut self, oid: ObjectId) -> Result<RevTree, WalkError> {
        let slot = self.pool.lookup(oid, ObjectType::Tree)?;
        Ok(self.pool.tree_handle(slot))
    }

    pub fn lookup_blob(&mut self, oid: ObjectId) -> Result<RevBlob, WalkError> {
        let slot = self.pool.lookup(oid, ObjectType::Blob)?;
        Ok(self.pool.blob_handle(slot))
    }

    pub fn lookup_tag(&mut self, oid: ObjectId) -> Result<RevTag, WalkError> {
        let slot = self.pool.lookup(oid, ObjectType::Tag)?;
        Ok(self.pool.tag_handle(slot))
    }

    pub fn lookup_any(&mut self, oid: ObjectId, object_type: ObjectType) -> Result<RevObject, WalkError> {
        let slot = self.pool.lookup(oid, object_type)?;
        Ok(self.pool.handle(slot))
    }

    /// Load an object of unknown type and parse its header
    pub fn parse_any(&mut self, oid: ObjectId) -> Result<RevObject, WalkError> {
        let slot = self.pool.parse_any(oid)?;
        Ok(self.pool.handle(slot))
    }

    /// Parse `oid` as a commit, looking through annotated tags
    pub fn parse_commit(&mut self, oid: ObjectId) -> Result<RevCommit, WalkError> {
        let slot = self.pool.parse_any(oid)?;
        let slot = self.peel_tags(slot)?;
        self.expect_type(slot, ObjectType::Commit)?;
        Ok(self.pool.commit_handle(slot))
    }

    /// Parse `oid` as a tree, looking through tags and commits
    pub fn parse_tree(&mut self, oid: ObjectId) -> Result<RevTree, WalkError> {
        let slot = self.pool.parse_any(oid)?;
        let mut slot = self.peel_tags(slot)?;
        if let Some(tree) = self.pool.tree(slot) {
            self.pool.parse_headers(tree)?;
            slot = tree;
        }
        self.expect_type(slot, ObjectType::Tree)?;
        Ok(self.pool.tree_handle(slot))
    }

    pub fn parse_tag(&mut self, oid: ObjectId) -> Result<RevTag, WalkError> {
        let slot = self.pool.parse_any(oid)?;
        self.expect_type(slot, ObjectType::Tag)?;
        Ok(self.pool.tag_handle(slot))
    }

    pub fn parse_headers(&mut self, object: impl Into<RevObject>) -> Result<(), WalkError> {
        let slot = self.pool.slot(object);
        self.pool.parse_headers(slot)
    }

    fn peel_tags(&mut self, mut slot: u32) -> Result<u32, WalkError> {
        for _ in 0..=self.pool.len() {
            if self.pool.object_type(slot) != ObjectType::Tag {
                return Ok(slot);
            }
            let Some(target) = self.pool.tag(slot).and_then(|tag| tag.target) else {
                return Err(WalkError::corrupt(self.pool.oid(slot), ObjectType::Tag, "tag has no target"));
            };
            self.pool.parse_headers(target)?;
            slot = target;
        }

        tracing::warn!(oid = %self.pool.oid(slot), "tag chain loops");
        Err(WalkError::corrupt(self.pool.oid(slot), ObjectType::Tag, "tag chain loops"))
    }

    fn expect_type(&self, slot: u32, expected: ObjectType) -> Result<(), WalkError> {
        let actual = self.pool.object_type(slot);
        if actual != expected {
            return Err(WalkError::IncorrectType {
                oid: self.pool.oid(slot),
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn id(&self, object: impl Into<RevObject>) -> ObjectId {
        self.pool.oid(self.pool.slot(object))
    }

    pub fn object_type(&self, object: impl Into<RevObject>) -> ObjectType {
        self.pool.object_type(self.pool.slot(object))
    }

    pub fn is_parsed(&self, object: impl Into<RevObject>) -> bool {
        self.pool.is_parsed(self.pool.slot(object))
    }

    pub fn is_uninteresting(&self, object: impl Into<RevObject>) -> bool {
        self.pool.has_any(self.pool.slot(object), UNINTERESTING)
    }

    /// Current parents; path simplification may have rewritten them
    pub fn parents(&self, commit: RevCommit) -> Vec<RevCommit> {
        self.pool
            .parents(self.pool.slot(commit))
            .iter()
            .map(|&parent| self.pool.commit_handle(parent))
            .collect()
    }

    pub fn parent_count(&self, commit: RevCommit) -> usize {
        self.pool.parents(self.pool.slot(commit)).len()
    }

    pub fn tree(&self, commit: RevCommit) -> Option<RevTree> {
        self.pool
            .tree(self.pool.slot(commit))
            .map(|tree| self.pool.tree_handle(tree))
    }

    pub fn commit_time(&self, commit: RevCommit) -> i64 {
        self.pool.commit_time(self.pool.slot(commit))
    }

    /// Raw commit body, read again from the store if it was not retained
    pub fn raw_body(&mut self, commit: RevCommit) -> Result<Bytes, WalkError> {
        let slot = self.pool.slot(commit);
        self.pool.parse_headers(slot)?;
        self.pool.load_body(slot)
    }

    pub fn tag_target(&self, tag: RevTag) -> Option<RevObject> {
        self.pool
            .tag(self.pool.slot(tag))
            .and_then(|tag| tag.target)
            .map(|target| self.pool.handle(target))
    }

    /// Name of a parsed tag
    pub fn tag_name(&self, tag: RevTag) -> Option<&str> {
        let slot = self.pool.slot(tag);
        if !self.pool.is_parsed(slot) {
            return None;
        }
        self.pool.tag(slot).map(|tag| tag.name.as_str())
    }

    // ---- starting points ----

    /// Register a commit the walk produces along with its history
    pub fn mark_start(&mut self, commit: RevCommit) -> Result<(), WalkError> {
        self.ensure_idle()?;
        let slot = self.pool.slot(commit);
        if self.pool.has_any(slot, SEEN) {
            return Ok(());
        }
        self.pool.parse_headers(slot)?;
        self.pool.add_flags(slot, SEEN);
        self.roots.push(slot);
        self.queue.add(&self.pool, slot);
        Ok(())
    }

    pub fn mark_start_all(&mut self, commits: impl IntoIterator<Item = RevCommit>) -> Result<(), WalkError> {
        commits.into_iter().try_for_each(|commit| self.mark_start(commit))
    }

    /// Exclude a commit and its whole history from the output
    pub fn mark_uninteresting(&mut self, commit: RevCommit) -> Result<(), WalkError> {
        self.ensure_idle()?;
        let slot = self.pool.slot(commit);
        self.pool.parse_headers(slot)?;
        self.pool.add_flags(slot, UNINTERESTING);
        let carry = self.pool.flags(slot) & self.pool.allocator.carry();
        self.pool.carry_flags(slot, carry);
        self.mark_start(commit)
    }

    // ---- traversal ----

    /// Next commit of the walk, `None` once the walk is exhausted
    pub fn next(&mut self) -> Result<Option<RevCommit>, WalkError> {
        if !self.is_running() {
            let generator = compose(
                &mut self.pool,
                &mut self.queue,
                &self.arena,
                Pipeline {
                    sort: self.sort,
                    rev_filter: &self.rev_filter,
                    tree_filter: &self.tree_filter,
                    config: self.config,
                    objects: self.objects,
                },
            )?;
            self.state = WalkState::Running(generator);
        }

        let WalkState::Running(generator) = &mut self.state else {
            return Ok(None);
        };
        let commit = generator.next(&mut self.pool)?;
        Ok(commit.map(|slot| self.pool.commit_handle(slot)))
    }

    /// Iterator view of [`RevWalk::next`]; it ends after the first error
    pub fn iter(&mut self) -> RevWalkIter<'_, 'r> {
        RevWalkIter {
            walk: self,
            failed: false,
        }
    }

    /// Clear every flag except the retained ones and forget the starts
    pub fn reset(&mut self) {
        self.reset_with(0);
    }

    /// Like [`RevWalk::reset`], also keeping the flags of `retain`
    pub fn reset_retain(&mut self, retain: &RevFlagSet) {
        for flag in retain {
            self.check_flag(flag);
        }
        self.reset_with(retain.mask());
    }

    fn reset_with(&mut self, retain: u32) {
        self.state = WalkState::Idle;
        self.pool.allocator.finish_delayed_frees();
        let retain = (retain | self.pool.allocator.retain_on_reset()) & self.pool.allocator.allocated();
        self.pool.reset(retain);
        self.roots.clear();
        self.queue.clear();
        tracing::debug!(objects = self.pool.len(), "walk reset");
    }

    /// Drop every parsed object; earlier handles and flags become invalid
    pub fn dispose(&mut self) {
        self.state = WalkState::Idle;
        self.pool.clear();
        self.roots.clear();
        self.queue = DateQueue::new();
        tracing::debug!("walk disposed");
    }

    // ---- flags ----

    pub fn allocate_flag(&mut self, name: impl Into<String>) -> Result<RevFlag, WalkError> {
        let name = name.into();
        let mask = self.pool.allocator.allocate(&name)?;
        Ok(RevFlag::new(name, mask, self.pool.id()))
    }

    /// Return a flag's bit; while a walk is running the bit stays taken
    /// until the next reset
    pub fn free_flag(&mut self, flag: RevFlag) {
        self.check_flag(&flag);
        if !self.pool.allocator.is_allocated(flag.mask()) {
            tracing::warn!(%flag, "flag freed twice");
            return;
        }
        if self.is_running() {
            self.pool.allocator.free_on_reset(flag.mask());
        } else {
            self.pool.allocator.free(flag.mask());
        }
    }

    /// Propagate `flag` from a popped commit onto its ancestry
    pub fn carry(&mut self, flag: &RevFlag) {
        self.check_flag(flag);
        self.pool.allocator.add_carry(flag.mask());
    }

    pub fn carry_set(&mut self, flags: &RevFlagSet) {
        for flag in flags {
            self.carry(flag);
        }
    }

    /// Keep `flag` set on objects across resets
    pub fn retain_on_reset(&mut self, flag: &RevFlag) {
        self.check_flag(flag);
        self.pool.allocator.add_retain_on_reset(flag.mask());
    }

    pub fn add_flag(&mut self, object: impl Into<RevObject>, flag: &RevFlag) {
        self.check_flag(flag);
        let slot = self.pool.slot(object);
        self.pool.add_flags(slot, flag.mask());
    }

    pub fn remove_flag(&mut self, object: impl Into<RevObject>, flag: &RevFlag) {
        self.check_flag(flag);
        let slot = self.pool.slot(object);
        self.pool.remove_flags(slot, flag.mask());
    }

    pub fn has_flag(&self, object: impl Into<RevObject>, flag: &RevFlag) -> bool {
        self.check_flag(flag);
        self.pool.has_any(self.pool.slot(object), flag.mask())
    }

    pub fn has_any(&self, object: impl Into<RevObject>, flags: &RevFlagSet) -> bool {
        self.pool.has_any(self.pool.slot(object), flags.mask())
    }

    pub fn has_all(&self, object: impl Into<RevObject>, flags: &RevFlagSet) -> bool {
        self.pool.has_all(self.pool.slot(object), flags.mask())
    }

    /// Add `flag` to every remaining commit of the walk that `matching`
    /// accepts, returning how many were flagged
    pub fn apply_flag(&mut self, mut matching: RevFilter, flag: &RevFlag) -> Result<usize, WalkError> {
        self.check_flag(flag);
        let body_needed = matching.requires_body();
        let mut flagged = 0;
        while let Some(commit) = self.next()? {
            let slot = self.pool.slot(commit);
            let body = if body_needed {
                Some(self.pool.load_body(slot)?)
            } else {
                None
            };
            let info = CommitInfo {
                id: self.pool.oid(slot),
                commit_time: self.pool.commit_time(slot),
                parent_count: self.pool.parents(slot).len(),
                body: body.as_deref(),
            };
            match matching.include(&info) {
                Ok(true) => {
                    self.pool.add_flags(slot, flag.mask());
                    flagged += 1;
                }
                Ok(false) => {}
                Err(Interrupt::Stop) => break,
                Err(Interrupt::Failed(err)) => return Err(err),
            }
        }
        Ok(flagged)
    }

    fn check_flag(&self, flag: &RevFlag) {
        assert!(
            flag.pool() == self.pool.id(),
            "flag {flag} was allocated by another walk"
        );
    }

    // ---- merge bases ----

    /// Merge bases of `tips`, newest first
    ///
    /// Resets the walk before and after; the configured filters are left
    /// untouched.
    pub fn merge_bases(&mut self, tips: &[RevCommit]) -> Result<Vec<RevCommit>, WalkError> {
        self.reset();
        let result = self.with_merge_base_filter(|walk| {
            walk.mark_start_all(tips.iter().copied())?;
            walk.iter().collect()
        });
        self.reset();
        result
    }

    /// Whether `base` is an ancestor of `tip` (or `tip` itself)
    ///
    /// Application flags survive the resets this performs.
    pub fn is_merged_into(&mut self, base: RevCommit, tip: RevCommit) -> Result<bool, WalkError> {
        let allocated = self.pool.allocator.allocated();
        self.reset_with(allocated);
        let result = self.with_merge_base_filter(|walk| {
            walk.mark_start(tip)?;
            walk.mark_start(base)?;
            while let Some(merge_base) = walk.next()? {
                if merge_base == base {
                    return Ok(true);
                }
            }
            Ok(false)
        });
        let allocated = self.pool.allocator.allocated();
        self.reset_with(allocated);
        result
    }

    fn with_merge_base_filter<T>(
        &mut self,
        run: impl FnOnce(&mut Self) -> Result<T, WalkError>,
    ) -> Result<T, WalkError> {
        let rev_filter = std::mem::replace(&mut self.rev_filter, RevFilter::MergeBase);
        let tree_filter = std::mem::take(&mut self.tree_filter);
        let result = run(self);
        self.rev_filter = rev_filter;
        self.tree_filter = tree_filter;
        result
    }
}

/// Borrowing iterator over the remaining commits of a walk
#[derive(Debug)]
pub struct RevWalkIter<'w, 'r> {
    walk: &'w mut RevWalk<'r>,
    failed: bool,
}

impl Iterator for RevWalkIter<'_, '_> {
    type Item = Result<RevCommit, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.walk.next() {
            Ok(commit) => commit.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
