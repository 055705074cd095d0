//! History simplification by path
//!
//! [`RewriteTreeFilter`] decides, while commits are popped, which commits
//! touch the filtered paths. Commits that do not are flagged `REWRITE`.
//! [`RewriteGenerator`] later splices those commits out of the parent lists
//! of the commits that are produced.

use crate::artifacts::diff::path_filter::PathFilter;
use crate::artifacts::diff::tree_diff::TreeDiff;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::flags::{REWRITE, TEMP_MARK, UNINTERESTING};
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::ObjectPool;
use std::ops::ControlFlow;

#[derive(Debug, Clone)]
pub(crate) struct RewriteTreeFilter {
    filter: PathFilter,
    recursive: bool,
}

impl RewriteTreeFilter {
    pub(crate) fn new(filter: PathFilter, recursive: bool) -> Self {
        RewriteTreeFilter { filter, recursive }
    }

    /// Whether `commit` changes a filtered path relative to its parents
    ///
    /// Parents are parsed as needed. May also rewrite the parent list of
    /// `commit` or of one of its parents.
    pub(crate) fn include(&self, pool: &mut ObjectPool<'_>, commit: u32) -> Result<bool, WalkError> {
        let parents = pool.parents(commit).to_vec();
        for &parent in &parents {
            pool.parse_headers(parent)?;
        }

        let mut trees = parents
            .iter()
            .map(|&parent| pool.tree(parent).map(|tree| pool.oid(tree)))
            .collect::<Vec<_>>();
        trees.push(pool.tree(commit).map(|tree| pool.oid(tree)));
        let diff = TreeDiff::new(pool.store(), self.recursive);
        let oid = pool.oid(commit);

        match parents.as_slice() {
            [] => {
                let mut touched = false;
                diff.compare(&trees, &self.filter, &mut |_| {
                    touched = true;
                    ControlFlow::Break(())
                })?;
                if !touched {
                    tracing::trace!(%oid, "root commit has none of the filtered paths");
                    pool.add_flags(commit, REWRITE);
                }
                Ok(touched)
            }
            [parent] => {
                let (mut changes, mut additions) = (0, 0);
                diff.compare(&trees, &self.filter, &mut |change| {
                    changes += 1;
                    if change.is_addition(0, 1) {
                        additions += 1;
                        ControlFlow::Continue(())
                    } else {
                        ControlFlow::Break(())
                    }
                })?;

                if changes == 0 {
                    tracing::trace!(%oid, "commit is identical to its parent");
                    pool.add_flags(commit, REWRITE);
                    return Ok(false);
                }
                if changes == additions {
                    // the parent has none of the filtered paths
                    tracing::trace!(
                        %oid,
                        parent = %pool.oid(*parent),
                        "commit adds the filtered paths; cutting history above its parent"
                    );
                    pool.set_parents(*parent, Vec::new());
                }
                Ok(true)
            }
            _ => self.include_merge(pool, commit, &parents, &trees, &diff),
        }
    }

    fn include_merge(
        &self,
        pool: &mut ObjectPool<'_>,
        commit: u32,
        parents: &[u32],
        trees: &[Option<ObjectId>],
        diff: &TreeDiff<'_>,
    ) -> Result<bool, WalkError> {
        let own = parents.len();
        let mut changes = vec![0usize; own];
        let mut additions = vec![0usize; own];
        diff.compare(trees, &self.filter, &mut |change| {
            for index in 0..own {
                if !change.differs(index, own) {
                    continue;
                }
                changes[index] += 1;
                if change.is_addition(index, own) {
                    additions[index] += 1;
                }
            }
            ControlFlow::Continue(())
        })?;

        let oid = pool.oid(commit);
        let (mut same, mut differs) = (false, false);
        for (index, &parent) in parents.iter().enumerate() {
            if changes[index] == 0 {
                if pool.has_any(parent, UNINTERESTING) {
                    same = true;
                    continue;
                }
                tracing::trace!(%oid, parent = %pool.oid(parent), "merge is identical to a parent");
                pool.add_flags(commit, REWRITE);
                pool.set_parents(commit, vec![parent]);
                return Ok(false);
            }
            if changes[index] == additions[index] {
                tracing::trace!(%oid, parent = %pool.oid(parent), "merge adds the filtered paths; cutting history above parent");
                pool.set_parents(parent, Vec::new());
            }
            differs = true;
        }

        if differs && !same {
            return Ok(true);
        }
        pool.add_flags(commit, REWRITE);
        Ok(false)
    }
}

/// Replaces parents flagged `REWRITE` with their nearest kept ancestor
#[derive(Debug)]
pub(crate) struct RewriteGenerator {
    source: Box<Generator>,
}

impl RewriteGenerator {
    pub(crate) fn new(source: Generator) -> Self {
        RewriteGenerator {
            source: Box::new(source),
        }
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        let Some(commit) = self.source.next(pool)? else {
            return Ok(None);
        };

        let old = pool.parents(commit).to_vec();
        let rewritten = old.iter().map(|&parent| rewrite(pool, parent)).collect::<Vec<_>>();
        if rewritten.iter().zip(&old).any(|(new, old)| *new != Some(*old)) {
            let parents = dedup_parents(pool, rewritten);
            pool.set_parents(commit, parents);
        }

        Ok(Some(commit))
    }
}

/// Nearest ancestor along first parents that is kept, `None` when the
/// chain runs out
fn rewrite(pool: &ObjectPool<'_>, mut parent: u32) -> Option<u32> {
    let limit = pool.len();
    for _ in 0..=limit {
        let parents = pool.parents(parent);
        if parents.len() > 1 || pool.has_any(parent, UNINTERESTING) || !pool.has_any(parent, REWRITE) {
            return Some(parent);
        }
        parent = *parents.first()?;
    }

    tracing::warn!(oid = %pool.oid(parent), "parent chain loops; keeping commit");
    Some(parent)
}

fn dedup_parents(pool: &mut ObjectPool<'_>, parents: Vec<Option<u32>>) -> Vec<u32> {
    let mut kept = Vec::with_capacity(parents.len());
    for parent in parents.into_iter().flatten() {
        if pool.has_any(parent, TEMP_MARK) {
            continue;
        }
        pool.add_flags(parent, TEMP_MARK);
        kept.push(parent);
    }
    for &parent in &kept {
        pool.remove_flags(parent, TEMP_MARK);
    }
    kept
}
