//! Merge base computation
//!
//! Each start commit gets its own branch bit. Bits are carried down the
//! history as commits are popped newest first; a commit that ends up with
//! every branch bit is a merge base, and everything below it is marked so
//! that it is not reported again. The walk halts once every pending commit
//! lies below a merge base.

use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::date::DateQueue;
use crate::artifacts::walk::queue::SlotQueue;

#[derive(Debug)]
pub(crate) struct MergeBaseGenerator {
    pending: DateQueue,
    branch_mask: u32,
    in_pending: u32,
    popped: u32,
    merge_base: u32,
    recarry_test: u32,
    recarry_mask: u32,
}

impl MergeBaseGenerator {
    /// Seed the stage with the start commits in `starts`
    ///
    /// Every flag allocated here is released on the walk's next reset.
    pub(crate) fn new(pool: &mut ObjectPool<'_>, mut starts: DateQueue) -> Result<Self, WalkError> {
        let in_pending = pool.allocator.allocate("IN_PENDING")?;
        let popped = pool.allocator.allocate("POPPED")?;
        let merge_base = pool.allocator.allocate("MERGE_BASE")?;
        pool.allocator.free_on_reset(in_pending | popped | merge_base);

        let mut pending = DateQueue::new();
        let mut branch_mask = 0;
        let seeded = std::iter::from_fn(|| starts.next()).try_for_each(|commit| {
            let branch = pool.allocator.allocate("branch")?;
            branch_mask |= branch;
            pool.add_flags(commit, branch | in_pending);
            pending.add(pool, commit);
            Ok::<_, WalkError>(())
        });
        pool.allocator.free_on_reset(branch_mask);
        seeded?;

        Ok(MergeBaseGenerator {
            pending,
            branch_mask,
            in_pending,
            popped,
            merge_base,
            recarry_test: branch_mask | popped,
            recarry_mask: branch_mask | popped | merge_base,
        })
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        while let Some(commit) = self.pending.next() {
            for index in 0..pool.parents(commit).len() {
                let parent = pool.parents(commit)[index];
                if pool.has_any(parent, self.in_pending) {
                    continue;
                }
                pool.parse_headers(parent)?;
                pool.add_flags(parent, self.in_pending);
                self.pending.add(pool, parent);
            }

            let mut carry = pool.flags(commit) & self.branch_mask;
            let is_merge_base = carry == self.branch_mask;
            if is_merge_base {
                carry |= self.merge_base;
            }
            self.carry_onto_history(pool, commit, carry);

            if pool.has_any(commit, self.merge_base) {
                // an earlier merge base already covers this commit
                if self.pending.everybody_has_flag(pool, self.merge_base) {
                    return Ok(None);
                }
                continue;
            }

            pool.add_flags(commit, self.popped);
            if is_merge_base {
                pool.add_flags(commit, self.merge_base);
                tracing::debug!(oid = %pool.oid(commit), "merge base found");
                return Ok(Some(commit));
            }
        }

        Ok(None)
    }

    fn carry_onto_history(&mut self, pool: &mut ObjectPool<'_>, commit: u32, carry: u32) {
        // each push adds bits to a node's flag word, so 32 pushes per node
        // bound the loop even on a cyclic graph
        let mut budget = pool.len().saturating_mul(32).saturating_add(1);
        let mut stack = vec![(commit, carry)];
        while let Some((commit, carry)) = stack.pop() {
            for index in 0..pool.parents(commit).len() {
                let parent = pool.parents(commit)[index];
                if self.carry_onto_one(pool, parent, carry, &mut stack) {
                    continue;
                }
                if budget == 0 {
                    tracing::warn!(oid = %pool.oid(parent), "merge base carry does not converge; giving up");
                    return;
                }
                budget -= 1;
                stack.push((parent, carry));
            }
        }
    }

    /// Returns `true` when `parent`'s history needs no further carrying
    fn carry_onto_one(
        &mut self,
        pool: &mut ObjectPool<'_>,
        parent: u32,
        carry: u32,
        stack: &mut Vec<(u32, u32)>,
    ) -> bool {
        let had_all = pool.has_all(parent, carry);
        pool.add_flags(parent, carry);

        if pool.flags(parent) & self.recarry_mask == self.recarry_test {
            // popped before it was known to be below a merge base
            pool.remove_flags(parent, self.popped);
            self.pending.add(pool, parent);
            stack.push((parent, self.branch_mask | self.merge_base));
            return true;
        }

        had_all
    }
}
