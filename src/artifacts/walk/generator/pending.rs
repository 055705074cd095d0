use crate::artifacts::walk::config::WalkConfig;
use crate::artifacts::walk::error::{Interrupt, WalkError};
use crate::artifacts::walk::filter::{CommitInfo, RevFilter};
use crate::artifacts::walk::flags::{SEEN, UNINTERESTING};
use crate::artifacts::walk::generator::rewrite::RewriteTreeFilter;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::date::DateQueue;
use crate::artifacts::walk::queue::SlotQueue;

/// The only stage that follows parent edges
///
/// Commits are popped newest first. Every popped commit has its unseen
/// parents parsed and queued and its carry flags pushed onto its ancestry
/// before it is either produced or dropped.
#[derive(Debug)]
pub(crate) struct PendingGenerator {
    queue: DateQueue,
    filter: RevFilter,
    tree_filter: Option<RewriteTreeFilter>,
    requires_body: bool,
    over_scan: usize,
    budget: usize,
    last_time: i64,
    can_dispose: bool,
}

impl PendingGenerator {
    pub(crate) fn new(
        queue: DateQueue,
        mut filter: RevFilter,
        tree_filter: Option<RewriteTreeFilter>,
        config: &WalkConfig,
        can_dispose: bool,
    ) -> Self {
        filter.reset();
        PendingGenerator {
            queue,
            requires_body: filter.requires_body(),
            filter,
            tree_filter,
            over_scan: config.over_scan,
            budget: config.over_scan + 1,
            last_time: i64::MAX,
            can_dispose: can_dispose && !config.retain_body,
        }
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        match self.advance(pool) {
            Ok(commit) => Ok(commit),
            Err(Interrupt::Stop) => {
                tracing::trace!("walk stopped early; dropping pending commits");
                self.queue.clear();
                Ok(None)
            }
            Err(Interrupt::Failed(err)) => Err(err),
        }
    }

    fn advance(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, Interrupt> {
        loop {
            let Some(commit) = self.queue.next() else {
                return Ok(None);
            };

            let uninteresting = pool.has_any(commit, UNINTERESTING);
            let produce = !uninteresting && self.include(pool, commit)?;

            for index in 0..pool.parents(commit).len() {
                let parent = pool.parents(commit)[index];
                if pool.has_any(parent, SEEN) {
                    continue;
                }
                pool.parse_headers(parent)?;
                pool.add_flags(parent, SEEN);
                self.queue.add(pool, parent);
            }

            let carry = pool.flags(commit) & pool.allocator.carry();
            if carry != 0 {
                pool.carry_flags(commit, carry);
            }

            if uninteresting {
                if self.queue.everybody_has_flag(pool, UNINTERESTING) {
                    let too_close = self
                        .queue
                        .peek()
                        .is_some_and(|next| pool.commit_time(next) >= self.last_time);
                    if too_close {
                        self.budget = self.over_scan + 1;
                    } else {
                        self.budget = self.budget.saturating_sub(1);
                        if self.budget == 0 {
                            return Err(Interrupt::Stop);
                        }
                    }
                } else {
                    self.budget = self.over_scan + 1;
                }

                if self.can_dispose {
                    pool.dispose_body(commit);
                }
                continue;
            }

            if produce {
                self.last_time = pool.commit_time(commit);
                return Ok(Some(commit));
            }

            if self.can_dispose {
                pool.dispose_body(commit);
            }
        }
    }

    fn include(&mut self, pool: &mut ObjectPool<'_>, commit: u32) -> Result<bool, Interrupt> {
        if let Some(tree_filter) = &self.tree_filter {
            if !tree_filter.include(pool, commit)? {
                return Ok(false);
            }
        }

        let body = if self.requires_body {
            Some(pool.load_body(commit)?)
        } else {
            None
        };
        let info = CommitInfo {
            id: pool.oid(commit),
            commit_time: pool.commit_time(commit),
            parent_count: pool.parents(commit).len(),
            body: body.as_deref(),
        };
        self.filter.include(&info)
    }
}
