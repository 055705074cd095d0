//! Pipeline stages producing the commits of a walk
//!
//! Every stage pulls from the one it wraps. The innermost stage is either
//! [`PendingGenerator`](pending::PendingGenerator), which follows parent
//! edges, or [`MergeBaseGenerator`](merge_base::MergeBaseGenerator). The
//! chain is assembled by [`start::compose`].

pub(crate) mod boundary;
pub(crate) mod delay;
pub(crate) mod merge_base;
pub(crate) mod pending;
pub(crate) mod rewrite;
pub(crate) mod start;
pub(crate) mod topo;

use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::flags::UNINTERESTING;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::fifo::FifoQueue;
use crate::artifacts::walk::queue::lifo::LifoQueue;
use boundary::BoundaryGenerator;
use delay::DelayGenerator;
use merge_base::MergeBaseGenerator;
use pending::PendingGenerator;
use rewrite::RewriteGenerator;
use topo::TopoGenerator;

#[derive(Debug)]
pub(crate) enum Generator {
    Pending(PendingGenerator),
    MergeBase(MergeBaseGenerator),
    /// Upstream output captured in full, replayed in order
    Buffered(FifoQueue),
    Rewrite(RewriteGenerator),
    Topo(TopoGenerator),
    /// Upstream output captured in full, replayed backwards
    Reversed(LifoQueue),
    Boundary(BoundaryGenerator),
    Delay(DelayGenerator),
    /// Drops commits that became uninteresting after they were produced
    FixUninteresting(Box<Generator>),
}

impl Generator {
    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        match self {
            Generator::Pending(generator) => generator.next(pool),
            Generator::MergeBase(generator) => generator.next(pool),
            Generator::Buffered(queue) => Ok(queue.next()),
            Generator::Rewrite(generator) => generator.next(pool),
            Generator::Topo(generator) => Ok(generator.next(pool)),
            Generator::Reversed(queue) => Ok(queue.next()),
            Generator::Boundary(generator) => generator.next(pool),
            Generator::Delay(generator) => generator.next(pool),
            Generator::FixUninteresting(source) => loop {
                match source.next(pool)? {
                    Some(commit) if pool.has_any(commit, UNINTERESTING) => continue,
                    commit => return Ok(commit),
                }
            },
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Generator::Pending(_) => "pending",
            Generator::MergeBase(_) => "merge-base",
            Generator::Buffered(_) => "buffer",
            Generator::Rewrite(_) => "rewrite",
            Generator::Topo(_) => "topo",
            Generator::Reversed(_) => "reverse",
            Generator::Boundary(_) => "boundary",
            Generator::Delay(_) => "delay",
            Generator::FixUninteresting(_) => "fix-uninteresting",
        }
    }
}
