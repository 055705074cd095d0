use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::flags::UNINTERESTING;
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::fifo::FifoQueue;
use crate::artifacts::walk::queue::SlotQueue;

/// Appends the uninteresting parents of produced commits to the output
#[derive(Debug)]
pub(crate) struct BoundaryGenerator {
    source: Option<Box<Generator>>,
    held: FifoQueue,
    boundary: FifoQueue,
    duplicate: u32,
}

impl BoundaryGenerator {
    /// `duplicate` is a stage-private flag the caller frees on reset
    pub(crate) fn new(source: Generator, arena: SharedArena, duplicate: u32) -> Self {
        BoundaryGenerator {
            source: Some(Box::new(source)),
            held: FifoQueue::new(arena.clone()),
            boundary: FifoQueue::new(arena),
            duplicate,
        }
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        if let Some(source) = &mut self.source {
            if let Some(commit) = source.next(pool)? {
                for &parent in pool.parents(commit) {
                    if pool.has_any(parent, UNINTERESTING) {
                        self.held.add(parent);
                    }
                }
                return Ok(Some(commit));
            }

            self.source = None;
            self.collect_boundary(pool)?;
        }

        Ok(self.boundary.next())
    }

    fn collect_boundary(&mut self, pool: &mut ObjectPool<'_>) -> Result<(), WalkError> {
        while let Some(commit) = self.held.next() {
            if pool.has_any(commit, self.duplicate) {
                continue;
            }
            pool.parse_headers(commit)?;
            pool.add_flags(commit, self.duplicate);
            self.boundary.add(commit);
        }
        self.boundary.remove_flag(pool, self.duplicate);
        tracing::trace!("boundary collected");
        Ok(())
    }
}
