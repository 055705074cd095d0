use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::flags::TOPO_DELAY;
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::fifo::FifoQueue;

/// Orders commits so that no commit comes before any of its children
///
/// The whole upstream output is buffered up front while each parent's
/// `in_degree` counts its buffered children. A commit popped while it still
/// has unproduced children is parked with `TOPO_DELAY` and pushed back to the
/// front once its last child is produced.
#[derive(Debug)]
pub(crate) struct TopoGenerator {
    pending: FifoQueue,
}

impl TopoGenerator {
    pub(crate) fn new(
        mut source: Generator,
        pool: &mut ObjectPool<'_>,
        arena: SharedArena,
    ) -> Result<Self, WalkError> {
        let mut pending = FifoQueue::new(arena);
        while let Some(commit) = source.next(pool)? {
            for index in 0..pool.parents(commit).len() {
                let parent = pool.parents(commit)[index];
                if let Some(node) = pool.commit_mut(parent) {
                    node.in_degree += 1;
                }
            }
            pending.add(commit);
        }

        Ok(TopoGenerator { pending })
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Option<u32> {
        loop {
            let commit = self.pending.next()?;
            if pool.commit(commit).is_some_and(|node| node.in_degree > 0) {
                pool.add_flags(commit, TOPO_DELAY);
                continue;
            }

            for index in 0..pool.parents(commit).len() {
                let parent = pool.parents(commit)[index];
                let Some(node) = pool.commit_mut(parent) else {
                    continue;
                };
                node.in_degree = node.in_degree.saturating_sub(1);
                if node.in_degree == 0 && pool.has_any(parent, TOPO_DELAY) {
                    pool.remove_flags(parent, TOPO_DELAY);
                    self.pending.unpop(parent);
                }
            }

            return Some(commit);
        }
    }
}
