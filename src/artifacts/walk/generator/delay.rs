use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::fifo::FifoQueue;

/// Keeps a window of commits buffered so that uninteresting marks carried
/// by later pops can reach commits that were popped too early
#[derive(Debug)]
pub(crate) struct DelayGenerator {
    source: Box<Generator>,
    delay: FifoQueue,
    window: usize,
    buffered: usize,
}

impl DelayGenerator {
    pub(crate) fn new(source: Generator, arena: SharedArena, window: usize) -> Self {
        DelayGenerator {
            source: Box::new(source),
            delay: FifoQueue::new(arena),
            window: window.max(1),
            buffered: 0,
        }
    }

    pub(crate) fn next(&mut self, pool: &mut ObjectPool<'_>) -> Result<Option<u32>, WalkError> {
        while self.buffered < self.window {
            let Some(commit) = self.source.next(pool)? else {
                break;
            };
            self.delay.add(commit);
            self.buffered += 1;
        }

        let commit = self.delay.next();
        if commit.is_some() {
            self.buffered -= 1;
        }
        Ok(commit)
    }
}
