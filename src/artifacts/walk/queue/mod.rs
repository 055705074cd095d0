//! Queues of pool slots used by the walker and its stages

pub(crate) mod block;
pub(crate) mod date;
pub(crate) mod fifo;
pub(crate) mod lifo;

use crate::artifacts::walk::pool::ObjectPool;
use std::ops::ControlFlow;

/// Flag scans shared by every queue
pub(crate) trait SlotQueue {
    /// Visit the queued slots in output order until `visitor` breaks
    fn visit(&self, visitor: &mut dyn FnMut(u32) -> ControlFlow<()>) -> ControlFlow<()>;

    fn everybody_has_flag(&self, pool: &ObjectPool<'_>, flag: u32) -> bool {
        self.visit(&mut |slot| {
            if pool.has_any(slot, flag) {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        })
        .is_continue()
    }

    fn anybody_has_flag(&self, pool: &ObjectPool<'_>, flag: u32) -> bool {
        self.visit(&mut |slot| {
            if pool.has_any(slot, flag) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .is_break()
    }

    fn remove_flag(&self, pool: &mut ObjectPool<'_>, flag: u32) {
        let _ = self.visit(&mut |slot| {
            pool.remove_flags(slot, flag);
            ControlFlow::Continue(())
        });
    }
}
