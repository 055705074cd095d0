use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::SlotQueue;
use std::ops::ControlFlow;

/// First-in first-out queue of slots with push-front support
#[derive(Debug)]
pub(crate) struct FifoQueue {
    arena: SharedArena,
    head: Option<u32>,
    tail: Option<u32>,
}

impl FifoQueue {
    pub(crate) fn new(arena: SharedArena) -> Self {
        FifoQueue {
            arena,
            head: None,
            tail: None,
        }
    }

    pub(crate) fn add(&mut self, slot: u32) {
        let mut arena = self.arena.borrow_mut();
        match self.tail {
            Some(tail) if arena.block(tail).can_push() => arena.block_mut(tail).push(slot),
            Some(tail) => {
                let block = arena.new_block();
                arena.block_mut(block).push(slot);
                arena.block_mut(tail).next = Some(block);
                self.tail = Some(block);
            }
            None => {
                let block = arena.new_block();
                arena.block_mut(block).push(slot);
                self.head = Some(block);
                self.tail = Some(block);
            }
        }
    }

    /// Put `slot` in front of everything queued
    pub(crate) fn unpop(&mut self, slot: u32) {
        let mut arena = self.arena.borrow_mut();
        match self.head {
            Some(head) if arena.block(head).can_unpop() => arena.block_mut(head).unpop(slot),
            Some(head) => {
                let block = arena.new_block();
                let new_head = arena.block_mut(block);
                new_head.reset_to_end();
                new_head.unpop(slot);
                new_head.next = Some(head);
                self.head = Some(block);
            }
            None => {
                let block = arena.new_block();
                let new_head = arena.block_mut(block);
                new_head.reset_to_middle();
                new_head.unpop(slot);
                self.head = Some(block);
                self.tail = Some(block);
            }
        }
    }

    pub(crate) fn next(&mut self) -> Option<u32> {
        let head = self.head?;
        let mut arena = self.arena.borrow_mut();
        let block = arena.block_mut(head);
        let slot = block.pop();
        if block.is_empty() {
            self.head = block.next;
            if self.head.is_none() {
                self.tail = None;
            }
            arena.free_block(head);
        }
        Some(slot)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.arena.borrow_mut().free_chain(self.head.take());
        self.tail = None;
    }
}

impl SlotQueue for FifoQueue {
    fn visit(&self, visitor: &mut dyn FnMut(u32) -> ControlFlow<()>) -> ControlFlow<()> {
        self.arena.borrow().visit(self.head, visitor)
    }
}

impl Drop for FifoQueue {
    fn drop(&mut self) {
        self.clear();
    }
}
