use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::SlotQueue;
use std::ops::ControlFlow;

/// Last-in first-out queue of slots
#[derive(Debug)]
pub(crate) struct LifoQueue {
    arena: SharedArena,
    head: Option<u32>,
}

impl LifoQueue {
    pub(crate) fn new(arena: SharedArena) -> Self {
        LifoQueue { arena, head: None }
    }

    pub(crate) fn add(&mut self, slot: u32) {
        let mut arena = self.arena.borrow_mut();
        match self.head {
            Some(head) if arena.block(head).can_unpop() => arena.block_mut(head).unpop(slot),
            head => {
                let block = arena.new_block();
                let new_head = arena.block_mut(block);
                new_head.reset_to_end();
                new_head.unpop(slot);
                new_head.next = head;
                self.head = Some(block);
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
            arena.free_block(head);
        }
        Some(slot)
    }

    pub(crate) fn clear(&mut self) {
        self.arena.borrow_mut().free_chain(self.head.take());
    }
}

impl SlotQueue for LifoQueue {
    fn visit(&self, visitor: &mut dyn FnMut(u32) -> ControlFlow<()>) -> ControlFlow<()> {
        self.arena.borrow().visit(self.head, visitor)
    }
}

impl Drop for LifoQueue {
    fn drop(&mut self) {
        self.clear();
    }
}
