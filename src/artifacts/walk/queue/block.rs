//! Fixed-capacity slabs shared by the FIFO and LIFO queues
//!
//! Blocks live in one arena and are linked by index. A block freed by one
//! queue is reused by the next queue that needs one, as long as both hold the
//! same [`SharedArena`].

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

pub(crate) const BLOCK_SIZE: usize = 256;

pub(crate) type SharedArena = Rc<RefCell<BlockArena>>;

pub(crate) fn shared_arena() -> SharedArena {
    Rc::new(RefCell::new(BlockArena::default()))
}

#[derive(Debug)]
pub(crate) struct Block {
    entries: [u32; BLOCK_SIZE],
    head: usize,
    tail: usize,
    pub(crate) next: Option<u32>,
}

impl Block {
    fn new() -> Self {
        Block {
            entries: [0; BLOCK_SIZE],
            head: 0,
            tail: 0,
            next: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub(crate) fn can_push(&self) -> bool {
        self.tail < BLOCK_SIZE
    }

    pub(crate) fn can_unpop(&self) -> bool {
        self.head > 0
    }

    pub(crate) fn push(&mut self, slot: u32) {
        self.entries[self.tail] = slot;
        self.tail += 1;
    }

    pub(crate) fn unpop(&mut self, slot: u32) {
        self.head -= 1;
        self.entries[self.head] = slot;
    }

    pub(crate) fn pop(&mut self) -> u32 {
        let slot = self.entries[self.head];
        self.head += 1;
        slot
    }

    /// Leave room on both sides
    pub(crate) fn reset_to_middle(&mut self) {
        self.head = BLOCK_SIZE / 2;
        self.tail = BLOCK_SIZE / 2;
    }

    /// Leave room for unpops only
    pub(crate) fn reset_to_end(&mut self) {
        self.head = BLOCK_SIZE;
        self.tail = BLOCK_SIZE;
    }

    fn entries(&self) -> &[u32] {
        &self.entries[self.head..self.tail]
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlockArena {
    blocks: Vec<Block>,
    free: Option<u32>,
}

impl BlockArena {
    /// An empty block, taken from the free list when possible
    pub(crate) fn new_block(&mut self) -> u32 {
        match self.free {
            Some(id) => {
                let block = &mut self.blocks[id as usize];
                self.free = block.next;
                block.head = 0;
                block.tail = 0;
                block.next = None;
                id
            }
            None => {
                self.blocks.push(Block::new());
                (self.blocks.len() - 1) as u32
            }
        }
    }

    pub(crate) fn free_block(&mut self, id: u32) {
        self.blocks[id as usize].next = self.free;
        self.free = Some(id);
    }

    /// Free every block of the chain starting at `head`
    pub(crate) fn free_chain(&mut self, mut head: Option<u32>) {
        while let Some(id) = head {
            head = self.blocks[id as usize].next;
            self.free_block(id);
        }
    }

    pub(crate) fn block(&self, id: u32) -> &Block {
        &self.blocks[id as usize]
    }

    pub(crate) fn block_mut(&mut self, id: u32) -> &mut Block {
        &mut self.blocks[id as usize]
    }

    /// Visit the slots of the chain starting at `head` in queue order
    pub(crate) fn visit(&self, mut head: Option<u32>, mut visitor: impl FnMut(u32) -> ControlFlow<()>) -> ControlFlow<()> {
        while let Some(id) = head {
            let block = self.block(id);
            for &slot in block.entries() {
                visitor(slot)?;
            }
            head = block.next;
        }
        ControlFlow::Continue(())
    }

    #[cfg(test)]
    pub(crate) fn free_len(&self) -> usize {
        let mut len = 0;
        let mut next = self.free;
        while let Some(id) = next {
            len += 1;
            next = self.block(id).next;
        }
        len
    }
}
