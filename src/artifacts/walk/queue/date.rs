use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::SlotQueue;
use std::ops::ControlFlow;

#[derive(Debug)]
struct Entry {
    slot: u32,
    time: i64,
    next: Option<u32>,
}

/// Commits ordered by commit time, newest first
///
/// Commits with equal times come out in insertion order. Entries are linked
/// by index and recycled through the queue's own free list.
#[derive(Debug, Default)]
pub(crate) struct DateQueue {
    entries: Vec<Entry>,
    head: Option<u32>,
    free: Option<u32>,
}

impl DateQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, pool: &ObjectPool<'_>, slot: u32) {
        self.insert(slot, pool.commit_time(slot));
    }

    fn insert(&mut self, slot: u32, time: i64) {
        let entry = self.new_entry(slot, time);

        let Some(head) = self.head.filter(|&head| time <= self.entries[head as usize].time) else {
            self.entries[entry as usize].next = self.head;
            self.head = Some(entry);
            return;
        };

        let mut prev = head;
        while let Some(next) = self.entries[prev as usize].next {
            if time > self.entries[next as usize].time {
                break;
            }
            prev = next;
        }
        self.entries[entry as usize].next = self.entries[prev as usize].next;
        self.entries[prev as usize].next = Some(entry);
    }

    fn new_entry(&mut self, slot: u32, time: i64) -> u32 {
        match self.free {
            Some(id) => {
                let entry = &mut self.entries[id as usize];
                self.free = entry.next;
                *entry = Entry {
                    slot,
                    time,
                    next: None,
                };
                id
            }
            None => {
                self.entries.push(Entry {
                    slot,
                    time,
                    next: None,
                });
                (self.entries.len() - 1) as u32
            }
        }
    }

    pub(crate) fn next(&mut self) -> Option<u32> {
        let head = self.head?;
        let entry = &mut self.entries[head as usize];
        self.head = entry.next;
        entry.next = self.free;
        self.free = Some(head);
        Some(entry.slot)
    }

    pub(crate) fn peek(&self) -> Option<u32> {
        self.head.map(|head| self.entries[head as usize].slot)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn clear(&mut self) {
        while self.next().is_some() {}
    }
}

impl SlotQueue for DateQueue {
    fn visit(&self, visitor: &mut dyn FnMut(u32) -> ControlFlow<()>) -> ControlFlow<()> {
        let mut next = self.head;
        while let Some(id) = next {
            let entry = &self.entries[id as usize];
            visitor(entry.slot)?;
            next = entry.next;
        }
        ControlFlow::Continue(())
    }
}
