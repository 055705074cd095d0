//! Flag bits carried by every node of a walk
//!
//! The low bits are reserved by the engine:
//!
//! | bit | name            | owner                                        |
//! |-----|-----------------|----------------------------------------------|
//! | 0   | `PARSED`        | walk-global: header has been read            |
//! | 1   | `SEEN`          | walk-global: node entered a queue            |
//! | 2   | `UNINTERESTING` | walk-global: node and its history excluded   |
//! | 3   | `REWRITE`       | path simplification only                     |
//! | 4   | `TEMP_MARK`     | parent de-duplication in the rewrite stage   |
//! | 5   | `TOPO_DELAY`    | topological sort only                        |
//!
//! All other bits are handed out by [`FlagAllocator`], both to applications
//! ([`RevFlag`]) and to pipeline stages that need a private mark of their own
//! (boundary de-duplication, merge-base bookkeeping).

use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::pool::PoolId;

pub(crate) const PARSED: u32 = 1 << 0;
pub(crate) const SEEN: u32 = 1 << 1;
pub(crate) const UNINTERESTING: u32 = 1 << 2;
pub(crate) const REWRITE: u32 = 1 << 3;
pub(crate) const TEMP_MARK: u32 = 1 << 4;
pub(crate) const TOPO_DELAY: u32 = 1 << 5;

pub(crate) const RESERVED_FLAGS: u32 = 6;

/// Bits available for allocation
pub(crate) const APP_FLAGS: u32 = !0 << RESERVED_FLAGS;

/// A named application flag allocated from one walk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevFlag {
    name: String,
    mask: u32,
    pool: PoolId,
}

impl RevFlag {
    pub(crate) fn new(name: String, mask: u32, pool: PoolId) -> Self {
        RevFlag { name, mask, pool }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mask(&self) -> u32 {
        self.mask
    }

    pub(crate) fn pool(&self) -> PoolId {
        self.pool
    }
}

impl std::fmt::Display for RevFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Insertion-ordered set of flags with a combined mask
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevFlagSet {
    flags: Vec<RevFlag>,
    mask: u32,
}

impl RevFlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag, returning `false` when it was already present
    pub fn add(&mut self, flag: RevFlag) -> bool {
        if self.contains(&flag) {
            return false;
        }
        self.mask |= flag.mask;
        self.flags.push(flag);
        true
    }

    pub fn remove(&mut self, flag: &RevFlag) -> bool {
        let Some(index) = self.flags.iter().position(|f| f == flag) else {
            return false;
        };
        self.flags.remove(index);
        self.mask &= !flag.mask;
        true
    }

    pub fn contains(&self, flag: &RevFlag) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RevFlag> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub(crate) fn mask(&self) -> u32 {
        self.mask
    }
}

impl FromIterator<RevFlag> for RevFlagSet {
    fn from_iter<I: IntoIterator<Item = RevFlag>>(iter: I) -> Self {
        let mut set = RevFlagSet::new();
        for flag in iter {
            set.add(flag);
        }
        set
    }
}

impl<'a> IntoIterator for &'a RevFlagSet {
    type Item = &'a RevFlag;
    type IntoIter = std::slice::Iter<'a, RevFlag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

/// Bookkeeping of which bits are in use within one walk
#[derive(Debug, Clone)]
pub(crate) struct FlagAllocator {
    free: u32,
    /// Freed while a traversal was running; returned on the next reset
    delay_free: u32,
    retain_on_reset: u32,
    carry: u32,
}

impl Default for FlagAllocator {
    fn default() -> Self {
        FlagAllocator {
            free: APP_FLAGS,
            delay_free: 0,
            retain_on_reset: 0,
            carry: UNINTERESTING,
        }
    }
}

impl FlagAllocator {
    /// Hand out the lowest free bit
    pub(crate) fn allocate(&mut self, name: &str) -> Result<u32, WalkError> {
        if self.free == 0 {
            return Err(WalkError::FlagsExhausted {
                name: name.to_string(),
            });
        }
        let mask = 1 << self.free.trailing_zeros();
        self.free &= !mask;
        Ok(mask)
    }

    /// Return bits right away; only safe while no traversal holds them
    pub(crate) fn free(&mut self, mask: u32) {
        let mask = mask & APP_FLAGS;
        self.free |= mask;
        self.carry &= !mask;
        self.retain_on_reset &= !mask;
    }

    /// Return bits once the current traversal is reset
    pub(crate) fn free_on_reset(&mut self, mask: u32) {
        self.delay_free |= mask & APP_FLAGS;
    }

    pub(crate) fn finish_delayed_frees(&mut self) {
        let delayed = std::mem::take(&mut self.delay_free);
        self.free(delayed);
    }

    pub(crate) fn is_allocated(&self, mask: u32) -> bool {
        mask & APP_FLAGS == mask && self.free & mask == 0
    }

    /// Bits currently handed out
    pub(crate) fn allocated(&self) -> u32 {
        !self.free & APP_FLAGS
    }

    pub(crate) fn carry(&self) -> u32 {
        self.carry
    }

    pub(crate) fn add_carry(&mut self, mask: u32) {
        self.carry |= mask;
    }

    pub(crate) fn retain_on_reset(&self) -> u32 {
        self.retain_on_reset
    }

    pub(crate) fn add_retain_on_reset(&mut self, mask: u32) {
        self.retain_on_reset |= mask;
    }
}
