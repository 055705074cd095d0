//! Revision walking
//!
//! [`rev_walk::RevWalk`] is the entry point. It owns an object pool in which
//! every id maps to one node with a flag word; the generator stages in
//! [`generator`] read and write those flags while they hand commits to one
//! another.

pub mod config;
pub mod error;
pub mod filter;
pub mod flags;
pub(crate) mod generator;
pub mod object_walk;
pub mod pool;
pub(crate) mod queue;
pub mod rev_walk;
