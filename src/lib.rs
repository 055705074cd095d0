//! Revision-graph traversal over a content-addressed git object store
//!
//! The crate is split the same way the object database and the algorithms
//! working on it are split:
//!
//! - `areas`: object stores (on-disk loose objects and an in-memory map)
//! - `artifacts`: object formats, tree comparison and the revision walker
//!
//! The entry points are [`RevWalk`] for commit traversal and [`ObjectWalk`]
//! for commit-plus-object traversal.

pub mod areas;
pub mod artifacts;

pub use areas::database::Database;
pub use areas::memory::MemoryStore;
pub use areas::object_store::{ObjectStore, RawObject};
pub use artifacts::diff::path_filter::{PathFilter, TreeFilter};
pub use artifacts::objects::object_id::ObjectId;
pub use artifacts::objects::object_type::ObjectType;
pub use artifacts::walk::config::WalkConfig;
pub use artifacts::walk::error::WalkError;
pub use artifacts::walk::filter::{CommitInfo, RevFilter};
pub use artifacts::walk::flags::{RevFlag, RevFlagSet};
pub use artifacts::walk::object_walk::ObjectWalk;
pub use artifacts::walk::pool::{RevBlob, RevCommit, RevObject, RevTag, RevTree};
pub use artifacts::walk::rev_walk::{RevSort, RevWalk};
