//! Git data structures and algorithms
//!
//! - `database`: Database entry types
//! - `diff`: Path filters and multi-way tree comparison
//! - `objects`: Git object types (blob, tree, commit, tag)
//! - `walk`: Revision and object graph traversal

pub mod database;
pub mod diff;
pub mod objects;
pub mod walk;
