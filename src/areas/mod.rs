//! Object stores
//!
//! - `object_store`: the read interface the walker consumes
//! - `database`: on-disk loose object database
//! - `memory`: in-memory store for tests and embedders

pub mod database;
pub mod memory;
pub mod object_store;
