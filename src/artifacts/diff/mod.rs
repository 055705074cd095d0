//! Tree comparison
//!
//! - `path_filter`: path sets that restrict which tree entries are compared
//! - `tree_diff`: N-way comparison of trees by path presence and identity

pub mod path_filter;
pub mod tree_diff;
