//! Commit selection rules applied by the pending stage
//!
//! A filter sees each interesting commit once, after its header is parsed.
//! Filters that know no later commit can match end the walk early.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::walk::error::Interrupt;
use std::fmt;
use std::rc::Rc;

/// What a filter may inspect about a commit
#[derive(Debug, Clone, Copy)]
pub struct CommitInfo<'a> {
    pub id: ObjectId,
    pub commit_time: i64,
    pub parent_count: usize,
    /// Raw commit body; only loaded when a custom filter is installed
    pub body: Option<&'a [u8]>,
}

#[derive(Clone, Default)]
pub enum RevFilter {
    /// Accept every commit
    #[default]
    All,
    /// Produce the merge bases of the start commits instead of a traversal
    ///
    /// Cannot be combined with other filters or with a tree filter.
    MergeBase,
    NoMerges,
    OnlyMerges,
    /// Accept at most `limit` commits, then end the walk
    MaxCount { limit: usize, count: usize },
    /// Accept commits at or after the time; the walk ends at the first older
    /// commit
    CommitTimeAfter(i64),
    /// Accept commits at or before the time
    CommitTimeBefore(i64),
    Not(Box<RevFilter>),
    And(Box<RevFilter>, Box<RevFilter>),
    Or(Box<RevFilter>, Box<RevFilter>),
    Custom(Rc<dyn Fn(&CommitInfo<'_>) -> bool>),
}

impl fmt::Debug for RevFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevFilter::All => f.write_str("All"),
            RevFilter::MergeBase => f.write_str("MergeBase"),
            RevFilter::NoMerges => f.write_str("NoMerges"),
            RevFilter::OnlyMerges => f.write_str("OnlyMerges"),
            RevFilter::MaxCount { limit, count } => f
                .debug_struct("MaxCount")
                .field("limit", limit)
                .field("count", count)
                .finish(),
            RevFilter::CommitTimeAfter(time) => f.debug_tuple("CommitTimeAfter").field(time).finish(),
            RevFilter::CommitTimeBefore(time) => f.debug_tuple("CommitTimeBefore").field(time).finish(),
            RevFilter::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            RevFilter::And(left, right) => f.debug_tuple("And").field(left).field(right).finish(),
            RevFilter::Or(left, right) => f.debug_tuple("Or").field(left).field(right).finish(),
            RevFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl RevFilter {
    pub fn max_count(limit: usize) -> Self {
        RevFilter::MaxCount { limit, count: 0 }
    }

    pub fn custom(predicate: impl Fn(&CommitInfo<'_>) -> bool + 'static) -> Self {
        RevFilter::Custom(Rc::new(predicate))
    }

    pub fn negate(self) -> Self {
        RevFilter::Not(Box::new(self))
    }

    pub fn and(self, other: RevFilter) -> Self {
        RevFilter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: RevFilter) -> Self {
        RevFilter::Or(Box::new(self), Box::new(other))
    }

    pub(crate) fn include(&mut self, commit: &CommitInfo<'_>) -> Result<bool, Interrupt> {
        match self {
            RevFilter::All | RevFilter::MergeBase => Ok(true),
            RevFilter::NoMerges => Ok(commit.parent_count < 2),
            RevFilter::OnlyMerges => Ok(commit.parent_count > 1),
            RevFilter::MaxCount { limit, count } => {
                if *count >= *limit {
                    return Err(Interrupt::Stop);
                }
                *count += 1;
                Ok(true)
            }
            RevFilter::CommitTimeAfter(time) => {
                if commit.commit_time < *time {
                    return Err(Interrupt::Stop);
                }
                Ok(true)
            }
            RevFilter::CommitTimeBefore(time) => Ok(commit.commit_time <= *time),
            RevFilter::Not(inner) => Ok(!inner.include(commit)?),
            RevFilter::And(left, right) => Ok(left.include(commit)? && right.include(commit)?),
            RevFilter::Or(left, right) => Ok(left.include(commit)? || right.include(commit)?),
            RevFilter::Custom(predicate) => Ok(predicate(commit)),
        }
    }

    /// Whether `include` needs the raw commit body
    pub(crate) fn requires_body(&self) -> bool {
        match self {
            RevFilter::Custom(_) => true,
            RevFilter::Not(inner) => inner.requires_body(),
            RevFilter::And(left, right) | RevFilter::Or(left, right) => {
                left.requires_body() || right.requires_body()
            }
            _ => false,
        }
    }

    pub(crate) fn contains_merge_base(&self) -> bool {
        match self {
            RevFilter::MergeBase => true,
            RevFilter::Not(inner) => inner.contains_merge_base(),
            RevFilter::And(left, right) | RevFilter::Or(left, right) => {
                left.contains_merge_base() || right.contains_merge_base()
            }
            _ => false,
        }
    }

    /// Restart stateful filters for a new traversal
    pub(crate) fn reset(&mut self) {
        match self {
            RevFilter::MaxCount { count, .. } => *count = 0,
            RevFilter::Not(inner) => inner.reset(),
            RevFilter::And(left, right) | RevFilter::Or(left, right) => {
                left.reset();
                right.reset();
            }
            _ => {}
        }
    }
}
