//! Filtering stages and their composition.
//!
//! A record flows through an ordered chain of stages. Each stage either keeps
//! the record (possibly transformed) or drops it with a reason. Dropping is a
//! policy decision, not an error: it never affects the run status.

mod chain;
mod stages;

pub use chain::FilterChain;
pub use stages::{BirthdayFilter, TransactionLimitFilter};

use std::fmt;

/// Why a stage dropped a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The eligibility predicate did not hold.
    NotEligible,

    /// A numeric field was at or above the configured limit.
    ThresholdExceeded,

    /// A stage-specific reason outside the built-in taxonomy.
    Other(&'static str),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotEligible => write!(f, "not eligible"),
            DropReason::ThresholdExceeded => write!(f, "threshold exceeded"),
            DropReason::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Outcome of applying one stage (or a whole chain) to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome<R> {
    /// Keep the (possibly transformed) record.
    Keep(R),

    /// Discard the record.
    Drop(DropReason),
}

impl<R> FilterOutcome<R> {
    /// Check if the record was kept.
    pub fn is_keep(&self) -> bool {
        matches!(self, FilterOutcome::Keep(_))
    }

    /// Check if the record was dropped.
    pub fn is_drop(&self) -> bool {
        matches!(self, FilterOutcome::Drop(_))
    }
}

/// One pluggable filtering unit.
///
/// `apply` must be a pure function of the record and stage-local
/// configuration; a stage must not depend on records it saw in other runs.
/// Validation failures are expressed as [`FilterOutcome::Drop`], never as
/// panics or errors.
pub trait FilterStage<R>: Send + Sync {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Keep, transform, or drop one record.
    fn apply(&self, record: R) -> FilterOutcome<R>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(DropReason::NotEligible.to_string(), "not eligible");
        assert_eq!(DropReason::ThresholdExceeded.to_string(), "threshold exceeded");
        assert_eq!(DropReason::Other("stale record").to_string(), "stale record");
    }

    #[test]
    fn test_outcome_predicates() {
        let keep: FilterOutcome<u32> = FilterOutcome::Keep(1);
        assert!(keep.is_keep());
        assert!(!keep.is_drop());

        let drop: FilterOutcome<u32> = FilterOutcome::Drop(DropReason::NotEligible);
        assert!(drop.is_drop());
        assert!(!drop.is_keep());
    }
}
