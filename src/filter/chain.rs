//! Ordered composition of filter stages.

use crate::filter::{FilterOutcome, FilterStage};
use crate::record::Record;

/// An ordered chain of filter stages.
///
/// A record survives only if every stage keeps it; the output of stage *i*
/// feeds stage *i + 1*, so stage order is semantically significant when
/// stages transform fields later stages read. The chain short-circuits at the
/// first drop and introduces no drop reasons of its own.
pub struct FilterChain<R> {
    stages: Vec<Box<dyn FilterStage<R>>>,
}

impl<R: Record> FilterChain<R> {
    /// Create a chain from stages in application order.
    pub fn new(stages: Vec<Box<dyn FilterStage<R>>>) -> Self {
        Self { stages }
    }

    /// Thread a record through every stage, short-circuiting on the first
    /// drop.
    pub fn apply(&self, record: R) -> FilterOutcome<R> {
        let mut current = record;
        for stage in &self.stages {
            let id = current.identity();
            match stage.apply(current) {
                FilterOutcome::Keep(next) => current = next,
                FilterOutcome::Drop(reason) => {
                    tracing::debug!(
                        "record {} dropped by stage '{}': {}",
                        id,
                        stage.name(),
                        reason
                    );
                    return FilterOutcome::Drop(reason);
                }
            }
        }
        FilterOutcome::Keep(current)
    }

    /// Number of stages in the chain.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
