//! Dependency-propagation engine.
//!
//! Given a date, an account scope, and optionally the concept whose change
//! triggered the call, the engine recomputes every derived concept in
//! topological order, applies sign normalization, and emits the entries
//! whose stored value or description actually changed, including the next
//! business day's opening balance (cross-period propagation).
//!
//! Everything here is pure: stored values arrive through an injected
//! lookup, and the caller persists the emitted changes (transactionally,
//! in the database layer).

pub mod error;
pub mod evaluator;
pub mod plan;
pub mod types;

#[cfg(test)]
mod props;

pub use error::SkipReason;
pub use evaluator::Evaluator;
pub use plan::EvaluationPlan;
pub use types::{
    AccountEvaluation, AuditAction, AuditSource, ChangedEntry, EntryAudit, RecomputeOutcome,
    RecomputeRequest, SkippedConcept, StoredValue,
};
