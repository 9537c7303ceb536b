//! Engine request, outcome, and audit types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tesoro_shared::types::{AccountId, CompanyId, ConceptId, UserId};

use crate::catalog::Area;
use crate::engine::error::SkipReason;

/// Parameters of one recomputation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeRequest {
    /// Ledger date to recompute.
    pub date: NaiveDate,
    /// Company whose accounts are in scope.
    pub company_id: CompanyId,
    /// Accounts to recompute; `None` means every company account with an
    /// entry on the date.
    pub account_ids: Option<Vec<AccountId>>,
    /// Concept whose change triggered the call. Scopes the working set to
    /// its transitive dependents; `None` recomputes every derived concept.
    pub triggering_concept_id: Option<ConceptId>,
    /// User on whose behalf the recomputation runs, for the audit trail.
    pub requested_by: Option<UserId>,
}

impl RecomputeRequest {
    /// Request recomputing everything for a date and company.
    #[must_use]
    pub fn full(date: NaiveDate, company_id: CompanyId) -> Self {
        Self {
            date,
            company_id,
            account_ids: None,
            triggering_concept_id: None,
            requested_by: None,
        }
    }
}

/// Stored entry state the engine compares against before emitting a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    /// Stored amount (already sign-normalized).
    pub amount: Decimal,
    /// Stored provenance description.
    pub description: String,
    /// Area the row is stored under. Compared against the concept's
    /// current area so a moved concept rewrites its rows in place.
    pub area: Area,
}

/// One entry whose stored state must change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntry {
    /// Date the entry lives on. Differs from the recomputed date for
    /// carried-forward opening balances, which land on the next business
    /// day.
    pub date: NaiveDate,
    /// Concept being written.
    pub concept_id: ConceptId,
    /// Account being written.
    pub account_id: AccountId,
    /// Display area denormalized from the concept.
    pub area: Area,
    /// Previously stored amount; `None` when no entry existed.
    pub previous_amount: Option<Decimal>,
    /// New amount, sign-normalized.
    pub new_amount: Decimal,
    /// Provenance description stating the value is auto-computed and from
    /// what.
    pub description: String,
    /// Derivation inputs for the audit trail.
    pub source: Option<AuditSource>,
}

/// A derived concept the engine could not evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedConcept {
    /// Concept that was skipped.
    pub concept_id: ConceptId,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Everything one account's evaluation produced.
#[derive(Debug, Clone, Default)]
pub struct AccountEvaluation {
    /// Entries to upsert, in evaluation order.
    pub changes: Vec<ChangedEntry>,
    /// Concepts skipped with their reasons.
    pub skipped: Vec<SkippedConcept>,
}

/// Result of one recomputation call across all accounts in scope.
#[derive(Debug, Clone, Default)]
pub struct RecomputeOutcome {
    /// Every entry that changed, in evaluation order per account.
    pub changes: Vec<ChangedEntry>,
    /// Concepts skipped with their reasons, deduplicated across accounts.
    pub skipped: Vec<SkippedConcept>,
}

impl RecomputeOutcome {
    /// Returns true if nothing changed and nothing was skipped.
    #[must_use]
    pub fn is_clean_noop(&self) -> bool {
        self.changes.is_empty() && self.skipped.is_empty()
    }
}

/// What kind of write produced an entry's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Manual entry created.
    Created,
    /// Manual entry updated.
    Updated,
    /// Written by the recomputation engine.
    Recomputed,
}

/// Derivation inputs recorded alongside a computed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSource {
    /// Concepts the value was derived from.
    pub concept_ids: Vec<ConceptId>,
    /// Raw computed amount before sign normalization (for GMF, the base
    /// sum before applying the rate).
    pub raw_amount: Decimal,
}

/// Structured audit record stamped on every entry write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryAudit {
    /// What kind of write this was.
    pub action: AuditAction,
    /// User on whose behalf the write happened; `None` for system runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<UserId>,
    /// When the write happened.
    pub at: DateTime<Utc>,
    /// Derivation inputs, present for engine-computed values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AuditSource>,
}
