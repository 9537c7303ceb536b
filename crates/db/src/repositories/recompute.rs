//! Recomputation service tying the evaluation engine to storage.
//!
//! One call wraps scope resolution, config lookup, the stored-value
//! preload, evaluation, and every resulting upsert in a single database
//! transaction, so readers never observe a date half-recomputed.

use std::collections::{BTreeSet, HashSet};

use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use tesoro_core::catalog::ConceptCatalog;
use tesoro_core::engine::{
    EvaluationPlan, Evaluator, RecomputeOutcome, RecomputeRequest, SkippedConcept,
};
use tesoro_core::tax::applicable_config;
use tesoro_shared::types::{AccountId, CompanyId, ConceptId};
use uuid::Uuid;

use crate::entities::accounts;

use super::catalog::ConceptRepository;
use super::gmf_config::GmfConfigRepository;
use super::holiday::HolidayRepository;
use super::ledger::{LedgerError, LedgerRepository, RecordEntryInput};

/// Error types for recomputation calls.
#[derive(Debug, thiserror::Error)]
pub enum RecomputeError {
    /// Ledger validation or write failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Service running recomputations against the store.
#[derive(Clone)]
pub struct RecomputeService {
    db: DatabaseConnection,
    concepts: ConceptRepository,
}

impl RecomputeService {
    /// Creates a recomputation service with its own catalog cache.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let concepts = ConceptRepository::new(db.clone());
        Self { db, concepts }
    }

    /// Creates a service sharing a concept repository, so catalog
    /// invalidations from administration reach this service's cache.
    #[must_use]
    pub fn with_concepts(db: DatabaseConnection, concepts: ConceptRepository) -> Self {
        Self { db, concepts }
    }

    /// Recomputes the derived concepts in scope for one date.
    ///
    /// Returns what changed and what was skipped. A rerun over unchanged
    /// inputs returns an empty outcome and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] when an explicitly scoped
    /// account does not belong to the requested company, or an error if a
    /// database operation fails; the transaction is rolled back and no
    /// partial writes remain.
    pub async fn recompute_for_date(
        &self,
        request: &RecomputeRequest,
    ) -> Result<RecomputeOutcome, RecomputeError> {
        let catalog = self.concepts.catalog().await?;

        let txn = self.db.begin().await?;
        let outcome = Self::recompute_in(&txn, &catalog, request).await?;
        txn.commit().await?;

        Ok(outcome)
    }

    /// Records a manual entry and recomputes its dependents, atomically.
    ///
    /// The entry and every derived value it touches land in one
    /// transaction: no reader sees the manual amount without its
    /// recomputed dependents.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ConceptNotFound`] for an unknown concept,
    /// [`LedgerError::ManualWriteToDerived`] when the concept is
    /// auto-calculated, [`LedgerError::AccountNotFound`] for an unknown
    /// account, or a database error.
    pub async fn record_and_recompute(
        &self,
        input: RecordEntryInput,
    ) -> Result<RecomputeOutcome, RecomputeError> {
        let catalog = self.concepts.catalog().await?;

        let concept = catalog
            .get(input.concept_id)
            .ok_or(LedgerError::ConceptNotFound(input.concept_id))?;
        if concept.is_derived() {
            return Err(LedgerError::ManualWriteToDerived(input.concept_id).into());
        }

        let txn = self.db.begin().await?;

        let account = accounts::Entity::find_by_id(input.account_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(LedgerError::AccountNotFound(input.account_id))?;

        LedgerRepository::record_in(&txn, concept, account.company_id, &input).await?;
        tracing::info!(
            date = %input.date,
            concept_id = %input.concept_id,
            account_id = %input.account_id,
            "Manual entry recorded"
        );

        let request = RecomputeRequest {
            date: input.date,
            company_id: CompanyId::from_uuid(account.company_id),
            account_ids: Some(vec![input.account_id]),
            triggering_concept_id: Some(input.concept_id),
            requested_by: Some(input.recorded_by),
        };
        let outcome = Self::recompute_in(&txn, &catalog, &request).await?;

        txn.commit().await?;

        Ok(outcome)
    }

    /// Runs one recomputation inside an open transaction.
    async fn recompute_in(
        txn: &DatabaseTransaction,
        catalog: &ConceptCatalog,
        request: &RecomputeRequest,
    ) -> Result<RecomputeOutcome, RecomputeError> {
        let calendar = HolidayRepository::load_calendar(txn).await?;

        let account_ids: Vec<Uuid> = match &request.account_ids {
            Some(ids) => Self::verify_scope(txn, request.company_id.into_inner(), ids).await?,
            None => {
                LedgerRepository::scope_accounts(txn, request.company_id.into_inner(), request.date)
                    .await?
            }
        };

        let mut outcome = RecomputeOutcome::default();
        if account_ids.is_empty() {
            return Ok(outcome);
        }

        // GMF edges come from the union of the in-scope accounts'
        // applicable configurations, so the plan is shared by all accounts
        let typed_accounts: Vec<AccountId> = account_ids
            .iter()
            .copied()
            .map(AccountId::from_uuid)
            .collect();
        let configs = GmfConfigRepository::load_for_accounts(txn, &typed_accounts).await?;
        let mut gmf_bases: BTreeSet<ConceptId> = BTreeSet::new();
        for &account_id in &typed_accounts {
            if let Some(config) = applicable_config(&configs, account_id, request.date) {
                gmf_bases.extend(config.base_concepts.iter().copied());
            }
        }

        let plan = EvaluationPlan::build(catalog, request.triggering_concept_id, &gmf_bases);
        outcome.skipped.extend(plan.skipped().iter().cloned());

        let evaluator = Evaluator::new(catalog, &calendar, request.date);

        // Stored state the evaluation can read: the date itself, the
        // previous business day (carry-forward source), and the next one
        // (propagated opening balances)
        let mut dates = vec![request.date];
        if let Ok(previous) = calendar.previous_business_day(request.date, false) {
            dates.push(previous);
        }
        if let Ok(next) = calendar.next_business_day(request.date, false) {
            dates.push(next);
        }
        let window = LedgerRepository::load_window(txn, &account_ids, &dates).await?;

        for &account_uuid in &account_ids {
            let account_id = AccountId::from_uuid(account_uuid);
            let gmf_config = applicable_config(&configs, account_id, request.date);

            let evaluation =
                evaluator.evaluate_account(&plan, account_id, gmf_config, |concept_id, date| {
                    window.get(&(account_uuid, concept_id, date)).cloned()
                });

            for change in &evaluation.changes {
                LedgerRepository::apply_change(
                    txn,
                    change,
                    request.company_id.into_inner(),
                    request.requested_by,
                )
                .await?;
            }
            outcome.changes.extend(evaluation.changes);
            merge_skips(&mut outcome.skipped, evaluation.skipped);
        }

        for skip in &outcome.skipped {
            tracing::warn!(
                concept_id = %skip.concept_id,
                reason = %skip.reason,
                "Concept skipped during recomputation"
            );
        }
        tracing::info!(
            date = %request.date,
            accounts = account_ids.len(),
            changes = outcome.changes.len(),
            skipped = outcome.skipped.len(),
            "Recomputation applied"
        );

        Ok(outcome)
    }

    /// Resolves an explicitly requested account scope, rejecting IDs that
    /// do not belong to the company stamped on the resulting rows.
    /// Duplicates collapse to one evaluation.
    async fn verify_scope(
        txn: &DatabaseTransaction,
        company_id: Uuid,
        ids: &[AccountId],
    ) -> Result<Vec<Uuid>, RecomputeError> {
        let requested: Vec<Uuid> = ids.iter().copied().map(AccountId::into_inner).collect();
        let owned: HashSet<Uuid> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Id)
            .filter(accounts::Column::Id.is_in(requested.iter().copied()))
            .filter(accounts::Column::CompanyId.eq(company_id))
            .into_tuple()
            .all(txn)
            .await?
            .into_iter()
            .collect();

        let mut verified = Vec::with_capacity(requested.len());
        for id in requested {
            if !owned.contains(&id) {
                return Err(LedgerError::AccountNotFound(AccountId::from_uuid(id)).into());
            }
            if !verified.contains(&id) {
                verified.push(id);
            }
        }
        Ok(verified)
    }
}

/// Appends skips not already reported for the same concept.
///
/// Account-independent problems (a bad formula, a calendar scan failure)
/// would otherwise repeat once per account in scope.
fn merge_skips(all: &mut Vec<SkippedConcept>, new: Vec<SkippedConcept>) {
    for skip in new {
        if !all.iter().any(|s| s.concept_id == skip.concept_id) {
            all.push(skip);
        }
    }
}
