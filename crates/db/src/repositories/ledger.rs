//! Ledger entry repository: keyed upserts and daily-sheet reads.
//!
//! Every write is an upsert on the `(entry_date, concept_id, account_id)`
//! cell. Rows are replaced in place, never appended, so a date can be
//! recomputed any number of times without growing the table. The stored
//! `area` is denormalized from the concept and rewritten with the rest of
//! the row, so a concept that moves sheets takes its rows with it.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tesoro_core::catalog::{Area, Concept};
use tesoro_core::engine::{AuditAction, ChangedEntry, EntryAudit, StoredValue};
use tesoro_shared::types::{AccountId, CompanyId, ConceptId, UserId};
use uuid::Uuid;

use crate::entities::{ledger_entries, sea_orm_active_enums::DisplayArea};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Concept not found in the active catalog.
    #[error("Concept not found: {0}")]
    ConceptNotFound(ConceptId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Manual write targeted an auto-calculated concept.
    #[error("Concept {0} is auto-calculated and cannot be entered manually")]
    ManualWriteToDerived(ConceptId),

    /// Audit record serialization failed.
    #[error("Audit serialization error: {0}")]
    Audit(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a manual ledger entry.
#[derive(Debug, Clone)]
pub struct RecordEntryInput {
    /// Ledger date of the entry.
    pub date: NaiveDate,
    /// Concept the amount belongs to; must be manually enterable.
    pub concept_id: ConceptId,
    /// Account the amount belongs to.
    pub account_id: AccountId,
    /// Entered amount; the concept's sign class normalizes it on write.
    pub amount: Decimal,
    /// Free-text description of the movement.
    pub description: String,
    /// User recording the entry.
    pub recorded_by: UserId,
}

/// Ledger entry repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches one entry by its natural key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(
        &self,
        date: NaiveDate,
        concept_id: ConceptId,
        account_id: AccountId,
        area: Area,
    ) -> Result<Option<ledger_entries::Model>, DbErr> {
        Self::find_by_key(
            &self.db,
            date,
            concept_id.into_inner(),
            account_id.into_inner(),
            area.into(),
        )
        .await
    }

    /// Lists a company's entries on a date, optionally restricted to the
    /// entries visible on one area's sheet (`both` rows show everywhere).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_date(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
        area: Option<Area>,
    ) -> Result<Vec<ledger_entries::Model>, DbErr> {
        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::CompanyId.eq(company_id.into_inner()))
            .filter(ledger_entries::Column::EntryDate.eq(date));

        if let Some(area) = area {
            query = query.filter(
                ledger_entries::Column::Area.is_in([DisplayArea::from(area), DisplayArea::Both]),
            );
        }

        query
            .order_by_asc(ledger_entries::Column::ConceptId)
            .all(&self.db)
            .await
    }

    /// Account IDs with at least one entry for the company on the date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn accounts_with_entries(
        &self,
        company_id: CompanyId,
        date: NaiveDate,
    ) -> Result<Vec<AccountId>, DbErr> {
        let ids = Self::scope_accounts(&self.db, company_id.into_inner(), date).await?;
        Ok(ids.into_iter().map(AccountId::from_uuid).collect())
    }

    /// Transaction-friendly scope resolution for a whole-company run.
    pub(crate) async fn scope_accounts<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, DbErr> {
        ledger_entries::Entity::find()
            .select_only()
            .column(ledger_entries::Column::AccountId)
            .filter(ledger_entries::Column::CompanyId.eq(company_id))
            .filter(ledger_entries::Column::EntryDate.eq(date))
            .distinct()
            .order_by_asc(ledger_entries::Column::AccountId)
            .into_tuple()
            .all(conn)
            .await
    }

    /// Preloads stored values for a set of accounts over the dates one
    /// recompute can touch: the date itself and its business-day
    /// neighbors.
    pub(crate) async fn load_window<C: ConnectionTrait>(
        conn: &C,
        account_ids: &[Uuid],
        dates: &[NaiveDate],
    ) -> Result<HashMap<(Uuid, ConceptId, NaiveDate), StoredValue>, DbErr> {
        if account_ids.is_empty() || dates.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountId.is_in(account_ids.iter().copied()))
            .filter(ledger_entries::Column::EntryDate.is_in(dates.iter().copied()))
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    (
                        row.account_id,
                        ConceptId::new(row.concept_id),
                        row.entry_date,
                    ),
                    StoredValue {
                        amount: row.amount,
                        description: row.description,
                        area: row.area.into(),
                    },
                )
            })
            .collect())
    }

    /// Applies one engine-emitted change as an upsert with a `recomputed`
    /// audit record.
    pub(crate) async fn apply_change<C: ConnectionTrait>(
        conn: &C,
        change: &ChangedEntry,
        company_id: Uuid,
        requested_by: Option<UserId>,
    ) -> Result<(), LedgerError> {
        let audit = EntryAudit {
            action: AuditAction::Recomputed,
            acting_user: requested_by,
            at: chrono::Utc::now(),
            source: change.source.clone(),
        };
        let audit = serde_json::to_value(&audit)?;

        let existing = Self::find_by_cell(
            conn,
            change.date,
            change.concept_id.into_inner(),
            change.account_id.into_inner(),
        )
        .await?;

        let now = chrono::Utc::now();
        if let Some(row) = existing {
            let mut entry: ledger_entries::ActiveModel = row.into();
            entry.area = Set(change.area.into());
            entry.amount = Set(change.new_amount);
            entry.description = Set(change.description.clone());
            entry.audit = Set(audit);
            entry.updated_at = Set(now.into());
            entry.update(conn).await?;
        } else {
            let entry = ledger_entries::ActiveModel {
                id: Set(Uuid::new_v4()),
                entry_date: Set(change.date),
                concept_id: Set(change.concept_id.into_inner()),
                account_id: Set(change.account_id.into_inner()),
                company_id: Set(company_id),
                area: Set(change.area.into()),
                amount: Set(change.new_amount),
                description: Set(change.description.clone()),
                audit: Set(audit),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            entry.insert(conn).await?;
        }

        Ok(())
    }

    /// Upserts a manual entry for a base concept.
    ///
    /// The concept's sign class normalizes the amount on write, and the
    /// audit records who entered it and whether the row existed before.
    pub(crate) async fn record_in<C: ConnectionTrait>(
        conn: &C,
        concept: &Concept,
        company_id: Uuid,
        input: &RecordEntryInput,
    ) -> Result<ledger_entries::Model, LedgerError> {
        let amount = concept.sign_class.normalize(input.amount);

        let existing = Self::find_by_cell(
            conn,
            input.date,
            input.concept_id.into_inner(),
            input.account_id.into_inner(),
        )
        .await?;

        let action = if existing.is_some() {
            AuditAction::Updated
        } else {
            AuditAction::Created
        };
        let audit = EntryAudit {
            action,
            acting_user: Some(input.recorded_by),
            at: chrono::Utc::now(),
            source: None,
        };
        let audit = serde_json::to_value(&audit)?;

        let now = chrono::Utc::now();
        let model = if let Some(row) = existing {
            let mut entry: ledger_entries::ActiveModel = row.into();
            entry.area = Set(concept.area.into());
            entry.amount = Set(amount);
            entry.description = Set(input.description.clone());
            entry.audit = Set(audit);
            entry.updated_at = Set(now.into());
            entry.update(conn).await?
        } else {
            let entry = ledger_entries::ActiveModel {
                id: Set(Uuid::new_v4()),
                entry_date: Set(input.date),
                concept_id: Set(input.concept_id.into_inner()),
                account_id: Set(input.account_id.into_inner()),
                company_id: Set(company_id),
                area: Set(concept.area.into()),
                amount: Set(amount),
                description: Set(input.description.clone()),
                audit: Set(audit),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            entry.insert(conn).await?
        };

        Ok(model)
    }

    /// Cell lookup backing the upserts. Area is not part of the key: it
    /// follows the concept definition, and the write paths rewrite it in
    /// place when the definition moved to another sheet.
    async fn find_by_cell<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
        concept_id: i32,
        account_id: Uuid,
    ) -> Result<Option<ledger_entries::Model>, DbErr> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::EntryDate.eq(date))
            .filter(ledger_entries::Column::ConceptId.eq(concept_id))
            .filter(ledger_entries::Column::AccountId.eq(account_id))
            .order_by_desc(ledger_entries::Column::UpdatedAt)
            .one(conn)
            .await
    }

    async fn find_by_key<C: ConnectionTrait>(
        conn: &C,
        date: NaiveDate,
        concept_id: i32,
        account_id: Uuid,
        area: DisplayArea,
    ) -> Result<Option<ledger_entries::Model>, DbErr> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::EntryDate.eq(date))
            .filter(ledger_entries::Column::ConceptId.eq(concept_id))
            .filter(ledger_entries::Column::AccountId.eq(account_id))
            .filter(ledger_entries::Column::Area.eq(area))
            .one(conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tesoro_core::engine::AuditSource;

    #[test]
    fn test_engine_audit_serializes_with_source() {
        let audit = EntryAudit {
            action: AuditAction::Recomputed,
            acting_user: None,
            at: chrono::Utc::now(),
            source: Some(AuditSource {
                concept_ids: vec![ConceptId::new(5), ConceptId::new(6)],
                raw_amount: dec!(800000),
            }),
        };

        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["action"], "recomputed");
        assert!(value.get("acting_user").is_none(), "system runs omit the user");
        assert_eq!(value["source"]["concept_ids"], serde_json::json!([5, 6]));
        assert_eq!(value["source"]["raw_amount"], serde_json::json!("800000"));
    }

    #[test]
    fn test_manual_audit_serializes_acting_user_without_source() {
        let user = UserId::new();
        let audit = EntryAudit {
            action: AuditAction::Created,
            acting_user: Some(user),
            at: chrono::Utc::now(),
            source: None,
        };

        let value = serde_json::to_value(&audit).unwrap();
        assert_eq!(value["action"], "created");
        assert_eq!(
            value["acting_user"],
            serde_json::json!(user.into_inner().to_string())
        );
        assert!(value.get("source").is_none());
    }
}
