//! GMF 4x1000 configuration repository.
//!
//! Configuration versions are append-only: changing an account's base set
//! means inserting a new version with a later `effective_from`, so past
//! recomputes stay explainable.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tesoro_core::tax::GmfConfig;
use tesoro_shared::types::{AccountId, ConceptId, UserId};
use uuid::Uuid;

use crate::entities::{gmf_config_concepts, gmf_configs};

/// Input for creating a GMF configuration version.
#[derive(Debug, Clone)]
pub struct CreateGmfConfigInput {
    /// Account the configuration applies to.
    pub account_id: AccountId,
    /// First date this version is in force.
    pub effective_from: chrono::NaiveDate,
    /// Concepts whose signed sum forms the withholding base.
    pub base_concepts: Vec<ConceptId>,
    /// User who created the version, when known.
    pub created_by: Option<UserId>,
}

/// Repository for per-account GMF base-set configuration.
#[derive(Debug, Clone)]
pub struct GmfConfigRepository {
    db: DatabaseConnection,
}

impl GmfConfigRepository {
    /// Creates a new GMF configuration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a configuration version together with its base concepts.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when a version for
    /// the same account and effective date already exists.
    pub async fn create(&self, input: CreateGmfConfigInput) -> Result<gmf_configs::Model, DbErr> {
        let now = chrono::Utc::now();

        let txn = self.db.begin().await?;

        let config = gmf_configs::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(input.account_id.into_inner()),
            effective_from: Set(input.effective_from),
            created_by: Set(input.created_by.map(UserId::into_inner)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let config = config.insert(&txn).await?;

        for concept_id in input.base_concepts {
            let link = gmf_config_concepts::ActiveModel {
                gmf_config_id: Set(config.id),
                concept_id: Set(concept_id.into_inner()),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(config)
    }

    /// Loads every configuration version for the given accounts, in the
    /// engine's config form.
    ///
    /// Version selection per date happens in the engine
    /// ([`tesoro_core::tax::applicable_config`]); this returns the full
    /// history so one load serves any evaluation date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn configs_for_accounts(
        &self,
        account_ids: &[AccountId],
    ) -> Result<Vec<GmfConfig>, DbErr> {
        Self::load_for_accounts(&self.db, account_ids).await
    }

    /// Transaction-friendly variant of [`Self::configs_for_accounts`].
    pub(crate) async fn load_for_accounts<C: ConnectionTrait>(
        conn: &C,
        account_ids: &[AccountId],
    ) -> Result<Vec<GmfConfig>, DbErr> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = account_ids
            .iter()
            .copied()
            .map(AccountId::into_inner)
            .collect();

        let rows = gmf_configs::Entity::find()
            .filter(gmf_configs::Column::AccountId.is_in(ids))
            .find_with_related(gmf_config_concepts::Entity)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(config, links)| config_from_rows(&config, links))
            .collect())
    }
}

/// Maps a configuration row and its base-concept links to the engine type.
fn config_from_rows(
    config: &gmf_configs::Model,
    links: Vec<gmf_config_concepts::Model>,
) -> GmfConfig {
    let mut base_concepts: Vec<ConceptId> = links
        .into_iter()
        .map(|link| ConceptId::new(link.concept_id))
        .collect();
    base_concepts.sort_unstable();

    GmfConfig {
        account_id: AccountId::from_uuid(config.account_id),
        effective_from: config.effective_from,
        base_concepts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_config_from_rows_sorts_base_concepts() {
        let config_id = Uuid::new_v4();
        let account_id = Uuid::new_v4();
        let config = gmf_configs::Model {
            id: config_id,
            account_id,
            effective_from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            created_by: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };
        let links = vec![
            gmf_config_concepts::Model {
                gmf_config_id: config_id,
                concept_id: 7,
            },
            gmf_config_concepts::Model {
                gmf_config_id: config_id,
                concept_id: 5,
            },
            gmf_config_concepts::Model {
                gmf_config_id: config_id,
                concept_id: 6,
            },
        ];

        let mapped = config_from_rows(&config, links);
        assert_eq!(mapped.account_id, AccountId::from_uuid(account_id));
        assert_eq!(
            mapped.base_concepts,
            vec![ConceptId::new(5), ConceptId::new(6), ConceptId::new(7)]
        );
    }

    #[test]
    fn test_config_from_rows_empty_base() {
        let config = gmf_configs::Model {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            created_by: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        let mapped = config_from_rows(&config, vec![]);
        assert!(mapped.base_concepts.is_empty());
    }
}
