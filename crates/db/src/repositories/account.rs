//! Account repository for bank account database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tesoro_shared::types::{AccountId, CompanyId};
use uuid::Uuid;

use crate::entities::accounts;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Bank the account is held at.
    pub bank_name: Option<String>,
    /// Account number at the bank.
    pub account_number: Option<String>,
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateAccountInput) -> Result<accounts::Model, DbErr> {
        let now = chrono::Utc::now().into();

        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id.into_inner()),
            name: Set(input.name),
            bank_name: Set(input.bank_name),
            account_number: Set(input.account_number),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        account.insert(&self.db).await
    }

    /// Lists all active accounts of a company ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
    }

    /// Deactivates an account. Its entries stay, and dates that already
    /// have entries still recompute for it; the account just stops showing
    /// up in listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the update fails.
    pub async fn deactivate(&self, id: AccountId) -> Result<accounts::Model, DbErr> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("account {id}")))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.db).await
    }
}
