//! Company repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tesoro_shared::types::CompanyId;
use uuid::Uuid;

use crate::entities::companies;

/// Company repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: CompanyId) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Creates a new company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        tax_id: Option<&str>,
    ) -> Result<companies::Model, DbErr> {
        let now = chrono::Utc::now().into();

        let company = companies::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            tax_id: Set(tax_id.map(ToString::to_string)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        company.insert(&self.db).await
    }

    /// Lists all active companies ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<companies::Model>, DbErr> {
        companies::Entity::find()
            .filter(companies::Column::IsActive.eq(true))
            .order_by_asc(companies::Column::Name)
            .all(&self.db)
            .await
    }
}
