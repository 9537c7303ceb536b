//! Holiday repository feeding the business-day calendar.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tesoro_core::calendar::BusinessDayCalendar;
use uuid::Uuid;

use crate::entities::holidays;

/// Holiday repository for calendar maintenance.
#[derive(Debug, Clone)]
pub struct HolidayRepository {
    db: DatabaseConnection,
}

impl HolidayRepository {
    /// Creates a new holiday repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a holiday. Returns the existing row when the date is already
    /// registered, so seeding is idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn add(&self, date: NaiveDate, name: &str) -> Result<holidays::Model, DbErr> {
        if let Some(existing) = holidays::Entity::find()
            .filter(holidays::Column::HolidayDate.eq(date))
            .one(&self.db)
            .await?
        {
            return Ok(existing);
        }

        let holiday = holidays::ActiveModel {
            id: Set(Uuid::new_v4()),
            holiday_date: Set(date),
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        };

        holiday.insert(&self.db).await
    }

    /// Lists all holidays ordered by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<holidays::Model>, DbErr> {
        holidays::Entity::find()
            .order_by_asc(holidays::Column::HolidayDate)
            .all(&self.db)
            .await
    }

    /// Builds the business-day calendar from the active holidays.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn calendar(&self) -> Result<BusinessDayCalendar, DbErr> {
        Self::load_calendar(&self.db).await
    }

    /// Loads the calendar through an arbitrary connection, so the
    /// recompute service can read it inside its transaction.
    pub(crate) async fn load_calendar<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<BusinessDayCalendar, DbErr> {
        let rows = holidays::Entity::find()
            .filter(holidays::Column::IsActive.eq(true))
            .all(conn)
            .await?;

        Ok(BusinessDayCalendar::new(
            rows.into_iter().map(|h| h.holiday_date),
        ))
    }
}
