//! `SeaORM` Entity for gmf_configs table.
//!
//! Per-account GMF 4x1000 configuration, versioned by effective date. The
//! base concept set lives in the gmf_config_concepts join table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gmf_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub effective_from: Date,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(has_many = "super::gmf_config_concepts::Entity")]
    GmfConfigConcepts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::gmf_config_concepts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GmfConfigConcepts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
