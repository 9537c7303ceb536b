//! `SeaORM` Entity for gmf_config_concepts join table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "gmf_config_concepts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub gmf_config_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub concept_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gmf_configs::Entity",
        from = "Column::GmfConfigId",
        to = "super::gmf_configs::Column::Id"
    )]
    GmfConfigs,
    #[sea_orm(
        belongs_to = "super::concepts::Entity",
        from = "Column::ConceptId",
        to = "super::concepts::Column::Id"
    )]
    Concepts,
}

impl Related<super::gmf_configs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GmfConfigs.def()
    }
}

impl Related<super::concepts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Concepts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
