//! `SeaORM` Entity for concepts table.
//!
//! Concept IDs are stable integers managed with the catalog itself, not
//! generated by the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ConceptRole, DependencyKind, DisplayArea, SignClass};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "concepts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub sign_class: SignClass,
    pub area: DisplayArea,
    pub role: ConceptRole,
    pub depends_on_concept_id: Option<i32>,
    pub dependency_kind: Option<DependencyKind>,
    pub dependency_formula: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
    #[sea_orm(has_many = "super::gmf_config_concepts::Entity")]
    GmfConfigConcepts,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::gmf_config_concepts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GmfConfigConcepts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
