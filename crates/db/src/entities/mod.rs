//! `SeaORM` entity definitions for the Tesoro schema.

pub mod accounts;
pub mod companies;
pub mod concepts;
pub mod gmf_config_concepts;
pub mod gmf_configs;
pub mod holidays;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
