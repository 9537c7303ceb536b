//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sign class governing how stored amounts are normalized.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sign_class")]
pub enum SignClass {
    /// Stored non-negative.
    #[sea_orm(string_value = "inflow")]
    Inflow,
    /// Stored non-positive.
    #[sea_orm(string_value = "outflow")]
    Outflow,
    /// Computed sign preserved.
    #[sea_orm(string_value = "neutral")]
    Neutral,
}

/// Display area a concept (and its entries) belongs to.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "display_area")]
pub enum DisplayArea {
    /// The treasury sheet.
    #[sea_orm(string_value = "treasury")]
    Treasury,
    /// The payroll sheet.
    #[sea_orm(string_value = "payroll")]
    Payroll,
    /// Both sheets.
    #[sea_orm(string_value = "both")]
    Both,
}

/// Semantic role of a concept within the daily sheet.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "concept_role")]
pub enum ConceptRole {
    /// No special role.
    #[sea_orm(string_value = "none")]
    None,
    /// Carries the previous business day's closing balance forward.
    #[sea_orm(string_value = "opening_balance")]
    OpeningBalance,
    /// Source of the next business day's opening balance.
    #[sea_orm(string_value = "closing_balance")]
    ClosingBalance,
    /// GMF 4x1000 withholding over per-account configured bases.
    #[sea_orm(string_value = "gmf_tax")]
    GmfTax,
}

/// Kind of a single-parent dependency.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "dependency_kind")]
pub enum DependencyKind {
    /// Same value as the parent.
    #[sea_orm(string_value = "copy")]
    Copy,
    /// Sum of the parents (single-parent spelling of a formula).
    #[sea_orm(string_value = "sum")]
    Sum,
    /// Negated parent value.
    #[sea_orm(string_value = "subtract")]
    Subtract,
}

impl From<SignClass> for tesoro_core::catalog::SignClass {
    fn from(value: SignClass) -> Self {
        match value {
            SignClass::Inflow => Self::Inflow,
            SignClass::Outflow => Self::Outflow,
            SignClass::Neutral => Self::Neutral,
        }
    }
}

impl From<tesoro_core::catalog::SignClass> for SignClass {
    fn from(value: tesoro_core::catalog::SignClass) -> Self {
        match value {
            tesoro_core::catalog::SignClass::Inflow => Self::Inflow,
            tesoro_core::catalog::SignClass::Outflow => Self::Outflow,
            tesoro_core::catalog::SignClass::Neutral => Self::Neutral,
        }
    }
}

impl From<DisplayArea> for tesoro_core::catalog::Area {
    fn from(value: DisplayArea) -> Self {
        match value {
            DisplayArea::Treasury => Self::Treasury,
            DisplayArea::Payroll => Self::Payroll,
            DisplayArea::Both => Self::Both,
        }
    }
}

impl From<tesoro_core::catalog::Area> for DisplayArea {
    fn from(value: tesoro_core::catalog::Area) -> Self {
        match value {
            tesoro_core::catalog::Area::Treasury => Self::Treasury,
            tesoro_core::catalog::Area::Payroll => Self::Payroll,
            tesoro_core::catalog::Area::Both => Self::Both,
        }
    }
}

impl From<ConceptRole> for tesoro_core::catalog::ConceptRole {
    fn from(value: ConceptRole) -> Self {
        match value {
            ConceptRole::None => Self::None,
            ConceptRole::OpeningBalance => Self::OpeningBalance,
            ConceptRole::ClosingBalance => Self::ClosingBalance,
            ConceptRole::GmfTax => Self::GmfTax,
        }
    }
}

impl From<tesoro_core::catalog::ConceptRole> for ConceptRole {
    fn from(value: tesoro_core::catalog::ConceptRole) -> Self {
        match value {
            tesoro_core::catalog::ConceptRole::None => Self::None,
            tesoro_core::catalog::ConceptRole::OpeningBalance => Self::OpeningBalance,
            tesoro_core::catalog::ConceptRole::ClosingBalance => Self::ClosingBalance,
            tesoro_core::catalog::ConceptRole::GmfTax => Self::GmfTax,
        }
    }
}

impl From<DependencyKind> for tesoro_core::catalog::DependencyKind {
    fn from(value: DependencyKind) -> Self {
        match value {
            DependencyKind::Copy => Self::Copy,
            DependencyKind::Sum => Self::Sum,
            DependencyKind::Subtract => Self::Subtract,
        }
    }
}

impl From<tesoro_core::catalog::DependencyKind> for DependencyKind {
    fn from(value: tesoro_core::catalog::DependencyKind) -> Self {
        match value {
            tesoro_core::catalog::DependencyKind::Copy => Self::Copy,
            tesoro_core::catalog::DependencyKind::Sum => Self::Sum,
            tesoro_core::catalog::DependencyKind::Subtract => Self::Subtract,
        }
    }
}
