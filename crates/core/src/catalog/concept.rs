//! Concept domain types: sign classes, display areas, roles, dependencies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tesoro_shared::types::ConceptId;

/// How a concept's stored amount is signed.
///
/// The stored sign comes from the class, never from the arithmetic that
/// produced the amount: inflows are kept non-negative, outflows
/// non-positive, and neutral concepts (balances, subtotals spanning both
/// directions) keep whatever sign the computation yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignClass {
    /// Money coming in; stored non-negative.
    Inflow,
    /// Money going out; stored non-positive.
    Outflow,
    /// Balances and mixed subtotals; computed sign preserved exactly.
    Neutral,
}

impl SignClass {
    /// Applies the class to a computed amount.
    #[must_use]
    pub fn normalize(self, amount: Decimal) -> Decimal {
        match self {
            Self::Inflow => amount.abs(),
            Self::Outflow => -amount.abs(),
            Self::Neutral => amount,
        }
    }
}

impl std::fmt::Display for SignClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
            Self::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}

/// Display area a concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// Treasury cash-flow sheet.
    Treasury,
    /// Payroll disbursement sheet.
    Payroll,
    /// Shown on both sheets.
    Both,
}

impl Area {
    /// Returns true if a concept in this area serves the given area.
    ///
    /// `Both` covers everything; otherwise areas must match exactly.
    #[must_use]
    pub fn covers(self, other: Area) -> bool {
        self == Area::Both || self == other
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Treasury => "treasury",
            Self::Payroll => "payroll",
            Self::Both => "both",
        };
        write!(f, "{s}")
    }
}

/// Semantic role markers, resolved from the catalog instead of hard-coded
/// concept IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptRole {
    /// Ordinary concept with no special role.
    None,
    /// Day-opening balance; sourced from the previous business day's closing.
    OpeningBalance,
    /// Day-closing balance; its value rolls into the next business day.
    ClosingBalance,
    /// GMF 4x1000 withholding; its base set comes from per-account config.
    GmfTax,
}

/// Single-parent dependency kinds as administered on a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Take the parent's value as-is.
    Copy,
    /// Sum the parent(s); multi-parent sums use a formula instead.
    Sum,
    /// Take the parent's value negated.
    Subtract,
}

/// Typed dependency descriptor, parsed once at catalog load.
///
/// Replaces the raw formula strings and hard-coded ID constants of older
/// treasury sheets: every evaluation reads this enum, never the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum Dependency {
    /// Value copied from one parent concept.
    Copy(ConceptId),
    /// Sum over the listed concepts; missing entries count as zero.
    Sum(Vec<ConceptId>),
    /// Parent concept's value, negated.
    Subtract(ConceptId),
    /// Previous business day's value of the named closing-balance concept.
    CarryForward {
        /// Closing-balance concept the value is carried from.
        closing: ConceptId,
    },
    /// GMF 4x1000 over the account's configured base concepts.
    GmfWithholding,
}

impl Dependency {
    /// Same-day concepts this dependency reads.
    ///
    /// Carry-forward reads a prior day and GMF bases are per-account
    /// configuration, so neither contributes static same-day edges.
    #[must_use]
    pub fn same_day_reads(&self) -> &[ConceptId] {
        match self {
            Self::Copy(id) | Self::Subtract(id) => std::slice::from_ref(id),
            Self::Sum(ids) => ids.as_slice(),
            Self::CarryForward { .. } | Self::GmfWithholding => &[],
        }
    }
}

/// A catalog concept with its dependency fully resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Stable integer identifier.
    pub id: ConceptId,
    /// Human-readable name shown on the sheet.
    pub name: String,
    /// Sign normalization class.
    pub sign_class: SignClass,
    /// Display area.
    pub area: Area,
    /// Semantic role.
    pub role: ConceptRole,
    /// Resolved dependency; `None` for base (manually entered) concepts.
    pub dependency: Option<Dependency>,
    /// Ordering of the row on the sheet.
    pub display_order: i32,
}

impl Concept {
    /// Returns true if this concept's value is computed by the engine.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.dependency.is_some()
    }
}

/// Raw concept definition as administered and stored.
///
/// The dependency is still in storage form here: an optional single parent
/// with a kind, or an unparsed formula string. [`super::ConceptCatalog`]
/// turns definitions into [`Concept`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptDefinition {
    /// Stable integer identifier.
    pub id: ConceptId,
    /// Human-readable name.
    pub name: String,
    /// Sign normalization class.
    pub sign_class: SignClass,
    /// Display area.
    pub area: Area,
    /// Semantic role.
    pub role: ConceptRole,
    /// Single parent concept, when the dependency fits one column.
    pub depends_on: Option<ConceptId>,
    /// Kind for the single-parent dependency.
    pub dependency_kind: Option<DependencyKind>,
    /// Multi-concept formula, e.g. `SUM(5,6,7)`.
    pub formula: Option<String>,
    /// Ordering of the row on the sheet.
    pub display_order: i32,
}
