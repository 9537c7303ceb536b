//! Catalog error types.

use thiserror::Error;
use tesoro_shared::types::ConceptId;

use super::concept::Area;

/// Formula parsing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    /// The function name is not one of the accepted spellings.
    #[error("unknown function {0:?}, expected SUM(...)")]
    UnknownFunction(String),

    /// The formula is not shaped like `NAME(args)`.
    #[error("malformed formula {0:?}")]
    Malformed(String),

    /// The argument list is empty.
    #[error("formula has no concept IDs")]
    EmptyArguments,

    /// An argument is not a concept ID.
    #[error("invalid concept ID {0:?}")]
    InvalidId(String),
}

/// Per-concept configuration errors.
///
/// These are fatal for the affected concept's recomputation only: the
/// concept is skipped and reported while its siblings proceed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The dependency formula could not be parsed.
    #[error("invalid dependency formula: {0}")]
    Formula(#[from] FormulaError),

    /// A concept depends on itself.
    #[error("concept depends on itself")]
    SelfReference,

    /// A dependency names a concept the catalog does not contain.
    #[error("references unknown concept {0}")]
    UnknownDependency(ConceptId),

    /// A single-parent dependency is missing its kind (or vice versa).
    #[error("dependency parent and kind must be configured together")]
    IncompleteDependency,

    /// An opening-balance concept has no closing-balance source in its area.
    #[error("no closing-balance concept covers area {area}")]
    MissingClosingSource {
        /// Area that was searched.
        area: Area,
    },

    /// More than one closing-balance concept covers the area.
    #[error("multiple closing-balance concepts cover area {area}")]
    AmbiguousClosingSource {
        /// Area that was searched.
        area: Area,
    },

    /// The concept participates in a dependency cycle.
    #[error("dependency cycle involving concepts [{}]", join_ids(.0))]
    Cycle(Vec<ConceptId>),
}

/// A configuration problem tied to one concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    /// Concept the problem belongs to.
    pub concept_id: ConceptId,
    /// What is wrong with it.
    pub error: CatalogError,
}

pub(crate) fn join_ids(ids: &[ConceptId]) -> String {
    let mut out = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&id.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_lists_members() {
        let err = CatalogError::Cycle(vec![ConceptId::new(3), ConceptId::new(7)]);
        assert_eq!(
            err.to_string(),
            "dependency cycle involving concepts [3, 7]"
        );
    }

    #[test]
    fn test_formula_error_wraps_into_catalog_error() {
        let err: CatalogError = FormulaError::EmptyArguments.into();
        assert_eq!(
            err.to_string(),
            "invalid dependency formula: formula has no concept IDs"
        );
    }
}
