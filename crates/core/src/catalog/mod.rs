//! Ledger concepts and their dependency graph.
//!
//! A concept is one row of the daily cash-flow sheet (a balance, a movement
//! category, a subtotal, a tax). Derived concepts carry a typed dependency
//! descriptor, parsed once when the catalog loads; the engine walks these
//! descriptors in topological order.

pub mod concept;
pub mod error;
pub mod formula;
pub mod graph;
pub mod registry;

pub use concept::{
    Area, Concept, ConceptDefinition, ConceptRole, Dependency, DependencyKind, SignClass,
};
pub use error::{CatalogError, CatalogIssue, FormulaError};
pub use formula::parse_formula;
pub use graph::{DependencyGraph, TopologicalOrder};
pub use registry::ConceptCatalog;
