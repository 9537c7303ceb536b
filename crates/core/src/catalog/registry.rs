//! The loaded concept catalog.

use std::collections::{BTreeMap, BTreeSet};

use tesoro_shared::types::ConceptId;

use super::concept::{Area, Concept, ConceptDefinition, ConceptRole, Dependency, DependencyKind};
use super::error::{CatalogError, CatalogIssue};
use super::formula::parse_formula;

/// Parsed, validated concept catalog.
///
/// Loading is tolerant: a definition with a broken dependency keeps its
/// metadata but loses the dependency, so the engine leaves its values
/// alone, and the problem is recorded as an issue for reporting. Roles
/// take precedence over explicit dependency columns: an opening-balance
/// concept always carries forward from its area's closing balance, and a
/// GMF concept always computes from the account's overlay configuration.
#[derive(Debug, Clone)]
pub struct ConceptCatalog {
    concepts: BTreeMap<ConceptId, Concept>,
    issues: Vec<CatalogIssue>,
}

impl ConceptCatalog {
    /// Builds the catalog from stored definitions, parsing formulas and
    /// resolving semantic roles.
    #[must_use]
    pub fn load(definitions: Vec<ConceptDefinition>) -> Self {
        let known: BTreeSet<ConceptId> = definitions.iter().map(|d| d.id).collect();
        let closings: Vec<(ConceptId, Area)> = definitions
            .iter()
            .filter(|d| d.role == ConceptRole::ClosingBalance)
            .map(|d| (d.id, d.area))
            .collect();

        let mut concepts = BTreeMap::new();
        let mut issues = Vec::new();

        for def in definitions {
            let (dependency, issue) = Self::resolve_dependency(&def, &known, &closings);
            if let Some(error) = issue {
                issues.push(CatalogIssue {
                    concept_id: def.id,
                    error,
                });
            }
            concepts.insert(
                def.id,
                Concept {
                    id: def.id,
                    name: def.name,
                    sign_class: def.sign_class,
                    area: def.area,
                    role: def.role,
                    dependency,
                    display_order: def.display_order,
                },
            );
        }

        Self { concepts, issues }
    }

    fn resolve_dependency(
        def: &ConceptDefinition,
        known: &BTreeSet<ConceptId>,
        closings: &[(ConceptId, Area)],
    ) -> (Option<Dependency>, Option<CatalogError>) {
        match def.role {
            ConceptRole::OpeningBalance => {
                let candidates: Vec<ConceptId> = closings
                    .iter()
                    .filter(|&&(id, area)| id != def.id && area.covers(def.area))
                    .map(|&(id, _)| id)
                    .collect();
                match candidates.as_slice() {
                    [] => (
                        None,
                        Some(CatalogError::MissingClosingSource { area: def.area }),
                    ),
                    [closing] => (Some(Dependency::CarryForward { closing: *closing }), None),
                    _ => (
                        None,
                        Some(CatalogError::AmbiguousClosingSource { area: def.area }),
                    ),
                }
            }
            ConceptRole::GmfTax => (Some(Dependency::GmfWithholding), None),
            ConceptRole::None | ConceptRole::ClosingBalance => {
                Self::resolve_explicit(def, known)
            }
        }
    }

    fn resolve_explicit(
        def: &ConceptDefinition,
        known: &BTreeSet<ConceptId>,
    ) -> (Option<Dependency>, Option<CatalogError>) {
        if let Some(formula) = &def.formula {
            let dependency = match parse_formula(formula) {
                Ok(dep) => dep,
                Err(err) => return (None, Some(err.into())),
            };
            if let Some(error) = Self::check_reads(def.id, &dependency, known) {
                return (None, Some(error));
            }
            return (Some(dependency), None);
        }

        match (def.depends_on, def.dependency_kind) {
            (Some(parent), Some(kind)) => {
                let dependency = match kind {
                    DependencyKind::Copy => Dependency::Copy(parent),
                    DependencyKind::Sum => Dependency::Sum(vec![parent]),
                    DependencyKind::Subtract => Dependency::Subtract(parent),
                };
                if let Some(error) = Self::check_reads(def.id, &dependency, known) {
                    return (None, Some(error));
                }
                (Some(dependency), None)
            }
            (None, None) => (None, None),
            _ => (None, Some(CatalogError::IncompleteDependency)),
        }
    }

    fn check_reads(
        id: ConceptId,
        dependency: &Dependency,
        known: &BTreeSet<ConceptId>,
    ) -> Option<CatalogError> {
        for &read in dependency.same_day_reads() {
            if read == id {
                return Some(CatalogError::SelfReference);
            }
            if !known.contains(&read) {
                return Some(CatalogError::UnknownDependency(read));
            }
        }
        None
    }

    /// Looks a concept up by ID.
    #[must_use]
    pub fn get(&self, id: ConceptId) -> Option<&Concept> {
        self.concepts.get(&id)
    }

    /// All concepts, ascending by ID.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    /// Concepts whose values the engine computes.
    pub fn derived(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values().filter(|c| c.is_derived())
    }

    /// Configuration problems found while loading.
    #[must_use]
    pub fn issues(&self) -> &[CatalogIssue] {
        &self.issues
    }

    /// Number of concepts in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// Returns true if the catalog has no concepts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// The unique closing-balance concept covering the area, if any.
    #[must_use]
    pub fn closing_balance(&self, area: Area) -> Option<&Concept> {
        self.unique_role(ConceptRole::ClosingBalance, area)
    }

    /// The unique opening-balance concept covering the area, if any.
    #[must_use]
    pub fn opening_balance(&self, area: Area) -> Option<&Concept> {
        self.unique_role(ConceptRole::OpeningBalance, area)
    }

    fn unique_role(&self, role: ConceptRole, area: Area) -> Option<&Concept> {
        let mut found = None;
        for concept in self.concepts.values() {
            if concept.role == role && concept.area.covers(area) {
                if found.is_some() {
                    return None;
                }
                found = Some(concept);
            }
        }
        found
    }

    /// Opening-balance concepts paired with their closing-balance source.
    ///
    /// This drives cross-period propagation: each closing value recomputed
    /// for a date is written into the paired opening concept on the next
    /// business day.
    #[must_use]
    pub fn carry_forward_pairs(&self) -> Vec<(&Concept, ConceptId)> {
        self.concepts
            .values()
            .filter_map(|c| match c.dependency {
                Some(Dependency::CarryForward { closing }) => Some((c, closing)),
                _ => None,
            })
            .collect()
    }
}
