//! Evaluation planning: which concepts, in which order.

use std::collections::BTreeSet;

use tesoro_shared::types::ConceptId;

use crate::catalog::{ConceptCatalog, Dependency, DependencyGraph};
use crate::engine::types::SkippedConcept;

/// Topologically-ordered working set for one recomputation call.
///
/// The plan is account-independent: GMF base edges are built from the
/// union of the in-scope accounts' configurations, so a tax fed by a
/// subtotal is ordered after that subtotal for every account. Catalog load
/// issues and cycle members surface as pre-skipped concepts.
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    steps: Vec<ConceptId>,
    skipped: Vec<SkippedConcept>,
}

impl EvaluationPlan {
    /// Builds the plan.
    ///
    /// `trigger` scopes the working set to the concepts transitively
    /// depending on the changed concept; `None` keeps every derived
    /// concept. `gmf_base_ids` is the union of withholding base concepts
    /// across the accounts in scope.
    #[must_use]
    pub fn build(
        catalog: &ConceptCatalog,
        trigger: Option<ConceptId>,
        gmf_base_ids: &BTreeSet<ConceptId>,
    ) -> Self {
        let mut graph = DependencyGraph::new();
        for concept in catalog.derived() {
            graph.add_node(concept.id);
            if let Some(dependency) = &concept.dependency {
                for &read in dependency.same_day_reads() {
                    graph.add_edge(concept.id, read);
                }
                if matches!(dependency, Dependency::GmfWithholding) {
                    for &base in gmf_base_ids {
                        graph.add_edge(concept.id, base);
                    }
                }
            }
        }

        let order = graph.topological_order();

        let mut skipped: Vec<SkippedConcept> = catalog
            .issues()
            .iter()
            .map(|issue| SkippedConcept {
                concept_id: issue.concept_id,
                reason: issue.error.clone().into(),
            })
            .collect();
        if !order.cyclic.is_empty() {
            for &id in &order.cyclic {
                skipped.push(SkippedConcept {
                    concept_id: id,
                    reason: crate::catalog::CatalogError::Cycle(order.cyclic.clone()).into(),
                });
            }
        }

        let steps = match trigger {
            Some(changed) => {
                let in_scope = graph.dependents_of(changed);
                order
                    .sorted
                    .into_iter()
                    .filter(|id| in_scope.contains(id))
                    .collect()
            }
            None => order.sorted,
        };

        Self { steps, skipped }
    }

    /// Concepts to evaluate, dependencies first.
    #[must_use]
    pub fn steps(&self) -> &[ConceptId] {
        &self.steps
    }

    /// Concepts excluded up front, with reasons.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedConcept] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        Area, CatalogError, ConceptDefinition, ConceptRole, DependencyKind, SignClass,
    };
    use crate::engine::error::SkipReason;

    fn id(raw: i32) -> ConceptId {
        ConceptId::new(raw)
    }

    fn def(raw_id: i32, name: &str) -> ConceptDefinition {
        ConceptDefinition {
            id: id(raw_id),
            name: name.to_string(),
            sign_class: SignClass::Neutral,
            area: Area::Treasury,
            role: ConceptRole::None,
            depends_on: None,
            dependency_kind: None,
            formula: None,
            display_order: raw_id,
        }
    }

    fn formula(raw_id: i32, name: &str, text: &str) -> ConceptDefinition {
        ConceptDefinition {
            formula: Some(text.to_string()),
            ..def(raw_id, name)
        }
    }

    fn standard_catalog() -> ConceptCatalog {
        ConceptCatalog::load(vec![
            ConceptDefinition {
                role: ConceptRole::OpeningBalance,
                ..def(1, "Opening balance")
            },
            def(5, "Collections"),
            def(6, "Supplier payments"),
            formula(20, "Net movements", "SUM(5,6)"),
            ConceptDefinition {
                role: ConceptRole::GmfTax,
                ..def(49, "GMF 4x1000")
            },
            ConceptDefinition {
                role: ConceptRole::ClosingBalance,
                ..formula(99, "Closing balance", "SUM(1,20,49)")
            },
        ])
    }

    #[test]
    fn test_dependencies_order_before_dependents() {
        let catalog = standard_catalog();
        let plan = EvaluationPlan::build(&catalog, None, &BTreeSet::new());

        let steps = plan.steps();
        let pos = |concept: ConceptId| steps.iter().position(|&s| s == concept).unwrap();
        assert!(pos(id(20)) < pos(id(99)));
        assert!(pos(id(1)) < pos(id(99)));
        assert!(pos(id(49)) < pos(id(99)));
        assert_eq!(steps.len(), 4); // 1, 20, 49, 99
        assert!(plan.skipped().is_empty());
    }

    #[test]
    fn test_gmf_base_edges_order_tax_after_subtotal() {
        let catalog = standard_catalog();
        // Some account's config uses the net-movements subtotal as a base
        let bases: BTreeSet<ConceptId> = [id(20)].into_iter().collect();
        let plan = EvaluationPlan::build(&catalog, None, &bases);

        let steps = plan.steps();
        let pos = |concept: ConceptId| steps.iter().position(|&s| s == concept).unwrap();
        assert!(pos(id(20)) < pos(id(49)));
        assert!(pos(id(49)) < pos(id(99)));
    }

    #[test]
    fn test_trigger_scopes_to_transitive_dependents() {
        let catalog = standard_catalog();
        let plan = EvaluationPlan::build(&catalog, Some(id(5)), &BTreeSet::new());

        // 5 feeds 20 which feeds 99; the opening balance and the GMF tax
        // are untouched by a change to concept 5
        assert_eq!(plan.steps(), &[id(20), id(99)]);
    }

    #[test]
    fn test_trigger_on_gmf_base_includes_tax() {
        let catalog = standard_catalog();
        let bases: BTreeSet<ConceptId> = [id(5)].into_iter().collect();
        let plan = EvaluationPlan::build(&catalog, Some(id(5)), &bases);

        assert_eq!(plan.steps(), &[id(20), id(49), id(99)]);
    }

    #[test]
    fn test_cycle_members_are_pre_skipped() {
        let catalog = ConceptCatalog::load(vec![
            ConceptDefinition {
                depends_on: Some(id(31)),
                dependency_kind: Some(DependencyKind::Copy),
                ..def(30, "A")
            },
            ConceptDefinition {
                depends_on: Some(id(30)),
                dependency_kind: Some(DependencyKind::Copy),
                ..def(31, "B")
            },
            def(5, "Collections"),
            formula(20, "Net movements", "SUM(5)"),
        ]);
        let plan = EvaluationPlan::build(&catalog, None, &BTreeSet::new());

        assert_eq!(plan.steps(), &[id(20)]);
        let skipped: Vec<ConceptId> = plan.skipped().iter().map(|s| s.concept_id).collect();
        assert_eq!(skipped, vec![id(30), id(31)]);
        assert!(plan
            .skipped()
            .iter()
            .all(|s| matches!(s.reason, SkipReason::Configuration(CatalogError::Cycle(_)))));
    }

    #[test]
    fn test_catalog_issues_surface_as_skips() {
        let catalog = ConceptCatalog::load(vec![
            def(5, "Collections"),
            formula(20, "Broken", "SUM(999)"),
        ]);
        let plan = EvaluationPlan::build(&catalog, None, &BTreeSet::new());

        assert!(plan.steps().is_empty());
        assert_eq!(plan.skipped().len(), 1);
        assert_eq!(plan.skipped()[0].concept_id, id(20));
        assert!(matches!(
            plan.skipped()[0].reason,
            SkipReason::Configuration(CatalogError::UnknownDependency(_))
        ));
    }
}
