//! Dependency graph ordering.

use std::collections::{BTreeMap, BTreeSet};

use tesoro_shared::types::ConceptId;

/// Same-day dependency edges between derived concepts.
///
/// Nodes are the concepts to be evaluated. Edges point from a dependent to
/// a concept it reads; edges to concepts outside the node set (base
/// concepts, which are never evaluated) do not constrain ordering.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    reads: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
}

/// Result of a topological sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Evaluation order; every dependency comes before its dependents.
    pub sorted: Vec<ConceptId>,
    /// Nodes that could not be ordered: cycle members plus anything that
    /// reads them, ascending by ID.
    pub cyclic: Vec<ConceptId>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a concept to be ordered.
    pub fn add_node(&mut self, id: ConceptId) {
        self.reads.entry(id).or_default();
    }

    /// Records that `dependent` reads `dependency`.
    pub fn add_edge(&mut self, dependent: ConceptId, dependency: ConceptId) {
        self.reads.entry(dependent).or_default().insert(dependency);
    }

    /// Returns true if the concept was added as a node.
    #[must_use]
    pub fn contains(&self, id: ConceptId) -> bool {
        self.reads.contains_key(&id)
    }

    /// Orders the nodes with Kahn's algorithm.
    ///
    /// Ties are resolved by ascending concept ID, so evaluation order is
    /// deterministic. Nodes that never become ready are in cycles and are
    /// returned separately instead of aborting the sort.
    #[must_use]
    pub fn topological_order(&self) -> TopologicalOrder {
        let mut in_degree: BTreeMap<ConceptId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<ConceptId, Vec<ConceptId>> = BTreeMap::new();

        for (&node, reads) in &self.reads {
            in_degree.entry(node).or_insert(0);
            for &read in reads {
                if self.reads.contains_key(&read) {
                    *in_degree.entry(node).or_insert(0) += 1;
                    dependents.entry(read).or_default().push(node);
                }
            }
        }

        let mut ready: BTreeSet<ConceptId> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut sorted = Vec::with_capacity(self.reads.len());

        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            sorted.push(next);
            if let Some(deps) = dependents.get(&next) {
                for &dependent in deps {
                    if let Some(degree) = in_degree.get_mut(&dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(dependent);
                        }
                    }
                }
            }
        }

        let cyclic: Vec<ConceptId> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(&id, _)| id)
            .collect();

        TopologicalOrder { sorted, cyclic }
    }

    /// Concepts that transitively read `root`.
    ///
    /// `root` itself is not included (unless it reads itself through a
    /// cycle). Used to scope a recomputation to what a changed concept can
    /// actually affect.
    #[must_use]
    pub fn dependents_of(&self, root: ConceptId) -> BTreeSet<ConceptId> {
        let mut reached: BTreeSet<ConceptId> = BTreeSet::new();
        let mut frontier: Vec<ConceptId> = vec![root];

        while let Some(current) = frontier.pop() {
            for (&node, reads) in &self.reads {
                if reads.contains(&current) && reached.insert(node) {
                    frontier.push(node);
                }
            }
        }

        reached
    }
}
