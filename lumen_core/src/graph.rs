//! Conflict graph construction.
//!
//! Turns a drug selection into a graph whose nodes are the selected drugs
//! (in selection order) and whose edges are:
//! - **hard**: the pair must not share a lumen
//! - **soft**: the pair may share a lumen through a Y-site connector

use crate::{
    CompatibilityClassifier, CompatibilityRepository, CompatibilityStatus, ConflictingDataPolicy,
    Warning,
};
use std::collections::{BTreeSet, HashSet};

/// A selected drug, as seen by the allocator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrugNode {
    pub id: String,
    pub cvc_required: bool,
    pub photosensitive: bool,
}

/// Graph over a selection. Edges are stored as `(i, j)` with `i < j`,
/// where `i` and `j` are positions in the selection.
#[derive(Clone, Debug, Default)]
pub struct ConflictGraph {
    nodes: Vec<DrugNode>,
    hard: BTreeSet<(usize, usize)>,
    soft: BTreeSet<(usize, usize)>,
    warnings: Vec<Warning>,
}

fn edge(i: usize, j: usize) -> (usize, usize) {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

impl ConflictGraph {
    pub fn nodes(&self) -> &[DrugNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a drug in the graph
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn has_hard_edge(&self, i: usize, j: usize) -> bool {
        self.hard.contains(&edge(i, j))
    }

    pub fn has_soft_edge(&self, i: usize, j: usize) -> bool {
        self.soft.contains(&edge(i, j))
    }

    /// Number of hard edges touching node `i`
    pub fn hard_degree(&self, i: usize) -> usize {
        self.hard.iter().filter(|(a, b)| *a == i || *b == i).count()
    }

    pub fn hard_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.hard.iter().copied()
    }

    pub fn soft_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.soft.iter().copied()
    }

    /// Warnings raised while building: unknown drugs, missing data,
    /// conflicting data
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Builds conflict graphs from selections
pub struct ConflictGraphBuilder<'a, R: CompatibilityRepository + ?Sized> {
    classifier: CompatibilityClassifier<'a, R>,
    policy: ConflictingDataPolicy,
}

impl<'a, R: CompatibilityRepository + ?Sized> ConflictGraphBuilder<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self {
            classifier: CompatibilityClassifier::new(repository),
            policy: ConflictingDataPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConflictingDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the graph for a selection.
    ///
    /// Duplicate ids collapse to the first occurrence. Ids missing from the
    /// repository are dropped with an `UnknownDrug` warning.
    pub fn build<S: AsRef<str>>(&self, selection: &[S]) -> ConflictGraph {
        let mut graph = ConflictGraph::default();
        let mut seen = HashSet::new();

        for raw in selection {
            let raw = raw.as_ref();
            match self.classifier.repository().drug(raw) {
                Some(entry) => {
                    if seen.insert(entry.id.clone()) {
                        graph.nodes.push(DrugNode {
                            id: entry.id.clone(),
                            cvc_required: entry.cvc_required,
                            photosensitive: entry.photosensitive,
                        });
                    } else {
                        tracing::debug!("Duplicate selection of '{}' collapsed", entry.id);
                    }
                }
                None => {
                    if seen.insert(format!("?{}", raw)) {
                        tracing::warn!("Drug '{}' not found in database, dropping it", raw);
                        graph.warnings.push(Warning::UnknownDrug {
                            drug: raw.to_string(),
                        });
                    }
                }
            }
        }

        for i in 0..graph.nodes.len() {
            for j in (i + 1)..graph.nodes.len() {
                let (a, b) = (&graph.nodes[i].id, &graph.nodes[j].id);
                let status = self.classifier.classify(a, b);

                match status {
                    CompatibilityStatus::Compatible => {}
                    CompatibilityStatus::Incompatible => {
                        graph.hard.insert((i, j));
                    }
                    CompatibilityStatus::ConflictingData => {
                        if self.policy == ConflictingDataPolicy::Block {
                            graph.hard.insert((i, j));
                        }
                        graph.warnings.push(Warning::ConflictingData {
                            drug_a: a.clone(),
                            drug_b: b.clone(),
                        });
                    }
                    CompatibilityStatus::YSiteOnly => {
                        graph.soft.insert((i, j));
                    }
                    CompatibilityStatus::Unknown => {
                        tracing::warn!("No compatibility data for {} / {}", a, b);
                        graph.warnings.push(Warning::NoCompatibilityData {
                            drug_a: a.clone(),
                            drug_b: b.clone(),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "Conflict graph: {} nodes, {} hard edges, {} soft edges",
            graph.nodes.len(),
            graph.hard.len(),
            graph.soft.len()
        );

        graph
    }
}
