use crate::libs::hit::FilteredHit;
use fxhash::FxHashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Two nodes linked by the targets they both hit; `node_a < node_b`
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapEdge {
    pub node_a: String,
    pub node_b: String,
    pub weight: f64,
}

/// Nodes with at least one overlap edge, and the edges between them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlapGraph {
    nodes: Vec<String>,
    edges: Vec<OverlapEdge>,
    // node -> positions in `edges`
    incident: BTreeMap<String, Vec<usize>>,
}

impl OverlapGraph {
    /// Sorted node ids
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Edges sorted by `(node_a, node_b)`
    pub fn edges(&self) -> &[OverlapEdge] {
        &self.edges
    }

    pub fn edges_of<'a>(&'a self, node: &str) -> impl Iterator<Item = &'a OverlapEdge> + 'a {
        self.incident
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Links every pair of nodes sharing a target. The weight sums, over shared
/// targets, the mean of the two relative scores. Nodes left without edges
/// are dropped.
///
/// ```
/// use blastgraph::libs::hit::FilteredHit;
/// use blastgraph::libs::overlap::build_overlap;
///
/// let hit = |n: &str, s: &str, r: f64| FilteredHit {
///     node: n.to_string(),
///     shared: s.to_string(),
///     relative_score: r,
/// };
/// let graph = build_overlap(&[hit("q1", "s1", 1.0), hit("q2", "s1", 0.95)]);
/// assert_eq!(graph.edges().len(), 1);
/// assert!((graph.edges()[0].weight - 0.975).abs() < 1e-12);
/// ```
pub fn build_overlap(hits: &[FilteredHit]) -> OverlapGraph {
    let mut targets_of: BTreeMap<&str, FxHashMap<&str, f64>> = BTreeMap::new();
    for hit in hits {
        targets_of
            .entry(hit.node.as_str())
            .or_default()
            .insert(hit.shared.as_str(), hit.relative_score);
    }

    let names: Vec<&str> = targets_of.keys().copied().collect();
    let sets: Vec<&FxHashMap<&str, f64>> = targets_of.values().collect();
    let n = names.len();

    // each worker owns all (i, j) pairs of its outer index i
    let (names, sets) = (&names, &sets);
    let edges: Vec<OverlapEdge> = (0..n)
        .into_par_iter()
        .flat_map_iter(move |i| {
            ((i + 1)..n).filter_map(move |j| {
                shared_weight(sets[i], sets[j]).map(|weight| OverlapEdge {
                    node_a: names[i].to_string(),
                    node_b: names[j].to_string(),
                    weight,
                })
            })
        })
        .collect();

    let mut incident: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, edge) in edges.iter().enumerate() {
        incident.entry(edge.node_a.clone()).or_default().push(idx);
        incident.entry(edge.node_b.clone()).or_default().push(idx);
    }

    let nodes: Vec<String> = incident.keys().cloned().collect();
    log::debug!(
        "Overlap: {} of {} nodes kept, {} edges",
        nodes.len(),
        n,
        edges.len()
    );

    OverlapGraph {
        nodes,
        edges,
        incident,
    }
}

// The smaller set drives the scan; lookups go to the larger one.
fn shared_weight(a: &FxHashMap<&str, f64>, b: &FxHashMap<&str, f64>) -> Option<f64> {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut found = false;
    let mut weight = 0.0;
    for (target, score) in shorter {
        if let Some(other) = longer.get(target) {
            found = true;
            weight += 0.5 * (score + other);
        }
    }

    found.then_some(weight)
}
