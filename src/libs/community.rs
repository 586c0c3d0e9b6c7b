//! Community detection within one component.

use crate::libs::error::GraphError;
use crate::libs::graph::ComponentGraph;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Splits the vertices of a component into disjoint communities
pub trait CommunityDetection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Disjoint groups of vertex indices covering every vertex once.
    /// Group `k` becomes community `k`.
    fn partition(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<Vec<usize>>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommunityKind {
    #[default]
    GreedyModularity,
    LabelPropagation,
}

impl FromStr for CommunityKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" | "fastgreedy" => Ok(CommunityKind::GreedyModularity),
            "lpa" | "label_propagation" => Ok(CommunityKind::LabelPropagation),
            _ => Err(GraphError::InvalidOption(format!(
                "unknown community method {:?}",
                s
            ))),
        }
    }
}

impl CommunityKind {
    pub fn build(&self) -> Box<dyn CommunityDetection> {
        match self {
            CommunityKind::GreedyModularity => Box::new(GreedyModularity),
            CommunityKind::LabelPropagation => Box::new(LabelPropagation::default()),
        }
    }
}

/// Groups labelled vertices, ordering groups by their smallest member
fn groups_by_label(labels: impl IntoIterator<Item = usize>) -> Vec<Vec<usize>> {
    let mut first_of: BTreeMap<usize, usize> = BTreeMap::new();
    let mut members_of: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (v, label) in labels.into_iter().enumerate() {
        let first = *first_of.entry(label).or_insert(v);
        members_of.entry(first).or_default().push(v);
    }
    members_of.into_values().collect()
}

/// Modularity of a partition given as one label per vertex
pub fn modularity(graph: &ComponentGraph, labels: &[usize]) -> f64 {
    let total: f64 = graph
        .edges
        .iter()
        .filter(|edge| edge.0 != edge.1)
        .map(|e| e.2)
        .sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut inner: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();
    for &(a, b, w) in graph.edges.iter().filter(|edge| edge.0 != edge.1) {
        if labels[a] == labels[b] {
            *inner.entry(labels[a]).or_default() += w;
        }
        *degree.entry(labels[a]).or_default() += w;
        *degree.entry(labels[b]).or_default() += w;
    }

    degree
        .iter()
        .map(|(c, d)| inner.get(c).copied().unwrap_or(0.0) / total - (d / (2.0 * total)).powi(2))
        .sum()
}

/// Clauset-Newman-Moore fast greedy modularity.
///
/// Starting from singletons, the pair of connected communities with the
/// largest modularity gain is merged until one community per connected part
/// is left. The partition with the highest modularity along the way is
/// returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyModularity;

impl CommunityDetection for GreedyModularity {
    fn name(&self) -> &'static str {
        "greedy_modularity"
    }

    fn partition(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<Vec<usize>>> {
        let n = graph.vertex_count;
        let total: f64 = graph
            .edges
            .iter()
            .filter(|edge| edge.0 != edge.1)
            .map(|e| e.2)
            .sum();
        if total <= 0.0 {
            return Ok((0..n).map(|v| vec![v]).collect());
        }
        let two_m = 2.0 * total;

        // e[i][j]: fraction of edge ends between communities i and j
        let mut e: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        let mut a = vec![0.0f64; n];
        for &(u, v, w) in graph.edges.iter().filter(|edge| edge.0 != edge.1) {
            anyhow::ensure!(u < n && v < n, "edge ({}, {}) out of range", u, v);
            *e[u].entry(v).or_default() += w / two_m;
            *e[v].entry(u).or_default() += w / two_m;
            a[u] += w / two_m;
            a[v] += w / two_m;
        }

        let mut q: f64 = -a.iter().map(|x| x * x).sum::<f64>();
        let mut best_q = q;
        let mut best_step = 0;
        let mut merges: Vec<(usize, usize)> = Vec::new();

        loop {
            let mut best: Option<(f64, usize, usize)> = None;
            for (i, row) in e.iter().enumerate() {
                for (&j, &eij) in row.range((i + 1)..) {
                    let dq = 2.0 * (eij - a[i] * a[j]);
                    if best.map_or(true, |(b, _, _)| dq > b) {
                        best = Some((dq, i, j));
                    }
                }
            }
            let Some((dq, i, j)) = best else {
                break;
            };

            // fold j into i
            let row_j = std::mem::take(&mut e[j]);
            for (k, w) in row_j {
                if k == i {
                    continue;
                }
                *e[i].entry(k).or_default() += w;
                e[k].remove(&j);
                *e[k].entry(i).or_default() += w;
            }
            e[i].remove(&j);
            a[i] += a[j];
            a[j] = 0.0;

            q += dq;
            merges.push((i, j));
            if q > best_q + 1e-12 {
                best_q = q;
                best_step = merges.len();
            }
        }

        let mut uf: UnionFind<usize> = UnionFind::new(n);
        for &(i, j) in &merges[..best_step] {
            uf.union(i, j);
        }
        log::trace!(
            "greedy modularity: {} merges, best Q {:.4} after {}",
            merges.len(),
            best_q,
            best_step
        );

        Ok(groups_by_label((0..n).map(|v| uf.find(v))))
    }
}

/// Weighted label propagation with a fixed vertex order. Each vertex takes
/// the label carrying the most neighbor weight; it keeps its own label on a
/// tie that includes it, and otherwise takes the smallest tied label.
#[derive(Debug, Clone, Copy)]
pub struct LabelPropagation {
    pub max_iter: usize,
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self { max_iter: 100 }
    }
}

impl CommunityDetection for LabelPropagation {
    fn name(&self) -> &'static str {
        "label_propagation"
    }

    fn partition(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<Vec<usize>>> {
        let n = graph.vertex_count;
        anyhow::ensure!(
            graph.edges.iter().all(|e| e.0 < n && e.1 < n),
            "edge endpoint out of range"
        );
        let adj = graph.adjacency();
        let mut labels: Vec<usize> = (0..n).collect();

        for _ in 0..self.max_iter {
            let mut changed = false;
            for v in 0..n {
                if adj[v].is_empty() {
                    continue;
                }
                let mut weight_of: BTreeMap<usize, f64> = BTreeMap::new();
                for &(u, w) in &adj[v] {
                    *weight_of.entry(labels[u]).or_default() += w;
                }
                let top = weight_of.values().fold(f64::MIN, |acc, &w| acc.max(w));
                let current = labels[v];
                let keeps = weight_of
                    .get(&current)
                    .map_or(false, |&w| (top - w).abs() < 1e-12);
                if keeps {
                    continue;
                }
                if let Some((&label, _)) = weight_of.iter().find(|&(_, &w)| (top - w).abs() < 1e-12) {
                    labels[v] = label;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(groups_by_label(labels))
    }
}
