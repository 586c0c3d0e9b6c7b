//! The assembled similarity graph and its per-component arenas.

pub mod contract;

use crate::libs::error::{GraphError, Result};
use crate::libs::overlap::OverlapGraph;
use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub names: BTreeSet<String>,
    pub weight: f64,
    pub subgraph: usize,
    pub x: f64,
    pub y: f64,
    pub community: usize,
}

impl Vertex {
    pub fn new(name: &str) -> Self {
        Self {
            names: BTreeSet::from([name.to_string()]),
            weight: 1.0,
            subgraph: 0,
            x: 0.0,
            y: 0.0,
            community: 0,
        }
    }

    /// Names joined by commas, in sorted order
    pub fn label(&self) -> String {
        self.names.iter().join(",")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub weight: f64,
    pub subgraph: usize,
    /// `None` when the endpoints sit in different communities
    pub community: Option<usize>,
}

impl Edge {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            subgraph: 0,
            community: None,
        }
    }
}

pub struct SimGraph {
    pub graph: UnGraph<Vertex, Edge>,
}

impl SimGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertex index of a node id; indices follow sorted-name order
    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&ix| self.graph[ix].names.contains(name))
    }

    /// Weakly connected components. Components are ordered by their smallest
    /// vertex index, and members are ascending.
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        let mut uf: UnionFind<usize> = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            uf.union(edge.source().index(), edge.target().index());
        }

        let mut members_of: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        let mut first_of: HashMap<usize, usize> = HashMap::new();
        for ix in self.graph.node_indices() {
            let root = uf.find(ix.index());
            // node indices ascend, so the first member seen is the smallest
            let first = *first_of.entry(root).or_insert(ix.index());
            members_of.entry(first).or_default().push(ix);
        }

        members_of.into_values().collect()
    }

    /// Copies one component into an arena with local indices `0..members.len()`
    pub fn component(&self, subgraph: usize, members: &[NodeIndex]) -> Component {
        let local_of: HashMap<NodeIndex, usize> = members
            .iter()
            .enumerate()
            .map(|(local, &ix)| (ix, local))
            .collect();

        let vertices = members.iter().map(|&ix| self.graph[ix].clone()).collect();

        let edges = self
            .graph
            .edge_references()
            .filter_map(|e| {
                let source = *local_of.get(&e.source())?;
                let target = *local_of.get(&e.target())?;
                Some(LocalEdge {
                    source,
                    target,
                    attr: e.weight().clone(),
                })
            })
            .collect();

        Component {
            subgraph,
            vertices,
            edges,
        }
    }
}

/// Builds the graph from the overlap result. Node ids get dense indices in
/// sorted order and every vertex starts with weight 1.
pub fn assemble(overlap: &OverlapGraph) -> Result<SimGraph> {
    let mut graph = UnGraph::with_capacity(overlap.nodes().len(), overlap.edges().len());

    let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
    for name in overlap.nodes().iter().sorted() {
        let ix = graph.add_node(Vertex::new(name));
        index_of.insert(name.as_str(), ix);
    }

    for edge in overlap.edges() {
        let a = index_of.get(edge.node_a.as_str()).ok_or_else(|| {
            GraphError::Assembly(format!("edge refers to unknown node {}", edge.node_a))
        })?;
        let b = index_of.get(edge.node_b.as_str()).ok_or_else(|| {
            GraphError::Assembly(format!("edge refers to unknown node {}", edge.node_b))
        })?;
        graph.add_edge(*a, *b, Edge::new(edge.weight));
    }

    Ok(SimGraph { graph })
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalEdge {
    pub source: usize,
    pub target: usize,
    pub attr: Edge,
}

/// One connected component with local vertex indices
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub subgraph: usize,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<LocalEdge>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.vertices.iter().map(|v| v.weight).sum()
    }

    /// Sorted neighbor lists, one per vertex
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![BTreeSet::new(); self.vertices.len()];
        for e in &self.edges {
            if e.source != e.target {
                adj[e.source].insert(e.target);
                adj[e.target].insert(e.source);
            }
        }
        adj.into_iter().map(|set| set.into_iter().collect()).collect()
    }

    /// The topology handed to layout and community strategies
    pub fn view(&self) -> ComponentGraph {
        ComponentGraph {
            vertex_count: self.vertices.len(),
            edges: self
                .edges
                .iter()
                .map(|e| (e.source, e.target, e.attr.weight))
                .collect(),
        }
    }
}

/// Vertex count plus weighted edges over local indices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentGraph {
    pub vertex_count: usize,
    pub edges: Vec<(usize, usize, f64)>,
}

impl ComponentGraph {
    pub fn new(vertex_count: usize, edges: Vec<(usize, usize, f64)>) -> Self {
        Self {
            vertex_count,
            edges,
        }
    }

    /// Weighted adjacency lists; self-loops are skipped
    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj = vec![Vec::new(); self.vertex_count];
        for &(a, b, w) in &self.edges {
            if a != b {
                adj[a].push((b, w));
                adj[b].push((a, w));
            }
        }
        adj
    }
}
