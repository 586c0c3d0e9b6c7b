//! Collapsing structurally equivalent vertices of a component.
//!
//! Two vertices are equivalent when they have the same community and the same
//! sorted neighbor list with themselves inserted (their closed neighborhood).
//! Such vertices are true twins and always adjacent, so each group contracts
//! into a single vertex without changing the drawn structure.

use super::{Component, Edge, LocalEdge, Vertex};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// Group key: community id and self-inclusive neighbor signature
pub type GroupKey = (usize, Vec<usize>);

/// Sorted neighbors of `v` with `v` itself inserted at its sorted position
pub fn signature(v: usize, neighbors: &[usize]) -> Vec<usize> {
    let mut sig = Vec::with_capacity(neighbors.len() + 1);
    let pos = neighbors.partition_point(|&n| n < v);
    sig.extend_from_slice(&neighbors[..pos]);
    sig.push(v);
    sig.extend_from_slice(&neighbors[pos..]);
    sig
}

/// Equivalence groups in order of first member; members ascend
pub fn equivalence_groups(component: &Component) -> IndexMap<GroupKey, Vec<usize>> {
    let neighbors = component.neighbors();
    let mut groups: IndexMap<GroupKey, Vec<usize>> = IndexMap::new();

    for (v, vertex) in component.vertices.iter().enumerate() {
        let key = (vertex.community, signature(v, &neighbors[v]));
        groups.entry(key).or_default().push(v);
    }

    groups
}

/// Maps every vertex to the smallest index of its group
pub fn membership(component: &Component) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..component.len()).collect();
    for group in equivalence_groups(component).values() {
        let rep = group.iter().copied().min().unwrap_or_default();
        for &v in group {
            membership[v] = rep;
        }
    }
    membership
}

/// Contracts vertices by `membership` and merges the resulting parallel
/// edges.
///
/// Combine rules: names are unioned, weights summed, positions averaged;
/// community and subgraph come from the representative. Edges collapsing
/// onto one vertex are dropped. Parallel edges sum their weights and keep the
/// first edge's subgraph and community, so an edge that crossed communities
/// keeps only one of them.
///
/// Contracted vertices are numbered by ascending representative index and
/// edges come out with `source < target`, sorted.
pub fn contract(component: &Component, membership: &[usize]) -> Component {
    // representative -> members
    let mut members_of: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (v, &rep) in membership.iter().enumerate() {
        members_of.entry(rep).or_default().push(v);
    }

    let mut new_index = vec![0usize; membership.len()];
    let mut vertices = Vec::with_capacity(members_of.len());
    for (new_ix, (rep, members)) in members_of.iter().enumerate() {
        for &v in members {
            new_index[v] = new_ix;
        }
        vertices.push(combine(&component.vertices[*rep], members, &component.vertices));
    }

    let mut merged: BTreeMap<(usize, usize), Edge> = BTreeMap::new();
    for e in &component.edges {
        let a = new_index[membership[e.source]];
        let b = new_index[membership[e.target]];
        if a == b {
            continue;
        }
        let key = (a.min(b), a.max(b));
        merged
            .entry(key)
            .and_modify(|edge| edge.weight += e.attr.weight)
            .or_insert_with(|| e.attr.clone());
    }

    let edges = merged
        .into_iter()
        .map(|((source, target), attr)| LocalEdge {
            source,
            target,
            attr,
        })
        .collect();

    Component {
        subgraph: component.subgraph,
        vertices,
        edges,
    }
}

fn combine(rep: &Vertex, members: &[usize], all: &[Vertex]) -> Vertex {
    let count = members.len() as f64;
    let mut names = BTreeSet::new();
    let (mut weight, mut x, mut y) = (0.0, 0.0, 0.0);
    for &m in members {
        let v = &all[m];
        names.extend(v.names.iter().cloned());
        weight += v.weight;
        x += v.x;
        y += v.y;
    }

    Vertex {
        names,
        weight,
        subgraph: rep.subgraph,
        x: x / count,
        y: y / count,
        community: rep.community,
    }
}

/// Runs equivalence detection and contraction in one step
pub fn simplify(component: &Component) -> Component {
    let membership = membership(component);
    contract(component, &membership)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(name: &str, community: usize, x: f64, y: f64) -> Vertex {
        Vertex {
            x,
            y,
            community,
            ..Vertex::new(name)
        }
    }

    fn edge(source: usize, target: usize, weight: f64, community: Option<usize>) -> LocalEdge {
        LocalEdge {
            source,
            target,
            attr: Edge {
                weight,
                subgraph: 0,
                community,
            },
        }
    }

    #[test]
    fn test_signature() {
        assert_eq!(signature(0, &[1, 2]), vec![0, 1, 2]);
        assert_eq!(signature(2, &[0, 1]), vec![0, 1, 2]);
        assert_eq!(signature(2, &[0, 4]), vec![0, 2, 4]);
        assert_eq!(signature(3, &[]), vec![3]);
    }

    #[test]
    fn test_triangle_collapses() {
        let comp = Component {
            subgraph: 0,
            vertices: vec![
                vertex("q1", 0, 0.0, 0.0),
                vertex("q2", 0, 1.0, 0.0),
                vertex("q3", 0, 2.0, 3.0),
            ],
            edges: vec![
                edge(0, 1, 1.0, Some(0)),
                edge(0, 2, 1.0, Some(0)),
                edge(1, 2, 1.0, Some(0)),
            ],
        };

        let out = simplify(&comp);
        assert_eq!(out.len(), 1);
        assert!(out.edges.is_empty());
        let v = &out.vertices[0];
        assert_eq!(v.weight, 3.0);
        assert_eq!(v.label(), "q1,q2,q3");
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 1.0);
    }

    #[test]
    fn test_community_blocks_merge() {
        let comp = Component {
            subgraph: 0,
            vertices: vec![vertex("a", 0, 0.0, 0.0), vertex("b", 1, 0.0, 0.0)],
            edges: vec![edge(0, 1, 1.0, None)],
        };
        let out = simplify(&comp);
        assert_eq!(out.len(), 2);
        assert_eq!(out.edges.len(), 1);
    }

    #[test]
    fn test_parallel_edges_merge() {
        // hub, t1, t2 form a clique in community 0 and all touch leaf
        let comp = Component {
            subgraph: 4,
            vertices: vec![
                vertex("hub", 0, 0.0, 0.0),
                vertex("t1", 0, 1.0, 1.0),
                vertex("t2", 0, 3.0, 1.0),
                vertex("leaf", 1, 5.0, 5.0),
            ],
            edges: vec![
                edge(0, 1, 1.0, Some(0)),
                edge(0, 2, 2.0, Some(0)),
                edge(1, 2, 0.5, Some(0)),
                edge(1, 3, 1.5, None),
                edge(2, 3, 2.5, None),
                edge(0, 3, 0.25, None),
            ],
        };

        let groups = equivalence_groups(&comp);
        assert_eq!(groups.len(), 2);
        assert_eq!(membership(&comp), vec![0, 0, 0, 3]);

        let out = simplify(&comp);
        assert_eq!(out.len(), 2);
        assert_eq!(out.vertices[0].label(), "hub,t1,t2");
        assert_eq!(out.vertices[1].label(), "leaf");
        assert_eq!(out.edges.len(), 1);
        let e = &out.edges[0];
        assert_eq!((e.source, e.target), (0, 1));
        assert_relative_eq!(e.attr.weight, 4.25);
        assert_eq!(e.attr.community, None);
        assert_eq!(out.subgraph, 4);
    }

    #[test]
    fn test_weight_conserved_and_keys_unique() {
        // a and b are twins, c bridges to d; b carries an earlier merge
        let mut vertices = vec![
            vertex("a", 0, 0.0, 0.0),
            vertex("b", 0, 1.0, 0.0),
            vertex("c", 0, 2.0, 0.0),
            vertex("d", 0, 3.0, 0.0),
        ];
        vertices[1].weight = 2.0;
        let comp = Component {
            subgraph: 0,
            vertices,
            edges: vec![
                edge(0, 1, 1.0, Some(0)),
                edge(0, 2, 1.0, Some(0)),
                edge(1, 2, 1.0, Some(0)),
                edge(2, 3, 1.0, Some(0)),
            ],
        };
        let out = simplify(&comp);
        assert_eq!(out.len(), 3);
        assert_eq!(out.vertices[0].weight, 3.0);
        assert_relative_eq!(out.total_weight(), comp.total_weight());

        let keys: BTreeSet<GroupKey> = equivalence_groups(&out).into_keys().collect();
        assert_eq!(keys.len(), out.len());
    }
}
