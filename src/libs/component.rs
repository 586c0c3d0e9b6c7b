use crate::libs::community::CommunityDetection;
use crate::libs::error::{GraphError, Result};
use crate::libs::graph::contract;
use crate::libs::graph::Component;
use crate::libs::layout::Layout;
use crate::libs::table::{ComponentTables, EdgeRow, NodeRow};

/// Turns one connected component into its contracted node and edge tables.
///
/// The steps run in a fixed order: tag, lay out, assign communities, group
/// equivalent vertices, contract, merge edges, re-index, emit. A failing or
/// malformed layout or community result aborts the component with
/// [`GraphError::DelegatedService`].
pub struct ComponentProcessor<'a> {
    layout: &'a dyn Layout,
    community: &'a dyn CommunityDetection,
}

impl<'a> ComponentProcessor<'a> {
    pub fn new(layout: &'a dyn Layout, community: &'a dyn CommunityDetection) -> Self {
        Self { layout, community }
    }

    pub fn process(&self, component: Component) -> Result<ComponentTables> {
        let subgraph = component.subgraph;
        let tagged = tag(component);
        let placed = self.place(tagged)?;
        let clustered = self.cluster(placed)?;

        let contracted = contract::simplify(&clustered);
        log::debug!(
            "Subgraph {}: {} vertices, {} edges contracted to {} vertices, {} edges",
            subgraph,
            clustered.len(),
            clustered.edges.len(),
            contracted.len(),
            contracted.edges.len()
        );

        Ok(emit(contracted))
    }

    fn place(&self, mut component: Component) -> Result<Component> {
        let subgraph = component.subgraph;
        let fail = |message: String| GraphError::DelegatedService {
            stage: "layout",
            subgraph,
            message,
        };

        let positions = self
            .layout
            .layout(&component.view())
            .map_err(|e| fail(format!("{}: {}", self.layout.name(), e)))?;
        if positions.len() != component.len() {
            return Err(fail(format!(
                "{} returned {} positions for {} vertices",
                self.layout.name(),
                positions.len(),
                component.len()
            )));
        }
        if positions.iter().any(|p| !(p.0.is_finite() && p.1.is_finite())) {
            return Err(fail(format!(
                "{} returned a non-finite position",
                self.layout.name()
            )));
        }

        for (vertex, (x, y)) in component.vertices.iter_mut().zip(positions) {
            vertex.x = x;
            vertex.y = y;
        }
        Ok(component)
    }

    fn cluster(&self, mut component: Component) -> Result<Component> {
        let subgraph = component.subgraph;
        let fail = |message: String| GraphError::DelegatedService {
            stage: "community detection",
            subgraph,
            message,
        };

        let groups = self
            .community
            .partition(&component.view())
            .map_err(|e| fail(format!("{}: {}", self.community.name(), e)))?;

        let mut assigned: Vec<Option<usize>> = vec![None; component.len()];
        for (community, group) in groups.iter().enumerate() {
            for &v in group {
                let slot = assigned
                    .get_mut(v)
                    .ok_or_else(|| fail(format!("vertex {} is out of range", v)))?;
                if slot.is_some() {
                    return Err(fail(format!("vertex {} is in two communities", v)));
                }
                *slot = Some(community);
            }
        }

        for (vertex, community) in component.vertices.iter_mut().zip(&assigned) {
            match community {
                Some(c) => vertex.community = *c,
                None => return Err(fail("not every vertex has a community".to_string())),
            }
        }

        for edge in component.edges.iter_mut() {
            let a = assigned[edge.source];
            let b = assigned[edge.target];
            edge.attr.community = if a == b { a } else { None };
        }

        Ok(component)
    }
}

fn tag(mut component: Component) -> Component {
    let subgraph = component.subgraph;
    for vertex in component.vertices.iter_mut() {
        vertex.subgraph = subgraph;
    }
    for edge in component.edges.iter_mut() {
        edge.attr.subgraph = subgraph;
    }
    component
}

fn emit(component: Component) -> ComponentTables {
    let nodes = component
        .vertices
        .iter()
        .enumerate()
        .map(|(node, v)| NodeRow {
            node,
            name: v.label(),
            weight: v.weight,
            subgraph: v.subgraph,
            x: v.x,
            y: v.y,
            community: v.community,
        })
        .collect();

    let edges = component
        .edges
        .iter()
        .enumerate()
        .map(|(edge, e)| EdgeRow {
            edge,
            source: e.source,
            target: e.target,
            weight: e.attr.weight,
            subgraph: e.attr.subgraph,
            community: e.attr.community,
        })
        .collect();

    ComponentTables {
        subgraph: component.subgraph,
        nodes,
        edges,
    }
}
