use std::io::Write;

pub const NODE_HEADER: &str = "node\tname\tweight\tsubgraph\tx\ty\tcommunity";
pub const EDGE_HEADER: &str = "edge\tsource\ttarget\tweight\tsubgraph\tcommunity";

/// One row of the node table; `node` is local to its subgraph
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub node: usize,
    pub name: String,
    pub weight: f64,
    pub subgraph: usize,
    pub x: f64,
    pub y: f64,
    pub community: usize,
}

/// One row of the edge table. `source` and `target` are node keys within
/// `subgraph`; `edge` is the global row index.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub edge: usize,
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub subgraph: usize,
    pub community: Option<usize>,
}

/// The two tables emitted for one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentTables {
    pub subgraph: usize,
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
}

/// Append-only accumulator of per-component tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphTables {
    nodes: Vec<NodeRow>,
    edges: Vec<EdgeRow>,
}

impl GraphTables {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends one component; edge rows are renumbered globally
    pub fn append(&mut self, tables: ComponentTables) {
        self.nodes.extend(tables.nodes);
        for mut row in tables.edges {
            row.edge = self.edges.len();
            self.edges.push(row);
        }
    }

    pub fn nodes(&self) -> &[NodeRow] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRow] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of subgraphs, taken as the largest id plus one
    pub fn subgraph_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.subgraph + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn write_nodes(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", NODE_HEADER)?;
        for n in &self.nodes {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                n.node, n.name, n.weight, n.subgraph, n.x, n.y, n.community
            )?;
        }
        Ok(())
    }

    pub fn write_edges(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", EDGE_HEADER)?;
        for e in &self.edges {
            let community = e.community.map(|c| c.to_string()).unwrap_or_default();
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                e.edge, e.source, e.target, e.weight, e.subgraph, community
            )?;
        }
        Ok(())
    }
}
