use crate::libs::community::CommunityKind;
use crate::libs::component::ComponentProcessor;
use crate::libs::error::{GraphError, Result};
use crate::libs::graph::{assemble, Component, SimGraph};
use crate::libs::hit::{filter_hits, read_hits, HitRecord, KeyColumns, ReadOpts, DEFAULT_THRESHOLD};
use crate::libs::layout::LayoutKind;
use crate::libs::overlap::build_overlap;
use crate::libs::table::GraphTables;
use rayon::prelude::*;
use std::io::BufRead;

/// Settings of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphOpts {
    /// Minimum relative score, in (0, 1]
    pub threshold: f64,
    pub columns: KeyColumns,
    pub layout: LayoutKind,
    pub community: CommunityKind,
}

impl Default for GraphOpts {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            columns: KeyColumns::default(),
            layout: LayoutKind::default(),
            community: CommunityKind::default(),
        }
    }
}

impl GraphOpts {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(GraphError::InvalidOption(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        KeyColumns::new(self.columns.node, self.columns.shared)?;
        Ok(())
    }
}

/// Hits in, node and edge tables out.
///
/// ```
/// use blastgraph::libs::hit::HitRecord;
/// use blastgraph::libs::pipeline::{GraphOpts, GraphPipeline};
///
/// let hits = vec![
///     HitRecord::new("q1", "s1", 100.0),
///     HitRecord::new("q2", "s1", 95.0),
/// ];
/// let tables = GraphPipeline::new(GraphOpts::default()).run(&hits).unwrap();
/// assert_eq!(tables.nodes().len(), 1);
/// assert_eq!(tables.nodes()[0].name, "q1,q2");
/// ```
pub struct GraphPipeline {
    opts: GraphOpts,
}

impl GraphPipeline {
    pub fn new(opts: GraphOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> &GraphOpts {
        &self.opts
    }

    pub fn run(&self, records: &[HitRecord]) -> Result<GraphTables> {
        self.opts.validate()?;

        let hits = filter_hits(records, self.opts.columns, self.opts.threshold);
        log::info!(
            "{} hits, {} kept at relative score >= {}",
            records.len(),
            hits.len(),
            self.opts.threshold
        );

        let overlap = build_overlap(&hits);
        log::info!(
            "Overlap: {} nodes, {} edges",
            overlap.nodes().len(),
            overlap.edges().len()
        );

        let graph = assemble(&overlap)?;
        let components = split_components(&graph);
        log::info!("{} components", components.len());

        let layout = self.opts.layout.build();
        let community = self.opts.community.build();
        let processor = ComponentProcessor::new(layout.as_ref(), community.as_ref());

        // collected in subgraph order; the first failure is returned
        let results = components
            .into_par_iter()
            .map(|comp| processor.process(comp))
            .collect::<Vec<_>>();

        let mut tables = GraphTables::new();
        for result in results {
            tables.append(result?);
        }
        log::info!(
            "Tables: {} nodes, {} edges in {} subgraphs",
            tables.nodes().len(),
            tables.edges().len(),
            tables.subgraph_count()
        );

        Ok(tables)
    }

    pub fn run_reader<R: BufRead>(&self, reader: R, read_opts: &ReadOpts) -> Result<GraphTables> {
        let records = read_hits(reader, read_opts)?;
        self.run(&records)
    }
}

/// Components in subgraph order. Subgraph ids count every component, but
/// those without edges are left out.
pub fn split_components(graph: &SimGraph) -> Vec<Component> {
    graph
        .components()
        .iter()
        .enumerate()
        .map(|(subgraph, members)| graph.component(subgraph, members))
        .filter(|comp| {
            if comp.edges.is_empty() {
                log::debug!("Skipping subgraph {} without edges", comp.subgraph);
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::hit::Column;
    use std::io::BufReader;

    fn run(hits: &[HitRecord]) -> GraphTables {
        GraphPipeline::new(GraphOpts::default()).run(hits).unwrap()
    }

    #[test]
    fn test_shared_target_pair() {
        let tables = run(&[
            HitRecord::new("q1", "s1", 100.0),
            HitRecord::new("q2", "s1", 95.0),
        ]);
        // q1 and q2 are twins and collapse
        assert_eq!(tables.nodes().len(), 1);
        assert_eq!(tables.nodes()[0].weight, 2.0);
        assert!(tables.edges().is_empty());
    }

    #[test]
    fn test_triangle_contracts() {
        let tables = run(&[
            HitRecord::new("q1", "s1", 50.0),
            HitRecord::new("q2", "s1", 50.0),
            HitRecord::new("q3", "s1", 50.0),
        ]);
        assert_eq!(tables.nodes().len(), 1);
        let node = &tables.nodes()[0];
        assert_eq!(node.name, "q1,q2,q3");
        assert_eq!(node.weight, 3.0);
        assert_eq!(node.subgraph, 0);
    }

    #[test]
    fn test_lonely_query_is_absent() {
        let tables = run(&[
            HitRecord::new("q1", "s1", 100.0),
            HitRecord::new("q2", "s1", 100.0),
            HitRecord::new("q3", "s9", 100.0),
        ]);
        assert!(tables.nodes().iter().all(|n| !n.name.contains("q3")));
    }

    #[test]
    fn test_weak_hit_cannot_link() {
        // q2 hits s1 at 50% of its best, so q1 and q2 share nothing
        let tables = run(&[
            HitRecord::new("q1", "s1", 100.0),
            HitRecord::new("q2", "s2", 100.0),
            HitRecord::new("q2", "s1", 50.0),
        ]);
        assert!(tables.is_empty());
        assert!(tables.edges().is_empty());
    }

    #[test]
    fn test_components_are_isolated() {
        // path a - b - c over s1, s2 and a separate pair d - e over s3
        let tables = run(&[
            HitRecord::new("a", "s1", 10.0),
            HitRecord::new("b", "s1", 10.0),
            HitRecord::new("b", "s2", 10.0),
            HitRecord::new("c", "s2", 10.0),
            HitRecord::new("d", "s3", 10.0),
            HitRecord::new("e", "s3", 10.0),
        ]);
        assert_eq!(tables.subgraph_count(), 2);

        // a, b, c stay apart; d and e merge
        let first: Vec<&str> = tables
            .nodes()
            .iter()
            .filter(|n| n.subgraph == 0)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        let second: Vec<&str> = tables
            .nodes()
            .iter()
            .filter(|n| n.subgraph == 1)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(second, vec!["d,e"]);

        let total: f64 = tables.nodes().iter().map(|n| n.weight).sum();
        assert_eq!(total, 5.0);

        for e in tables.edges() {
            assert_eq!(e.subgraph, 0);
            assert!(e.source < e.target && e.target < 3);
        }
        let ids: Vec<usize> = tables.edges().iter().map(|e| e.edge).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_edgeless_component_skipped() {
        use crate::libs::graph::{Edge, Vertex};
        use petgraph::graph::UnGraph;

        // a - b, then a lone c
        let mut graph = UnGraph::new_undirected();
        let a = graph.add_node(Vertex::new("a"));
        let b = graph.add_node(Vertex::new("b"));
        graph.add_node(Vertex::new("c"));
        graph.add_edge(a, b, Edge::new(1.0));
        let graph = SimGraph { graph };

        assert_eq!(graph.components().len(), 2);
        let components = split_components(&graph);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].subgraph, 0);
        assert_eq!(components[0].len(), 2);
        assert!(components.iter().all(|c| !c.edges.is_empty()));
    }

    #[test]
    fn test_empty_input() {
        let tables = run(&[]);
        assert!(tables.is_empty());
        assert_eq!(tables.subgraph_count(), 0);
    }

    #[test]
    fn test_bad_threshold() {
        let opts = GraphOpts {
            threshold: 1.5,
            ..Default::default()
        };
        let err = GraphPipeline::new(opts).run(&[]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidOption(_)));
    }

    #[test]
    fn test_species_as_nodes() {
        let hits = vec![
            HitRecord::new("q1", "s1", 100.0).with_label("Homo sapiens"),
            HitRecord::new("q1", "s2", 98.0).with_label("Pan troglodytes"),
            HitRecord::new("q2", "s3", 100.0).with_label("Mus musculus"),
        ];
        let opts = GraphOpts {
            columns: KeyColumns::new(Column::Label, Column::Query).unwrap(),
            ..Default::default()
        };
        let tables = GraphPipeline::new(opts).run(&hits).unwrap();
        assert_eq!(tables.nodes().len(), 1);
        assert_eq!(tables.nodes()[0].name, "Homo sapiens,Pan troglodytes");
    }

    #[test]
    fn test_run_reader() {
        let text = "\
qacc\tsacc\tbitscore\tevalue\tsscinames
q1\ts1\t100\t1e-50\tHomo sapiens
q2\ts1\t95\t1e-45\tHomo sapiens
";
        let tables = GraphPipeline::new(GraphOpts::default())
            .run_reader(BufReader::new(text.as_bytes()), &ReadOpts::default())
            .unwrap();
        assert_eq!(tables.nodes()[0].name, "q1,q2");

        let broken = "header\nq1\ts1\tNA\t0\tx\n";
        let err = GraphPipeline::new(GraphOpts::default())
            .run_reader(BufReader::new(broken.as_bytes()), &ReadOpts::default())
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::input_format(2, "score is not numeric: \"NA\"")
        );
    }
}
