use blastgraph::libs::community::CommunityKind;
use blastgraph::libs::layout::LayoutKind;
use blastgraph::libs::pipeline::{GraphOpts, GraphPipeline};
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("build")
        .about("Build node and edge tables of the similarity graph")
        .after_help(
            r###"
Queries are linked when they hit the same targets with scores close to their
best hit. Every connected component is laid out, split into communities and
contracted: vertices in the same community with identical closed
neighborhoods are merged into one node.

Process:
1. Keep the best hit per (node, shared) pair
2. Keep hits scoring >= threshold * the best hit of their query
3. Link nodes sharing targets; weight = sum of mean relative scores
4. Per component: layout, communities, contraction

Outputs:
* nodes: node name weight subgraph x y community
* edges: edge source target weight subgraph community
  `node`, `source` and `target` are local to a subgraph
  an empty `community` marks an edge between two communities

Layouts: kk (Kamada-Kawai), fr (Fruchterman-Reingold), circle
Community methods: greedy (fast greedy modularity), lpa (label propagation)

Examples:
1. Default outputs nodes.tsv and edges.tsv:
   blastgraph build hits.tsv

2. Raw `-outfmt 6` without a header, all rows:
   blastgraph build hits.tsv --no-header --rows 0

3. Species as nodes, linked by shared queries:
   blastgraph build hits.tsv --node label --shared query

4. Another layout and community method, 4 threads:
   blastgraph build hits.tsv --layout fr --community lpa --parallel 4

"###,
        );

    super::hit_args(cmd)
        .arg(
            Arg::new("layout")
                .long("layout")
                .num_args(1)
                .default_value("kk")
                .value_parser(["kk", "kamada_kawai", "fr", "fruchterman_reingold", "circle"])
                .help("Layout of each component"),
        )
        .arg(
            Arg::new("community")
                .long("community")
                .num_args(1)
                .default_value("greedy")
                .value_parser(["greedy", "fastgreedy", "lpa", "label_propagation"])
                .help("Community detection method"),
        )
        .arg(
            Arg::new("nodes")
                .long("nodes")
                .num_args(1)
                .default_value("nodes.tsv")
                .help("Output filename of the node table. [stdout] for screen"),
        )
        .arg(
            Arg::new("edges")
                .long("edges")
                .num_args(1)
                .default_value("edges.tsv")
                .help("Output filename of the edge table. [stdout] for screen"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads for parallel processing"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let opt_threshold = *args.get_one::<f64>("threshold").unwrap();
    let opt_layout = args.get_one::<String>("layout").unwrap().parse::<LayoutKind>()?;
    let opt_community = args
        .get_one::<String>("community")
        .unwrap()
        .parse::<CommunityKind>()?;

    let opts = GraphOpts {
        threshold: opt_threshold,
        columns: super::key_columns(args)?,
        layout: opt_layout,
        community: opt_community,
    };
    opts.validate()?;
    let read_opts = super::read_opts(args);

    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    //----------------------------
    // Ops
    //----------------------------
    let reader = blastgraph::reader(infile)?;
    let tables = GraphPipeline::new(opts).run_reader(reader, &read_opts)?;

    //----------------------------
    // Output
    //----------------------------
    let mut nodes = blastgraph::writer(args.get_one::<String>("nodes").unwrap())?;
    tables.write_nodes(&mut nodes)?;
    nodes.flush()?;

    let mut edges = blastgraph::writer(args.get_one::<String>("edges").unwrap())?;
    tables.write_edges(&mut edges)?;
    edges.flush()?;

    Ok(())
}
