use blastgraph::libs::hit::{filter_hits, read_hits};
use blastgraph::libs::overlap::build_overlap;
use blastgraph::libs::pipeline::GraphOpts;
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("overlap")
        .about("Link nodes that hit the same targets")
        .after_help(
            r###"
Filters the hits as `blastgraph filter` does, then links every pair of nodes
sharing at least one target. The weight of a link sums, over the shared
targets, the mean of the two relative scores. Nodes without links are dropped.

Output columns: node_a node_b weight, with node_a < node_b

Examples:
1. Default columns:
   blastgraph overlap hits.tsv

2. Four threads for the pairwise scan:
   blastgraph overlap hits.tsv --rows 0 --parallel 4 -o links.tsv

"###,
        );

    super::hit_args(cmd)
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads for parallel processing"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let opt_threshold = *args.get_one::<f64>("threshold").unwrap();

    let opts = GraphOpts {
        threshold: opt_threshold,
        columns: super::key_columns(args)?,
        ..Default::default()
    };
    opts.validate()?;

    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    let records = read_hits(blastgraph::reader(infile)?, &super::read_opts(args))?;
    let hits = filter_hits(&records, opts.columns, opts.threshold);
    let graph = build_overlap(&hits);
    log::info!(
        "{} nodes, {} edges",
        graph.nodes().len(),
        graph.edges().len()
    );

    let mut writer = blastgraph::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("node_a\tnode_b\tweight\n"))?;
    for edge in graph.edges() {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\n",
            edge.node_a, edge.node_b, edge.weight
        ))?;
    }
    writer.flush()?;

    Ok(())
}
