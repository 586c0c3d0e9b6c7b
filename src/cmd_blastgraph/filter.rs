use blastgraph::libs::hit::{filter_hits, read_hits};
use blastgraph::libs::pipeline::GraphOpts;
use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("filter")
        .about("Keep hits close to the best hit of their query")
        .after_help(
            r###"
Keeps the best hit per (node, shared) pair and scores it against the best hit
of its query. Hits below the threshold are dropped, as are queries whose best
score is not positive.

Output columns: node shared relative_score

Examples:
1. Default columns and threshold:
   blastgraph filter hits.tsv

2. Stricter threshold, all rows:
   blastgraph filter hits.tsv --threshold 0.95 --rows 0 -o filtered.tsv

"###,
        );

    super::hit_args(cmd).arg(
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

    let records = read_hits(blastgraph::reader(infile)?, &super::read_opts(args))?;
    let hits = filter_hits(&records, opts.columns, opts.threshold);
    log::info!("{} of {} hits kept", hits.len(), records.len());

    let mut writer = blastgraph::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("node\tshared\trelative_score\n"))?;
    for hit in &hits {
        writer.write_fmt(format_args!(
            "{}\t{}\t{}\n",
            hit.node, hit.shared, hit.relative_score
        ))?;
    }
    writer.flush()?;

    Ok(())
}
