//! Subcommand modules for the `blastgraph` binary.

use blastgraph::libs::hit::{Column, KeyColumns, ReadOpts};
use clap::*;

pub mod build;
pub mod filter;
pub mod overlap;

/// Arguments shared by every subcommand that reads hits
pub fn hit_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("infile")
            .index(1)
            .num_args(1)
            .default_value("stdin")
            .help("Tabular hits: query target score significance label. [stdin] for standard input"),
    )
    .arg(
        Arg::new("threshold")
            .long("threshold")
            .short('t')
            .num_args(1)
            .default_value("0.9")
            .value_parser(value_parser!(f64))
            .help("Minimum score relative to the best hit of the same query"),
    )
    .arg(
        Arg::new("rows")
            .long("rows")
            .num_args(1)
            .default_value("500")
            .value_parser(value_parser!(usize))
            .help("Read at most this many data rows, 0 for all"),
    )
    .arg(
        Arg::new("no_header")
            .long("no-header")
            .action(ArgAction::SetTrue)
            .help("The input has no header row, e.g. raw `-outfmt 6`"),
    )
    .arg(
        Arg::new("node")
            .long("node")
            .num_args(1)
            .default_value("query")
            .value_parser(["query", "qacc", "target", "sacc", "label", "sscinames"])
            .help("Column used as graph node"),
    )
    .arg(
        Arg::new("shared")
            .long("shared")
            .num_args(1)
            .default_value("target")
            .value_parser(["query", "qacc", "target", "sacc", "label", "sscinames"])
            .help("Column that links two nodes when both hit it"),
    )
}

pub fn read_opts(args: &ArgMatches) -> ReadOpts {
    let opt_rows = *args.get_one::<usize>("rows").unwrap();
    ReadOpts {
        header: !args.get_flag("no_header"),
        max_rows: if opt_rows == 0 { None } else { Some(opt_rows) },
    }
}

pub fn key_columns(args: &ArgMatches) -> anyhow::Result<KeyColumns> {
    let node = args.get_one::<String>("node").unwrap().parse::<Column>()?;
    let shared = args.get_one::<String>("shared").unwrap().parse::<Column>()?;
    Ok(KeyColumns::new(node, shared)?)
}
