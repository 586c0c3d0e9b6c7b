extern crate clap;
use clap::*;

mod cmd_blastgraph;

fn main() -> anyhow::Result<()> {
    let app = Command::new("blastgraph")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`blastgraph` - Similarity graphs from BLAST hits")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Report progress on stderr"),
        )
        .subcommand(cmd_blastgraph::build::make_subcommand())
        .subcommand(cmd_blastgraph::filter::make_subcommand())
        .subcommand(cmd_blastgraph::overlap::make_subcommand())
        .after_help(
            r###"Subcommands:

* filter  - Hits close to the best hit of their query
* overlap - Links between nodes sharing targets
* build   - Contracted node and edge tables, per component

Input is BLAST tabular output with five columns:
    query target score significance label
e.g. `-outfmt "6 qacc sacc bitscore evalue sscinames"`

Logging follows RUST_LOG, `--verbose` sets it to info.

"###,
        );

    let matches = app.get_matches();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if matches.get_flag("verbose") {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.target(env_logger::Target::Stderr).init();

    match matches.subcommand() {
        Some(("build", sub_matches)) => cmd_blastgraph::build::execute(sub_matches),
        Some(("filter", sub_matches)) => cmd_blastgraph::filter::execute(sub_matches),
        Some(("overlap", sub_matches)) => cmd_blastgraph::overlap::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
