extern crate clap;
use clap::*;
use tracing_subscriber::EnvFilter;

mod cmd_nwclust;

fn main() -> anyhow::Result<()> {
    // RUST_LOG wins, then NWCLUST_LOG, then info
    let log_level = std::env::var("NWCLUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = Command::new("nwclust")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`nwclust` - Needleman-Wunsch scores, single-linkage trees and clusters")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_nwclust::score::make_subcommand())
        .subcommand(cmd_nwclust::tree::make_subcommand())
        .subcommand(cmd_nwclust::cut::make_subcommand())
        .subcommand(cmd_nwclust::run::make_subcommand())
        .after_help(
            r###"Subcommands:

* score - All-pairs global alignment scores
* tree  - Single-linkage tree in Newick
* cut   - Clusters of a tree at similarity thresholds
* run   - score + tree + cut, with every output written to one directory

Logging goes to stderr. Set NWCLUST_LOG (or RUST_LOG) to e.g. `debug` or `warn`.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("score", sub_matches)) => cmd_nwclust::score::execute(sub_matches),
        Some(("tree", sub_matches)) => cmd_nwclust::tree::execute(sub_matches),
        Some(("cut", sub_matches)) => cmd_nwclust::cut::execute(sub_matches),
        Some(("run", sub_matches)) => cmd_nwclust::run::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
