use clap::*;
use nwclust::libs::io::{reader, write_json};
use nwclust::libs::phylo::cut::{clusters_for, parse_thresholds};
use nwclust::libs::phylo::Tree;
use std::io::Read;

use super::arg_outfile;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("cut")
        .about("Cuts a tree into clusters at similarity thresholds")
        .after_help(
            r###"
Reads a tree written by `nwclust tree --distance`, restores the height of
every node from its branch lengths, and cuts it once per threshold.

At a threshold T, a node whose height is at least T keeps all its leaves in
one cluster. Lower nodes are split. Raising T never merges clusters.

Thresholds file:
* one number per line
* blank lines and lines starting with `#` are skipped
* other lines that are not numbers are skipped with a warning

Output:
* `{"T": [["A", "B"], ["C"]], ...}`
* members sorted, clusters largest first

Examples:
1. Cut a saved tree:
   nwclust cut tree.nw --thresholds thresholds.txt

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Newick with branch lengths. [stdin] for standard input"),
        )
        .arg(
            Arg::new("thresholds")
                .long("thresholds")
                .short('t')
                .required(true)
                .num_args(1)
                .help("Thresholds, one per line"),
        )
        .arg(arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let thresholds = args.get_one::<String>("thresholds").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    //----------------------------
    // Ops
    //----------------------------
    let mut newick = String::new();
    reader(infile)?.read_to_string(&mut newick)?;
    let tree = Tree::from_distance_newick(&newick)?;

    let thresholds = parse_thresholds(reader(thresholds)?)?;
    let clusters = clusters_for(&tree, &thresholds);

    //----------------------------
    // Output
    //----------------------------
    write_json(outfile, &clusters)?;

    Ok(())
}
