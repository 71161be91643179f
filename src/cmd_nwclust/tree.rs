use clap::*;
use indexmap::IndexMap;
use nwclust::libs::io::{read_json, read_sequences, writer};
use nwclust::libs::phylo::build::{single_linkage, LeafHeight};
use nwclust::libs::scoring::ScoringModel;
use nwclust::libs::similarity::SimilarityTable;
use std::io::Write;

use super::{arg_leaf_height, arg_matrix, arg_outfile, arg_parallel, init_pool};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("tree")
        .about("Builds a single-linkage tree from alignment scores")
        .after_help(
            r###"
Merges the two most similar clusters until one is left. The similarity of two
clusters is the best score between any of their members, and each merge
becomes an internal node at that height.

Scores come from either:
* --matrix: align the sequences, as `nwclust score` does
* --scores: a flat JSON written by `nwclust score`

Output:
* Topology only: `((A,B),C);`
* --distance: each branch is `parent height - node height`, which may be
  negative: `((A:5,B:5):-2,C:3);`

Notes:
* Equal scores are merged in input order of the sequences
* `--leaf-height self` puts each leaf at its self-alignment score; with
  --scores this needs `id_id` entries (`nwclust score --self`)

Examples:
1. Build from sequences:
   nwclust tree organisms.json --matrix blosum62.json

2. Build from saved scores, with branch lengths:
   nwclust tree organisms.json --scores scores.json --distance

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Sequences in JSON. [stdin] for standard input"),
        )
        .arg(arg_matrix())
        .arg(
            Arg::new("scores")
                .long("scores")
                .short('s')
                .num_args(1)
                .help("Flat scores in JSON, instead of aligning"),
        )
        .group(
            ArgGroup::new("source")
                .args(["matrix", "scores"])
                .required(true),
        )
        .arg(
            Arg::new("distance")
                .long("distance")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Write integer branch lengths"),
        )
        .arg(arg_leaf_height())
        .arg(arg_parallel())
        .arg(arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let is_distance = args.get_flag("distance");
    let leaf_height: LeafHeight = args
        .get_one::<String>("leaf-height")
        .unwrap()
        .parse()
        .map_err(anyhow::Error::msg)?;
    let mut writer = writer(args.get_one::<String>("outfile").unwrap())?;

    init_pool(args)?;

    //----------------------------
    // Ops
    //----------------------------
    let seqs = read_sequences(infile)?;
    let table = if let Some(matrix) = args.get_one::<String>("matrix") {
        let model = ScoringModel::from_file(matrix)?;
        SimilarityTable::build(&seqs, &model)?
    } else {
        let scores = args.get_one::<String>("scores").unwrap();
        let flat: IndexMap<String, i32> = read_json(scores)?;
        SimilarityTable::from_flat(seqs.keys().cloned(), &flat)?
    };

    let ids: Vec<&str> = seqs.keys().map(|s| s.as_str()).collect();
    let tree = single_linkage(&table, &ids, leaf_height)?;
    tracing::info!("Built a tree of {} nodes", tree.len());

    //----------------------------
    // Output
    //----------------------------
    let out_string = if is_distance {
        tree.to_distance_newick()
    } else {
        tree.to_topology_newick()
    };
    writer.write_all((out_string + "\n").as_ref())?;
    writer.flush()?;

    Ok(())
}
