use clap::*;
use nwclust::libs::io::{read_sequences, reader, write_json, writer};
use nwclust::libs::phylo::build::{single_linkage, LeafHeight};
use nwclust::libs::phylo::cut::{clusters_for, parse_thresholds};
use nwclust::libs::scoring::ScoringModel;
use nwclust::libs::similarity::SimilarityTable;
use std::io::Write;
use std::path::Path;

use super::{arg_leaf_height, arg_matrix, arg_parallel, init_pool};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("run")
        .about("Scores, builds the tree and cuts it in one go")
        .after_help(
            r###"
Runs `score`, `tree` and `cut` on one set of sequences and writes into --outdir:

* organisms_scores_<NAME>.json           - flat pairwise scores
* tree_<NAME>_newick.nw                  - topology
* tree_<NAME>_newick_with_distance.nw    - topology with branch lengths
* clusters_for_<NAME>.json               - clusters per threshold

NAME defaults to the file name of --matrix without its extension, e.g.
`blosum62` for `blosum62.json`.

Examples:
1. The whole pipeline:
   nwclust run organisms.json --matrix blosum62.json --thresholds thresholds.txt

2. Into another directory, with 8 threads:
   nwclust run organisms.json -m blosum50.json -t thresholds.txt --outdir results -p 8

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Sequences in JSON. [stdin] for standard input"),
        )
        .arg(arg_matrix().required(true))
        .arg(
            Arg::new("thresholds")
                .long("thresholds")
                .short('t')
                .required(true)
                .num_args(1)
                .help("Thresholds, one per line"),
        )
        .arg(
            Arg::new("outdir")
                .long("outdir")
                .num_args(1)
                .default_value(".")
                .help("Output directory"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .num_args(1)
                .help("Tag in the output file names"),
        )
        .arg(arg_leaf_height())
        .arg(arg_parallel())
}

/// `blosum62.json` and `blosum62.json.gz` both become `blosum62`
fn default_name(matrix: &str) -> String {
    let file_name = Path::new(matrix)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| matrix.to_string());
    let name = file_name.strip_suffix(".gz").unwrap_or(&file_name);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let matrix = args.get_one::<String>("matrix").unwrap();
    let thresholds = args.get_one::<String>("thresholds").unwrap();
    let outdir = Path::new(args.get_one::<String>("outdir").unwrap());
    let name = match args.get_one::<String>("name") {
        Some(name) => name.clone(),
        None => default_name(matrix),
    };
    let leaf_height: LeafHeight = args
        .get_one::<String>("leaf-height")
        .unwrap()
        .parse()
        .map_err(anyhow::Error::msg)?;

    init_pool(args)?;

    //----------------------------
    // Ops
    //----------------------------
    let model = ScoringModel::from_file(matrix)?;
    let seqs = read_sequences(infile)?;
    // read thresholds before the long part, so a missing file fails fast
    let thresholds = parse_thresholds(reader(thresholds)?)?;

    let table = SimilarityTable::build(&seqs, &model)?;
    let ids: Vec<&str> = seqs.keys().map(|s| s.as_str()).collect();
    let tree = single_linkage(&table, &ids, leaf_height)?;
    let clusters = clusters_for(&tree, &thresholds);

    //----------------------------
    // Output
    //----------------------------
    std::fs::create_dir_all(outdir)?;
    let path = |file: String| outdir.join(file).to_string_lossy().to_string();

    write_json(
        &path(format!("organisms_scores_{}.json", name)),
        &table.to_flat(false),
    )?;

    for (file, newick) in [
        (
            format!("tree_{}_newick.nw", name),
            tree.to_topology_newick(),
        ),
        (
            format!("tree_{}_newick_with_distance.nw", name),
            tree.to_distance_newick(),
        ),
    ] {
        let mut writer = writer(&path(file))?;
        writer.write_all((newick + "\n").as_ref())?;
        writer.flush()?;
    }

    write_json(&path(format!("clusters_for_{}.json", name)), &clusters)?;
    tracing::info!("Results written to {}", outdir.display());

    Ok(())
}
