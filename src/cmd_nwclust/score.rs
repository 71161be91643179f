use clap::*;
use nwclust::libs::io::{read_sequences, write_json};
use nwclust::libs::scoring::ScoringModel;
use nwclust::libs::similarity::SimilarityTable;

use super::{arg_matrix, arg_outfile, arg_parallel, init_pool};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Scores every pair of sequences by global alignment")
        .after_help(
            r###"
Aligns every pair of sequences with Needleman-Wunsch and writes the scores as
a flat JSON object.

Input:
* infile: `{"id": "SEQUENCE", ...}`
* --matrix: `{"A": -4, "AA": 4, "AR": -1, ...}`
    * one-letter keys are gap penalties of that symbol
    * two-letter keys are substitution scores; `AR` also serves `RA`

Output:
* `{"id1_id2": score, ...}`, with id1 before id2 in input order
* `--self` also writes `id_id` self-alignment scores

Examples:
1. Score all pairs:
   nwclust score organisms.json --matrix blosum62.json

2. Use 4 threads, keep self-scores:
   nwclust score organisms.json --matrix blosum62.json --self -p 4 -o scores.json

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
            Arg::new("self")
                .long("self")
                .action(ArgAction::SetTrue)
                .help("Also write self-alignment scores as `id_id`"),
        )
        .arg(arg_parallel())
        .arg(arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let matrix = args.get_one::<String>("matrix").unwrap();
    let is_self = args.get_flag("self");
    let outfile = args.get_one::<String>("outfile").unwrap();

    init_pool(args)?;

    //----------------------------
    // Ops
    //----------------------------
    let model = ScoringModel::from_file(matrix)?;
    let seqs = read_sequences(infile)?;
    let table = SimilarityTable::build(&seqs, &model)?;

    //----------------------------
    // Output
    //----------------------------
    write_json(outfile, &table.to_flat(is_self))?;

    Ok(())
}
