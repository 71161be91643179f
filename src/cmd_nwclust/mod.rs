//! Subcommand modules for the `nwclust` binary.

pub mod cut;
pub mod run;
pub mod score;
pub mod tree;

use clap::*;

pub fn arg_matrix() -> Arg {
    Arg::new("matrix")
        .long("matrix")
        .short('m')
        .num_args(1)
        .help("Scoring table in JSON: one-letter keys are gap penalties, two-letter keys substitutions")
}

pub fn arg_leaf_height() -> Arg {
    Arg::new("leaf-height")
        .long("leaf-height")
        .num_args(1)
        .default_value("zero")
        .value_parser(["zero", "self"])
        .help("Height of the leaves: 0 or the self-alignment score")
}

pub fn arg_parallel() -> Arg {
    Arg::new("parallel")
        .long("parallel")
        .short('p')
        .num_args(1)
        .default_value("1")
        .value_parser(value_parser!(usize))
        .help("Number of threads for parallel processing")
}

pub fn arg_outfile() -> Arg {
    Arg::new("outfile")
        .short('o')
        .long("outfile")
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

/// Size the global rayon pool from `--parallel`.
pub fn init_pool(args: &ArgMatches) -> anyhow::Result<()> {
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;
    Ok(())
}
