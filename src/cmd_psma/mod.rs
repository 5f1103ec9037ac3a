use clap::*;
use psma::libs::report::{format_alignment, format_pairscores};
use psma::libs::round::{GroupResult, RoundConfig};
use std::io::Write;

pub mod align;
pub mod node;

// Arguments shared by `align` and `node`
pub fn common_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("infiles")
            .required(true)
            .num_args(1..)
            .index(1)
            .help("Input FASTA file(s); every record is one chain"),
    )
    .arg(
        Arg::new("threads")
            .long("threads")
            .short('t')
            .value_parser(value_parser!(usize))
            .default_value("1")
            .help("Worker threads per process"),
    )
    .arg(
        Arg::new("chunk")
            .long("chunk")
            .value_parser(value_parser!(usize))
            .default_value("0")
            .help("Tasks handed out per request. 0 uses --threads"),
    )
    .arg(
        Arg::new("scores")
            .long("scores")
            .num_args(1)
            .help("Also write the pairwise scores to this file"),
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

pub fn round_config(args: &ArgMatches) -> RoundConfig {
    RoundConfig {
        threads: *args.get_one::<usize>("threads").unwrap(),
        chunk_size: *args.get_one::<usize>("chunk").unwrap(),
    }
}

/// Write the final alignment, and the pairscores if asked for. Ranks without
/// an alignment write nothing.
pub fn write_result(args: &ArgMatches, result: &GroupResult, names: &[String]) -> anyhow::Result<()> {
    let Some(alignment) = &result.alignment else {
        return Ok(());
    };

    let mut writer = psma::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_all(format_alignment(alignment).as_bytes())?;
    writer.flush()?;

    if let Some(scores) = args.get_one::<String>("scores") {
        let mut writer = psma::writer(scores)?;
        writer.write_all(format_pairscores(&result.pairscores, names).as_bytes())?;
        writer.flush()?;
    }

    Ok(())
}
