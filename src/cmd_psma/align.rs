use clap::*;
use psma::libs::alignment::{read_chains, UngappedEngine};
use psma::libs::logger::RankLogger;
use psma::libs::round::align_group;
use psma::libs::transport::{LocalTransport, ProcessGroup};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("align")
        .about("Aligns chains with a process group running inside this process")
        .after_help(
            r###"
Builds a multiple alignment of all input chains by repeatedly merging the best
scoring pair of clusters. The work of every round is spread over --procs
processes, each simulated by a thread with its own mailbox, and every
process runs --threads workers.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* The result does not depend on --procs, --threads or --chunk, except for
  the order among equally scored merges

Output:
* #score, #rmsd, #pvalue and #chains header lines
* The assembly order as a Newick tree labelled with chain names

Examples:
1. Align all chains of a file:
   psma align tests/psma/four.fa

2. Use 2 processes with 4 threads each, and keep the pairwise scores:
   psma align tests/psma/four.fa -p 2 -t 4 --scores scores.tsv

"###,
        )
        .arg(
            Arg::new("procs")
                .long("procs")
                .short('p')
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of processes in the group"),
        );

    super::common_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let procs = *args.get_one::<usize>("procs").unwrap();
    if procs == 0 {
        anyhow::bail!("--procs must be at least 1");
    }
    let config = super::round_config(args);

    let chains = read_chains(args.get_many::<String>("infiles").unwrap())?;
    let names: Vec<String> = chains.iter().map(|c| c.id_string.clone()).collect();
    let engine = UngappedEngine::new();

    let results = crossbeam::scope(|s| {
        let handles: Vec<_> = LocalTransport::group(procs)
            .into_iter()
            .map(|transport| {
                let (chains, engine, config) = (chains.clone(), &engine, &config);
                s.spawn(move |_| {
                    let group = ProcessGroup::new(transport);
                    let logger = RankLogger::from_env(group.rank(), group.is_leader());
                    align_group(&group, engine, chains, config, &logger)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    })
    .map_err(|_| anyhow::anyhow!("process group panicked"))?;

    let mut leader = None;
    for (rank, joined) in results.into_iter().enumerate() {
        let result = joined.map_err(|_| anyhow::anyhow!("rank {} panicked", rank))??;
        if rank == 0 {
            leader = Some(result);
        }
    }

    if let Some(result) = leader {
        super::write_result(args, &result, &names)?;
    }

    Ok(())
}
