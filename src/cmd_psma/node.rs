use anyhow::Context;
use clap::*;
use psma::libs::alignment::{read_chains, UngappedEngine};
use psma::libs::logger::RankLogger;
use psma::libs::round::align_group;
use psma::libs::transport::{ProcessGroup, TcpTransport};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("node")
        .about("Runs one rank of a process group connected over TCP")
        .after_help(
            r###"
Start one `psma node` per rank, all with the same input files. Rank 0 listens
on --leader and the other ranks connect to it, retrying for a while if it is
not up yet. Only rank 0 writes the result.

Examples:
1. A group of 3 on one machine:
   psma node tests/psma/four.fa --rank 0 --size 3 --leader 127.0.0.1:7070 -o out.nwk &
   psma node tests/psma/four.fa --rank 1 --size 3 --leader 127.0.0.1:7070 &
   psma node tests/psma/four.fa --rank 2 --size 3 --leader 127.0.0.1:7070

"###,
        )
        .arg(
            Arg::new("rank")
                .long("rank")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Rank of this process, 0 is the leader"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Number of processes in the group"),
        )
        .arg(
            Arg::new("leader")
                .long("leader")
                .required(true)
                .num_args(1)
                .help("HOST:PORT the leader listens on"),
        );

    super::common_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let rank = *args.get_one::<usize>("rank").unwrap();
    let size = *args.get_one::<usize>("size").unwrap();
    let leader = args.get_one::<String>("leader").unwrap();
    let config = super::round_config(args);

    let chains = read_chains(args.get_many::<String>("infiles").unwrap())?;
    let names: Vec<String> = chains.iter().map(|c| c.id_string.clone()).collect();

    let transport = TcpTransport::join(rank, size, leader)
        .with_context(|| format!("rank {} could not join the group at {}", rank, leader))?;
    let group = ProcessGroup::new(transport);
    let logger = RankLogger::from_env(rank, group.is_leader());

    let result = align_group(&group, &UngappedEngine::new(), chains, &config, &logger)?;
    super::write_result(args, &result, &names)?;

    Ok(())
}
