extern crate clap;
use clap::*;

mod cmd_psma;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let app = Command::new("psma")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`psma` - Parallel Structural Multiple Alignment")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_psma::align::make_subcommand())
        .subcommand(cmd_psma::node::make_subcommand())
        .after_help(
            r###"Subcommands:

* align - Run a whole process group inside this process
* node  - Run one rank of a process group connected over TCP

Logging:
* PSMA_LOG_LEVEL=0|1|2 selects how much each rank reports (default 2)
* RUST_LOG filters the log output as usual

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("align", sub_matches)) => cmd_psma::align::execute(sub_matches),
        Some(("node", sub_matches)) => cmd_psma::node::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
