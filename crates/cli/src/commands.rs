//! Clap command definition.

use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};

/// Build the command line interface.
pub fn build_cli() -> Command {
    Command::new("strata-bench")
        .about("Concurrent storage benchmark harness")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("TOML configuration file (default: built-in defaults)"),
        )
        .arg(
            Arg::new("load")
                .long("load")
                .help("Run the load phase")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("run")
                .long("run")
                .help("Run the transaction phase (after load if both are given)")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("phases")
                .args(["load", "run"])
                .multiple(true)
                .required(true),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .value_name("N")
                .help("Worker threads per phase")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("OPS")
                .help("Aggregate operations per second cap")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("measurement")
                .long("measurement")
                .value_name("TYPE")
                .help("Latency aggregation: basic or hdrhistogram"),
        )
        .arg(
            Arg::new("warmup")
                .long("warmup")
                .value_name("N")
                .help("Warm-up operations across all threads (run phase)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("status-interval")
                .long("status-interval")
                .value_name("SECS")
                .help("Seconds between status lines; 0 disables")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print phase reports as JSON")
                .action(ArgAction::SetTrue),
        )
}
