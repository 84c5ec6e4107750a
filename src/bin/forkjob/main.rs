// src/bin/forkjob/main.rs

use clap::Parser;
use forkjob_cli::Cli;

fn main() {
    let cli = Cli::parse();
    let cfg = match cli.global.daemon_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = logging::init(cli.global.subscriber_config(&cfg)) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }
    if let Err(e) = forkjob_cli::run(cli, cfg) {
        tracing::debug!("command failed: {e:?}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
