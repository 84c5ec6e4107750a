// crates/cli/src/lib.rs
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use daemon::{DaemonConfig, DaemonError, Status};
use logging::{LogFormat, SubscriberConfig};
use thiserror::Error;

pub mod builtin;
mod commands;
mod utils;

use utils::parse_param;

/// Run jobs as detached daemons and inspect their lifecycle registry.
#[derive(Parser, Debug)]
#[command(name = "forkjob", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// configuration file
    #[arg(long, global = true, value_name = "FILE", env = "FORKJOB_CONFIG_PATH")]
    pub config: Option<PathBuf>,
    /// directory holding marker files and the registry
    #[arg(long = "pid-dir", global = true, value_name = "DIR")]
    pub pid_dir: Option<PathBuf>,
    /// directory receiving the daily lifecycle log
    #[arg(long = "log-dir", global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a built-in job in a detached daemon and print its pid
    Run(RunOpts),
    /// Show the registry record of one daemon
    Status {
        pid: u32,
        #[arg(long)]
        json: bool,
    },
    /// Show every registry record
    List {
        #[arg(long)]
        json: bool,
    },
    /// Terminate a running daemon and mark it STOPPED
    Stop { pid: u32 },
    /// Drop STOPPED and COMPLETED records from the registry
    Prune,
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// name of the work function
    pub work: String,
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
    /// name of the completion callback
    #[arg(long, default_value = "log")]
    pub callback: String,
    #[arg(long = "callback-param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub callback_params: Vec<(String, String)>,
    /// keep stdin, stdout and stderr attached in the daemon
    #[arg(long = "no-redirect")]
    pub no_redirect: bool,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Daemon(#[from] DaemonError),
    #[error("invalid configuration: {0}")]
    Config(#[from] std::io::Error),
    #[error("process {0} is not registered")]
    UnknownPid(u32),
    #[error("process {pid} is not running ({status})")]
    NotRunning { pid: u32, status: Status },
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

impl GlobalOpts {
    /// Loads the configuration file and applies command line overrides.
    pub fn daemon_config(&self) -> Result<DaemonConfig, CliError> {
        let mut cfg = daemon::load_config(self.config.as_deref())?;
        if let Some(dir) = &self.pid_dir {
            cfg.pid_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            cfg.log_dir = dir.clone();
        }
        Ok(cfg)
    }

    pub fn subscriber_config(&self, cfg: &DaemonConfig) -> SubscriberConfig {
        SubscriberConfig::builder()
            .format(self.log_format)
            .verbose(self.verbose)
            .quiet(self.quiet)
            .log_dir(Some(cfg.log_dir.clone()))
            .build()
    }
}

pub fn run(cli: Cli, cfg: DaemonConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Run(opts) => commands::start(&opts, cfg),
        Commands::Status { pid, json } => commands::status(&cfg, pid, json),
        Commands::List { json } => commands::list(&cfg, json),
        Commands::Stop { pid } => commands::stop(&cfg, pid),
        Commands::Prune => commands::prune(&cfg),
    }
}
