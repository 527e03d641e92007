//! lfs-filter - long-running git filter process.
//!
//! Configure git to start it once per command:
//!
//! ```text
//! git config filter.lfs.process "lfs-filter filter-process"
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lfs_filter::transform::Passthrough;
use lfs_filter::{Filter, FilterConfig, FilterError};
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// lfs-filter - git clean/smudge filter process
#[derive(Parser, Debug)]
#[command(name = "lfs-filter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); logs go to stderr
    #[arg(long, env = "LFS_FILTER_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve clean/smudge requests from git over stdin/stdout
    FilterProcess {
        /// Skip downloading content during smudge
        #[arg(short, long)]
        skip: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Commands) -> Result<(), FilterError> {
    match command {
        Commands::FilterProcess { skip } => {
            let mut config = FilterConfig::from_env();
            config.skip_smudge |= skip;

            let runtime = tokio::runtime::Builder::new_current_thread().build()?;

            runtime.block_on(async {
                Filter::builder(Passthrough)
                    .config(config)
                    .build()
                    .run_stdio()
                    .await
            })?;
            Ok(())
        }
    }
}
