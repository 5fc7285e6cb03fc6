//! logtrack -- replay job-processor and proxy logs into the job history database.

mod cli;
mod commands;
mod error;
mod interrupt;
mod logging;
mod output;

use clap::Parser;

use logtrack_core::config::{GeneralConfig, LogtrackConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let outcome = interrupt::run_until_interrupted(dispatch(cli), tokio::signal::ctrl_c()).await;

    let exit_code = match outcome {
        Some(Ok(())) => 0,
        Some(Err(e)) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            e.exit_code()
        }
        None => {
            tracing::warn!("interrupted, exiting without flushing pending operations");
            0
        }
    };

    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let loaded = commands::load_config(&cli).await;

    // 설정 로드에 실패해도 로깅은 전역 플래그만으로 초기화
    let general = match &loaded {
        Ok(config) => config.general.clone(),
        Err(_) => fallback_general(&cli),
    };
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;
    logtrack_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);
    let (source, _) = cli.config_path();

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, loaded?, &writer).await,
        Commands::Rules(args) => commands::rules::execute(args, loaded?, &writer).await,
        Commands::Config(args) => commands::config::execute(args, loaded, &source, &writer).await,
    }
}

fn fallback_general(cli: &Cli) -> GeneralConfig {
    let mut general = LogtrackConfig::default().general;
    if let Some(level) = cli.log_level_override() {
        general.log_level = level;
    }
    if let Some(format) = &cli.log_format {
        general.log_format.clone_from(format);
    }
    general
}
