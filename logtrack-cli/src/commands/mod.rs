//! Command handlers -- one module per subcommand

pub mod config;
pub mod rules;
pub mod run;

use logtrack_core::config::LogtrackConfig;

use crate::cli::Cli;
use crate::error::CliError;

/// Load the effective configuration: defaults < file < environment < global flags.
///
/// Validation is left to each command so that subcommand flags can still
/// change the outcome (e.g. `run --dry-run` with an empty DSN).
pub async fn load_config(cli: &Cli) -> Result<LogtrackConfig, CliError> {
    let (path, explicit) = cli.config_path();
    let mut config = if explicit {
        let mut config = LogtrackConfig::from_file(&path).await?;
        config.apply_env_overrides();
        config
    } else {
        LogtrackConfig::load_or_default(&path).await?
    };

    if let Some(level) = cli.log_level_override() {
        config.general.log_level = level;
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format.clone_from(format);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_explicit_missing_config_is_an_error() {
        let cli = Cli::try_parse_from(["logtrack", "-c", "/nonexistent/logtrack.toml", "run"])
            .expect("parse succeeded");
        let err = load_config(&cli).await.expect_err("explicit file must exist");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_global_flags_override_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("logtrack.toml");
        std::fs::write(&path, "[general]\nlog_level = \"warn\"\nlog_format = \"json\"\n")
            .expect("write config");

        let path_arg = path.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "logtrack",
            "-c",
            path_arg.as_str(),
            "--log-format",
            "pretty",
            "-v",
            "run",
        ])
        .expect("parse succeeded");

        let config = load_config(&cli).await.expect("config should load");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "pretty");
    }
}
