//! CLI-specific error types and exit code mapping

use logtrack_core::error::{LogtrackError, StorageError};
use logtrack_pipeline::LogPipelineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rule file could not be loaded or compiled.
    #[error("rule error: {0}")]
    Rule(String),

    /// Could not connect to the job history database.
    #[error("store unavailable: {0}")]
    Store(String),

    /// The log run aborted (unmatched line, failed batch, malformed payload).
    #[error("run failed: {0}")]
    Run(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success (also on Ctrl-C)         |
    /// | 1    | Run failure / output error       |
    /// | 2    | Configuration or rule error      |
    /// | 3    | Store connection failure         |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Rule(_) => 2,
            Self::Store(_) => 3,
            Self::Io(_) => 10,
            Self::Run(_) | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<LogtrackError> for CliError {
    fn from(e: LogtrackError) -> Self {
        match e {
            LogtrackError::Config(e) => Self::Config(e.to_string()),
            LogtrackError::Storage(e) => e.into(),
            LogtrackError::Io(e) => Self::Io(e),
            LogtrackError::Pipeline(e) => Self::Run(e.to_string()),
        }
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Connection(_) => Self::Store(e.to_string()),
            other => Self::Run(other.to_string()),
        }
    }
}

impl From<LogPipelineError> for CliError {
    fn from(e: LogPipelineError) -> Self {
        match e {
            LogPipelineError::InvalidPattern { .. }
            | LogPipelineError::UnknownHandler(_)
            | LogPipelineError::RuleLoad { .. } => Self::Rule(e.to_string()),
            LogPipelineError::Storage(e) => e.into(),
            LogPipelineError::Io(e) => Self::Io(e),
            other => Self::Run(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtrack_core::error::{ConfigError, PipelineError};

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_rule_error() {
        let err = CliError::Rule("invalid rule".to_owned());
        assert_eq!(err.exit_code(), 2, "rule error should return exit code 2");
    }

    #[test]
    fn test_exit_code_store_error() {
        let err = CliError::Store("connection refused".to_owned());
        assert_eq!(err.exit_code(), 3, "store error should return exit code 3");
    }

    #[test]
    fn test_exit_code_run_error() {
        let err = CliError::Run("no matching rule".to_owned());
        assert_eq!(err.exit_code(), 1, "run error should return exit code 1");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_from_core_config_error() {
        let core_err = LogtrackError::Config(ConfigError::FileNotFound {
            path: "logtrack.toml".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        assert!(matches!(cli_err, CliError::Config(_)));
        assert!(cli_err.to_string().contains("logtrack.toml"));
    }

    #[test]
    fn test_from_core_pipeline_error() {
        let core_err = LogtrackError::Pipeline(PipelineError::Aborted("x".to_owned()));
        assert_eq!(CliError::from(core_err).exit_code(), 1);
    }

    #[test]
    fn test_connection_failure_maps_to_store() {
        let err: CliError = StorageError::Connection("refused".to_owned()).into();
        assert!(matches!(err, CliError::Store(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_batch_failure_maps_to_run() {
        let err: CliError = LogPipelineError::Storage(StorageError::Statement {
            index: 2,
            reason: "syntax error".to_owned(),
        })
        .into();
        assert!(matches!(err, CliError::Run(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_rule_errors_map_to_rule() {
        let err: CliError = LogPipelineError::UnknownHandler("bogus".to_owned()).into();
        assert!(matches!(err, CliError::Rule(_)));

        let err: CliError = LogPipelineError::InvalidPattern {
            pattern: "(".to_owned(),
            reason: "unclosed group".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unmatched_line_maps_to_run() {
        let err: CliError = LogPipelineError::NoMatchingRule {
            path: "/logs/proxy.log".to_owned(),
            line: "garbage".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("garbage"));
    }
}
