//! `logtrack run` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use logtrack_core::config::LogtrackConfig;
use logtrack_pipeline::{
    DryRunStore, HandlerOptions, JobHistoryHandler, LogProcessor, OperationBuffer, PgStore,
    RuleTable, RunSummary,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Ctrl-C is handled by the caller; see [`crate::interrupt`].
pub async fn execute(
    args: RunArgs,
    mut config: LogtrackConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    apply_overrides(&mut config, args);
    config.validate()?;

    let rules = load_rules(&config).await?;
    let log_path = PathBuf::from(config.processor.log_path.trim());
    let options = HandlerOptions {
        download_threshold_secs: config.handlers.download_threshold_secs,
        truncate_on_start: config.handlers.truncate_history_on_start,
    };
    let batch_size = config.store.batch_size;

    info!(
        log_path = %log_path.display(),
        rulesets = rules.rulesets().len(),
        batch_size,
        dry_run = config.processor.dry_run,
        "starting log run"
    );

    let summary = if config.processor.dry_run {
        let buffer = OperationBuffer::new(DryRunStore::new(), batch_size);
        let mut processor = LogProcessor::new(rules, JobHistoryHandler::new(buffer, options), true);
        processor.run(&log_path).await?
    } else {
        let store = PgStore::connect(&config.store.dsn).await?;
        let mut buffer = OperationBuffer::new(store, batch_size);
        if let Some(script) = config.store.setup_script_path() {
            buffer.run_script(script).await?;
        }

        let mut processor =
            LogProcessor::new(rules, JobHistoryHandler::new(buffer, options), false);
        let summary = processor.run(&log_path).await?;
        processor
            .into_handler()
            .into_buffer()
            .into_store()
            .close()
            .await?;
        summary
    };

    writer.render(&RunReport::new(&log_path, config.processor.dry_run, summary))?;
    Ok(())
}

/// Subcommand flags win over file and environment values.
fn apply_overrides(config: &mut LogtrackConfig, args: RunArgs) {
    if let Some(path) = args.log_path {
        config.processor.log_path = path.display().to_string();
    }
    if let Some(rules) = args.rules {
        config.processor.rules_path = rules.display().to_string();
    }
    if let Some(dsn) = args.dsn {
        config.store.dsn = dsn;
    }
    if let Some(script) = args.setup_script {
        config.store.setup_script = script.display().to_string();
    }
    if args.dry_run {
        config.processor.dry_run = true;
    }
}

/// Rule file from configuration, or the built-in rules.
pub(crate) async fn load_rules(config: &LogtrackConfig) -> Result<RuleTable, CliError> {
    let table = match config.processor.rules_file() {
        Some(path) => {
            info!(path = %path.display(), "loading rules");
            RuleTable::load(path).await?
        }
        None => RuleTable::builtin()?,
    };
    Ok(table)
}

/// Result of a completed run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub log_path: String,
    pub dry_run: bool,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub lines_processed: usize,
    pub lines_unmatched: usize,
}

impl RunReport {
    fn new(log_path: &Path, dry_run: bool, summary: RunSummary) -> Self {
        Self {
            log_path: log_path.display().to_string(),
            dry_run,
            files_processed: summary.files_processed,
            files_skipped: summary.files_skipped,
            lines_processed: summary.lines_processed,
            lines_unmatched: summary.lines_unmatched,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let mode = if self.dry_run {
            "dry run".yellow().bold()
        } else {
            "run".green().bold()
        };
        writeln!(w, "Log {} complete: {}", mode, self.log_path.bold())?;
        writeln!(w, "  Files processed: {}", self.files_processed)?;
        writeln!(w, "  Files skipped:   {}", self.files_skipped)?;
        writeln!(w, "  Lines processed: {}", self.lines_processed)?;
        if self.lines_unmatched > 0 {
            writeln!(
                w,
                "  Lines unmatched: {}",
                self.lines_unmatched.to_string().red()
            )?;
        } else {
            writeln!(w, "  Lines unmatched: 0")?;
        }
        Ok(())
    }
}
