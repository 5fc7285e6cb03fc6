//! `logtrack rules` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use logtrack_core::config::LogtrackConfig;
use logtrack_pipeline::RuleTable;

use super::run::load_rules;
use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Source label for the embedded rule table.
const BUILTIN_SOURCE: &str = "(built-in)";

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config: LogtrackConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        RulesAction::List { rules } => execute_list(config, rules, writer).await,
        RulesAction::Check { path } => execute_check(&path, writer).await,
    }
}

async fn execute_list(
    mut config: LogtrackConfig,
    rules: Option<PathBuf>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    if let Some(path) = rules {
        config.processor.rules_path = path.display().to_string();
    }

    let source = config
        .processor
        .rules_file()
        .map_or_else(|| BUILTIN_SOURCE.to_owned(), |p| p.display().to_string());
    let table = load_rules(&config).await?;

    writer.render(&RuleListReport::from_table(source, &table))?;
    Ok(())
}

async fn execute_check(path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %path.display(), "checking rule file");

    let report = match RuleTable::load(path).await {
        Ok(table) => RuleCheckReport {
            path: path.display().to_string(),
            valid: true,
            rulesets: table.rulesets().len(),
            rules: table.rule_count(),
            error: None,
        },
        Err(e) => RuleCheckReport {
            path: path.display().to_string(),
            valid: false,
            rulesets: 0,
            rules: 0,
            error: Some(e.to_string()),
        },
    };

    writer.render(&report)?;

    match report.error {
        Some(error) => Err(CliError::Rule(error)),
        None => Ok(()),
    }
}

#[derive(Debug, Serialize)]
pub struct RuleListReport {
    pub source: String,
    pub total: usize,
    pub rulesets: Vec<RuleSetEntry>,
}

#[derive(Debug, Serialize)]
pub struct RuleSetEntry {
    pub files: String,
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Serialize)]
pub struct RuleEntry {
    pub pattern: String,
    pub handler: String,
}

impl RuleListReport {
    fn from_table(source: String, table: &RuleTable) -> Self {
        Self {
            source,
            total: table.rule_count(),
            rulesets: table
                .rulesets()
                .iter()
                .map(|set| RuleSetEntry {
                    files: set.file_pattern().to_owned(),
                    rules: set
                        .rules()
                        .iter()
                        .map(|rule| RuleEntry {
                            pattern: rule.pattern().to_owned(),
                            handler: rule.handler().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Line Rules ({} total, source: {})",
            self.total.to_string().bold(),
            self.source
        )?;

        for set in &self.rulesets {
            writeln!(w)?;
            writeln!(w, "{}", set.files.cyan().bold())?;
            for (idx, rule) in set.rules.iter().enumerate() {
                writeln!(
                    w,
                    "  {:>3}. {:<18} {}",
                    idx + 1,
                    rule.handler.green(),
                    rule.pattern
                )?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RuleCheckReport {
    pub path: String,
    pub valid: bool,
    pub rulesets: usize,
    pub rules: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Render for RuleCheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Check: {}", self.path.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            writeln!(w, "  Rulesets: {}", self.rulesets)?;
            writeln!(w, "  Rules: {}", self.rules)?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            if let Some(error) = &self.error {
                writeln!(w, "  Error: {}", error.red())?;
            }
        }
        Ok(())
    }
}
