//! `logtrack config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logtrack_core::config::LogtrackConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Section names accepted by `config show --section`.
const SECTIONS: [&str; 4] = ["general", "store", "processor", "handlers"];

/// Execute the `config` command.
///
/// `loaded` is the configuration after file, environment and global flags,
/// or the error that loading produced.
pub async fn execute(
    args: ConfigArgs,
    loaded: Result<LogtrackConfig, CliError>,
    source: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(loaded, source, writer),
        ConfigAction::Show { section } => execute_show(loaded?, source, section, writer),
    }
}

/// Validate the effective configuration and report every problem found.
///
/// # Errors
///
/// Returns `CliError::Config` if loading or validation fails.
fn execute_validate(
    loaded: Result<LogtrackConfig, CliError>,
    source: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %source.display(), "validating configuration");

    let errors = match loaded {
        Ok(config) => config
            .validate()
            .err()
            .map(|e| vec![e.to_string()])
            .unwrap_or_default(),
        Err(e) => vec![e.to_string()],
    };

    let report = ConfigValidationReport {
        source: source.display().to_string(),
        valid: errors.is_empty(),
        errors,
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Print the effective configuration as TOML, with DSN credentials redacted.
///
/// # Errors
///
/// Returns `CliError::Config` if the section name is unknown.
fn execute_show(
    mut config: LogtrackConfig,
    source: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    config.store.dsn = redact_url(&config.store.dsn);

    let config_toml = match section.as_deref() {
        None => toml::to_string_pretty(&config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("store") => toml::to_string_pretty(&config.store),
        Some("processor") => toml::to_string_pretty(&config.processor),
        Some("handlers") => toml::to_string_pretty(&config.handlers),
        Some(other) => {
            return Err(CliError::Config(format!(
                "unknown section '{other}', expected one of: {}",
                SECTIONS.join(", ")
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {e})"));

    let mut value = serde_json::to_value(&config)?;
    if let Some(name) = section.as_deref() {
        value = value
            .get_mut(name)
            .map(serde_json::Value::take)
            .unwrap_or_default();
    }

    let report = ConfigReport {
        source: source.display().to_string(),
        section,
        config: value,
        config_toml,
    };
    writer.render(&report)?;
    Ok(())
}

/// Replace `user:password@` in a connection URL with a placeholder.
///
/// `postgresql://user:pw@host:5432/db` becomes `postgresql://***REDACTED***@host:5432/db`.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_owned();
    };

    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at_pos) => format!("{scheme}://***REDACTED***{}", &rest[at_pos..]),
        None => url.to_owned(),
    }
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering; JSON output carries the
/// structured `config` instead.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
