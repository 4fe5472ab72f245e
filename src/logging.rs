//! Logging System
//!
//! Structured logging built on `tracing`. The menu runtime itself only emits
//! events; hosts that do not install their own subscriber can call
//! [`init_logging`] once at startup.

use crate::error::MenuError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(MenuError::Config(format!(
                "Invalid log format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

impl FromStr for LogOutput {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            other => Err(MenuError::Config(format!(
                "Invalid log output '{}', expected 'stdout', 'stderr' or 'file'",
                other
            ))),
        }
    }
}

/// `[logging]` section of the menu configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level: trace, debug, info, warn, error or off.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Only used with `output = "file"`.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// ANSI colours for text output on a terminal.
    #[serde(default = "default_color")]
    pub color: bool,

    /// Per-module levels, e.g. `"gridmenu::events" = "debug"`.
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/gridmenu.log")
}

fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: default_log_file(),
            color: default_color(),
            modules: BTreeMap::new(),
        }
    }
}

/// Install a global subscriber for the runtime's `tracing` output.
///
/// Environment variables (`GRIDMENU_LOG`, `GRIDMENU_LOG_FORMAT`,
/// `GRIDMENU_LOG_OUTPUT`, `GRIDMENU_LOG_MODULES`) win over `config`, which wins
/// over the defaults. Fails if a global subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), MenuError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = build_env_filter(config)?;
    let format = env_override("GRIDMENU_LOG_FORMAT")?.unwrap_or(config.format);
    let output = env_override("GRIDMENU_LOG_OUTPUT")?.unwrap_or(config.output);
    let ansi = output != LogOutput::File && config.color;

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(Arc::new(open_log_file(config)?)),
    };

    let base = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Text => base.with_ansi(ansi).boxed(),
    };

    Registry::default()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| MenuError::Config(format!("Failed to install subscriber: {}", e)))
}

fn env_override<T: FromStr<Err = MenuError>>(var: &str) -> Result<Option<T>, MenuError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map(Some),
        Err(_) => Ok(None),
    }
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, MenuError> {
    if let Some(parent) = config.file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| MenuError::Config(format!("Failed to create log directory: {}", e)))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .map_err(|e| {
            MenuError::Config(format!(
                "Failed to open log file {}: {}",
                config.file.display(),
                e
            ))
        })
}

/// `GRIDMENU_LOG` replaces everything; otherwise the configured level plus
/// per-module directives from the config and `GRIDMENU_LOG_MODULES`.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, MenuError> {
    if let Ok(filter) = EnvFilter::try_from_env("GRIDMENU_LOG") {
        return Ok(filter);
    }

    let mut filter = EnvFilter::new(&config.level);

    let configured = config
        .modules
        .iter()
        .map(|(module, level)| format!("{}={}", module, level));
    let from_env: Vec<String> = std::env::var("GRIDMENU_LOG_MODULES")
        .map(|spec| {
            spec.split(',')
                .filter_map(|entry| entry.split_once('='))
                .map(|(module, level)| format!("{}={}", module.trim(), level.trim()))
                .collect()
        })
        .unwrap_or_default();

    for directive in configured.chain(from_env) {
        let parsed = directive
            .parse()
            .map_err(|e| MenuError::Config(format!("Invalid log directive '{}': {}", directive, e)))?;
        filter = filter.add_directive(parsed);
    }

    Ok(filter)
}

/// Validate a logging configuration without installing anything.
pub(crate) fn validate(config: &LoggingConfig) -> Result<(), String> {
    LevelFilter::from_str(&config.level)
        .map_err(|_| format!("Invalid log level '{}'", config.level))?;
    for (module, level) in &config.modules {
        LevelFilter::from_str(level)
            .map_err(|_| format!("Invalid log level '{}' for module '{}'", level, module))?;
    }
    if config.output == LogOutput::File && config.file.as_os_str().is_empty() {
        return Err("file output needs a log file path".to_string());
    }
    Ok(())
}
