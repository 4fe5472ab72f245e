//! Configuration System
//!
//! Decoration palettes, standard button appearance, deferred-callback delays and
//! logging. Values are layered: built-in defaults, then an optional TOML file,
//! then `GRIDMENU__`-prefixed environment variables (`__` separates nesting,
//! e.g. `GRIDMENU__SCHEDULING__REOPEN_DELAY_TICKS=2`).

use crate::error::MenuError;
use crate::logging::LoggingConfig;
use crate::visual::{PaneColor, Visual};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub decoration: DecorationConfig,

    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            decoration: DecorationConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

/// How empty slots are decorated before a menu is first shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillPolicy {
    /// Leave empty slots empty.
    None,
    /// One colour everywhere.
    Uniform { color: PaneColor },
    /// Row gradient between two palette colours.
    Gradient { start: PaneColor, end: PaneColor },
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::Uniform {
            color: PaneColor::Gray,
        }
    }
}

/// Decoration and standard button appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationConfig {
    #[serde(default)]
    pub fill: FillPolicy,

    /// Gradient used for empty content slots of pageable menus.
    #[serde(default = "default_page_palette")]
    pub page_palette: Vec<PaneColor>,

    /// Filler for unused navigation row cells.
    #[serde(default = "default_navigation_filler")]
    pub navigation_filler: PaneColor,

    #[serde(default = "default_back_button")]
    pub back_button: Visual,

    #[serde(default = "default_close_button")]
    pub close_button: Visual,

    #[serde(default = "default_previous_button")]
    pub previous_button: Visual,

    #[serde(default = "default_next_button")]
    pub next_button: Visual,
}

fn default_page_palette() -> Vec<PaneColor> {
    vec![PaneColor::LightBlue, PaneColor::Blue, PaneColor::Cyan]
}

fn default_navigation_filler() -> PaneColor {
    PaneColor::Black
}

fn default_back_button() -> Visual {
    Visual::new("oak_door")
        .with_label("Back")
        .with_lore("Click to go back")
}

fn default_close_button() -> Visual {
    Visual::new("barrier")
        .with_label("Close")
        .with_lore("Click to close this menu")
}

fn default_previous_button() -> Visual {
    Visual::new("arrow").with_label("Previous Page")
}

fn default_next_button() -> Visual {
    Visual::new("arrow").with_label("Next Page")
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            fill: FillPolicy::default(),
            page_palette: default_page_palette(),
            navigation_filler: default_navigation_filler(),
            back_button: default_back_button(),
            close_button: default_close_button(),
            previous_button: default_previous_button(),
            next_button: default_next_button(),
        }
    }
}

/// Delays, in host ticks, for the deferred callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Delay before a clicked slot's visual is re-asserted.
    #[serde(default = "default_one_tick")]
    pub reassert_delay_ticks: u64,

    /// Delay before an uncloseable menu is shown again after the user closed it.
    #[serde(default = "default_one_tick")]
    pub reopen_delay_ticks: u64,
}

fn default_one_tick() -> u64 {
    1
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            reassert_delay_ticks: default_one_tick(),
            reopen_delay_ticks: default_one_tick(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Logging(String),
    Decoration(String),
    Scheduling(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Decoration(msg) => write!(f, "Decoration: {}", msg),
            ValidationError::Scheduling(msg) => write!(f, "Scheduling: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MenuConfig {
    /// Load configuration: defaults, then `path` (if given), then environment.
    pub fn load(path: Option<&Path>) -> Result<Self, MenuError> {
        let mut builder = Config::builder().add_source(Config::try_from(&MenuConfig::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(MenuError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("GRIDMENU")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: MenuConfig = builder.build()?.try_deserialize()?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            MenuError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = crate::logging::validate(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if self.decoration.page_palette.is_empty() {
            errors.push(ValidationError::Decoration(
                "page_palette must contain at least one colour".to_string(),
            ));
        }

        for (name, button) in [
            ("back_button", &self.decoration.back_button),
            ("close_button", &self.decoration.close_button),
            ("previous_button", &self.decoration.previous_button),
            ("next_button", &self.decoration.next_button),
        ] {
            if button.material.is_empty() {
                errors.push(ValidationError::Decoration(format!(
                    "{} material cannot be empty",
                    name
                )));
            }
        }

        if self.scheduling.reassert_delay_ticks == 0 {
            errors.push(ValidationError::Scheduling(
                "reassert_delay_ticks must be at least 1".to_string(),
            ));
        }
        if self.scheduling.reopen_delay_ticks == 0 {
            errors.push(ValidationError::Scheduling(
                "reopen_delay_ticks must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render this configuration as TOML, e.g. to write a starter file.
    pub fn to_toml_string(&self) -> Result<String, MenuError> {
        toml::to_string_pretty(self).map_err(|e| MenuError::Config(e.to_string()))
    }
}
