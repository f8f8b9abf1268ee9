//! Configuration file support for `.prodcal.toml`
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.prodcal.toml` (user defaults)
//! - Project directory: `./.prodcal.toml` (project defaults)
//! - Custom location via `--config` (replaces both)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Project config
//! 3. User config
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use prodcal_calendar::ics::{DEFAULT_CALENDAR_NAME, DEFAULT_PROD_ID};
use prodcal_calendar::{CalendarHeader, IcsOptions};
use prodcal_source::{ExtractOptions, FetchOptions};
use serde::{Deserialize, Serialize};

/// Config file name looked up in the home and current directories
pub const CONFIG_FILE_NAME: &str = ".prodcal.toml";

/// Default output file name, `{year}` is substituted
pub const DEFAULT_FILE_NAME: &str = "prodcal-{year}.ics";

/// Commented template written by `prodcal config init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# prodcal configuration file

[calendar]
# Display name; the year is appended
name = "Производственный календарь"
prod_id = "-//prodcal//Production Calendar//RU"
# Fold lines longer than 75 octets
fold_lines = false

[source]
# Page address, {year} is substituted
url = "https://www.consultant.ru/law/ref/calendar/proizvodstvennye/{year}/"
timeout_secs = 30
# Messages for days whose cell has no title
holiday_message = "Выходной день"
shortened_message = "Сокращённый рабочий день"

[output]
directory = "."
file_name = "prodcal-{year}.ics"
overwrite = false
"#;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Calendar header and layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarConfig>,

    /// Page retrieval and extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,

    /// Output file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fold_lines: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortened_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

impl CalendarConfig {
    fn overlay(self, over: Self) -> Self {
        Self {
            name: over.name.or(self.name),
            prod_id: over.prod_id.or(self.prod_id),
            fold_lines: over.fold_lines.or(self.fold_lines),
        }
    }
}

impl SourceConfig {
    fn overlay(self, over: Self) -> Self {
        Self {
            url: over.url.or(self.url),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
            user_agent: over.user_agent.or(self.user_agent),
            holiday_message: over.holiday_message.or(self.holiday_message),
            shortened_message: over.shortened_message.or(self.shortened_message),
        }
    }
}

impl OutputConfig {
    fn overlay(self, over: Self) -> Self {
        Self {
            directory: over.directory.or(self.directory),
            file_name: over.file_name.or(self.file_name),
            overwrite: over.overwrite.or(self.overwrite),
        }
    }
}

fn overlay_section<T: Default>(base: Option<T>, over: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(base), Some(over)) => Some(merge(base, over)),
        (base, None) => base,
        (None, over) => over.map(|over| merge(T::default(), over)),
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Explicit config file, or the merged user and project configs
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::merge(Self::load_user_config(), Self::load_project_config())),
        }
    }

    /// Load user config from `~/.prodcal.toml`
    fn load_user_config() -> Option<Self> {
        let path = dirs::home_dir()?.join(CONFIG_FILE_NAME);
        Self::load_optional(&path, "user")
    }

    /// Load project config from `./.prodcal.toml`
    fn load_project_config() -> Option<Self> {
        Self::load_optional(Path::new(CONFIG_FILE_NAME), "project")
    }

    fn load_optional(path: &Path, scope: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                log::debug!("Loaded {scope} config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!(
                    "{} Failed to load {scope} config from {}: {e:#}",
                    "Warning:".yellow().bold(),
                    path.display()
                );
                None
            }
        }
    }

    /// Merge configs, project settings override user settings
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let user = user_config.unwrap_or_default();
        let project = project_config.unwrap_or_default();
        Self {
            calendar: overlay_section(user.calendar, project.calendar, CalendarConfig::overlay),
            source: overlay_section(user.source, project.source, SourceConfig::overlay),
            output: overlay_section(user.output, project.output, OutputConfig::overlay),
        }
    }

    /// Calendar header for `year`
    pub fn calendar_header(&self, year: i32) -> CalendarHeader {
        let calendar = self.calendar.clone().unwrap_or_default();
        let name = calendar.name.as_deref().unwrap_or(DEFAULT_CALENDAR_NAME);
        CalendarHeader {
            prod_id: calendar.prod_id.unwrap_or_else(|| DEFAULT_PROD_ID.to_string()),
            name: format!("{name} {year}"),
        }
    }

    pub fn ics_options(&self) -> IcsOptions {
        IcsOptions {
            fold_lines: self
                .calendar
                .as_ref()
                .and_then(|c| c.fold_lines)
                .unwrap_or(false),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let mut options = FetchOptions::default();
        if let Some(source) = &self.source {
            if let Some(url) = &source.url {
                options.url_template.clone_from(url);
            }
            if let Some(secs) = source.timeout_secs {
                options.timeout = Duration::from_secs(secs);
            }
            if let Some(user_agent) = &source.user_agent {
                options.user_agent.clone_from(user_agent);
            }
        }
        options
    }

    pub fn extract_options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::default();
        if let Some(source) = &self.source {
            if let Some(message) = &source.holiday_message {
                options.holiday_message.clone_from(message);
            }
            if let Some(message) = &source.shortened_message {
                options.shortened_message.clone_from(message);
            }
        }
        options
    }

    /// Default output file for `year`
    pub fn output_path(&self, year: i32) -> PathBuf {
        let output = self.output.clone().unwrap_or_default();
        let directory = output.directory.unwrap_or_else(|| PathBuf::from("."));
        let file_name = output
            .file_name
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
            .replace("{year}", &year.to_string());
        directory.join(file_name)
    }

    /// Whether existing output files may be replaced
    pub fn overwrite(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.overwrite)
            .unwrap_or(false)
    }
}
