use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use booking_core::{BookingNumberIssuer, Catalog, RandomIssuer, SequentialIssuer};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "booking.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuerKind {
    Random,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog_path: Option<PathBuf>,
    pub log_filter: String,
    pub output: OutputFormat,
    pub issuer: IssuerKind,
    pub sequential_seed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: None,
            log_filter: "info".into(),
            output: OutputFormat::Text,
            issuer: IssuerKind::Random,
            sequential_seed: 12_637,
        }
    }
}

impl Settings {
    pub fn issuer(&self) -> Box<dyn BookingNumberIssuer> {
        match self.issuer {
            IssuerKind::Random => Box::new(RandomIssuer::new()),
            IssuerKind::Sequential => Box::new(SequentialIssuer::starting_at(self.sequential_seed)),
        }
    }
}

/// Defaults, then `booking.toml` (or the explicit path, which must exist),
/// then `APP__*` environment variables.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let file = match config_path {
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
    };

    let raw = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to load settings")?;

    raw.try_deserialize::<Settings>()
        .context("failed to read settings")
}

pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
    Catalog::from_toml_str(&raw)
        .with_context(|| format!("invalid catalog '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
