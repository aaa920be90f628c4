//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section carries serde defaults, so a partial file (or an empty one) is
//! valid and only overrides what it names.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::scanners::{CombinedScorer, OsvConfig, RadConfig, WeightTable};
use crate::engine::scanner::Scanner;
use crate::types::ScanMode;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub rad: RadConfig,
    pub osv: OsvConfig,
    pub weights: WeightTable,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub default_mode: ScanMode,
    pub default_limit: usize,
    /// Concurrent snapshot fetches per scan.
    pub fetch_concurrency: usize,
    /// JSON array of snapshots served by the fixture source.
    pub fixture_path: Option<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            default_mode: ScanMode::Swing,
            default_limit: 20,
            fetch_concurrency: 8,
            fixture_path: Some("fixtures/snapshots.json".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and validate the weight table.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Failed to parse config")?;
        config.weights.validate()?;
        if config.rad.lookback_period == 0 || config.rad.atr_period == 0 {
            anyhow::bail!("rad.lookback_period and rad.atr_period must be positive");
        }
        let share = config.osv.dominant_ask_share;
        if !share.is_finite() || !(0.0..=1.0).contains(&share) {
            anyhow::bail!("osv.dominant_ask_share must be within [0, 1], got {share}");
        }
        Ok(config)
    }

    /// Build the scanner described by this configuration.
    pub fn build_scanner(&self) -> Result<Scanner> {
        let scorer = CombinedScorer::new(self.weights.clone())?;
        Ok(Scanner::new(self.rad.clone(), self.osv.clone(), scorer)
            .with_fetch_concurrency(self.scanner.fetch_concurrency))
    }
}
