//! JSON fixture source.
//!
//! Loads a fixed array of `StockSnapshot`s from disk. Used for offline runs
//! and as the deterministic stand-in for live vendors in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::SnapshotSource;
use crate::error::ScanError;
use crate::types::StockSnapshot;

#[derive(Debug)]
pub struct FixtureSource {
    /// Keyed by upper-cased symbol.
    snapshots: HashMap<String, StockSnapshot>,
    /// Symbols in file order.
    order: Vec<String>,
}

impl FixtureSource {
    pub fn from_snapshots(snapshots: Vec<StockSnapshot>) -> Self {
        let mut map = HashMap::with_capacity(snapshots.len());
        let mut order = Vec::with_capacity(snapshots.len());
        for snap in snapshots {
            let key = snap.symbol.to_uppercase();
            if !map.contains_key(&key) {
                order.push(snap.symbol.clone());
            }
            map.insert(key, snap);
        }
        Self {
            snapshots: map,
            order,
        }
    }

    /// Load a JSON array of snapshots.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;
        let snapshots: Vec<StockSnapshot> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse fixture file: {}", path.display()))?;

        info!(path = %path.display(), symbols = snapshots.len(), "Fixture snapshots loaded");
        Ok(Self::from_snapshots(snapshots))
    }

    /// An empty source (every fetch fails).
    pub fn empty() -> Self {
        Self::from_snapshots(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotSource for FixtureSource {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot> {
        match self.snapshots.get(&symbol.to_uppercase()) {
            Some(snap) => {
                debug!(symbol, "Fixture snapshot served");
                Ok(snap.clone())
            }
            None => Err(ScanError::Source {
                symbol: symbol.to_string(),
                message: "not present in fixture".to_string(),
            }
            .into()),
        }
    }

    fn symbols(&self) -> Vec<String> {
        self.order.clone()
    }
}
