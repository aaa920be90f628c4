//! Mock snapshot source for integration testing.
//!
//! Provides a deterministic `SnapshotSource` that serves in-memory
//! snapshots, counts fetches and can be told to fail specific symbols.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flowscan::data::SnapshotSource;
use flowscan::types::StockSnapshot;

pub struct MockSource {
    snapshots: Vec<StockSnapshot>,
    failing: Arc<Mutex<HashSet<String>>>,
    fetches: AtomicUsize,
}

impl MockSource {
    pub fn new(snapshots: Vec<StockSnapshot>) -> Self {
        Self {
            snapshots,
            failing: Arc::new(Mutex::new(HashSet::new())),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Make every fetch of `symbol` return an error.
    pub fn fail_symbol(&self, symbol: &str) {
        self.failing.lock().unwrap().insert(symbol.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Price-only snapshots with a spread of daily moves.
    pub fn price_only(symbols: &[(&str, f64)]) -> Self {
        Self::new(
            symbols
                .iter()
                .map(|(symbol, change)| StockSnapshot {
                    symbol: symbol.to_string(),
                    price: 25.0,
                    change_percent: Some(*change),
                    volume: Some(3_000_000.0),
                    avg_volume: Some(2_000_000.0),
                    day_high: Some(25.5),
                    day_low: Some(24.5),
                    ..Default::default()
                })
                .collect(),
        )
    }
}

#[async_trait]
impl SnapshotSource for MockSource {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(symbol) {
            return Err(anyhow!("forced failure for {symbol}"));
        }
        self.snapshots
            .iter()
            .find(|s| s.symbol == symbol)
            .cloned()
            .ok_or_else(|| anyhow!("unknown symbol {symbol}"))
    }

    fn symbols(&self) -> Vec<String> {
        self.snapshots.iter().map(|s| s.symbol.clone()).collect()
    }
}
