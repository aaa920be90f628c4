//! Snapshot sources.
//!
//! Defines the `SnapshotSource` trait the scanner pulls per-symbol data
//! from. Market-data vendors sit behind it; the only implementation shipped
//! here is the deterministic JSON fixture source.

pub mod fixture;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::StockSnapshot;

/// Abstraction over per-symbol market snapshots.
///
/// Fetches are independent per symbol and may run concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch everything known about one symbol.
    async fn fetch_snapshot(&self, symbol: &str) -> Result<StockSnapshot>;

    /// Default scan universe for this source.
    fn symbols(&self) -> Vec<String>;
}
