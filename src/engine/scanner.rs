//! Scanner orchestrator.
//!
//! Maps stock snapshots through the five analyzers, combines the sub-scores
//! for the requested mode and returns the ranked list.
//!
//! Each sub-score is taken from the best source available:
//! 1. a precomputed analyzer result attached to the snapshot,
//! 2. the analyzer run on raw inputs (bars, options flow, strikes, volume),
//! 3. a quick heuristic over the partial price fields.
//!
//! Quick heuristics are best effort and are tagged `Score::Quick` so callers
//! can tell them apart from full analyses.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::data::SnapshotSource;
use crate::scanners::{
    analyze_liquidity, analyze_mp_lp, analyze_osv_metrics, analyze_rad, analyze_tank_flow,
    CombinedScorer, OsvConfig, RadConfig, SubScores,
};
use crate::types::{finite_or, LiquidityInput, ScanMode, ScannerResult, Score, StockSnapshot};

/// Default number of concurrent snapshot fetches.
const DEFAULT_FETCH_CONCURRENCY: usize = 8;

const NEUTRAL: f64 = 50.0;

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Stateless scoring pipeline. Share it behind an `Arc`; every call works
/// only on its own inputs.
#[derive(Debug, Clone)]
pub struct Scanner {
    rad: RadConfig,
    osv: OsvConfig,
    scorer: CombinedScorer,
    fetch_concurrency: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(RadConfig::default(), OsvConfig::default(), CombinedScorer::default())
    }
}

impl Scanner {
    pub fn new(rad: RadConfig, osv: OsvConfig, scorer: CombinedScorer) -> Self {
        Self {
            rad,
            osv,
            scorer,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    pub fn scorer(&self) -> &CombinedScorer {
        &self.scorer
    }

    pub fn rad_config(&self) -> &RadConfig {
        &self.rad
    }

    pub fn osv_config(&self) -> &OsvConfig {
        &self.osv
    }

    /// Score every stock for `mode`, sort by combined score (descending,
    /// ties by symbol) and keep the top `limit`.
    pub fn process_stocks_for_mode(
        &self,
        stocks: &[StockSnapshot],
        mode: ScanMode,
        limit: usize,
    ) -> Vec<ScannerResult> {
        let mut results: Vec<ScannerResult> = stocks
            .iter()
            .map(|stock| self.score_stock(stock, mode))
            .collect();

        results.sort_by(|a, b| {
            b.combined_score
                .cmp(&a.combined_score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        results.truncate(limit);

        debug!(
            mode = %mode,
            input = stocks.len(),
            output = results.len(),
            "Stocks processed"
        );
        results
    }

    /// Fetch snapshots for `symbols` concurrently, then rank them.
    ///
    /// Symbols whose fetch fails are logged and skipped.
    pub async fn scan(
        &self,
        source: &dyn SnapshotSource,
        symbols: &[String],
        mode: ScanMode,
        limit: usize,
    ) -> Vec<ScannerResult> {
        info!(symbols = symbols.len(), mode = %mode, limit, "Starting scan");

        let fetched: Vec<_> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = source.fetch_snapshot(&symbol).await;
                (symbol, result)
            })
            .buffer_unordered(self.fetch_concurrency)
            .collect()
            .await;

        let mut stocks = Vec::with_capacity(fetched.len());
        for (symbol, result) in fetched {
            match result {
                Ok(snapshot) => stocks.push(snapshot),
                Err(e) => warn!(symbol = %symbol, error = %e, "Snapshot fetch failed, skipping"),
            }
        }

        let results = self.process_stocks_for_mode(&stocks, mode, limit);
        info!(
            fetched = stocks.len(),
            ranked = results.len(),
            top = results.first().map(|r| r.symbol.as_str()).unwrap_or("-"),
            "Scan complete"
        );
        results
    }

    /// Build the result row for a single stock.
    pub fn score_stock(&self, stock: &StockSnapshot, mode: ScanMode) -> ScannerResult {
        let mut signals = Vec::new();

        let tank = self.tank_score(stock, &mut signals);
        let rad = self.rad_score(stock, &mut signals);
        let mp_lp = self.mp_lp_score(stock, &mut signals);
        let osv = self.osv_score(stock, &mut signals);
        let liquidity = self.liquidity_score(stock, &mut signals);

        let quick: Vec<&str> = [
            ("tank", tank),
            ("rad", rad),
            ("mp_lp", mp_lp),
            ("osv", osv),
            ("liquidity", liquidity),
        ]
        .iter()
        .filter(|(_, s)| s.is_quick())
        .map(|(name, _)| *name)
        .collect();
        if !quick.is_empty() {
            signals.push(format!("Quick estimates: {}", quick.join(", ")));
        }

        let sub_scores = SubScores::new(
            tank.value(),
            rad.value(),
            mp_lp.value(),
            osv.value(),
            liquidity.value(),
        );
        let combined_score = self.scorer.combined_score(&sub_scores, mode);

        ScannerResult {
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            price: stock.price,
            change_percent: stock.change_percent,
            mode,
            tank,
            rad,
            mp_lp,
            osv,
            liquidity,
            combined_score,
            signals,
        }
    }

    // -- Sub-score derivation ----------------------------------------------

    fn tank_score(&self, stock: &StockSnapshot, signals: &mut Vec<String>) -> Score {
        if let Some(data) = &stock.tank_flow {
            extend_labeled(signals, "TANK", &data.signals);
            return Score::Full(data.score);
        }
        if let Some(input) = &stock.tank_flow_input {
            let data = analyze_tank_flow(input);
            extend_labeled(signals, "TANK", &data.signals);
            return Score::Full(data.score);
        }
        Score::Quick(quick_tank(stock))
    }

    fn rad_score(&self, stock: &StockSnapshot, signals: &mut Vec<String>) -> Score {
        if let Some(data) = &stock.rad_setup {
            extend_labeled(signals, "RAD", &data.signals);
            return Score::Full(data.normalized_score);
        }
        if stock.bars.len() >= self.rad.lookback_period {
            let data = analyze_rad(&stock.bars, &self.rad);
            extend_labeled(signals, "RAD", &data.signals);
            return Score::Full(data.normalized_score);
        }
        Score::Quick(quick_rad(stock))
    }

    fn mp_lp_score(&self, stock: &StockSnapshot, signals: &mut Vec<String>) -> Score {
        if let Some(data) = &stock.mp_lp {
            extend_labeled(signals, "MP/LP", &data.signals);
            return Score::Full(data.score);
        }
        if !stock.strikes.is_empty() {
            let data = analyze_mp_lp(stock.price, &stock.strikes);
            extend_labeled(signals, "MP/LP", &data.signals);
            return Score::Full(data.score);
        }
        Score::Quick(quick_mp_lp(stock))
    }

    fn osv_score(&self, stock: &StockSnapshot, signals: &mut Vec<String>) -> Score {
        if let Some(data) = &stock.osv_metrics {
            extend_labeled(signals, "OSV", &data.signals);
            return Score::Full(data.score);
        }
        if let Some(options) = &stock.options_flow {
            let data = analyze_osv_metrics(&stock.symbol, options, &self.osv);
            extend_labeled(signals, "OSV", &data.signals);
            return Score::Full(data.score);
        }
        Score::Quick(quick_osv(stock))
    }

    fn liquidity_score(&self, stock: &StockSnapshot, signals: &mut Vec<String>) -> Score {
        if let Some(data) = &stock.liquidity {
            extend_labeled(signals, "LIQ", &data.signals);
            return Score::Full(data.score);
        }
        match stock.avg_volume.or(stock.volume) {
            Some(volume) if stock.price > 0.0 => {
                let data = analyze_liquidity(&LiquidityInput {
                    price: stock.price,
                    avg_daily_volume: volume,
                    spread_pct: stock.spread_pct,
                });
                extend_labeled(signals, "LIQ", &data.signals);
                Score::Full(data.score)
            }
            _ => Score::Quick(NEUTRAL),
        }
    }
}

fn extend_labeled(signals: &mut Vec<String>, label: &str, items: &[String]) {
    signals.extend(items.iter().map(|s| format!("{label}: {s}")));
}

// ---------------------------------------------------------------------------
// Quick heuristics
// ---------------------------------------------------------------------------

/// Direction of the day's move: +1, -1 or 0 when unknown.
fn change_direction(stock: &StockSnapshot) -> f64 {
    match stock.change_percent {
        Some(c) if c > 0.0 => 1.0,
        Some(c) if c < 0.0 => -1.0,
        _ => 0.0,
    }
}

fn bounded(score: f64) -> f64 {
    finite_or(score, NEUTRAL).clamp(0.0, 100.0)
}

/// Volume surge in the direction of the day's move.
fn quick_tank(stock: &StockSnapshot) -> f64 {
    match stock.volume_ratio() {
        Some(ratio) if ratio > 1.0 => {
            let surge = ((ratio - 1.0) * 20.0).min(30.0);
            bounded(NEUTRAL + surge * change_direction(stock))
        }
        _ => NEUTRAL,
    }
}

/// Recovery within the day's range plus momentum.
fn quick_rad(stock: &StockSnapshot) -> f64 {
    let mut score = NEUTRAL;
    if let Some(pos) = stock.range_position() {
        if (0.5..=0.8).contains(&pos) {
            score += 10.0;
        } else if pos < 0.2 {
            score -= 10.0;
        }
    }
    if let Some(change) = stock.change_percent {
        score += finite_or(change * 2.0, 0.0).clamp(-15.0, 15.0);
    }
    bounded(score)
}

/// Closing near the high reads as upward pull.
fn quick_mp_lp(stock: &StockSnapshot) -> f64 {
    match stock.range_position() {
        Some(pos) => bounded(40.0 + pos * 20.0),
        None => NEUTRAL,
    }
}

/// Momentum, confirmed by elevated volume.
fn quick_osv(stock: &StockSnapshot) -> f64 {
    let mut score = NEUTRAL;
    if let Some(change) = stock.change_percent {
        score += finite_or(change * 3.0, 0.0).clamp(-20.0, 20.0);
    }
    if matches!(stock.volume_ratio(), Some(r) if r >= 1.5) {
        score += 5.0 * change_direction(stock);
    }
    bounded(score)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
