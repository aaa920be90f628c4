//! Shared types for the FLOWSCAN scoring engine.
//!
//! These types form the data model passed between the data layer, the
//! analyzers and the scanner. Analyzer-specific outputs (RAD setup, OSV
//! metrics, ...) live next to their analyzers in `crate::scanners`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScanError;
use crate::scanners::liquidity::LiquidityData;
use crate::scanners::mplp::MpLpData;
use crate::scanners::osv::OsvMetricsData;
use crate::scanners::rad::RadSetupData;
use crate::scanners::tank::TankFlowData;

// ---------------------------------------------------------------------------
// Price bars
// ---------------------------------------------------------------------------

/// One OHLCV bar. Series are always ordered oldest -> newest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for PriceBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} O:{:.2} H:{:.2} L:{:.2} C:{:.2} V:{:.0}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Categorical direction reported by every analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Bullish => write!(f, "BULLISH"),
            Signal::Bearish => write!(f, "BEARISH"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Price position relative to its EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "UP"),
            Trend::Down => write!(f, "DOWN"),
        }
    }
}

/// Scan mode; selects the row of the weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Intraday,
    Swing,
    #[serde(alias = "long-term", alias = "long_term")]
    LongTerm,
    Liquidity,
}

impl ScanMode {
    /// All modes, in weight-table order.
    pub const ALL: &'static [ScanMode] = &[
        ScanMode::Intraday,
        ScanMode::Swing,
        ScanMode::LongTerm,
        ScanMode::Liquidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Intraday => "intraday",
            ScanMode::Swing => "swing",
            ScanMode::LongTerm => "longterm",
            ScanMode::Liquidity => "liquidity",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a scan mode (case-insensitive). Unknown modes are a caller bug and
/// are rejected rather than defaulted.
impl std::str::FromStr for ScanMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "intraday" => Ok(ScanMode::Intraday),
            "swing" => Ok(ScanMode::Swing),
            "longterm" | "long-term" | "long_term" => Ok(ScanMode::LongTerm),
            "liquidity" => Ok(ScanMode::Liquidity),
            _ => Err(ScanError::InvalidMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// A sub-score together with how it was obtained.
///
/// `Full` comes from a complete analyzer run (or a precomputed analyzer
/// result). `Quick` is a best-effort heuristic built from whatever partial
/// snapshot fields were present and must not be treated as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "confidence", content = "value", rename_all = "lowercase")]
pub enum Score {
    Full(f64),
    Quick(f64),
}

impl Score {
    pub fn value(&self) -> f64 {
        match self {
            Score::Full(v) | Score::Quick(v) => *v,
        }
    }

    pub fn is_quick(&self) -> bool {
        matches!(self, Score::Quick(_))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Full(v) => write!(f, "{v:.0}"),
            Score::Quick(v) => write!(f, "~{v:.0}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analyzer inputs
// ---------------------------------------------------------------------------

/// Aggregated options flow for one symbol. Only the call/put volumes are
/// required; everything else has a documented default in the OSV analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsFlowSnapshot {
    pub call_volume: f64,
    pub put_volume: f64,
    pub call_ask_volume: Option<f64>,
    pub call_bid_volume: Option<f64>,
    pub put_ask_volume: Option<f64>,
    pub put_bid_volume: Option<f64>,
    /// Total premium traded on calls, in dollars.
    pub call_premium: Option<Decimal>,
    /// Total premium traded on puts, in dollars.
    pub put_premium: Option<Decimal>,
    pub max_pain: Option<f64>,
    /// 30-day average of total (call + put) contract volume.
    pub avg_volume_30d: Option<f64>,
}

/// Dark-pool and sweep aggregates feeding the TANK analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TankFlowInput {
    /// Shares printed off-exchange.
    pub dark_pool_volume: f64,
    /// Total shares traded.
    pub total_volume: f64,
    pub avg_volume: Option<f64>,
    #[serde(default)]
    pub call_sweep_premium: Decimal,
    #[serde(default)]
    pub put_sweep_premium: Decimal,
    #[serde(default)]
    pub block_trades: u32,
}

/// Open interest and gamma at a single strike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrikeInterest {
    pub strike: f64,
    pub call_oi: f64,
    pub put_oi: f64,
    #[serde(default)]
    pub call_gamma: f64,
    #[serde(default)]
    pub put_gamma: f64,
}

impl StrikeInterest {
    pub fn total_oi(&self) -> f64 {
        self.call_oi + self.put_oi
    }
}

/// Trading-activity figures used for the liquidity score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityInput {
    pub price: f64,
    /// Average daily share volume.
    pub avg_daily_volume: f64,
    /// Quoted bid/ask spread as a percentage of price.
    pub spread_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Snapshot & result
// ---------------------------------------------------------------------------

/// Everything known about a symbol at scan time.
///
/// Any subset of fields may be present. Precomputed analyzer results take
/// priority, then raw inputs, then quick heuristics over the price fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
    pub change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub avg_volume: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub spread_pct: Option<f64>,

    // Raw analyzer inputs
    #[serde(default)]
    pub bars: Vec<PriceBar>,
    pub options_flow: Option<OptionsFlowSnapshot>,
    pub tank_flow_input: Option<TankFlowInput>,
    #[serde(default)]
    pub strikes: Vec<StrikeInterest>,

    // Precomputed analyzer results
    pub rad_setup: Option<RadSetupData>,
    pub osv_metrics: Option<OsvMetricsData>,
    pub tank_flow: Option<TankFlowData>,
    pub mp_lp: Option<MpLpData>,
    pub liquidity: Option<LiquidityData>,
}

impl StockSnapshot {
    /// Position of the price inside the day's range (0.0 = low, 1.0 = high).
    pub fn range_position(&self) -> Option<f64> {
        let (high, low) = (self.day_high?, self.day_low?);
        let range = high - low;
        if !range.is_finite() || range <= 0.0 {
            return None;
        }
        Some(((self.price - low) / range).clamp(0.0, 1.0))
    }

    /// Current volume relative to average volume.
    pub fn volume_ratio(&self) -> Option<f64> {
        let (volume, avg) = (self.volume?, self.avg_volume?);
        if avg > 0.0 && volume.is_finite() {
            Some(volume / avg)
        } else {
            None
        }
    }
}

/// Ranked output row for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerResult {
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
    pub change_percent: Option<f64>,
    pub mode: ScanMode,
    pub tank: Score,
    pub rad: Score,
    pub mp_lp: Score,
    pub osv: Score,
    pub liquidity: Score,
    pub combined_score: u32,
    pub signals: Vec<String>,
}

impl ScannerResult {
    /// Number of sub-scores that came from quick heuristics.
    pub fn quick_count(&self) -> usize {
        [self.tank, self.rad, self.mp_lp, self.osv, self.liquidity]
            .iter()
            .filter(|s| s.is_quick())
            .count()
    }
}

impl fmt::Display for ScannerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] score={} (tank {} | rad {} | mp/lp {} | osv {} | liq {})",
            self.symbol,
            self.mode,
            self.combined_score,
            self.tank,
            self.rad,
            self.mp_lp,
            self.osv,
            self.liquidity,
        )
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replace NaN / infinite inputs with a fallback.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
