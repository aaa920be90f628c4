//! RAD (Resistance After Dip) setup detection.
//!
//! Looks for a meaningful dip followed by a tight consolidation with
//! improving structure (higher lows, price back above trend, volume drying
//! up). Produces a small raw score, a 0-100 normalised score and a
//! categorical signal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::{self, count_falling, count_rising};
use crate::types::{finite_or, PriceBar, Signal, Trend};

/// Number of most recent swing points inspected for structure.
const SWING_POINTS_INSPECTED: usize = 5;

/// Consolidation volume below this fraction of the prior window counts as
/// drying up.
const VOLUME_DRY_UP_RATIO: f64 = 0.7;

/// Recovery band (fraction of the dip range retraced).
const RECOVERY_MIN: f64 = 0.5;
const RECOVERY_MAX: f64 = 0.8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// RAD detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadConfig {
    /// Dip must be at least `atr_multiplier` ATRs (as % of price).
    pub atr_multiplier: f64,
    /// Bars inspected for the dip; also the minimum history required.
    pub lookback_period: usize,
    /// Trailing bars treated as the consolidation window.
    pub consolidation_days: usize,
    /// Consolidation range must be within this fraction of the dip range.
    pub range_threshold: f64,
    pub bullish_threshold: f64,
    pub bearish_threshold: f64,
    pub ema_length: usize,
    /// Bars compared on each side when detecting swing points.
    pub swing_lookback: usize,
    pub atr_period: usize,
}

impl Default for RadConfig {
    fn default() -> Self {
        Self {
            atr_multiplier: 1.5,
            lookback_period: 20,
            consolidation_days: 5,
            range_threshold: 0.5,
            bullish_threshold: 3.0,
            bearish_threshold: -2.0,
            ema_length: 20,
            swing_lookback: 2,
            atr_period: 14,
        }
    }
}

impl RadConfig {
    /// Map a raw score to a signal using the configured thresholds.
    pub fn classify(&self, score: f64) -> Signal {
        if score >= self.bullish_threshold {
            Signal::Bullish
        } else if score <= self.bearish_threshold {
            Signal::Bearish
        } else {
            Signal::Neutral
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Outcome of a RAD analysis for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadSetupData {
    /// Raw score, roughly -3..+5.
    pub score: f64,
    /// `normalize_rad_score(score)`, 0-100.
    pub normalized_score: f64,
    pub signal: Signal,
    pub trend: Trend,
    pub dip_percent: f64,
    pub consol_range: f64,
    pub higher_lows: usize,
    pub lower_highs: usize,
    pub ema_value: f64,
    pub is_above_trend: bool,
    pub atr: f64,
    pub recent_high: f64,
    pub recent_low: f64,
    pub recovery_ratio: f64,
    pub signals: Vec<String>,
}

impl RadSetupData {
    /// Neutral result carrying a single explanatory signal.
    pub fn neutral(reason: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            normalized_score: normalize_rad_score(0.0),
            signal: Signal::Neutral,
            trend: Trend::Down,
            dip_percent: 0.0,
            consol_range: 0.0,
            higher_lows: 0,
            lower_highs: 0,
            ema_value: 0.0,
            is_above_trend: false,
            atr: 0.0,
            recent_high: 0.0,
            recent_low: 0.0,
            recovery_ratio: 0.0,
            signals: vec![reason.into()],
        }
    }
}

/// Map a raw RAD score onto 0-100: `clamp(50 + score * 10, 0, 100)`.
///
/// Monotonic; `normalize_rad_score(0.0) == 50.0`. NaN maps to 50.
pub fn normalize_rad_score(score: f64) -> f64 {
    (50.0 + finite_or(score, 0.0) * 10.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Run the RAD detector over `bars` (oldest -> newest).
///
/// Never fails: short histories produce a neutral result.
pub fn analyze_rad(bars: &[PriceBar], config: &RadConfig) -> RadSetupData {
    let lookback = config.lookback_period.max(1);
    if bars.len() < lookback {
        debug!(bars = bars.len(), required = lookback, "RAD: insufficient history");
        return RadSetupData::neutral(format!(
            "Insufficient data: need {lookback} bars, have {}",
            bars.len()
        ));
    }

    let mut signals = Vec::new();
    let mut score = 0.0;

    let price = bars[bars.len() - 1].close;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    // 1-2. Volatility and trend
    let atr = indicators::atr(bars, config.atr_period).unwrap_or(0.0);
    let ema_value = indicators::last_ema(&closes, config.ema_length).unwrap_or(price);
    let is_above_trend = price > ema_value;
    let trend = if is_above_trend { Trend::Up } else { Trend::Down };

    // 3. Dip over the lookback window
    let window = &bars[bars.len() - lookback..];
    let recent_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let recent_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let dip_range = (recent_high - recent_low).max(0.0);
    let dip_percent = if recent_high > 0.0 {
        dip_range / recent_high * 100.0
    } else {
        0.0
    };
    let dip_threshold = if price > 0.0 {
        atr / price * config.atr_multiplier * 100.0
    } else {
        0.0
    };

    if dip_percent > 0.0 && dip_percent >= dip_threshold {
        score += 1.0;
        signals.push(format!(
            "Significant dip: {dip_percent:.1}% (threshold {dip_threshold:.1}%)"
        ));
    }

    // 4. Consolidation over the trailing window
    let consol_days = config.consolidation_days.clamp(1, lookback);
    let consol = &bars[bars.len() - consol_days..];
    let consol_high = consol.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let consol_low = consol.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let consol_abs = (consol_high - consol_low).max(0.0);
    let consol_range = if consol_low > 0.0 {
        consol_abs / consol_low * 100.0
    } else {
        0.0
    };

    if dip_range > 0.0 && consol_abs <= dip_range * config.range_threshold {
        score += 1.0;
        signals.push(format!(
            "Tight consolidation: {consol_range:.1}% over {consol_days} bars"
        ));
    }

    // 5. Structure from swing points
    let swing_lows = indicators::swing_lows(bars, config.swing_lookback);
    let swing_highs = indicators::swing_highs(bars, config.swing_lookback);
    let higher_lows = count_rising(&swing_lows, SWING_POINTS_INSPECTED);
    let lower_highs = count_falling(&swing_highs, SWING_POINTS_INSPECTED);

    if higher_lows >= 2 {
        score += 0.5 * higher_lows as f64;
        signals.push(format!("Higher lows forming ({higher_lows})"));
    }
    if lower_highs >= 2 {
        score -= 0.5 * lower_highs as f64;
        signals.push(format!("Lower highs ({lower_highs})"));
    }

    // 6. Trend, recovery and volume
    if is_above_trend {
        score += 0.5;
        signals.push(format!("Above EMA({})", config.ema_length));
    } else {
        score -= 0.5;
        signals.push(format!("Below EMA({})", config.ema_length));
    }

    let recovery_ratio = if dip_range > 0.0 {
        (price - recent_low) / dip_range
    } else {
        0.0
    };
    if (RECOVERY_MIN..=RECOVERY_MAX).contains(&recovery_ratio) {
        score += 0.5;
        signals.push(format!(
            "Recovered {:.0}% of dip range",
            recovery_ratio * 100.0
        ));
    }

    let prior = &window[..window.len() - consol_days];
    let consol_volume = indicators::mean(&consol.iter().map(|b| b.volume).collect::<Vec<_>>());
    let prior_volume = indicators::mean(&prior.iter().map(|b| b.volume).collect::<Vec<_>>());
    if let (Some(cv), Some(pv)) = (consol_volume, prior_volume) {
        if pv > 0.0 && cv < pv * VOLUME_DRY_UP_RATIO {
            score += 0.5;
            signals.push(format!(
                "Volume drying up ({:.0}% of prior average)",
                cv / pv * 100.0
            ));
        }
    }

    let score = finite_or(score, 0.0);
    let signal = config.classify(score);

    debug!(
        score,
        dip_percent = format!("{dip_percent:.2}"),
        consol_range = format!("{consol_range:.2}"),
        higher_lows,
        lower_highs,
        trend = %trend,
        signal = %signal,
        "RAD analysis complete"
    );

    RadSetupData {
        score,
        normalized_score: normalize_rad_score(score),
        signal,
        trend,
        dip_percent,
        consol_range,
        higher_lows,
        lower_highs,
        ema_value,
        is_above_trend,
        atr,
        recent_high,
        recent_low,
        recovery_ratio,
        signals,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::tests::bars_from;

    /// Run-up, sharp dip, then a quiet consolidation above the EMA.
    fn dip_and_base() -> Vec<PriceBar> {
        let mut hlc = Vec::new();
        for _ in 0..10 {
            hlc.push((101.0, 99.0, 100.0));
        }
        for c in [102.0, 104.0, 106.0, 108.0, 110.0, 104.0, 98.0, 92.0, 95.0, 98.0] {
            hlc.push((c + 1.0, c - 1.0, c));
        }
        for c in [101.0, 101.5, 102.0, 101.8, 102.5] {
            hlc.push((c + 0.5, c - 0.5, c));
        }
        let mut bars = bars_from(&hlc);
        let n = bars.len();
        for bar in &mut bars[n - 5..] {
            bar.volume = 400_000.0;
        }
        bars
    }

    /// Steady decline made of lower swing highs.
    fn stair_down() -> Vec<PriceBar> {
        let mut hlc = Vec::new();
        let mut base = 120.0;
        for _ in 0..6 {
            for offset in [0.0, 2.0, 4.0, 2.0, 0.0] {
                let c = base + offset;
                hlc.push((c + 0.5, c - 0.5, c));
            }
            base -= 3.0;
        }
        bars_from(&hlc)
    }

    /// Steady advance made of higher swing lows.
    fn stair_up() -> Vec<PriceBar> {
        let mut hlc = Vec::new();
        let mut base = 100.0;
        for _ in 0..6 {
            for offset in [0.0, 2.0, 4.0, 2.0, 0.0] {
                let c = base + offset;
                hlc.push((c + 0.5, c - 0.5, c));
            }
            base += 3.0;
        }
        bars_from(&hlc)
    }

    #[test]
    fn test_insufficient_data_is_neutral() {
        let bars = bars_from(&[(101.0, 99.0, 100.0); 10]);
        let result = analyze_rad(&bars, &RadConfig::default());
        assert_eq!(result.signal, Signal::Neutral);
        assert_eq!(result.normalized_score, 50.0);
        assert_eq!(result.signals.len(), 1);
        assert!(result.signals[0].starts_with("Insufficient data"));
    }

    #[test]
    fn test_empty_bars_is_neutral() {
        let result = analyze_rad(&[], &RadConfig::default());
        assert_eq!(result.signal, Signal::Neutral);
        assert_eq!(result.normalized_score, 50.0);
    }

    #[test]
    fn test_flat_bars_no_dip() {
        let bars = bars_from(&[(100.0, 100.0, 100.0); 25]);
        let result = analyze_rad(&bars, &RadConfig::default());
        assert_eq!(result.signal, Signal::Neutral);
        assert!(result.dip_percent.abs() < 1e-9);
        assert!(!result.is_above_trend);
        assert_eq!(result.trend, Trend::Down);
        // Only the below-EMA penalty applies
        assert!((result.score + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_dip_and_consolidation_is_bullish() {
        let result = analyze_rad(&dip_and_base(), &RadConfig::default());
        assert!(result.dip_percent > 17.0 && result.dip_percent < 19.0);
        assert_eq!(result.recent_high, 111.0);
        assert_eq!(result.recent_low, 91.0);
        assert!(result.is_above_trend);
        assert_eq!(result.trend, Trend::Up);
        assert!((result.score - 3.5).abs() < 1e-9, "score was {}", result.score);
        assert_eq!(result.signal, Signal::Bullish);
        assert!((result.normalized_score - 85.0).abs() < 1e-9);
        assert!(result.signals.iter().any(|s| s.starts_with("Significant dip")));
        assert!(result.signals.iter().any(|s| s.starts_with("Tight consolidation")));
        assert!(result.signals.iter().any(|s| s.starts_with("Volume drying up")));
    }

    #[test]
    fn test_stair_down_counts_lower_highs() {
        let result = analyze_rad(&stair_down(), &RadConfig::default());
        assert!(result.lower_highs >= 2, "lower highs {}", result.lower_highs);
        assert_eq!(result.higher_lows, 0);
        assert_eq!(result.trend, Trend::Down);
        assert!(result.score < analyze_rad(&dip_and_base(), &RadConfig::default()).score);
        assert!(result.signals.iter().any(|s| s.starts_with("Lower highs")));
    }

    #[test]
    fn test_stair_up_counts_higher_lows() {
        let result = analyze_rad(&stair_up(), &RadConfig::default());
        // Swing lows sit at the end of each step, five of them inspected
        assert_eq!(result.higher_lows, 4);
        assert_eq!(result.lower_highs, 0);
        assert!(result.signals.iter().any(|s| s == "Higher lows forming (4)"));
        assert!(!result.signals.iter().any(|s| s.starts_with("Lower highs")));
        assert!(result.score > analyze_rad(&stair_down(), &RadConfig::default()).score);
    }

    #[test]
    fn test_oversized_swing_lookback_finds_no_swings() {
        let config = RadConfig {
            swing_lookback: usize::MAX,
            ..RadConfig::default()
        };
        let result = analyze_rad(&stair_up(), &config);
        assert_eq!(result.higher_lows, 0);
        assert_eq!(result.lower_highs, 0);
    }

    #[test]
    fn test_classify_thresholds() {
        let config = RadConfig::default();
        assert_eq!(config.classify(3.0), Signal::Bullish);
        assert_eq!(config.classify(2.99), Signal::Neutral);
        assert_eq!(config.classify(-2.0), Signal::Bearish);
        assert_eq!(config.classify(-1.99), Signal::Neutral);
    }

    #[test]
    fn test_normalize_rad_score() {
        assert_eq!(normalize_rad_score(0.0), 50.0);
        assert_eq!(normalize_rad_score(3.5), 85.0);
        assert_eq!(normalize_rad_score(10.0), 100.0);
        assert_eq!(normalize_rad_score(-10.0), 0.0);
        assert_eq!(normalize_rad_score(f64::NAN), 50.0);
    }

    #[test]
    fn test_normalize_rad_score_monotonic() {
        let mut prev = normalize_rad_score(-20.0);
        let mut s = -20.0;
        while s <= 20.0 {
            let n = normalize_rad_score(s);
            assert!(n >= prev);
            assert!((0.0..=100.0).contains(&n));
            prev = n;
            s += 0.25;
        }
    }

    #[test]
    fn test_rad_config_default() {
        let config = RadConfig::default();
        assert_eq!(config.bullish_threshold, 3.0);
        assert_eq!(config.bearish_threshold, -2.0);
        assert_eq!(config.lookback_period, 20);
    }
}
