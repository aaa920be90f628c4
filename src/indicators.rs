//! Price-series utilities over OHLCV bars.
//!
//! Pure functions, no I/O. Every function tolerates short or empty input
//! and returns `None` / empty results rather than panicking.

use crate::types::PriceBar;

/// True range of `bar` given the previous close.
///
/// `max(high - low, |high - prev_close|, |low - prev_close|)`. Without a
/// previous close the range is simply `high - low`.
pub fn true_range(bar: &PriceBar, prev_close: Option<f64>) -> f64 {
    let hl = bar.high - bar.low;
    match prev_close {
        Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        None => hl,
    }
}

/// Average True Range: simple mean of the last `period` true ranges.
///
/// Uses all available true ranges when fewer than `period` exist.
pub fn atr(bars: &[PriceBar], period: usize) -> Option<f64> {
    if bars.is_empty() || period == 0 {
        return None;
    }

    let ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if i > 0 { Some(bars[i - 1].close) } else { None };
            true_range(bar, prev_close)
        })
        .collect();

    let start = ranges.len().saturating_sub(period);
    let window = &ranges[start..];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Exponential Moving Average series.
///
/// Multiplier `k = 2 / (period + 1)`, seeded with the SMA of the first
/// `period` values. Returns an empty `Vec` if there is insufficient data.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        prev = v * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

/// Latest EMA value, falling back to the SMA of everything available when
/// the series is shorter than `period`.
pub fn last_ema(values: &[f64], period: usize) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match ema(values, period).last() {
        Some(v) => Some(*v),
        None => Some(values.iter().sum::<f64>() / values.len() as f64),
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// ---------------------------------------------------------------------------
// Swing points
// ---------------------------------------------------------------------------

/// A local extreme in a bar series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

/// Bars whose high is strictly greater than the high of each of the
/// `lookback` bars on both sides.
pub fn swing_highs(bars: &[PriceBar], lookback: usize) -> Vec<SwingPoint> {
    swing_points(bars, lookback, |b| b.high, |candidate, other| candidate > other)
}

/// Bars whose low is strictly lower than the low of each of the `lookback`
/// bars on both sides.
pub fn swing_lows(bars: &[PriceBar], lookback: usize) -> Vec<SwingPoint> {
    swing_points(bars, lookback, |b| b.low, |candidate, other| candidate < other)
}

fn swing_points(
    bars: &[PriceBar],
    lookback: usize,
    price: impl Fn(&PriceBar) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<SwingPoint> {
    if lookback == 0 || bars.len() < lookback.saturating_mul(2).saturating_add(1) {
        return Vec::new();
    }

    (lookback..bars.len() - lookback)
        .filter_map(|i| {
            let candidate = price(&bars[i]);
            let is_swing = (1..=lookback).all(|j| {
                beats(candidate, price(&bars[i - j])) && beats(candidate, price(&bars[i + j]))
            });
            is_swing.then_some(SwingPoint { index: i, price: candidate })
        })
        .collect()
}

/// Number of consecutive rises among the last `take` points.
pub fn count_rising(points: &[SwingPoint], take: usize) -> usize {
    let start = points.len().saturating_sub(take);
    points[start..]
        .windows(2)
        .filter(|w| w[1].price > w[0].price)
        .count()
}

/// Number of consecutive falls among the last `take` points.
pub fn count_falling(points: &[SwingPoint], take: usize) -> usize {
    let start = points.len().saturating_sub(take);
    points[start..]
        .windows(2)
        .filter(|w| w[1].price < w[0].price)
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
