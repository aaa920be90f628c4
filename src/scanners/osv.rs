//! OSV (options strike/summary volume) sentiment.
//!
//! Scores a symbol's aggregated options activity: put/call ratio, volume
//! versus the 30-day average, estimated premium flow and ask-side
//! aggression. Degenerate inputs (zero volume, missing splits) fall back to
//! documented defaults instead of failing.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{finite_or, OptionsFlowSnapshot, Signal};

const BASELINE: f64 = 50.0;

/// Tolerance for share comparisons so a 60% default split counts as 60%.
const SHARE_EPS: f64 = 1e-9;

/// Net premium tiers (dollars).
const PREMIUM_TIER_LARGE: Decimal = dec!(50000000);
const PREMIUM_TIER_MEDIUM: Decimal = dec!(20000000);
const PREMIUM_TIER_SMALL: Decimal = dec!(10000000);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsvConfig {
    /// Ask share assumed for the dominant side when the feed gives no
    /// ask/bid split. The other side gets `1 - dominant_ask_share`.
    pub dominant_ask_share: f64,
}

impl Default for OsvConfig {
    fn default() -> Self {
        Self {
            dominant_ask_share: 0.6,
        }
    }
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OsvSentiment {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl OsvSentiment {
    /// Collapse to the three-way signal used across analyzers.
    pub fn signal(&self) -> Signal {
        match self {
            OsvSentiment::StrongBullish | OsvSentiment::Bullish => Signal::Bullish,
            OsvSentiment::StrongBearish | OsvSentiment::Bearish => Signal::Bearish,
            OsvSentiment::Neutral => Signal::Neutral,
        }
    }
}

impl fmt::Display for OsvSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsvSentiment::StrongBullish => write!(f, "strong bullish"),
            OsvSentiment::Bullish => write!(f, "bullish"),
            OsvSentiment::Neutral => write!(f, "neutral"),
            OsvSentiment::Bearish => write!(f, "bearish"),
            OsvSentiment::StrongBearish => write!(f, "strong bearish"),
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsvMetricsData {
    pub symbol: String,
    pub total_call_volume: f64,
    pub total_put_volume: f64,
    pub put_call_ratio: f64,
    pub call_ask_volume: f64,
    pub call_bid_volume: f64,
    pub put_ask_volume: f64,
    pub put_bid_volume: f64,
    /// True when any ask/bid split above came from the default share.
    pub ask_bid_estimated: bool,
    pub net_premium: Decimal,
    pub bullish_premium: Decimal,
    pub bearish_premium: Decimal,
    pub max_pain: Option<f64>,
    /// Total volume as a percentage of the 30-day average.
    pub volume_vs_avg: f64,
    pub sentiment: OsvSentiment,
    pub score: f64,
    pub signals: Vec<String>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Score the options activity of `symbol`.
pub fn analyze_osv_metrics(
    symbol: &str,
    options: &OptionsFlowSnapshot,
    config: &OsvConfig,
) -> OsvMetricsData {
    let call_volume = finite_or(options.call_volume, 0.0).max(0.0);
    let put_volume = finite_or(options.put_volume, 0.0).max(0.0);
    let total = call_volume + put_volume;

    let put_call_ratio = if call_volume > 0.0 {
        put_volume / call_volume
    } else {
        1.0
    };

    // Ask/bid splits, defaulted from the dominant side
    let dominant = config.dominant_ask_share.clamp(0.0, 1.0);
    let (call_ask_share, put_ask_share) = if put_call_ratio < 1.0 {
        (dominant, 1.0 - dominant)
    } else if put_call_ratio > 1.0 {
        (1.0 - dominant, dominant)
    } else {
        (0.5, 0.5)
    };
    let (call_ask_volume, call_bid_volume, call_estimated) = split_volume(
        call_volume,
        options.call_ask_volume,
        options.call_bid_volume,
        call_ask_share,
    );
    let (put_ask_volume, put_bid_volume, put_estimated) = split_volume(
        put_volume,
        options.put_ask_volume,
        options.put_bid_volume,
        put_ask_share,
    );
    let ask_bid_estimated = call_estimated || put_estimated;

    let avg_volume = options
        .avg_volume_30d
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(total);
    let volume_vs_avg = if avg_volume > 0.0 {
        total / avg_volume * 100.0
    } else {
        100.0
    };

    // Premium flow from ask/bid skew x average premium per contract
    let avg_call_premium = per_contract(options.call_premium, call_volume);
    let avg_put_premium = per_contract(options.put_premium, put_volume);
    let bullish_premium = flow_premium(
        (call_ask_volume, avg_call_premium),
        (put_bid_volume, avg_put_premium),
    );
    let bearish_premium = flow_premium(
        (put_ask_volume, avg_put_premium),
        (call_bid_volume, avg_call_premium),
    );
    let net_premium = bullish_premium - bearish_premium;

    let sentiment = if put_call_ratio < 0.7 {
        OsvSentiment::StrongBullish
    } else if put_call_ratio < 0.85 && bullish_premium >= bearish_premium {
        OsvSentiment::Bullish
    } else if put_call_ratio > 1.5 {
        OsvSentiment::StrongBearish
    } else if put_call_ratio > 1.3 && bearish_premium >= bullish_premium {
        OsvSentiment::Bearish
    } else {
        OsvSentiment::Neutral
    };

    let mut signals = Vec::new();
    let mut score = BASELINE;

    // Put/call extremity
    let pcr_adj = if put_call_ratio < 0.5 {
        20.0
    } else if put_call_ratio < 0.7 {
        15.0
    } else if put_call_ratio < 0.85 {
        8.0
    } else if put_call_ratio > 2.0 {
        -20.0
    } else if put_call_ratio > 1.5 {
        -15.0
    } else if put_call_ratio > 1.3 {
        -8.0
    } else {
        0.0
    };
    score += pcr_adj;
    signals.push(format!("Put/call ratio {put_call_ratio:.2} ({sentiment})"));

    // Volume spike in the direction of sentiment
    let direction = match sentiment.signal() {
        Signal::Bullish => 1.0,
        Signal::Bearish => -1.0,
        Signal::Neutral => 0.0,
    };
    if volume_vs_avg >= 200.0 {
        score += 10.0 * direction;
        signals.push(format!("Options volume {volume_vs_avg:.0}% of 30d average"));
    } else if volume_vs_avg >= 150.0 {
        score += 5.0 * direction;
        signals.push(format!("Options volume {volume_vs_avg:.0}% of 30d average"));
    }

    // Net premium magnitude
    let premium_adj = if net_premium.abs() >= PREMIUM_TIER_LARGE {
        15.0
    } else if net_premium.abs() >= PREMIUM_TIER_MEDIUM {
        10.0
    } else if net_premium.abs() >= PREMIUM_TIER_SMALL {
        5.0
    } else {
        0.0
    };
    if premium_adj > 0.0 {
        let sign = if net_premium.is_sign_negative() { -1.0 } else { 1.0 };
        score += premium_adj * sign;
        let millions = (net_premium / dec!(1000000)).round_dp(1);
        signals.push(format!("Net premium {}${}M", if sign > 0.0 { "+" } else { "-" }, millions.abs()));
    }

    // Ask-side aggression per side
    if call_volume > 0.0 {
        let share = call_ask_volume / call_volume;
        if share + SHARE_EPS >= 0.6 {
            score += 8.0;
            signals.push(format!("Calls bought at ask ({:.0}%)", share * 100.0));
        } else if share + SHARE_EPS >= 0.55 {
            score += 4.0;
        }
    }
    if put_volume > 0.0 {
        let share = put_ask_volume / put_volume;
        if share + SHARE_EPS >= 0.6 {
            score -= 8.0;
            signals.push(format!("Puts bought at ask ({:.0}%)", share * 100.0));
        } else if share + SHARE_EPS >= 0.55 {
            score -= 4.0;
        }
    }

    if ask_bid_estimated {
        signals.push(format!(
            "Ask/bid split estimated ({:.0}/{:.0} default)",
            dominant * 100.0,
            (1.0 - dominant) * 100.0
        ));
    }
    if let Some(mp) = options.max_pain {
        signals.push(format!("Max pain ${mp:.2}"));
    }

    let score = finite_or(score, BASELINE).clamp(0.0, 100.0);

    debug!(
        symbol,
        put_call_ratio = format!("{put_call_ratio:.2}"),
        volume_vs_avg = format!("{volume_vs_avg:.0}"),
        net_premium = %net_premium,
        sentiment = %sentiment,
        score,
        "OSV analysis complete"
    );

    OsvMetricsData {
        symbol: symbol.to_string(),
        total_call_volume: call_volume,
        total_put_volume: put_volume,
        put_call_ratio,
        call_ask_volume,
        call_bid_volume,
        put_ask_volume,
        put_bid_volume,
        ask_bid_estimated,
        net_premium,
        bullish_premium,
        bearish_premium,
        max_pain: options.max_pain,
        volume_vs_avg,
        sentiment,
        score,
        signals,
    }
}

/// Resolve `(ask, bid, estimated)` for one side.
fn split_volume(
    volume: f64,
    ask: Option<f64>,
    bid: Option<f64>,
    default_ask_share: f64,
) -> (f64, f64, bool) {
    let ask = ask.filter(|v| v.is_finite() && *v >= 0.0);
    let bid = bid.filter(|v| v.is_finite() && *v >= 0.0);
    match (ask, bid) {
        (Some(a), Some(b)) => (a.min(volume), b.min(volume), false),
        (Some(a), None) => (a.min(volume), (volume - a).max(0.0), false),
        (None, Some(b)) => ((volume - b).max(0.0), b.min(volume), false),
        (None, None) => (
            volume * default_ask_share,
            volume * (1.0 - default_ask_share),
            true,
        ),
    }
}

fn per_contract(premium: Option<Decimal>, volume: f64) -> Decimal {
    match premium {
        Some(p) if volume > 0.0 => {
            let v = to_dec(volume);
            if v.is_zero() {
                Decimal::ZERO
            } else {
                p.max(Decimal::ZERO).checked_div(v).unwrap_or(Decimal::MAX)
            }
        }
        _ => Decimal::ZERO,
    }
}

/// Sum of `volume x premium` over two legs, saturating at `Decimal::MAX`.
/// Both legs are non-negative so the sum never wraps.
fn flow_premium(a: (f64, Decimal), b: (f64, Decimal)) -> Decimal {
    let leg = |(volume, premium): (f64, Decimal)| {
        to_dec(volume).checked_mul(premium).unwrap_or(Decimal::MAX)
    };
    leg(a)
        .checked_add(leg(b))
        .unwrap_or(Decimal::MAX)
        .round_dp(2)
}

fn to_dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
