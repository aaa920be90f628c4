//! Liquidity score from dollar volume and quoted spread.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{finite_or, LiquidityInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityTier {
    Mega,
    High,
    Medium,
    Low,
    Thin,
}

impl fmt::Display for LiquidityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquidityTier::Mega => write!(f, "mega"),
            LiquidityTier::High => write!(f, "high"),
            LiquidityTier::Medium => write!(f, "medium"),
            LiquidityTier::Low => write!(f, "low"),
            LiquidityTier::Thin => write!(f, "thin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityData {
    /// Average daily dollar volume.
    pub dollar_volume: f64,
    pub spread_pct: Option<f64>,
    pub tier: LiquidityTier,
    pub score: f64,
    pub signals: Vec<String>,
}

/// (minimum dollar volume, score, tier), highest first.
const DOLLAR_VOLUME_TIERS: &[(f64, f64, LiquidityTier)] = &[
    (1_000_000_000.0, 100.0, LiquidityTier::Mega),
    (500_000_000.0, 90.0, LiquidityTier::Mega),
    (100_000_000.0, 75.0, LiquidityTier::High),
    (50_000_000.0, 60.0, LiquidityTier::Medium),
    (10_000_000.0, 40.0, LiquidityTier::Medium),
    (1_000_000.0, 20.0, LiquidityTier::Low),
];

pub fn analyze_liquidity(input: &LiquidityInput) -> LiquidityData {
    let price = finite_or(input.price, 0.0).max(0.0);
    let volume = finite_or(input.avg_daily_volume, 0.0).max(0.0);
    let dollar_volume = price * volume;

    let (mut score, tier) = DOLLAR_VOLUME_TIERS
        .iter()
        .find(|(min, _, _)| dollar_volume >= *min)
        .map(|(_, score, tier)| (*score, *tier))
        .unwrap_or((10.0, LiquidityTier::Thin));

    let mut signals = vec![format!(
        "${:.1}M average daily dollar volume ({tier})",
        dollar_volume / 1_000_000.0
    )];

    let spread_pct = input.spread_pct.filter(|s| s.is_finite() && *s >= 0.0);
    if let Some(spread) = spread_pct {
        if spread > 0.5 {
            score -= 15.0;
            signals.push(format!("Wide spread {spread:.2}%"));
        } else if spread > 0.2 {
            score -= 5.0;
            signals.push(format!("Spread {spread:.2}%"));
        }
    }

    let score = score.clamp(0.0, 100.0);
    debug!(
        dollar_volume = format!("${:.1}M", dollar_volume / 1_000_000.0),
        spread_pct = ?spread_pct,
        tier = %tier,
        score,
        "Liquidity analysis complete"
    );

    LiquidityData {
        dollar_volume,
        spread_pct,
        tier,
        score,
        signals,
    }
}
