//! MP/LP: Magnet Price and Liquidity Pull zones.
//!
//! Open interest concentrates at a handful of strikes that tend to attract
//! price into expiry. The heaviest strike is the magnet; the heaviest strikes
//! below and above price are support and resistance zones. Net gamma exposure
//! (GEX) indicates whether dealer hedging dampens or amplifies moves.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::types::{finite_or, Signal, StrikeInterest};

/// Zones reported on each side of price.
const ZONES_PER_SIDE: usize = 3;

/// Band around price used to compare support and resistance OI.
const NEAR_BAND_PCT: f64 = 10.0;

/// Contract multiplier used for GEX.
const CONTRACT_SIZE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZone {
    pub strike: f64,
    pub open_interest: f64,
    /// Signed distance from price, in percent (negative = below).
    pub distance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpLpData {
    pub magnet_price: Option<f64>,
    pub distance_to_magnet_pct: Option<f64>,
    pub net_gex: f64,
    pub support_zones: Vec<LiquidityZone>,
    pub resistance_zones: Vec<LiquidityZone>,
    /// Direction the magnet pulls price.
    pub pull: Signal,
    pub score: f64,
    pub signals: Vec<String>,
}

impl MpLpData {
    fn neutral(reason: &str) -> Self {
        Self {
            magnet_price: None,
            distance_to_magnet_pct: None,
            net_gex: 0.0,
            support_zones: Vec::new(),
            resistance_zones: Vec::new(),
            pull: Signal::Neutral,
            score: 50.0,
            signals: vec![reason.to_string()],
        }
    }
}

/// Locate magnet and liquidity zones for a symbol trading at `price`.
pub fn analyze_mp_lp(price: f64, strikes: &[StrikeInterest]) -> MpLpData {
    if !price.is_finite() || price <= 0.0 {
        return MpLpData::neutral("No valid price for MP/LP");
    }

    let strikes: Vec<StrikeInterest> = strikes
        .iter()
        .filter(|s| s.strike.is_finite() && s.strike > 0.0 && s.total_oi().is_finite())
        .copied()
        .collect();
    if strikes.iter().all(|s| s.total_oi() <= 0.0) {
        return MpLpData::neutral("No open interest data");
    }

    let distance = |strike: f64| (strike - price) / price * 100.0;

    // Magnet: highest OI, ties broken by proximity to price
    let magnet = strikes
        .iter()
        .max_by(|a, b| {
            a.total_oi()
                .partial_cmp(&b.total_oi())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    (b.strike - price)
                        .abs()
                        .partial_cmp(&(a.strike - price).abs())
                        .unwrap_or(Ordering::Equal)
                })
        })
        .map(|s| s.strike);
    let distance_to_magnet_pct = magnet.map(distance);

    let net_gex: f64 = strikes
        .iter()
        .map(|s| (s.call_gamma * s.call_oi - s.put_gamma * s.put_oi) * CONTRACT_SIZE * price)
        .sum();
    let net_gex = finite_or(net_gex, 0.0);

    let zones = |below: bool| -> Vec<LiquidityZone> {
        let mut side: Vec<LiquidityZone> = strikes
            .iter()
            .filter(|s| if below { s.strike < price } else { s.strike > price })
            .filter(|s| s.total_oi() > 0.0)
            .map(|s| LiquidityZone {
                strike: s.strike,
                open_interest: s.total_oi(),
                distance_pct: distance(s.strike),
            })
            .collect();
        side.sort_by(|a, b| {
            b.open_interest
                .partial_cmp(&a.open_interest)
                .unwrap_or(Ordering::Equal)
        });
        side.truncate(ZONES_PER_SIDE);
        side
    };
    let support_zones = zones(true);
    let resistance_zones = zones(false);

    let mut signals = Vec::new();
    let mut score = 50.0;

    let pull = match distance_to_magnet_pct {
        Some(d) if d > 0.0 => Signal::Bullish,
        Some(d) if d < 0.0 => Signal::Bearish,
        _ => Signal::Neutral,
    };
    if let (Some(m), Some(d)) = (magnet, distance_to_magnet_pct) {
        let magnitude = if d.abs() <= 2.0 {
            15.0
        } else if d.abs() <= 5.0 {
            10.0
        } else {
            5.0
        };
        match pull {
            Signal::Bullish => score += magnitude,
            Signal::Bearish => score -= magnitude,
            Signal::Neutral => {}
        }
        signals.push(format!("Magnet ${m:.2} ({d:+.1}%)"));
    }

    let near = |s: &&StrikeInterest| distance(s.strike).abs() <= NEAR_BAND_PCT;
    let oi_below: f64 = strikes.iter().filter(near).filter(|s| s.strike < price).map(|s| s.total_oi()).sum();
    let oi_above: f64 = strikes.iter().filter(near).filter(|s| s.strike > price).map(|s| s.total_oi()).sum();
    if oi_below > oi_above {
        score += 10.0;
        signals.push("Open interest support below price".to_string());
    } else if oi_above > oi_below {
        score -= 10.0;
        signals.push("Open interest overhead resistance".to_string());
    }

    if net_gex > 0.0 {
        score += 5.0;
        signals.push("Positive GEX (dampened moves)".to_string());
    } else if net_gex < 0.0 {
        score -= 5.0;
        signals.push("Negative GEX (amplified moves)".to_string());
    }

    let score = finite_or(score, 50.0).clamp(0.0, 100.0);

    debug!(
        price,
        magnet = ?magnet,
        net_gex = format!("{net_gex:.0}"),
        supports = support_zones.len(),
        resistances = resistance_zones.len(),
        score,
        "MP/LP analysis complete"
    );

    MpLpData {
        magnet_price: magnet,
        distance_to_magnet_pct,
        net_gex,
        support_zones,
        resistance_zones,
        pull,
        score,
        signals,
    }
}
