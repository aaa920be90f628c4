//! TANK flow: large and aggressive order flow.
//!
//! Combines dark-pool share of volume, the call/put skew of sweep premium,
//! unusual volume and block-trade counts into a 0-100 score.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{finite_or, Signal, TankFlowInput};

/// Sweep bias beyond which the flow has a direction.
const DIRECTION_THRESHOLD: f64 = 0.2;
const BLOCK_TRADE_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankFlowData {
    /// Off-exchange share of total volume, in percent.
    pub dark_pool_percent: f64,
    /// (call - put) / (call + put) sweep premium, in [-1, 1].
    pub sweep_bias: f64,
    /// Volume relative to average (1.0 when unknown).
    pub volume_ratio: f64,
    pub block_trades: u32,
    pub direction: Signal,
    pub score: f64,
    pub signals: Vec<String>,
}

/// Score a symbol's institutional flow.
pub fn analyze_tank_flow(input: &TankFlowInput) -> TankFlowData {
    let total_volume = finite_or(input.total_volume, 0.0).max(0.0);
    let dark_pool = finite_or(input.dark_pool_volume, 0.0).max(0.0);
    let dark_pool_percent = if total_volume > 0.0 {
        (dark_pool / total_volume * 100.0).min(100.0)
    } else {
        0.0
    };

    let call_sweeps = input.call_sweep_premium.max(Decimal::ZERO);
    let put_sweeps = input.put_sweep_premium.max(Decimal::ZERO);
    let sweep_total = call_sweeps
        .checked_add(put_sweeps)
        .unwrap_or(Decimal::MAX);
    let sweep_bias = if sweep_total.is_zero() {
        0.0
    } else {
        ((call_sweeps - put_sweeps) / sweep_total).to_f64().unwrap_or(0.0)
    };

    let volume_ratio = match input.avg_volume {
        Some(avg) if avg.is_finite() && avg > 0.0 => total_volume / avg,
        _ => 1.0,
    };

    let direction = if sweep_bias > DIRECTION_THRESHOLD {
        Signal::Bullish
    } else if sweep_bias < -DIRECTION_THRESHOLD {
        Signal::Bearish
    } else {
        Signal::Neutral
    };
    // Dark-pool accumulation without sweep direction still counts as interest
    let dp_sign = match direction {
        Signal::Bearish => -1.0,
        _ => 1.0,
    };
    let flow_sign = match direction {
        Signal::Bullish => 1.0,
        Signal::Bearish => -1.0,
        Signal::Neutral => 0.0,
    };

    let mut signals = Vec::new();
    let mut score = 50.0;

    let dp_adj = if dark_pool_percent >= 50.0 {
        15.0
    } else if dark_pool_percent >= 40.0 {
        10.0
    } else if dark_pool_percent >= 30.0 {
        5.0
    } else {
        0.0
    };
    if dp_adj > 0.0 {
        score += dp_adj * dp_sign;
        signals.push(format!("Dark pool {dark_pool_percent:.0}% of volume"));
    }

    if !sweep_total.is_zero() {
        score += 20.0 * sweep_bias;
        signals.push(format!(
            "Sweeps {:.0}% calls (${} total)",
            (sweep_bias + 1.0) * 50.0,
            sweep_total.round_dp(0)
        ));
    }

    if volume_ratio >= 2.0 {
        score += 10.0 * flow_sign;
        signals.push(format!("Unusual volume {volume_ratio:.1}x average"));
    } else if volume_ratio >= 1.5 {
        score += 5.0 * flow_sign;
        signals.push(format!("Elevated volume {volume_ratio:.1}x average"));
    }

    if input.block_trades >= BLOCK_TRADE_THRESHOLD {
        score += 5.0 * flow_sign;
        signals.push(format!("{} block trades", input.block_trades));
    }

    let score = finite_or(score, 50.0).clamp(0.0, 100.0);

    debug!(
        dark_pool_percent = format!("{dark_pool_percent:.1}"),
        sweep_bias = format!("{sweep_bias:.2}"),
        volume_ratio = format!("{volume_ratio:.2}"),
        direction = %direction,
        score,
        "TANK analysis complete"
    );

    TankFlowData {
        dark_pool_percent,
        sweep_bias,
        volume_ratio,
        block_trades: input.block_trades,
        direction,
        score,
        signals,
    }
}
