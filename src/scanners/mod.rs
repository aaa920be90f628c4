//! Per-symbol analyzers and the combined scorer.
//!
//! Every analyzer is a pure function of its inputs that always returns a
//! populated result; missing or degenerate data yields a neutral score.

pub mod combined;
pub mod liquidity;
pub mod mplp;
pub mod osv;
pub mod rad;
pub mod tank;

pub use combined::{CombinedScorer, ModeWeights, ScoreBreakdown, SubScores, WeightTable};
pub use liquidity::{analyze_liquidity, LiquidityData};
pub use mplp::{analyze_mp_lp, MpLpData};
pub use osv::{analyze_osv_metrics, OsvConfig, OsvMetricsData, OsvSentiment};
pub use rad::{analyze_rad, normalize_rad_score, RadConfig, RadSetupData};
pub use tank::{analyze_tank_flow, TankFlowData};
