//! Mode-weighted combination of the five sub-scores.
//!
//! The weight table is plain data owned by `CombinedScorer`. Defaults are
//! compiled in and can be replaced from configuration; every row must sum
//! to 1.0 so that sub-scores in [0, 100] give a combined score in [0, 100].

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::types::{finite_or, ScanMode};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Weights for one scan mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeWeights {
    pub tank: f64,
    pub rad: f64,
    pub mp_lp: f64,
    pub osv: f64,
    pub liquidity: f64,
}

impl ModeWeights {
    pub fn sum(&self) -> f64 {
        self.tank + self.rad + self.mp_lp + self.osv + self.liquidity
    }

    fn as_array(&self) -> [f64; 5] {
        [self.tank, self.rad, self.mp_lp, self.osv, self.liquidity]
    }

    fn validate(&self, mode: ScanMode) -> ScanResult<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScanError::InvalidWeights {
                mode: mode.to_string(),
                reason: "weights must be finite and non-negative".to_string(),
            });
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScanError::InvalidWeights {
                mode: mode.to_string(),
                reason: format!("weights sum to {sum:.6}, expected 1.0"),
            });
        }
        Ok(())
    }
}

/// One row of weights per scan mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    pub intraday: ModeWeights,
    pub swing: ModeWeights,
    pub longterm: ModeWeights,
    pub liquidity: ModeWeights,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            // Flow-driven: what is moving today
            intraday: ModeWeights {
                tank: 0.30,
                rad: 0.15,
                mp_lp: 0.20,
                osv: 0.25,
                liquidity: 0.10,
            },
            // Setup-driven: multi-day pattern quality
            swing: ModeWeights {
                tank: 0.20,
                rad: 0.35,
                mp_lp: 0.15,
                osv: 0.20,
                liquidity: 0.10,
            },
            longterm: ModeWeights {
                tank: 0.15,
                rad: 0.30,
                mp_lp: 0.10,
                osv: 0.25,
                liquidity: 0.20,
            },
            liquidity: ModeWeights {
                tank: 0.10,
                rad: 0.10,
                mp_lp: 0.15,
                osv: 0.15,
                liquidity: 0.50,
            },
        }
    }
}

impl WeightTable {
    pub fn for_mode(&self, mode: ScanMode) -> &ModeWeights {
        match mode {
            ScanMode::Intraday => &self.intraday,
            ScanMode::Swing => &self.swing,
            ScanMode::LongTerm => &self.longterm,
            ScanMode::Liquidity => &self.liquidity,
        }
    }

    /// Check every row is non-negative and sums to 1.0.
    pub fn validate(&self) -> ScanResult<()> {
        for mode in ScanMode::ALL {
            self.for_mode(*mode).validate(*mode)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// The five sub-scores for one symbol, each nominally in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub tank: f64,
    pub rad: f64,
    pub mp_lp: f64,
    pub osv: f64,
    pub liquidity: f64,
}

impl SubScores {
    pub fn new(tank: f64, rad: f64, mp_lp: f64, osv: f64, liquidity: f64) -> Self {
        Self {
            tank,
            rad,
            mp_lp,
            osv,
            liquidity,
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [self.tank, self.rad, self.mp_lp, self.osv, self.liquidity]
    }
}

/// One line of a score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentContribution {
    pub component: String,
    pub weight: f64,
    pub score: f64,
    /// `score * weight`, rounded on its own.
    pub contribution: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub mode: ScanMode,
    pub components: Vec<ComponentContribution>,
    /// Equal to `CombinedScorer::combined_score` for the same inputs.
    pub total: u32,
}

const COMPONENT_NAMES: [&str; 5] = ["tank", "rad", "mp_lp", "osv", "liquidity"];

/// Weighted combination of sub-scores.
#[derive(Debug, Clone, Default)]
pub struct CombinedScorer {
    weights: WeightTable,
}

impl CombinedScorer {
    /// Build a scorer, rejecting weight tables that break the row-sum rule.
    pub fn new(weights: WeightTable) -> ScanResult<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// `round(sum(score_i * weight_i))`, clamped to [0, 100].
    ///
    /// NaN sub-scores count as 0.
    pub fn combined_score(&self, scores: &SubScores, mode: ScanMode) -> u32 {
        let raw: f64 = self.raw_contributions(scores, mode).iter().sum();
        raw.round().clamp(0.0, 100.0) as u32
    }

    /// Per-component contributions for display.
    ///
    /// Each contribution is rounded independently, so their sum may differ
    /// from `total` by at most four points; `total` itself is always the
    /// combined score.
    pub fn score_breakdown(&self, scores: &SubScores, mode: ScanMode) -> ScoreBreakdown {
        let weights = self.weights.for_mode(mode).as_array();
        let values = scores.as_array();
        let raw = self.raw_contributions(scores, mode);

        let components = COMPONENT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| ComponentContribution {
                component: name.to_string(),
                weight: weights[i],
                score: finite_or(values[i], 0.0),
                contribution: raw[i].round() as i64,
            })
            .collect();

        ScoreBreakdown {
            mode,
            components,
            total: self.combined_score(scores, mode),
        }
    }

    fn raw_contributions(&self, scores: &SubScores, mode: ScanMode) -> [f64; 5] {
        let weights = self.weights.for_mode(mode).as_array();
        let values = scores.as_array();
        std::array::from_fn(|i| finite_or(values[i], 0.0) * weights[i])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> CombinedScorer {
        CombinedScorer::default()
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let table = WeightTable::default();
        for mode in ScanMode::ALL {
            let sum = table.for_mode(*mode).sum();
            assert!((sum - 1.0).abs() < 1e-9, "{mode} sums to {sum}");
        }
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_uniform_scores_reproduce_input() {
        let s = scorer();
        let scores = SubScores::new(80.0, 80.0, 80.0, 80.0, 80.0);
        for mode in ScanMode::ALL {
            assert_eq!(s.combined_score(&scores, *mode), 80);
        }
    }

    #[test]
    fn test_mode_changes_ranking() {
        let s = scorer();
        // Great setup, thin liquidity
        let setup = SubScores::new(50.0, 95.0, 50.0, 50.0, 10.0);
        // Mediocre setup, very liquid
        let liquid = SubScores::new(50.0, 40.0, 50.0, 50.0, 100.0);
        assert!(s.combined_score(&setup, ScanMode::Swing) > s.combined_score(&liquid, ScanMode::Swing));
        assert!(
            s.combined_score(&setup, ScanMode::Liquidity) < s.combined_score(&liquid, ScanMode::Liquidity)
        );
    }

    #[test]
    fn test_monotonic_in_each_component() {
        let s = scorer();
        let base = [40.0, 55.0, 60.0, 35.0, 70.0];
        for mode in ScanMode::ALL {
            for component in 0..5 {
                let mut prev = 0;
                let mut value = 0.0;
                while value <= 100.0 {
                    let mut v = base;
                    v[component] = value;
                    let scores = SubScores::new(v[0], v[1], v[2], v[3], v[4]);
                    let combined = s.combined_score(&scores, *mode);
                    assert!(combined >= prev, "{mode} component {component} at {value}");
                    prev = combined;
                    value += 5.0;
                }
            }
        }
    }

    #[test]
    fn test_breakdown_total_matches_combined() {
        let s = scorer();
        let samples = [
            SubScores::new(80.0, 80.0, 80.0, 80.0, 80.0),
            SubScores::new(12.3, 97.4, 55.5, 44.4, 66.6),
            SubScores::new(0.0, 100.0, 0.0, 100.0, 0.0),
            SubScores::new(49.5, 50.5, 49.5, 50.5, 49.5),
        ];
        for scores in &samples {
            for mode in ScanMode::ALL {
                let breakdown = s.score_breakdown(scores, *mode);
                let combined = s.combined_score(scores, *mode);
                assert_eq!(breakdown.total, combined);
                let displayed: i64 = breakdown.components.iter().map(|c| c.contribution).sum();
                assert!((displayed - combined as i64).abs() <= 4);
                assert_eq!(breakdown.components.len(), 5);
            }
        }
    }

    #[test]
    fn test_nan_subscore_counts_as_zero() {
        let s = scorer();
        let with_nan = SubScores::new(f64::NAN, 50.0, 50.0, 50.0, 50.0);
        let with_zero = SubScores::new(0.0, 50.0, 50.0, 50.0, 50.0);
        assert_eq!(
            s.combined_score(&with_nan, ScanMode::Intraday),
            s.combined_score(&with_zero, ScanMode::Intraday)
        );
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let s = scorer();
        let scores = SubScores::new(500.0, 500.0, 500.0, 500.0, 500.0);
        assert_eq!(s.combined_score(&scores, ScanMode::Swing), 100);
        let scores = SubScores::new(-50.0, -50.0, -50.0, -50.0, -50.0);
        assert_eq!(s.combined_score(&scores, ScanMode::Swing), 0);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut table = WeightTable::default();
        table.swing.rad = 0.50;
        let err = CombinedScorer::new(table).unwrap_err();
        assert!(matches!(err, ScanError::InvalidWeights { ref mode, .. } if mode == "swing"));

        let mut table = WeightTable::default();
        table.intraday.tank = -0.1;
        table.intraday.osv = 0.65;
        assert!(CombinedScorer::new(table).is_err());
    }

    #[test]
    fn test_custom_weights_injected() {
        let mut table = WeightTable::default();
        table.intraday = ModeWeights {
            tank: 1.0,
            rad: 0.0,
            mp_lp: 0.0,
            osv: 0.0,
            liquidity: 0.0,
        };
        let s = CombinedScorer::new(table).unwrap();
        let scores = SubScores::new(73.0, 10.0, 10.0, 10.0, 10.0);
        assert_eq!(s.combined_score(&scores, ScanMode::Intraday), 73);
    }
}
