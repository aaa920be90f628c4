//! Library error type.
//!
//! Data-quality problems (short history, zero volume, NaN fields) never
//! surface here: analyzers fall back to neutral results instead. `ScanError`
//! is reserved for caller bugs and configuration mistakes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Scan mode string is not one of the known modes.
    #[error("invalid scan mode '{0}' (expected intraday, swing, longterm or liquidity)")]
    InvalidMode(String),

    /// A weight row is negative somewhere or does not sum to 1.0.
    #[error("invalid weights for mode {mode}: {reason}")]
    InvalidWeights { mode: String, reason: String },

    /// Snapshot source could not produce data for a symbol.
    #[error("snapshot source failed for {symbol}: {message}")]
    Source { symbol: String, message: String },
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
