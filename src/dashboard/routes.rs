//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::SnapshotSource;
use crate::engine::scanner::Scanner;
use crate::error::ScanError;
use crate::scanners::{
    analyze_osv_metrics, analyze_rad, ModeWeights, OsvConfig, OsvMetricsData, RadConfig,
    RadSetupData, ScoreBreakdown, SubScores,
};
use crate::types::{OptionsFlowSnapshot, PriceBar, ScanMode, ScannerResult, StockSnapshot};

/// Upper bound on `limit` accepted from requests.
const MAX_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub scanner: Scanner,
    pub source: Arc<dyn SnapshotSource>,
    pub default_limit: usize,
    pub last_scan: RwLock<Option<ScanResponse>>,
}

impl DashboardState {
    pub fn new(scanner: Scanner, source: Arc<dyn SnapshotSource>, default_limit: usize) -> Self {
        Self {
            scanner,
            source,
            default_limit,
            last_scan: RwLock::new(None),
        }
    }

    /// Remember the most recent source-backed scan.
    pub async fn record_scan(&self, scan: ScanResponse) {
        *self.last_scan.write().await = Some(scan);
    }

    fn resolve_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.default_limit).min(MAX_LIMIT)
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "bad_request: {msg}"),
            Self::NotFound(msg) => write!(f, "not_found: {msg}"),
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::InvalidMode(_) | ScanError::InvalidWeights { .. } => {
                Self::BadRequest(e.to_string())
            }
            ScanError::Source { .. } => Self::Internal(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub scan_id: Uuid,
    pub mode: ScanMode,
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub results: Vec<ScannerResult>,
}

impl ScanResponse {
    pub fn new(mode: ScanMode, results: Vec<ScannerResult>) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            mode,
            generated_at: Utc::now(),
            count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModeInfo {
    pub mode: ScanMode,
    pub weights: ModeWeights,
}

/// Scan mode arrives as text so a bad value is a 400 with a readable message.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub mode: String,
    pub limit: Option<usize>,
    pub stocks: Vec<StockSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanQuery {
    /// Comma-separated symbols; the source's universe when absent.
    pub symbols: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RadRequest {
    pub bars: Vec<PriceBar>,
    pub config: Option<RadConfig>,
}

#[derive(Debug, Deserialize)]
pub struct OsvRequest {
    pub symbol: String,
    pub options: OptionsFlowSnapshot,
    pub config: Option<OsvConfig>,
}

#[derive(Debug, Deserialize)]
pub struct BreakdownRequest {
    pub mode: String,
    pub scores: SubScores,
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/modes
pub async fn get_modes(State(state): State<AppState>) -> Json<Vec<ModeInfo>> {
    let weights = state.scanner.scorer().weights();
    Json(
        ScanMode::ALL
            .iter()
            .map(|mode| ModeInfo {
                mode: *mode,
                weights: *weights.for_mode(*mode),
            })
            .collect(),
    )
}

/// POST /api/scan
pub async fn post_scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let mode: ScanMode = req.mode.parse()?;
    let limit = state.resolve_limit(req.limit);
    let results = state.scanner.process_stocks_for_mode(&req.stocks, mode, limit);
    info!(mode = %mode, stocks = req.stocks.len(), returned = results.len(), "Ad-hoc scan served");
    Ok(Json(ScanResponse::new(mode, results)))
}

/// GET /api/scan/:mode
pub async fn get_scan(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanResponse>, ApiError> {
    let mode: ScanMode = mode.parse()?;
    let symbols = match query.symbols.as_deref().map(parse_symbols) {
        Some(list) if !list.is_empty() => list,
        _ => state.source.symbols(),
    };
    if symbols.is_empty() {
        warn!("Scan requested but the snapshot source has no symbols");
    }

    let limit = state.resolve_limit(query.limit);
    let results = state
        .scanner
        .scan(state.source.as_ref(), &symbols, mode, limit)
        .await;

    let response = ScanResponse::new(mode, results);
    state.record_scan(response.clone()).await;
    Ok(Json(response))
}

/// GET /api/last-scan
pub async fn get_last_scan(State(state): State<AppState>) -> Result<Json<ScanResponse>, ApiError> {
    state
        .last_scan
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no scan has run yet".to_string()))
}

/// POST /api/analyze/rad
pub async fn post_analyze_rad(
    State(state): State<AppState>,
    Json(req): Json<RadRequest>,
) -> Json<RadSetupData> {
    let config = req
        .config
        .unwrap_or_else(|| state.scanner.rad_config().clone());
    Json(analyze_rad(&req.bars, &config))
}

/// POST /api/analyze/osv
pub async fn post_analyze_osv(
    State(state): State<AppState>,
    Json(req): Json<OsvRequest>,
) -> Json<OsvMetricsData> {
    let config = req
        .config
        .unwrap_or_else(|| state.scanner.osv_config().clone());
    Json(analyze_osv_metrics(&req.symbol, &req.options, &config))
}

/// POST /api/breakdown
pub async fn post_breakdown(
    State(state): State<AppState>,
    Json(req): Json<BreakdownRequest>,
) -> Result<Json<ScoreBreakdown>, ApiError> {
    let mode: ScanMode = req.mode.parse()?;
    Ok(Json(state.scanner.scorer().score_breakdown(&req.scores, mode)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixture::FixtureSource;

    fn make_state() -> AppState {
        Arc::new(DashboardState::new(
            Scanner::default(),
            Arc::new(FixtureSource::empty()),
            10,
        ))
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols("aapl, msft,,NVDA "), vec!["AAPL", "MSFT", "NVDA"]);
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_limit_is_capped() {
        let state = make_state();
        assert_eq!(state.resolve_limit(None), 10);
        assert_eq!(state.resolve_limit(Some(3)), 3);
        assert_eq!(state.resolve_limit(Some(10_000)), MAX_LIMIT);
    }

    #[test]
    fn test_scan_error_mapping() {
        let bad_mode: ApiError = ScanError::InvalidMode("weekly".into()).into();
        assert!(matches!(bad_mode, ApiError::BadRequest(ref m) if m.contains("weekly")));

        let source: ApiError = ScanError::Source {
            symbol: "AAPL".into(),
            message: "down".into(),
        }
        .into();
        assert!(matches!(source, ApiError::Internal(_)));
    }

    #[test]
    fn test_scan_response_counts_results() {
        let resp = ScanResponse::new(ScanMode::Swing, Vec::new());
        assert_eq!(resp.count, 0);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"mode\":\"swing\""));
        assert!(json.contains("scan_id"));
    }

    #[tokio::test]
    async fn test_get_modes_lists_all() {
        let Json(modes) = get_modes(State(make_state())).await;
        assert_eq!(modes.len(), 4);
        assert!(modes.iter().all(|m| (m.weights.sum() - 1.0).abs() < 1e-9));
    }

    #[tokio::test]
    async fn test_last_scan_empty_then_recorded() {
        let state = make_state();
        assert!(get_last_scan(State(state.clone())).await.is_err());

        state
            .record_scan(ScanResponse::new(ScanMode::Intraday, Vec::new()))
            .await;
        let Json(last) = get_last_scan(State(state)).await.unwrap();
        assert_eq!(last.mode, ScanMode::Intraday);
    }

    #[tokio::test]
    async fn test_breakdown_handler() {
        let req = BreakdownRequest {
            mode: "liquidity".into(),
            scores: SubScores::new(80.0, 80.0, 80.0, 80.0, 80.0),
        };
        let Json(breakdown) = post_breakdown(State(make_state()), Json(req)).await.unwrap();
        assert_eq!(breakdown.total, 80);
        assert_eq!(breakdown.mode, ScanMode::Liquidity);
    }
}
