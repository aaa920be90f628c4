//! End-to-end scans over the shipped fixture file and the mock source.

use flowscan::config::AppConfig;
use flowscan::data::fixture::FixtureSource;
use flowscan::data::SnapshotSource;
use flowscan::engine::scanner::Scanner;
use flowscan::scanners::WeightTable;
use flowscan::types::{ScanMode, ScannerResult};

use crate::mock_source::MockSource;

fn fixture_source() -> FixtureSource {
    FixtureSource::load(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/snapshots.json"))
        .expect("fixture file should load")
}

fn find<'a>(results: &'a [ScannerResult], symbol: &str) -> &'a ScannerResult {
    results
        .iter()
        .find(|r| r.symbol == symbol)
        .unwrap_or_else(|| panic!("{symbol} missing from results"))
}

async fn scan_fixture(mode: ScanMode, limit: usize) -> Vec<ScannerResult> {
    let source = fixture_source();
    let symbols = source.symbols();
    Scanner::default().scan(&source, &symbols, mode, limit).await
}

#[tokio::test]
async fn test_every_mode_is_sorted_and_bounded() {
    for mode in ScanMode::ALL {
        let results = scan_fixture(*mode, 4).await;
        assert_eq!(results.len(), 4, "{mode}");
        assert!(
            results
                .windows(2)
                .all(|w| w[0].combined_score >= w[1].combined_score),
            "{mode} not sorted"
        );
        assert!(results.iter().all(|r| r.combined_score <= 100 && r.mode == *mode));
    }
}

#[tokio::test]
async fn test_fully_populated_snapshot_has_no_quick_scores() {
    let results = scan_fixture(ScanMode::Intraday, 50).await;
    let nvda = find(&results, "NVDA");
    assert_eq!(nvda.quick_count(), 0);
    assert!(nvda.osv.value() > 50.0);
    assert!(nvda.rad.value() > 50.0);
    assert!(nvda.signals.iter().any(|s| s.starts_with("OSV:")));
    assert!(nvda.signals.iter().any(|s| s.starts_with("MP/LP:")));
}

#[tokio::test]
async fn test_price_only_snapshot_uses_quick_scores() {
    let results = scan_fixture(ScanMode::Swing, 50).await;
    let amd = find(&results, "AMD");
    assert_eq!(amd.quick_count(), 4);
    assert!(!amd.liquidity.is_quick());
}

#[tokio::test]
async fn test_heavy_put_flow_scores_bearish() {
    let results = scan_fixture(ScanMode::Intraday, 50).await;
    let tsla = find(&results, "TSLA");
    assert!(tsla.osv.value() < 50.0);
    assert!(tsla.tank.value() < 50.0);
}

#[tokio::test]
async fn test_liquidity_mode_sinks_thin_names() {
    let results = scan_fixture(ScanMode::Liquidity, 50).await;
    assert_eq!(results.last().map(|r| r.symbol.as_str()), Some("SOFI"));
    assert_eq!(find(&results, "SOFI").liquidity.value(), 0.0);
}

#[tokio::test]
async fn test_scans_are_deterministic() {
    let first: Vec<_> = scan_fixture(ScanMode::LongTerm, 50)
        .await
        .into_iter()
        .map(|r| (r.symbol, r.combined_score))
        .collect();
    let second: Vec<_> = scan_fixture(ScanMode::LongTerm, 50)
        .await
        .into_iter()
        .map(|r| (r.symbol, r.combined_score))
        .collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_symbols_are_skipped() {
    let source = MockSource::price_only(&[("AAA", 1.0), ("BBB", -2.0), ("CCC", 3.0)]);
    source.fail_symbol("BBB");

    let scanner = Scanner::default().with_fetch_concurrency(2);
    let symbols = source.symbols();
    let results = scanner.scan(&source, &symbols, ScanMode::Intraday, 10).await;

    assert_eq!(source.fetch_count(), 3);
    let ranked: Vec<_> = results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(ranked, vec!["CCC", "AAA"]);
}

#[tokio::test]
async fn test_empty_universe() {
    let source = MockSource::new(Vec::new());
    let results = Scanner::default()
        .scan(&source, &source.symbols(), ScanMode::Swing, 10)
        .await;
    assert!(results.is_empty());
}

#[test]
fn test_sample_config_matches_defaults() {
    let cfg = AppConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"))
        .expect("sample config should load");
    assert_eq!(cfg.weights, WeightTable::default());
    assert_eq!(cfg.scanner.default_mode, ScanMode::Swing);
    assert!(cfg.build_scanner().is_ok());
}
