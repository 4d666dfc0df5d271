//! CLI integration tests for settings resolution and startup wiring.
//!
//! Tests cover:
//! - INI files on disk typed into settings
//! - Command-line overrides over file values
//! - Universe and price source selection
//! - Offline CSV source feeding the correlation pipeline

mod common;

use clap::Parser;
use common::*;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use twcorr::cli::{self, Cli};
use twcorr::domain::correlation::WindowPolicy;
use twcorr::domain::dashboard::{CorrelationOptions, CorrelationRequest, correlation_report};
use twcorr::domain::error::{ErrorKind, TwcorrError};
use twcorr::domain::price_cache::PriceCache;
use twcorr::domain::settings::{LogFormat, PriceSource};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[server]
bind = 127.0.0.1
port = 9000

[data]
source = yahoo

[yahoo]
timeout_secs = 3.5
max_concurrency = 4

[dashboard]
candidate_limit = 20
strict_windows = false
session_ttl_minutes = 15

[logging]
level = debug
format = json
"#;

fn cli_with_config(path: PathBuf) -> Cli {
    Cli {
        config: Some(path),
        ..Cli::default()
    }
}

#[test]
fn defaults_without_config_file() {
    let settings = cli::resolve_settings(&Cli::default()).unwrap();

    assert_eq!(settings.server.socket_addr().to_string(), "0.0.0.0:7860");
    assert_eq!(settings.data.source, PriceSource::Yahoo);
    assert_eq!(settings.dashboard.window_policy, WindowPolicy::Strict);
}

#[test]
fn reads_all_sections_from_file() {
    let file = write_temp_ini(VALID_INI);
    let settings = cli::resolve_settings(&cli_with_config(file.path().to_path_buf())).unwrap();

    assert_eq!(settings.server.socket_addr().to_string(), "127.0.0.1:9000");
    assert_eq!(settings.yahoo.timeout_secs, 3.5);
    assert_eq!(settings.yahoo.max_concurrency, 4);
    assert_eq!(settings.dashboard.candidate_limit, 20);
    assert_eq!(settings.dashboard.window_policy, WindowPolicy::Partial);
    assert_eq!(settings.dashboard.session_ttl_minutes, 15);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn flags_override_file_values() {
    let file = write_temp_ini(VALID_INI);
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        bind: Some("0.0.0.0".into()),
        port: Some(7861),
        log_level: Some("warn".into()),
    };
    let settings = cli::resolve_settings(&cli).unwrap();

    assert_eq!(settings.server.socket_addr().to_string(), "0.0.0.0:7861");
    assert_eq!(settings.logging.level, "warn");
    // untouched values still come from the file
    assert_eq!(settings.dashboard.candidate_limit, 20);
}

#[test]
fn parses_command_line_flags() {
    let cli = Cli::try_parse_from(["twcorr", "--bind", "127.0.0.1", "-p", "8000", "--log-level", "trace"]).unwrap();

    assert_eq!(cli.bind.as_deref(), Some("127.0.0.1"));
    assert_eq!(cli.port, Some(8000));
    assert_eq!(cli.log_level.as_deref(), Some("trace"));
}

#[test]
fn invalid_overrides_are_configuration_errors() {
    let bad_bind = Cli {
        bind: Some("not-an-ip".into()),
        ..Cli::default()
    };
    assert_eq!(
        cli::resolve_settings(&bad_bind).unwrap_err().kind(),
        ErrorKind::Configuration
    );

    let zero_port = Cli {
        port: Some(0),
        ..Cli::default()
    };
    assert!(cli::resolve_settings(&zero_port).is_err());
}

#[test]
fn missing_config_file_is_parse_error() {
    let err = cli::resolve_settings(&cli_with_config(PathBuf::from("/nonexistent/twcorr.ini")))
        .unwrap_err();

    assert!(matches!(err, TwcorrError::ConfigParse { .. }));
    assert_eq!(
        std::process::ExitCode::from(&err),
        std::process::ExitCode::from(2)
    );
}

#[test]
fn invalid_values_in_file_are_rejected() {
    let file = write_temp_ini("[yahoo]\nmax_concurrency = 0\n");
    let err = cli::resolve_settings(&cli_with_config(file.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, TwcorrError::ConfigInvalid { ref key, .. } if key == "max_concurrency"));
}

#[test]
fn embedded_universe_is_the_default() {
    let settings = cli::resolve_settings(&Cli::default()).unwrap();
    let universe = cli::load_universe(&settings).unwrap();

    assert!(universe.get("2330").is_some());
    assert!(universe.count() > 50);
}

#[test]
fn universe_path_overrides_embedded_list() {
    let dir = TempDir::new().unwrap();
    let universe_path = dir.path().join("universe.csv");
    fs::write(
        &universe_path,
        "ticker,name,category,market\n2330,台積電,半導體業,twse\n2454,聯發科,半導體業,twse\n",
    )
    .unwrap();
    let file = write_temp_ini(&format!("[data]\nuniverse_path = {}\n", universe_path.display()));

    let settings = cli::resolve_settings(&cli_with_config(file.path().to_path_buf())).unwrap();
    let universe = cli::load_universe(&settings).unwrap();

    assert_eq!(universe.tickers(), vec!["2330", "2454"]);
}

fn write_prices(dir: &TempDir, ticker: &str, series: &PriceSeries) {
    let mut content = String::from("date,close\n");
    for p in series.points() {
        content.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.close));
    }
    fs::write(dir.path().join(format!("{ticker}.csv")), content).unwrap();
}

#[tokio::test]
async fn csv_source_feeds_the_correlation_table() {
    let prices = TempDir::new().unwrap();
    write_prices(&prices, "2330", &wave_series("2330", "2024-01-02", 130, 600.0, 0.0));
    write_prices(&prices, "2454", &wave_series("2454", "2024-01-02", 130, 900.0, 0.2));

    let file = write_temp_ini(&format!(
        "[data]\nsource = csv\ncsv_dir = {}\n",
        prices.path().display()
    ));
    let settings = cli::resolve_settings(&cli_with_config(file.path().to_path_buf())).unwrap();
    let universe = sample_universe();
    let fetcher = cli::build_fetcher(&settings, &universe).unwrap();
    assert_eq!(fetcher.name(), "csv");

    let cache = Mutex::new(PriceCache::new());
    let request = CorrelationRequest {
        reference: "2330".into(),
        category: None,
        limit: None,
    };
    let options = CorrelationOptions {
        policy: settings.dashboard.window_policy,
    };
    let report = correlation_report(&universe, fetcher.as_ref(), &cache, &request, options)
        .await
        .unwrap();

    assert_eq!(report.entries[0].stock.ticker, "2454");
    assert_eq!(report.entries[0].row.overlap, 130);
    assert!(report.entries[0].row.value(120).is_some());
    assert_eq!(report.missing.len(), 4);
}
