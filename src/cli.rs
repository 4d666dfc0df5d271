//! CLI definition and server startup.

use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_universe_adapter::CsvUniverseAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::web::{AppState, build_router};
use crate::adapters::yahoo_adapter::YahooAdapter;
use crate::domain::error::TwcorrError;
use crate::domain::settings::{PriceSource, Settings, parse_bind};
use crate::domain::universe::Universe;
use crate::logging::init_logging;
use crate::ports::price_port::PriceFetchPort;
use crate::ports::universe_port::UniversePort;

#[derive(Parser, Debug, Default)]
#[command(
    name = "twcorr",
    version,
    about = "Correlation dashboard for Taiwan electronics stocks"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, env = "TWCORR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides [server] bind
    #[arg(long, env = "TWCORR_BIND")]
    pub bind: Option<String>,

    /// Port to listen on, overrides [server] port
    #[arg(short, long, env = "TWCORR_PORT")]
    pub port: Option<u16>,

    /// Log filter directive, overrides [logging] level
    #[arg(long, env = "TWCORR_LOG")]
    pub log_level: Option<String>,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TwcorrError> {
    FileConfigAdapter::from_file(path).map_err(|e| TwcorrError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Settings from the config file (if any) with command-line overrides applied.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, TwcorrError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FileConfigAdapter::empty(),
    };
    let mut settings = Settings::from_config(&config)?;

    if let Some(bind) = &cli.bind {
        settings.server.bind = parse_bind(bind)?;
    }
    if let Some(port) = cli.port {
        if port == 0 {
            return Err(TwcorrError::config_invalid(
                "server",
                "port",
                "port must be between 1 and 65535",
            ));
        }
        settings.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    Ok(settings)
}

pub fn load_universe(settings: &Settings) -> Result<Universe, TwcorrError> {
    let adapter = match &settings.data.universe_path {
        Some(path) => CsvUniverseAdapter::from_path(path.clone()),
        None => CsvUniverseAdapter::embedded(),
    };
    adapter.list_universe()
}

pub fn build_fetcher(
    settings: &Settings,
    universe: &Universe,
) -> Result<Arc<dyn PriceFetchPort>, TwcorrError> {
    match &settings.data.source {
        PriceSource::Yahoo => {
            let markets: HashMap<_, _> = universe
                .stocks()
                .map(|s| (s.ticker.clone(), s.market))
                .collect();
            Ok(Arc::new(YahooAdapter::from_settings(&settings.yahoo, markets)?))
        }
        PriceSource::Csv { dir } => Ok(Arc::new(CsvPriceAdapter::new(dir.clone()))),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

pub async fn serve(settings: Settings) -> Result<(), TwcorrError> {
    let universe = load_universe(&settings)?;
    let fetcher = build_fetcher(&settings, &universe)?;
    info!(
        stocks = universe.count(),
        source = fetcher.name(),
        policy = ?settings.dashboard.window_policy,
        "dashboard ready"
    );

    let router = build_router(AppState::new(universe, fetcher, settings.dashboard.clone()));

    let addr = settings.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn run(cli: Cli) -> ExitCode {
    let settings = match resolve_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let err = TwcorrError::Io(e);
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    match runtime.block_on(serve(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}
