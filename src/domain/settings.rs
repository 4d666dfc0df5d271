//! Typed runtime settings built from a [`ConfigPort`] and validated up front.

use crate::domain::correlation::WindowPolicy;
use crate::domain::error::TwcorrError;
use crate::ports::config_port::ConfigPort;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_YAHOO_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: IpAddr,
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    Yahoo,
    Csv { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub source: PriceSource,
    pub universe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YahooSettings {
    pub base_url: String,
    pub timeout_secs: f64,
    pub max_concurrency: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Default number of candidates in the correlation table; 0 means all.
    pub candidate_limit: usize,
    pub window_policy: WindowPolicy,
    pub session_ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub yahoo: YahooSettings,
    pub dashboard: DashboardSettings,
    pub logging: LogSettings,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TwcorrError> {
        Ok(Self {
            server: server_settings(config)?,
            data: data_settings(config)?,
            yahoo: yahoo_settings(config)?,
            dashboard: dashboard_settings(config)?,
            logging: log_settings(config)?,
        })
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn parse_bind(value: &str) -> Result<IpAddr, TwcorrError> {
    value
        .trim()
        .parse()
        .map_err(|_| TwcorrError::config_invalid("server", "bind", format!("not an IP address: {value}")))
}

fn server_settings(config: &dyn ConfigPort) -> Result<ServerSettings, TwcorrError> {
    let bind = parse_bind(
        &non_empty(config, "server", "bind").unwrap_or_else(|| DEFAULT_BIND.to_string()),
    )?;

    let port = match non_empty(config, "server", "port") {
        None => DEFAULT_PORT,
        Some(raw) => raw
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                TwcorrError::config_invalid("server", "port", "port must be between 1 and 65535")
            })?,
    };

    Ok(ServerSettings { bind, port })
}

fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, TwcorrError> {
    let source = match non_empty(config, "data", "source")
        .unwrap_or_else(|| "yahoo".to_string())
        .to_lowercase()
        .as_str()
    {
        "yahoo" => PriceSource::Yahoo,
        "csv" => {
            let dir = non_empty(config, "data", "csv_dir").ok_or_else(|| {
                TwcorrError::config_invalid("data", "csv_dir", "required when source = csv")
            })?;
            PriceSource::Csv {
                dir: PathBuf::from(dir),
            }
        }
        other => {
            return Err(TwcorrError::config_invalid(
                "data",
                "source",
                format!("expected yahoo or csv, got {other}"),
            ));
        }
    };

    Ok(DataSettings {
        source,
        universe_path: non_empty(config, "data", "universe_path").map(PathBuf::from),
    })
}

fn yahoo_settings(config: &dyn ConfigPort) -> Result<YahooSettings, TwcorrError> {
    let timeout_secs = config.get_double("yahoo", "timeout_secs", 15.0);
    if !(timeout_secs > 0.0 && timeout_secs.is_finite()) {
        return Err(TwcorrError::config_invalid(
            "yahoo",
            "timeout_secs",
            "timeout_secs must be positive",
        ));
    }

    let max_concurrency = config.get_int("yahoo", "max_concurrency", 8);
    if max_concurrency < 1 {
        return Err(TwcorrError::config_invalid(
            "yahoo",
            "max_concurrency",
            "max_concurrency must be at least 1",
        ));
    }

    let base_url = non_empty(config, "yahoo", "base_url")
        .unwrap_or_else(|| DEFAULT_YAHOO_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    Ok(YahooSettings {
        base_url,
        timeout_secs,
        max_concurrency: max_concurrency as usize,
        user_agent: non_empty(config, "yahoo", "user_agent")
            .unwrap_or_else(|| "Mozilla/5.0 (compatible; twcorr)".to_string()),
    })
}

fn dashboard_settings(config: &dyn ConfigPort) -> Result<DashboardSettings, TwcorrError> {
    let candidate_limit = config.get_int("dashboard", "candidate_limit", 50);
    if candidate_limit < 0 {
        return Err(TwcorrError::config_invalid(
            "dashboard",
            "candidate_limit",
            "candidate_limit must be non-negative",
        ));
    }

    let session_ttl_minutes = config.get_int("dashboard", "session_ttl_minutes", 60);
    if session_ttl_minutes < 1 {
        return Err(TwcorrError::config_invalid(
            "dashboard",
            "session_ttl_minutes",
            "session_ttl_minutes must be at least 1",
        ));
    }

    let window_policy = if config.get_bool("dashboard", "strict_windows", true) {
        WindowPolicy::Strict
    } else {
        WindowPolicy::Partial
    };

    Ok(DashboardSettings {
        candidate_limit: candidate_limit as usize,
        window_policy,
        session_ttl_minutes,
    })
}

fn log_settings(config: &dyn ConfigPort) -> Result<LogSettings, TwcorrError> {
    let format = match non_empty(config, "logging", "format") {
        None => LogFormat::default(),
        Some(raw) => raw
            .parse::<LogFormat>()
            .map_err(|reason| TwcorrError::config_invalid("logging", "format", reason))?,
    };
    Ok(LogSettings {
        level: non_empty(config, "logging", "level").unwrap_or_else(|| "info".to_string()),
        format,
    })
}
