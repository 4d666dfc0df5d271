//! CSV-backed stock universe.
//!
//! Columns: `ticker,name,category,market`. The category is either the
//! exchange's industry group label or its slug; rows outside the electronics
//! groups are skipped.

use crate::domain::error::TwcorrError;
use crate::domain::universe::{Category, Market, Stock, Universe};
use crate::ports::universe_port::UniversePort;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const EMBEDDED_UNIVERSE: &str = include_str!("../../data/electronics_universe.csv");

#[derive(Debug, Deserialize)]
struct UniverseRecord {
    ticker: String,
    name: String,
    category: String,
    #[serde(default)]
    market: String,
}

enum Source {
    Embedded,
    File(PathBuf),
}

pub struct CsvUniverseAdapter {
    source: Source,
}

impl CsvUniverseAdapter {
    /// The list compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            source: Source::Embedded,
        }
    }

    pub fn from_path(path: PathBuf) -> Self {
        Self {
            source: Source::File(path),
        }
    }

    fn provider(&self) -> String {
        match &self.source {
            Source::Embedded => "embedded universe".to_string(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn read_content(&self) -> Result<String, TwcorrError> {
        match &self.source {
            Source::Embedded => Ok(EMBEDDED_UNIVERSE.to_string()),
            Source::File(path) => fs::read_to_string(path).map_err(|e| {
                TwcorrError::upstream(self.provider(), format!("failed to read: {e}"))
            }),
        }
    }
}

pub fn parse_universe(content: &str, provider: &str) -> Result<Universe, TwcorrError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut stocks = Vec::new();
    for (line, result) in rdr.deserialize::<UniverseRecord>().enumerate() {
        let record = result.map_err(|e| {
            TwcorrError::upstream(provider, format!("CSV parse error: {e}"))
        })?;

        if record.ticker.is_empty() {
            warn!(line = line + 2, "skipping universe row without ticker");
            continue;
        }

        let category = match record.category.parse::<Category>() {
            Ok(c) => c,
            Err(_) => {
                warn!(
                    ticker = %record.ticker,
                    category = %record.category,
                    "skipping non-electronics stock"
                );
                continue;
            }
        };

        let market = if record.market.is_empty() {
            Market::default()
        } else {
            record.market.parse::<Market>().unwrap_or_else(|_| {
                warn!(ticker = %record.ticker, market = %record.market, "unknown market, assuming TWSE");
                Market::default()
            })
        };

        stocks.push(Stock {
            ticker: record.ticker,
            name: record.name,
            category,
            market,
        });
    }

    Ok(Universe::new(stocks))
}

impl UniversePort for CsvUniverseAdapter {
    fn list_universe(&self) -> Result<Universe, TwcorrError> {
        let provider = self.provider();
        let universe = parse_universe(&self.read_content()?, &provider)?;
        if universe.is_empty() {
            return Err(TwcorrError::upstream(provider, "universe has no electronics stocks"));
        }
        info!(stocks = universe.count(), source = %provider, "loaded stock universe");
        Ok(universe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn embedded_universe_loads() {
        let universe = CsvUniverseAdapter::embedded().list_universe().unwrap();

        let tsmc = universe.get("2330").unwrap();
        assert_eq!(tsmc.name, "台積電");
        assert_eq!(tsmc.category, Category::Semiconductor);
        assert_eq!(tsmc.market, Market::Twse);
        assert!(universe.get("2454").is_some());
        assert_eq!(universe.get("6488").unwrap().market, Market::Tpex);
    }

    #[test]
    fn embedded_universe_covers_core_groups() {
        let universe = CsvUniverseAdapter::embedded().list_universe().unwrap();
        let categories = universe.categories();
        for c in [
            Category::Semiconductor,
            Category::ComputerPeripherals,
            Category::ElectronicComponents,
            Category::Optoelectronics,
            Category::CommunicationNetworks,
        ] {
            assert!(categories.contains(&c), "missing {c}");
        }
    }

    #[test]
    fn skips_non_electronics_rows() {
        let content = "ticker,name,category,market\n\
            2330,台積電,半導體業,twse\n\
            1101,台泥,水泥工業,twse\n";
        let universe = parse_universe(content, "test").unwrap();
        assert_eq!(universe.tickers(), vec!["2330"]);
    }

    #[test]
    fn accepts_slugs_and_missing_market() {
        let content = "ticker,name,category,market\n 2454 , 聯發科 , semiconductor ,\n";
        let universe = parse_universe(content, "test").unwrap();
        let stock = universe.get("2454").unwrap();
        assert_eq!(stock.name, "聯發科");
        assert_eq!(stock.market, Market::Twse);
    }

    #[test]
    fn reads_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("universe.csv");
        fs::write(&path, "ticker,name,category,market\n3008,大立光,光電業,上市\n").unwrap();

        let universe = CsvUniverseAdapter::from_path(path).list_universe().unwrap();

        assert_eq!(universe.count(), 1);
        assert_eq!(universe.get("3008").unwrap().category, Category::Optoelectronics);
    }

    #[test]
    fn missing_file_is_upstream_failure() {
        let err = CsvUniverseAdapter::from_path(PathBuf::from("/nonexistent/universe.csv"))
            .list_universe()
            .unwrap_err();
        assert!(matches!(err, TwcorrError::UpstreamFetch { .. }));
    }

    #[test]
    fn universe_without_electronics_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("universe.csv");
        fs::write(&path, "ticker,name,category,market\n1101,台泥,水泥工業,twse\n").unwrap();

        assert!(CsvUniverseAdapter::from_path(path).list_universe().is_err());
    }
}
