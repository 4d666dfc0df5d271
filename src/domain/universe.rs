//! Electronics-sector stock universe.
//!
//! A read-only lookup table keyed by ticker. Where the rows come from is the
//! business of the [`UniversePort`](crate::ports::universe_port::UniversePort)
//! adapter.

use crate::domain::error::TwcorrError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Industry groups treated as the electronics sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Semiconductor,
    ComputerPeripherals,
    ElectronicComponents,
    Optoelectronics,
    CommunicationNetworks,
    ElectronicDistribution,
    InformationServices,
    OtherElectronics,
    DigitalCloud,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Semiconductor,
        Category::ComputerPeripherals,
        Category::ElectronicComponents,
        Category::Optoelectronics,
        Category::CommunicationNetworks,
        Category::ElectronicDistribution,
        Category::InformationServices,
        Category::OtherElectronics,
        Category::DigitalCloud,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Semiconductor => "semiconductor",
            Category::ComputerPeripherals => "computer-peripherals",
            Category::ElectronicComponents => "electronic-components",
            Category::Optoelectronics => "optoelectronics",
            Category::CommunicationNetworks => "communication-networks",
            Category::ElectronicDistribution => "electronic-distribution",
            Category::InformationServices => "information-services",
            Category::OtherElectronics => "other-electronics",
            Category::DigitalCloud => "digital-cloud",
        }
    }

    /// Industry group name as published by the exchange.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Semiconductor => "半導體業",
            Category::ComputerPeripherals => "電腦及週邊設備業",
            Category::ElectronicComponents => "電子零組件業",
            Category::Optoelectronics => "光電業",
            Category::CommunicationNetworks => "通信網路業",
            Category::ElectronicDistribution => "電子通路業",
            Category::InformationServices => "資訊服務業",
            Category::OtherElectronics => "其他電子業",
            Category::DigitalCloud => "數位雲端",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = TwcorrError;

    /// Accepts either the slug or the exchange label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s) || c.label() == s)
            .ok_or_else(|| TwcorrError::InvalidInput {
                reason: format!("unknown category: {s}"),
            })
    }
}

/// Where a stock trades; decides the quote symbol suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Market {
    /// Taiwan Stock Exchange (上市)
    #[default]
    Twse,
    /// Taipei Exchange (上櫃)
    Tpex,
}

impl Market {
    pub fn yahoo_suffix(&self) -> &'static str {
        match self {
            Market::Twse => ".TW",
            Market::Tpex => ".TWO",
        }
    }
}

impl FromStr for Market {
    type Err = TwcorrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twse" | "tw" | "上市" => Ok(Market::Twse),
            "tpex" | "two" | "otc" | "上櫃" => Ok(Market::Tpex),
            other => Err(TwcorrError::InvalidInput {
                reason: format!("unknown market: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    pub ticker: String,
    pub name: String,
    pub category: Category,
    pub market: Market,
}

impl Stock {
    /// "2330 台積電"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.ticker, self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Universe {
    stocks: BTreeMap<String, Stock>,
}

impl Universe {
    /// Later duplicates of a ticker replace earlier ones.
    pub fn new(stocks: impl IntoIterator<Item = Stock>) -> Self {
        Self {
            stocks: stocks
                .into_iter()
                .map(|s| (s.ticker.clone(), s))
                .collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&Stock> {
        self.stocks.get(ticker.trim())
    }

    /// Like [`get`](Self::get) but reports an unknown ticker as invalid input.
    pub fn require(&self, ticker: &str) -> Result<&Stock, TwcorrError> {
        self.get(ticker).ok_or_else(|| TwcorrError::UnknownTicker {
            ticker: ticker.trim().to_string(),
        })
    }

    /// All stocks in ticker order.
    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.stocks.keys().cloned().collect()
    }

    /// Stocks in `category` (all when `None`), in ticker order.
    pub fn by_category(&self, category: Option<Category>) -> Vec<&Stock> {
        self.stocks
            .values()
            .filter(|s| category.is_none_or(|c| s.category == c))
            .collect()
    }

    /// Categories that have at least one stock, in declaration order.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.stocks.values().any(|s| s.category == *c))
            .collect()
    }

    /// Validates a comparison pair: both known and not the same stock.
    pub fn require_pair(&self, a: &str, b: &str) -> Result<(&Stock, &Stock), TwcorrError> {
        let first = self.require(a)?;
        let second = self.require(b)?;
        if first.ticker == second.ticker {
            return Err(TwcorrError::IdenticalPair {
                ticker: first.ticker.clone(),
            });
        }
        Ok((first, second))
    }
}
