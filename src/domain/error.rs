//! Domain error types.

/// Broad classes the presentation layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty fetch result or no overlapping dates. Rendered inline.
    DataUnavailable,
    /// Network or API failure from a collaborator. Rendered with a retry button.
    UpstreamFetchFailure,
    /// Unknown ticker, identical pair, malformed form value. Rendered inline.
    InvalidInput,
    Configuration,
    Internal,
}

/// Top-level error type for twcorr.
#[derive(Debug, thiserror::Error)]
pub enum TwcorrError {
    #[error("no data available for {ticker}")]
    DataUnavailable { ticker: String },

    #[error("no overlapping trading dates for {left} and {right}")]
    NoOverlap { left: String, right: String },

    #[error("upstream fetch from {provider} failed: {reason}")]
    UpstreamFetch { provider: String, reason: String },

    #[error("unknown ticker: {ticker}")]
    UnknownTicker { ticker: String },

    #[error("please choose two different stocks (got {ticker} twice)")]
    IdenticalPair { ticker: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("session error: {reason}")]
    Session { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TwcorrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TwcorrError::DataUnavailable { .. } | TwcorrError::NoOverlap { .. } => {
                ErrorKind::DataUnavailable
            }
            TwcorrError::UpstreamFetch { .. } => ErrorKind::UpstreamFetchFailure,
            TwcorrError::UnknownTicker { .. }
            | TwcorrError::IdenticalPair { .. }
            | TwcorrError::InvalidInput { .. } => ErrorKind::InvalidInput,
            TwcorrError::ConfigParse { .. } | TwcorrError::ConfigInvalid { .. } => {
                ErrorKind::Configuration
            }
            TwcorrError::Session { .. } | TwcorrError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn upstream(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        TwcorrError::UpstreamFetch {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TwcorrError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TwcorrError> for std::process::ExitCode {
    fn from(err: &TwcorrError) -> Self {
        let code: u8 = match err.kind() {
            ErrorKind::Internal => 1,
            ErrorKind::Configuration => 2,
            ErrorKind::UpstreamFetchFailure => 3,
            ErrorKind::InvalidInput => 4,
            ErrorKind::DataUnavailable => 5,
        };
        std::process::ExitCode::from(code)
    }
}
