use thiserror::Error;

/// Failure of a single remote lookup. Never crosses into another data domain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("no country record for code '{0}'")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl GatewayError {
    /// Flattens an `anyhow` chain into a provider error.
    pub fn provider(err: anyhow::Error) -> Self {
        Self::Provider(format!("{err:#}"))
    }
}

/// Errors that abort a whole selection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("unknown country code '{0}'")]
    UnknownCountry(String),

    #[error("country '{0}' is not supported: no currency mapping")]
    UnsupportedCurrency(String),
}
