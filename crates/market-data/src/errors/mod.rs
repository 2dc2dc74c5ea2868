//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching prices.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but has no quotes in the requested period.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider returned data that failed validation checks.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// True when the provider answered but has nothing for this symbol/range.
    ///
    /// Such results are reported as missing symbols rather than failures.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::SymbolNotFound(_) | Self::NoDataForRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_symbols_are_empty_results() {
        assert!(MarketDataError::SymbolNotFound("INVALID".to_string()).is_empty_result());
        assert!(MarketDataError::NoDataForRange.is_empty_result());
    }

    #[test]
    fn test_transport_failures_are_not_empty_results() {
        let timeout = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert!(!timeout.is_empty_result());

        let provider = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "Internal server error".to_string(),
        };
        assert!(!provider.is_empty_result());
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "bad gateway".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: YAHOO - bad gateway");
    }
}
