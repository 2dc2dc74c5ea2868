//! Provider capabilities and rate limiting configuration.

/// Describes the capabilities of a market data provider.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Whether the provider can return the most recent price.
    pub supports_latest: bool,

    /// Whether the provider supports historical quote fetching.
    pub supports_historical: bool,
}

/// Rate limiting configuration for a provider.
///
/// Batch fetches never keep more than `max_concurrency` requests in flight.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum concurrent requests to this provider.
    pub max_concurrency: usize,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self { max_concurrency: 5 }
    }
}
