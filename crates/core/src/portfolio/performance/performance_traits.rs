use async_trait::async_trait;

use super::performance_model::{ComprehensivePerformance, ReturnWindow, RollingReturnsResponse};
use crate::errors::Result;

/// Read-only analytics over a user's recommendations.
///
/// Failures of individual tickers never fail a call; only store errors do.
#[async_trait]
pub trait PerformanceServiceTrait: Send + Sync {
    async fn compute_comprehensive_performance(
        &self,
        user_id: &str,
    ) -> Result<ComprehensivePerformance>;

    async fn compute_rolling_returns(
        &self,
        user_id: &str,
        window: ReturnWindow,
    ) -> Result<RollingReturnsResponse>;
}
