//! Driven port for grouped engagement aggregates.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::feed::{StatisticsQuery, StatisticsSnapshot};

define_port_error! {
    /// Errors raised while aggregating engagement counters.
    pub enum EngagementStatisticsError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "engagement statistics connection failed: {message}",
        /// Aggregate query failed.
        Query { message: String } =>
            "engagement statistics query failed: {message}",
    }
}

/// Port computing per-item aggregates for a bounded set of identifiers.
///
/// Implementations must only read rows belonging to `query.item_ids` and
/// `query.owner_ids`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStatistics: Send + Sync {
    /// Aggregate views, ratings and follows for the queried identifiers.
    async fn snapshot(
        &self,
        query: &StatisticsQuery,
    ) -> Result<StatisticsSnapshot, EngagementStatisticsError>;
}

/// Fixture reporting no engagement at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEngagementStatistics;

#[async_trait]
impl EngagementStatistics for FixtureEngagementStatistics {
    async fn snapshot(
        &self,
        _query: &StatisticsQuery,
    ) -> Result<StatisticsSnapshot, EngagementStatisticsError> {
        Ok(StatisticsSnapshot::default())
    }
}
