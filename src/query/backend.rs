//! The metrics backend seam.
//!
//! The backend computes metric values; this crate only composes queries for it.

use async_trait::async_trait;

use crate::data::{
    AmplifierMetrics, FilterSpec, Granularity, MetricsBundle, RepositoryRef, SquadRef,
    TimeseriesPoint, UserRef,
};
use crate::error::BackendError;

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Point-in-time speed/ease/quality metrics for the filter
    async fn fetch_metrics(&self, filter: &FilterSpec) -> BackendResult<MetricsBundle>;

    /// Ordered speed/ease/quality series for the filter
    async fn fetch_timeseries(
        &self,
        filter: &FilterSpec,
        granularity: Granularity,
    ) -> BackendResult<Vec<TimeseriesPoint>>;

    /// PR-activity metrics over the last `days` days, benchmarks included
    async fn fetch_amplifier_metrics(&self, days: i64) -> BackendResult<AmplifierMetrics>;

    async fn fetch_repositories(&self) -> BackendResult<Vec<RepositoryRef>>;

    async fn fetch_users(&self) -> BackendResult<Vec<UserRef>>;

    async fn fetch_squads(&self) -> BackendResult<Vec<SquadRef>>;
}
