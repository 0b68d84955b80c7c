//! Visible dashboard state published by the orchestrator.

use serde::Serialize;

use crate::comparison::DerivedMetrics;
use crate::data::{AmplifierMetrics, FilterSpec, MetricsBundle, ReferenceLists, TimeseriesPoint};

/// Generation tag marking one batch of in-flight fetches
pub type Generation = u64;

/// One independently fetched section of the dashboard.
///
/// A failure records `error` but keeps the previously shown `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub loading: bool,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Section {
            data: None,
            error: None,
            loading: false,
        }
    }
}

impl<T> Section<T> {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
    }

    pub(crate) fn resolve(&mut self, result: Result<T, String>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
    }
}

/// Everything the presentation layer needs to draw the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    /// Generation of the most recently issued fetch set
    pub generation: Generation,
    /// Filter the current generation was issued with
    pub filter: Option<FilterSpec>,
    pub metrics: Section<MetricsBundle>,
    pub timeseries: Section<Vec<TimeseriesPoint>>,
    pub amplifier: Section<AmplifierMetrics>,
    /// Comparisons and productivity summary for `amplifier.data`
    pub derived: Option<DerivedMetrics>,
    pub references: Section<ReferenceLists>,
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.metrics.loading || self.timeseries.loading || self.amplifier.loading
    }
}
