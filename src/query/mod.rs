//! Debounced, generation-tagged fetching of dashboard data.

mod backend;
mod debounce;
mod orchestrator;
mod state;

pub use backend::{BackendResult, MetricsBackend};
pub use debounce::{DebounceTimer, DebounceToken};
pub use orchestrator::{OrchestratorConfig, OrchestratorHandle, QueryOrchestrator};
pub use state::{DashboardState, Generation, Section};
