//! Query orchestration.
//!
//! A single actor task owns the current filter, the debounce timer and the
//! generation counter. Filter changes restart the debounce timer; when it
//! elapses the generation is bumped and the metrics, timeseries and Amplifier
//! fetches are spawned in parallel, each tagged with that generation. A
//! completion is applied only if its tag still matches the current generation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{BackendResult, MetricsBackend};
use super::debounce::{DebounceTimer, DebounceToken};
use super::state::{DashboardState, Generation};
use crate::comparison::DerivedMetrics;
use crate::data::{
    AmplifierMetrics, FilterSpec, Granularity, MetricsBundle, ReferenceLists, TimeseriesPoint,
};
use crate::error::BackendError;
use crate::filters::{FilterStore, SubscriptionId};
use crate::sync::RefreshTrigger;

/// Tuning knobs for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Quiet period after the last filter change before fetching
    pub debounce: Duration,
    /// Upper bound on each individual fetch
    pub fetch_timeout: Duration,
    pub granularity: Granularity,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            debounce: Duration::from_millis(300),
            fetch_timeout: Duration::from_secs(30),
            granularity: Granularity::Weekly,
        }
    }
}

/// Completed fetch for one dashboard section
#[derive(Debug)]
enum SectionResult {
    Metrics(BackendResult<MetricsBundle>),
    Timeseries(BackendResult<Vec<TimeseriesPoint>>),
    Amplifier(BackendResult<AmplifierMetrics>),
}

impl SectionResult {
    fn name(&self) -> &'static str {
        match self {
            SectionResult::Metrics(_) => "metrics",
            SectionResult::Timeseries(_) => "timeseries",
            SectionResult::Amplifier(_) => "amplifier",
        }
    }
}

#[derive(Debug)]
enum Command {
    FilterChanged(FilterSpec),
    DebounceElapsed(DebounceToken),
    Refresh,
    SyncCompleted,
    Completed(Generation, SectionResult),
    ReferencesLoaded(Generation, BackendResult<ReferenceLists>),
    Shutdown,
}

/// Cloneable handle for talking to a running orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: UnboundedSender<Command>,
    state: watch::Receiver<DashboardState>,
}

impl OrchestratorHandle {
    /// Report a new filter spec; fetching happens after the debounce period
    pub fn filter_changed(&self, spec: FilterSpec) {
        self.send(Command::FilterChanged(spec));
    }

    /// Issue a fresh fetch set immediately
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// A backend sync finished: refetch everything, reference lists included
    pub fn sync_completed(&self) {
        self.send(Command::SyncCompleted);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    /// Snapshot of the current dashboard state
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Forward every change of `store` to this orchestrator
    pub fn observe(&self, store: &mut FilterStore) -> SubscriptionId {
        let handle = self.clone();
        store.subscribe(move |spec| handle.filter_changed(spec.clone()))
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Orchestrator has stopped, dropping command");
        }
    }
}

impl RefreshTrigger for OrchestratorHandle {
    fn request_refresh(&self) {
        self.sync_completed();
    }
}

pub struct QueryOrchestrator {
    backend: Arc<dyn MetricsBackend>,
    config: OrchestratorConfig,
    filter: FilterSpec,
    generation: Generation,
    reference_generation: Generation,
    debounce: DebounceTimer,
    commands: WeakUnboundedSender<Command>,
    state: watch::Sender<DashboardState>,
}

impl QueryOrchestrator {
    /// Start the orchestrator task.
    ///
    /// An initial fetch set for `filter` and the reference lists are issued
    /// right away.
    pub fn spawn(
        backend: Arc<dyn MetricsBackend>,
        config: OrchestratorConfig,
        filter: FilterSpec,
    ) -> (OrchestratorHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(DashboardState::default());

        let orchestrator = QueryOrchestrator {
            backend,
            config,
            filter,
            generation: 0,
            reference_generation: 0,
            debounce: DebounceTimer::new(config.debounce),
            commands: commands_tx.downgrade(),
            state: state_tx,
        };
        let task = tokio::spawn(orchestrator.run(commands_rx));

        let handle = OrchestratorHandle {
            commands: commands_tx,
            state: state_rx,
        };
        (handle, task)
    }

    async fn run(mut self, mut commands: UnboundedReceiver<Command>) {
        self.load_references();
        self.issue_fetches("startup");

        while let Some(command) = commands.recv().await {
            match command {
                Command::Shutdown => break,
                other => self.handle(other),
            }
        }

        self.debounce.cancel();
        debug!("Orchestrator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::FilterChanged(spec) => {
                self.filter = spec;
                if let Some(events) = self.commands.upgrade() {
                    self.debounce.restart(&events, Command::DebounceElapsed);
                }
            }
            Command::DebounceElapsed(token) => {
                if self.debounce.fire(token) {
                    self.issue_fetches("filter change");
                } else {
                    debug!(token, "Ignoring superseded debounce timer");
                }
            }
            Command::Refresh => {
                self.debounce.cancel();
                self.issue_fetches("refresh");
            }
            Command::SyncCompleted => {
                self.debounce.cancel();
                self.issue_fetches("sync completed");
                self.load_references();
            }
            Command::Completed(generation, result) => self.apply(generation, result),
            Command::ReferencesLoaded(generation, result) => {
                self.apply_references(generation, result)
            }
            Command::Shutdown => {}
        }
    }

    /// Bump the generation and spawn all three section fetches
    fn issue_fetches(&mut self, reason: &'static str) {
        let Some(events) = self.commands.upgrade() else {
            return;
        };
        self.generation += 1;
        let generation = self.generation;
        let filter = self.filter.clone();
        let timeout = self.config.fetch_timeout;
        info!(generation, reason, ?filter, "Issuing fetch set");

        let backend = Arc::clone(&self.backend);
        let spec = filter.clone();
        spawn_fetch(
            &events,
            generation,
            ("fetch_metrics", timeout),
            SectionResult::Metrics,
            async move { backend.fetch_metrics(&spec).await },
        );

        let backend = Arc::clone(&self.backend);
        let spec = filter.clone();
        let granularity = self.config.granularity;
        spawn_fetch(
            &events,
            generation,
            ("fetch_timeseries", timeout),
            SectionResult::Timeseries,
            async move { backend.fetch_timeseries(&spec, granularity).await },
        );

        let backend = Arc::clone(&self.backend);
        let days = filter.amplifier_days();
        spawn_fetch(
            &events,
            generation,
            ("fetch_amplifier_metrics", timeout),
            SectionResult::Amplifier,
            async move { backend.fetch_amplifier_metrics(days).await },
        );

        self.state.send_modify(|state| {
            state.generation = generation;
            state.filter = Some(filter);
            state.metrics.begin();
            state.timeseries.begin();
            state.amplifier.begin();
        });
    }

    fn apply(&mut self, generation: Generation, result: SectionResult) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                section = result.name(),
                "Discarding stale result"
            );
            return;
        }

        if let SectionResult::Metrics(Err(e))
        | SectionResult::Timeseries(Err(e))
        | SectionResult::Amplifier(Err(e)) = &result
        {
            warn!(generation, section = result.name(), error = %e, "Fetch failed");
        }

        self.state.send_modify(|state| match result {
            SectionResult::Metrics(r) => state.metrics.resolve(r.map_err(|e| e.to_string())),
            SectionResult::Timeseries(r) => state.timeseries.resolve(r.map_err(|e| e.to_string())),
            SectionResult::Amplifier(r) => {
                if let Ok(metrics) = &r {
                    state.derived = Some(DerivedMetrics::from_amplifier(metrics));
                }
                state.amplifier.resolve(r.map_err(|e| e.to_string()));
            }
        });
    }

    fn load_references(&mut self) {
        let Some(events) = self.commands.upgrade() else {
            return;
        };
        self.reference_generation += 1;
        let generation = self.reference_generation;
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.fetch_timeout;

        tokio::spawn(async move {
            let fetch = async {
                let (repositories, users, squads) = tokio::join!(
                    backend.fetch_repositories(),
                    backend.fetch_users(),
                    backend.fetch_squads()
                );
                Ok::<_, BackendError>(ReferenceLists {
                    repositories: repositories?,
                    users: users?,
                    squads: squads?,
                })
            };
            let result = with_timeout("fetch_references", timeout, fetch).await;
            let _ = events.send(Command::ReferencesLoaded(generation, result));
        });

        self.state.send_modify(|state| state.references.begin());
    }

    fn apply_references(&mut self, generation: Generation, result: BackendResult<ReferenceLists>) {
        if generation != self.reference_generation {
            debug!(generation, "Discarding stale reference lists");
            return;
        }
        if let Err(e) = &result {
            warn!(error = %e, "Loading reference lists failed");
        }
        self.state
            .send_modify(|state| state.references.resolve(result.map_err(|e| e.to_string())));
    }
}

async fn with_timeout<T>(
    operation: &'static str,
    after: Duration,
    fetch: impl Future<Output = BackendResult<T>>,
) -> BackendResult<T> {
    match tokio::time::timeout(after, fetch).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}

/// Run one fetch on its own task and report the tagged result
fn spawn_fetch<T, F>(
    events: &UnboundedSender<Command>,
    generation: Generation,
    (operation, timeout): (&'static str, Duration),
    wrap: fn(BackendResult<T>) -> SectionResult,
    fetch: F,
) where
    T: Send + 'static,
    F: Future<Output = BackendResult<T>> + Send + 'static,
{
    let events = events.clone();
    tokio::spawn(async move {
        let result = with_timeout(operation, timeout, fetch).await;
        let _ = events.send(Command::Completed(generation, wrap(result)));
    });
}
