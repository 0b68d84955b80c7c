//! End-to-end: persisted filters drive the orchestrator, sync completions
//! refresh it, and derived benchmarks follow every Amplifier fetch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use made_dash::benchmark::Tier;
use made_dash::comparison::MetricId;
use made_dash::data::{
    AmplifierMetrics, FilterSpec, Granularity, MetricsBundle, RepositoryRef, SqliteRecordStore,
    SquadRef, TimeseriesPoint, UserRef,
};
use made_dash::filters::FilterStore;
use made_dash::productivity::ProductivityLabel;
use made_dash::query::{BackendResult, MetricsBackend, OrchestratorConfig, QueryOrchestrator};
use made_dash::sync::{SyncEvent, SyncLifecycle, SyncProgress, SyncState, COMPLETE_PHASE};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

/// Backend whose PR velocity grows with every Amplifier fetch
#[derive(Default)]
struct GrowingBackend {
    filters: Mutex<Vec<FilterSpec>>,
    amplifier_fetches: AtomicUsize,
}

#[async_trait]
impl MetricsBackend for GrowingBackend {
    async fn fetch_metrics(&self, filter: &FilterSpec) -> BackendResult<MetricsBundle> {
        self.filters.lock().unwrap().push(filter.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(MetricsBundle::default())
    }

    async fn fetch_timeseries(
        &self,
        _filter: &FilterSpec,
        _granularity: Granularity,
    ) -> BackendResult<Vec<TimeseriesPoint>> {
        Ok(Vec::new())
    }

    async fn fetch_amplifier_metrics(&self, days: i64) -> BackendResult<AmplifierMetrics> {
        let fetch = self.amplifier_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let mut metrics = AmplifierMetrics::default();
        metrics.speed.prs_per_day_per_dev = 0.5 * fetch as f64;
        metrics.speed.pr_turnaround_hours = 24.0;
        metrics.ease.repos_per_dev = 3.5;
        metrics.quality.pr_merge_rate = 85.0;
        metrics.quality.bug_pr_percentage = 20.0;
        metrics.overview.period_days = days;
        Ok(metrics)
    }

    async fn fetch_repositories(&self) -> BackendResult<Vec<RepositoryRef>> {
        Ok(Vec::new())
    }

    async fn fetch_users(&self) -> BackendResult<Vec<UserRef>> {
        Ok(Vec::new())
    }

    async fn fetch_squads(&self) -> BackendResult<Vec<SquadRef>> {
        Ok(vec![SquadRef {
            id: "core".to_string(),
            name: "Core".to_string(),
            members: vec!["octo".to_string()],
            color: "#4ECDC4".to_string(),
        }])
    }
}

fn progress(phase: &str) -> SyncEvent {
    SyncEvent::Progress(SyncProgress::new(phase, 1, 1, "repositories"))
}

#[tokio::test(start_paused = true)]
async fn filters_persist_and_drive_fetches() {
    let dir = TempDir::new().unwrap();
    let mut store = FilterStore::load_with_clock(SqliteRecordStore::in_dir(dir.path()), today);

    let backend = Arc::new(GrowingBackend::default());
    let backend_dyn: Arc<dyn MetricsBackend> = backend.clone();
    let (handle, _task) =
        QueryOrchestrator::spawn(backend_dyn, OrchestratorConfig::default(), store.spec().clone());
    handle.observe(&mut store);

    store.set_user(Some(4));
    store.set_squad(Some("core".to_string()));
    store.set_repositories(Some(vec![11, 12]));
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Startup plus one debounced set with the final spec
    let filters = backend.filters.lock().unwrap().clone();
    assert_eq!(filters.len(), 2);
    assert_eq!(&filters[1], store.spec());
    assert_eq!(filters[1].squad_id(), Some("core"));
    assert_eq!(filters[1].user_id(), None);

    let state = handle.state();
    assert_eq!(state.generation, 2);
    assert_eq!(state.filter.as_ref(), Some(store.spec()));
    assert_eq!(state.references.data.as_ref().unwrap().squads.len(), 1);

    // A new session restores the same spec from disk
    let restored = FilterStore::load_with_clock(SqliteRecordStore::in_dir(dir.path()), today);
    assert_eq!(restored.spec(), store.spec());
}

#[tokio::test(start_paused = true)]
async fn sync_completion_refreshes_derived_metrics() {
    let backend = Arc::new(GrowingBackend::default());
    let backend_dyn: Arc<dyn MetricsBackend> = backend.clone();
    let (handle, _task) = QueryOrchestrator::spawn(
        backend_dyn,
        OrchestratorConfig::default(),
        FilterSpec::default_for(today()),
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    let derived = handle.state().derived.unwrap();
    assert_eq!(derived.get(MetricId::PrVelocity).unwrap().tier, Tier::BelowIndustry);
    assert_eq!(derived.get(MetricId::PrTurnaround).unwrap().tier, Tier::Elite);
    assert_eq!(derived.get(MetricId::BugRatio).unwrap().tier, Tier::Industry);

    let (events_tx, events_rx) = mpsc::channel(8);
    let sync = tokio::spawn(SyncLifecycle::new(handle.clone()).run(events_rx));
    events_tx.send(progress("syncing")).await.unwrap();
    events_tx.send(progress("embeddings")).await.unwrap();
    events_tx.send(progress(COMPLETE_PHASE)).await.unwrap();
    drop(events_tx);
    assert_eq!(sync.await.unwrap(), SyncState::Idle);

    tokio::time::sleep(Duration::from_secs(1)).await;

    let state = handle.state();
    assert_eq!(state.generation, 2);
    assert_eq!(backend.amplifier_fetches.load(Ordering::SeqCst), 2);
    let derived = state.derived.unwrap();
    assert_eq!(derived.get(MetricId::PrVelocity).unwrap().tier, Tier::Industry);
    assert_eq!(derived.productivity.label, ProductivityLabel::IndustryAverage);
}

#[tokio::test(start_paused = true)]
async fn watchers_are_notified_of_new_generations() {
    let backend: Arc<dyn MetricsBackend> = Arc::new(GrowingBackend::default());
    let (handle, _task) = QueryOrchestrator::spawn(
        backend,
        OrchestratorConfig::default(),
        FilterSpec::default_for(today()),
    );
    let mut watcher = handle.subscribe();

    handle.refresh();
    loop {
        watcher.changed().await.unwrap();
        let state = watcher.borrow_and_update().clone();
        if state.generation == 2 && !state.is_loading() {
            assert!(state.amplifier.data.is_some());
            break;
        }
    }
}
