//! Shared data types and the local record store.

mod models;
mod storage;

pub use models::{
    AmplifierEase, AmplifierMetrics, AmplifierOverview, AmplifierQuality, AmplifierSpeed,
    DateRange, EaseBenchmarks, EaseSummary, FilterSpec, Granularity, MetricsBundle,
    QualityBenchmarks, QualitySummary, ReferenceLists, RepoId, RepositoryRef, SpeedBenchmarks,
    SpeedSummary, SquadId, SquadRef, TimeseriesPoint, UserId, UserRef, DEFAULT_RANGE_DAYS,
};
pub use storage::{
    deserialize_filters, load_filters, save_filters, serialize_filters, MemoryRecordStore,
    RecordStore, SqliteRecordStore, FILTERS_RECORD, RECORDS_DB_FILE,
};
