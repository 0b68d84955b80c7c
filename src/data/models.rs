//! Data models shared by the filter store, the query orchestrator and the
//! benchmark derivation.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

pub type RepoId = i64;
pub type UserId = i64;
pub type SquadId = String;

/// Length of the date range restored at startup and by `clear()`
pub const DEFAULT_RANGE_DAYS: u32 = 90;

/// Parse an ISO 8601 date, accepting full timestamps as well as plain dates
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// An inclusive calendar date range with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// The range covering the last `days` days, ending on `today`.
    ///
    /// Starts past the earliest representable date are clamped to it.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let start = today
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        DateRange { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days between start and end
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Wire shape of a stored date range (ISO strings)
#[derive(Deserialize)]
struct RawDateRange {
    start: String,
    end: String,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        let start = parse_date(&raw.start).ok_or_else(|| format!("invalid start date: {}", raw.start))?;
        let end = parse_date(&raw.end).ok_or_else(|| format!("invalid end date: {}", raw.end))?;
        DateRange::new(start, end).map_err(|e| e.to_string())
    }
}

/// The complete description of which data subset the dashboard displays.
///
/// `squad_id` and `user_id` are mutually exclusive: setting one clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFilterSpec")]
pub struct FilterSpec {
    date_range: Option<DateRange>,
    repository_ids: Option<BTreeSet<RepoId>>,
    squad_id: Option<SquadId>,
    user_id: Option<UserId>,
}

impl FilterSpec {
    /// The startup spec: last 90 days ending `today`, nothing else selected
    pub fn default_for(today: NaiveDate) -> Self {
        FilterSpec {
            date_range: Some(DateRange::last_days(today, DEFAULT_RANGE_DAYS)),
            ..FilterSpec::default()
        }
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn repository_ids(&self) -> Option<&BTreeSet<RepoId>> {
        self.repository_ids.as_ref()
    }

    pub fn squad_id(&self) -> Option<&str> {
        self.squad_id.as_deref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// True iff any of repositories, squad or user is set
    pub fn has_active_filters(&self) -> bool {
        self.repository_ids.is_some() || self.squad_id.is_some() || self.user_id.is_some()
    }

    /// Day count handed to the Amplifier metrics fetch
    pub fn amplifier_days(&self) -> i64 {
        self.date_range
            .map(|range| range.span_days().max(1))
            .unwrap_or_else(|| i64::from(DEFAULT_RANGE_DAYS))
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.apply_date_range(range);
        self
    }

    pub fn with_repositories<I>(mut self, ids: Option<I>) -> Self
    where
        I: IntoIterator<Item = RepoId>,
    {
        self.apply_repositories(ids.map(|ids| ids.into_iter().collect()));
        self
    }

    pub fn with_squad(mut self, squad: Option<SquadId>) -> Self {
        self.apply_squad(squad);
        self
    }

    pub fn with_user(mut self, user: Option<UserId>) -> Self {
        self.apply_user(user);
        self
    }

    pub(crate) fn apply_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
    }

    /// An empty selection means "no repository filter"
    pub(crate) fn apply_repositories(&mut self, ids: Option<BTreeSet<RepoId>>) {
        self.repository_ids = ids.filter(|ids| !ids.is_empty());
    }

    pub(crate) fn apply_squad(&mut self, squad: Option<SquadId>) {
        if squad.is_some() {
            self.user_id = None;
        }
        self.squad_id = squad;
    }

    pub(crate) fn apply_user(&mut self, user: Option<UserId>) {
        if user.is_some() {
            self.squad_id = None;
        }
        self.user_id = user;
    }
}

/// Wire shape of a stored filter spec, validated on conversion
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterSpec {
    #[serde(default)]
    date_range: Option<DateRange>,
    #[serde(default)]
    repository_ids: Option<BTreeSet<RepoId>>,
    #[serde(default)]
    squad_id: Option<SquadId>,
    #[serde(default)]
    user_id: Option<UserId>,
}

impl TryFrom<RawFilterSpec> for FilterSpec {
    type Error = String;

    fn try_from(raw: RawFilterSpec) -> Result<Self, Self::Error> {
        if raw.squad_id.is_some() && raw.user_id.is_some() {
            return Err("squadId and userId are mutually exclusive".to_string());
        }
        let mut spec = FilterSpec {
            date_range: raw.date_range,
            squad_id: raw.squad_id,
            user_id: raw.user_id,
            ..FilterSpec::default()
        };
        spec.apply_repositories(raw.repository_ids);
        Ok(spec)
    }
}

/// Bucket size for timeseries fetches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

/// Point-in-time metrics of the default metrics mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub speed: SpeedSummary,
    pub ease: EaseSummary,
    pub quality: QualitySummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedSummary {
    pub avg_cycle_time_days: f64,
    pub avg_pr_lead_time_hours: f64,
    pub throughput_per_week: f64,
    pub trend: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EaseSummary {
    pub avg_pr_size_lines: f64,
    pub avg_review_rounds: f64,
    pub avg_time_to_first_review_hours: f64,
    pub rework_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub bug_rate: f64,
    pub reopen_rate: f64,
    pub pr_rejection_rate: f64,
    pub test_coverage_trend: f64,
}

/// A single bucket of the speed/ease/quality timeseries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub date: NaiveDate,
    pub speed: f64,
    pub ease: f64,
    pub quality: f64,
}

/// PR-activity metrics of the Amplifier mode, each section carrying its benchmarks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplifierMetrics {
    pub speed: AmplifierSpeed,
    pub ease: AmplifierEase,
    pub quality: AmplifierQuality,
    pub overview: AmplifierOverview,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplifierSpeed {
    pub prs_per_day: f64,
    pub prs_per_day_per_dev: f64,
    pub pr_turnaround_hours: f64,
    pub loc_per_day: f64,
    #[serde(default)]
    pub benchmark_comparison: SpeedBenchmarks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBenchmarks {
    pub prs_per_day_industry: f64,
    pub prs_per_day_elite: f64,
    pub pr_turnaround_industry: f64,
    pub pr_turnaround_elite: f64,
}

impl Default for SpeedBenchmarks {
    fn default() -> Self {
        SpeedBenchmarks {
            prs_per_day_industry: 0.8,
            prs_per_day_elite: 1.5,
            pr_turnaround_industry: 89.0,
            pr_turnaround_elite: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplifierEase {
    pub concurrent_repos: i64,
    pub repos_per_dev: f64,
    pub total_active_repos: i64,
    pub pr_switch_frequency: f64,
    #[serde(default)]
    pub benchmark_comparison: EaseBenchmarks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EaseBenchmarks {
    pub concurrent_repos_industry: f64,
    pub concurrent_repos_elite: f64,
}

impl Default for EaseBenchmarks {
    fn default() -> Self {
        EaseBenchmarks {
            concurrent_repos_industry: 2.1,
            concurrent_repos_elite: 3.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplifierQuality {
    pub pr_merge_rate: f64,
    pub avg_files_per_pr: f64,
    pub bug_pr_percentage: f64,
    pub avg_review_cycle_hours: f64,
    #[serde(default)]
    pub benchmark_comparison: QualityBenchmarks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBenchmarks {
    pub merge_rate_industry: f64,
    pub merge_rate_elite: f64,
    pub bug_ratio_industry: f64,
    pub bug_ratio_elite: f64,
    pub files_per_pr_industry: f64,
}

impl Default for QualityBenchmarks {
    fn default() -> Self {
        QualityBenchmarks {
            merge_rate_industry: 68.0,
            merge_rate_elite: 85.0,
            bug_ratio_industry: 25.0,
            bug_ratio_elite: 15.0,
            files_per_pr_industry: 8.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplifierOverview {
    pub productivity_multiplier: f64,
    pub period_days: i64,
    pub total_prs: i64,
    pub active_developers: i64,
}

/// A repository offered by the filter picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub id: RepoId,
    pub owner: String,
    pub name: String,
    pub enabled: bool,
}

/// A tracked user offered by the filter picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub login: String,
    pub name: Option<String>,
    pub tracked: bool,
}

/// A configured squad offered by the filter picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadRef {
    pub id: SquadId,
    pub name: String,
    pub members: Vec<String>,
    pub color: String,
}

/// Picker contents for the repository, user and squad filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLists {
    pub repositories: Vec<RepositoryRef>,
    pub users: Vec<UserRef>,
    pub squads: Vec<SquadRef>,
}
