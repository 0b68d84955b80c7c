//! Per-metric benchmark comparisons for an Amplifier metrics bundle.
//!
//! Recomputed from scratch on every successful fetch; nothing here is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::benchmark::{BenchmarkReference, Comparison};
use crate::data::AmplifierMetrics;
use crate::productivity::{compose_amplifier, ProductivitySummary};

/// A displayed metric that has benchmark references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    PrVelocity,
    PrTurnaround,
    RepoCapacity,
    MergeRate,
    BugRatio,
}

impl MetricId {
    pub const ALL: [MetricId; 5] = [
        MetricId::PrVelocity,
        MetricId::PrTurnaround,
        MetricId::RepoCapacity,
        MetricId::MergeRate,
        MetricId::BugRatio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricId::PrVelocity => "PRs per day per developer",
            MetricId::PrTurnaround => "PR turnaround (hours)",
            MetricId::RepoCapacity => "Repositories per developer",
            MetricId::MergeRate => "PR merge rate (%)",
            MetricId::BugRatio => "Bug PR share (%)",
        }
    }

    /// Observed value and benchmark reference for this metric
    fn sample(&self, metrics: &AmplifierMetrics) -> (f64, BenchmarkReference) {
        let speed = &metrics.speed.benchmark_comparison;
        let ease = &metrics.ease.benchmark_comparison;
        let quality = &metrics.quality.benchmark_comparison;
        match self {
            MetricId::PrVelocity => (
                metrics.speed.prs_per_day_per_dev,
                BenchmarkReference::higher_is_better(speed.prs_per_day_industry, speed.prs_per_day_elite),
            ),
            MetricId::PrTurnaround => (
                metrics.speed.pr_turnaround_hours,
                BenchmarkReference::lower_is_better(speed.pr_turnaround_industry, speed.pr_turnaround_elite),
            ),
            MetricId::RepoCapacity => (
                metrics.ease.repos_per_dev,
                BenchmarkReference::higher_is_better(
                    ease.concurrent_repos_industry,
                    ease.concurrent_repos_elite,
                ),
            ),
            MetricId::MergeRate => (
                metrics.quality.pr_merge_rate,
                BenchmarkReference::higher_is_better(quality.merge_rate_industry, quality.merge_rate_elite),
            ),
            MetricId::BugRatio => (
                metrics.quality.bug_pr_percentage,
                BenchmarkReference::lower_is_better(quality.bug_ratio_industry, quality.bug_ratio_elite),
            ),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One metric's comparison together with the reference it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: MetricId,
    pub reference: BenchmarkReference,
    pub comparison: Comparison,
}

/// Everything derived from one Amplifier bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub comparisons: Vec<MetricComparison>,
    pub productivity: ProductivitySummary,
}

impl DerivedMetrics {
    pub fn from_amplifier(metrics: &AmplifierMetrics) -> Self {
        DerivedMetrics {
            comparisons: compare_amplifier(metrics),
            productivity: compose_amplifier(metrics),
        }
    }

    /// Get the comparison for a specific metric
    pub fn get(&self, metric: MetricId) -> Option<&Comparison> {
        self.comparisons
            .iter()
            .find(|c| c.metric == metric)
            .map(|c| &c.comparison)
    }
}

/// Compare every benchmarked metric of the bundle, in display order
pub fn compare_amplifier(metrics: &AmplifierMetrics) -> Vec<MetricComparison> {
    MetricId::ALL
        .iter()
        .map(|&metric| {
            let (value, reference) = metric.sample(metrics);
            MetricComparison {
                metric,
                reference,
                comparison: reference.compare(value),
            }
        })
        .collect()
}
