//! Productivity multiplier: a weighted composite of four benchmark ratios.
//!
//! The label breakpoints here operate on the composite's own scale and are
//! independent of the per-metric [`Tier`](crate::benchmark::Tier) thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::AmplifierMetrics;

const PR_VELOCITY_WEIGHT: f64 = 0.35;
const PR_SPEED_WEIGHT: f64 = 0.25;
const REPO_CAPACITY_WEIGHT: f64 = 0.25;
const QUALITY_WEIGHT: f64 = 0.15;

/// Qualitative reading of the productivity multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductivityLabel {
    BelowIndustryAverage,
    IndustryAverage,
    EliteTier,
    Exceptional,
}

impl ProductivityLabel {
    pub fn for_multiplier(multiplier: f64) -> Self {
        if multiplier < 0.8 {
            ProductivityLabel::BelowIndustryAverage
        } else if multiplier < 1.5 {
            ProductivityLabel::IndustryAverage
        } else if multiplier < 3.0 {
            ProductivityLabel::EliteTier
        } else {
            ProductivityLabel::Exceptional
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductivityLabel::BelowIndustryAverage => "Below Industry Average",
            ProductivityLabel::IndustryAverage => "Industry Average Performance",
            ProductivityLabel::EliteTier => "Elite Tier Performance",
            ProductivityLabel::Exceptional => "Exceptional Performance",
        }
    }
}

impl fmt::Display for ProductivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension ratios to the elite benchmark (higher is better for all four)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityScores {
    pub pr_velocity: f64,
    pub pr_speed: f64,
    pub repo_capacity: f64,
    pub quality: f64,
}

impl ProductivityScores {
    /// Read the four scores from an Amplifier bundle
    pub fn from_amplifier(metrics: &AmplifierMetrics) -> Self {
        let speed = &metrics.speed.benchmark_comparison;
        ProductivityScores {
            pr_velocity: ratio(metrics.speed.prs_per_day_per_dev, speed.prs_per_day_elite),
            // Turnaround is lower-is-better, so the ratio is inverted
            pr_speed: ratio(speed.pr_turnaround_elite, metrics.speed.pr_turnaround_hours),
            repo_capacity: ratio(
                metrics.ease.repos_per_dev,
                metrics.ease.benchmark_comparison.concurrent_repos_elite,
            ),
            quality: ratio(
                metrics.quality.pr_merge_rate,
                metrics.quality.benchmark_comparison.merge_rate_elite,
            ),
        }
    }

    pub fn multiplier(&self) -> f64 {
        PR_VELOCITY_WEIGHT * self.pr_velocity
            + PR_SPEED_WEIGHT * self.pr_speed
            + REPO_CAPACITY_WEIGHT * self.repo_capacity
            + QUALITY_WEIGHT * self.quality
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// The composite score with its label and the scores it was built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivitySummary {
    pub multiplier: f64,
    pub label: ProductivityLabel,
    pub scores: ProductivityScores,
}

pub fn compose(scores: ProductivityScores) -> ProductivitySummary {
    let multiplier = scores.multiplier();
    ProductivitySummary {
        multiplier,
        label: ProductivityLabel::for_multiplier(multiplier),
        scores,
    }
}

pub fn compose_amplifier(metrics: &AmplifierMetrics) -> ProductivitySummary {
    compose(ProductivityScores::from_amplifier(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_label_breakpoints() {
        assert_eq!(ProductivityLabel::for_multiplier(0.79), ProductivityLabel::BelowIndustryAverage);
        assert_eq!(ProductivityLabel::for_multiplier(0.8), ProductivityLabel::IndustryAverage);
        assert_eq!(ProductivityLabel::for_multiplier(1.49), ProductivityLabel::IndustryAverage);
        assert_eq!(ProductivityLabel::for_multiplier(1.5), ProductivityLabel::EliteTier);
        assert_eq!(ProductivityLabel::for_multiplier(3.0), ProductivityLabel::Exceptional);
        assert_eq!(ProductivityLabel::EliteTier.to_string(), "Elite Tier Performance");
    }

    #[test]
    fn test_weights_sum_to_one() {
        let scores = ProductivityScores {
            pr_velocity: 1.0,
            pr_speed: 1.0,
            repo_capacity: 1.0,
            quality: 1.0,
        };
        assert!(approx(scores.multiplier(), 1.0));
    }

    #[test]
    fn test_weighted_composite() {
        let summary = compose(ProductivityScores {
            pr_velocity: 2.0,
            pr_speed: 4.0,
            repo_capacity: 1.0,
            quality: 0.0,
        });
        assert!(approx(summary.multiplier, 0.7 + 1.0 + 0.25));
        assert_eq!(summary.label, ProductivityLabel::EliteTier);
    }

    #[test]
    fn test_scores_from_amplifier_bundle() {
        let mut metrics = AmplifierMetrics::default();
        metrics.speed.prs_per_day_per_dev = 3.0;
        metrics.speed.pr_turnaround_hours = 12.0;
        metrics.ease.repos_per_dev = 3.5;
        metrics.quality.pr_merge_rate = 85.0;

        let scores = ProductivityScores::from_amplifier(&metrics);
        assert!(approx(scores.pr_velocity, 2.0));
        assert!(approx(scores.pr_speed, 2.0));
        assert!(approx(scores.repo_capacity, 1.0));
        assert!(approx(scores.quality, 1.0));

        let summary = compose_amplifier(&metrics);
        assert!(approx(summary.multiplier, 0.7 + 0.5 + 0.25 + 0.15));
        assert_eq!(summary.label, ProductivityLabel::EliteTier);
    }

    #[test]
    fn test_empty_bundle_scores_zero_speed() {
        // No merged PRs means zero turnaround; the inverted ratio must not blow up
        let summary = compose_amplifier(&AmplifierMetrics::default());
        assert_eq!(summary.scores.pr_speed, 0.0);
        assert_eq!(summary.multiplier, 0.0);
        assert_eq!(summary.label, ProductivityLabel::BelowIndustryAverage);
    }
}
