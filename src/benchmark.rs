//! Benchmark derivation: where a metric value sits relative to its industry
//! and elite reference points.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative bucket for a metric against its benchmarks, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    BelowIndustry,
    Industry,
    Elite,
    Exceptional,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::BelowIndustry => "Below Industry",
            Tier::Industry => "Industry",
            Tier::Elite => "Elite",
            Tier::Exceptional => "Exceptional",
        };
        f.write_str(label)
    }
}

/// Industry and elite reference values for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReference {
    pub industry: f64,
    pub elite: f64,
    pub higher_is_better: bool,
}

impl BenchmarkReference {
    pub fn higher_is_better(industry: f64, elite: f64) -> Self {
        BenchmarkReference {
            industry,
            elite,
            higher_is_better: true,
        }
    }

    pub fn lower_is_better(industry: f64, elite: f64) -> Self {
        BenchmarkReference {
            industry,
            elite,
            higher_is_better: false,
        }
    }

    pub fn compare(&self, value: f64) -> Comparison {
        derive_comparison(value, self.industry, self.elite, self.higher_is_better)
    }
}

/// A metric value classified against its benchmarks.
///
/// Positive percentages always mean "better than the benchmark".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub value: f64,
    pub tier: Tier,
    pub vs_industry_pct: f64,
    pub vs_elite_pct: f64,
}

pub fn derive_tier(value: f64, industry: f64, elite: f64, higher_is_better: bool) -> Tier {
    if higher_is_better {
        if value < industry * 0.8 {
            Tier::BelowIndustry
        } else if value < elite {
            Tier::Industry
        } else if value < elite * 1.5 {
            Tier::Elite
        } else {
            Tier::Exceptional
        }
    } else if value > industry * 1.2 {
        Tier::BelowIndustry
    } else if value > elite {
        Tier::Industry
    } else if value > elite * 0.5 {
        Tier::Elite
    } else {
        Tier::Exceptional
    }
}

/// Signed percentage difference from `benchmark`; zero benchmarks yield 0
fn delta_pct(value: f64, benchmark: f64, higher_is_better: bool) -> f64 {
    if benchmark == 0.0 {
        return 0.0;
    }
    let pct = (value - benchmark) / benchmark * 100.0;
    if higher_is_better {
        pct
    } else {
        -pct
    }
}

pub fn derive_comparison(value: f64, industry: f64, elite: f64, higher_is_better: bool) -> Comparison {
    Comparison {
        value,
        tier: derive_tier(value, industry, elite, higher_is_better),
        vs_industry_pct: delta_pct(value, industry, higher_is_better),
        vs_elite_pct: delta_pct(value, elite, higher_is_better),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_higher_is_better_tiers() {
        assert_eq!(derive_tier(100.0, 100.0, 150.0, true), Tier::Industry);
        assert_eq!(derive_tier(200.0, 100.0, 150.0, true), Tier::Elite);
        assert_eq!(derive_tier(500.0, 100.0, 150.0, true), Tier::Exceptional);
        assert_eq!(derive_tier(50.0, 100.0, 150.0, true), Tier::BelowIndustry);
    }

    #[test]
    fn test_higher_is_better_boundaries() {
        // 80% of industry is already Industry tier
        assert_eq!(derive_tier(80.0, 100.0, 150.0, true), Tier::Industry);
        assert_eq!(derive_tier(79.9, 100.0, 150.0, true), Tier::BelowIndustry);
        assert_eq!(derive_tier(150.0, 100.0, 150.0, true), Tier::Elite);
        assert_eq!(derive_tier(225.0, 100.0, 150.0, true), Tier::Exceptional);
    }

    #[test]
    fn test_lower_is_better_tiers() {
        assert_eq!(derive_tier(20.0, 89.0, 24.0, false), Tier::Elite);
        assert_eq!(derive_tier(110.0, 89.0, 24.0, false), Tier::BelowIndustry);
        assert_eq!(derive_tier(50.0, 89.0, 24.0, false), Tier::Industry);
        assert_eq!(derive_tier(12.0, 89.0, 24.0, false), Tier::Exceptional);
        assert_eq!(derive_tier(24.0, 89.0, 24.0, false), Tier::Elite);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::BelowIndustry < Tier::Industry);
        assert!(Tier::Industry < Tier::Elite);
        assert!(Tier::Elite < Tier::Exceptional);
    }

    #[test]
    fn test_comparison_percentages() {
        let c = derive_comparison(1.2, 0.8, 1.5, true);
        assert_eq!(c.tier, Tier::Industry);
        assert!(approx(c.vs_industry_pct, 50.0));
        assert!(approx(c.vs_elite_pct, -20.0));
    }

    #[test]
    fn test_comparison_flips_sign_when_lower_is_better() {
        // 20h turnaround beats both 89h and 24h benchmarks
        let c = derive_comparison(20.0, 89.0, 24.0, false);
        assert!(c.vs_industry_pct > 0.0);
        assert!(c.vs_elite_pct > 0.0);
        assert!(approx(c.vs_elite_pct, 4.0 / 24.0 * 100.0));

        let slow = derive_comparison(178.0, 89.0, 24.0, false);
        assert!(approx(slow.vs_industry_pct, -100.0));
    }

    #[test]
    fn test_zero_benchmark_yields_zero_pct() {
        let c = derive_comparison(5.0, 0.0, 0.0, true);
        assert_eq!(c.vs_industry_pct, 0.0);
        assert_eq!(c.vs_elite_pct, 0.0);
        assert!(c.vs_industry_pct.is_finite());
    }

    #[test]
    fn test_reference_compare() {
        let reference = BenchmarkReference::lower_is_better(89.0, 24.0);
        assert_eq!(reference.compare(20.0), derive_comparison(20.0, 89.0, 24.0, false));
    }
}
