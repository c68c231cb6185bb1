use super::{Criterion, RatioMetric, Rule};
use crate::config::Mode;

/// Rules for aggregate-count data: age/citation thresholds ranked by beauty ratio,
/// plus ratio and absolute rules on the uniform-rate estimates.
pub fn aggregate_presets() -> Vec<Rule> {
    vec![
        Rule::new(
            "SB-10",
            Criterion::AgeThreshold {
                min_age: 10,
                min_citations: 10,
                min_beauty_ratio: None,
            },
        ),
        Rule::new(
            "SB-15",
            Criterion::AgeThreshold {
                min_age: 15,
                min_citations: 20,
                min_beauty_ratio: None,
            },
        ),
        Rule::new(
            "SB-conservative",
            Criterion::AgeThreshold {
                min_age: 10,
                min_citations: 20,
                min_beauty_ratio: Some(3.0),
            },
        ),
        Rule::new(
            "SB-ratio",
            Criterion::Ratio {
                metric: RatioMetric::BeautyRatio,
                ratio_threshold: 3.0,
                min_early_citations: 0.0,
                min_total_citations: 20,
                min_age: 10,
            },
        ),
        Rule::new(
            "SB-absolute",
            Criterion::Absolute {
                max_early_citations: 10.0,
                min_late_citations: 30.0,
                min_age: 10,
            },
        ),
    ]
}

/// Rules for year-by-year citation histograms: delayed peaks, peak/early
/// coefficient and absolute early/late volumes.
pub fn timeline_presets() -> Vec<Rule> {
    vec![
        Rule::new(
            "SB-10",
            Criterion::PeakDelay {
                threshold_years: 10,
                min_late_citations: 10.0,
            },
        ),
        Rule::new(
            "SB-15",
            Criterion::PeakDelay {
                threshold_years: 15,
                min_late_citations: 10.0,
            },
        ),
        Rule::new(
            "SB-conservative",
            Criterion::PeakDelay {
                threshold_years: 10,
                min_late_citations: 50.0,
            },
        ),
        Rule::new(
            "SB-ratio",
            Criterion::Ratio {
                metric: RatioMetric::BeautyCoefficient,
                ratio_threshold: 10.0,
                min_early_citations: 1.0,
                min_total_citations: 20,
                min_age: 0,
            },
        ),
        Rule::new(
            "SB-absolute",
            Criterion::Absolute {
                max_early_citations: 5.0,
                min_late_citations: 50.0,
                min_age: 0,
            },
        ),
    ]
}

/// Look up a named preset for a mode
pub fn preset(name: &str, mode: Mode) -> Option<Rule> {
    let rules = match mode {
        Mode::Aggregate => aggregate_presets(),
        Mode::Timeline => timeline_presets(),
    };
    rules.into_iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_preset_names_are_unique() {
        for rules in [aggregate_presets(), timeline_presets()] {
            let names: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names.len(), rules.len());
            for required in ["SB-10", "SB-15", "SB-conservative", "SB-ratio"] {
                assert!(names.contains(required), "missing preset {}", required);
            }
        }
    }

    #[test]
    fn test_preset_lookup() {
        let rule = preset("sb-15", Mode::Aggregate).unwrap();
        assert_eq!(
            rule.criterion,
            Criterion::AgeThreshold {
                min_age: 15,
                min_citations: 20,
                min_beauty_ratio: None
            }
        );

        let rule = preset("SB-conservative", Mode::Timeline).unwrap();
        assert_eq!(rule.criterion.kind(), "peak-delay");

        assert!(preset("SB-99", Mode::Aggregate).is_none());
    }
}
