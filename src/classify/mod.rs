mod criterion;
mod presets;

pub use criterion::{Criterion, RatioMetric};
pub use presets::{aggregate_presets, preset, timeline_presets};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::MetricRecord;

/// A named classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(flatten)]
    pub criterion: Criterion,
}

impl Rule {
    pub fn new(name: impl Into<String>, criterion: Criterion) -> Self {
        Self {
            name: name.into(),
            criterion,
        }
    }

    /// Score every record that passes the criterion, best first
    pub fn evaluate<'a>(&'a self, metrics: &'a [MetricRecord]) -> Vec<Candidate<'a>> {
        let mut candidates: Vec<Candidate<'a>> = metrics
            .par_iter()
            .filter_map(|m| {
                self.criterion.evaluate(m).map(|score| Candidate {
                    metric: m,
                    method: &self.name,
                    score,
                })
            })
            .collect();

        candidates.sort_by(Candidate::ranking);
        candidates
    }
}

/// A paper flagged by one rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub metric: &'a MetricRecord,
    pub method: &'a str,
    pub score: f64,
}

impl Candidate<'_> {
    /// Score descending, then identifier ascending
    pub fn ranking(a: &Self, b: &Self) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.metric.id.cmp(&b.metric.id))
    }
}

/// Sorted candidates of one rule
#[derive(Debug, Clone)]
pub struct RuleOutcome<'a> {
    pub rule: &'a Rule,
    pub candidates: Vec<Candidate<'a>>,
}

impl<'a> RuleOutcome<'a> {
    pub fn name(&self) -> &'a str {
        &self.rule.name
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// First `k` candidates in rank order
    pub fn top(&self, k: usize) -> &[Candidate<'a>] {
        &self.candidates[..k.min(self.candidates.len())]
    }
}

/// Run every rule over the same metric collection; outcomes keep the rule order
pub fn classify_all<'a>(rules: &'a [Rule], metrics: &'a [MetricRecord]) -> Vec<RuleOutcome<'a>> {
    rules
        .par_iter()
        .map(|rule| RuleOutcome {
            rule,
            candidates: rule.evaluate(metrics),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Estimation;

    fn metric(id: &str, age: i32, total: u64, early: f64, late: f64) -> MetricRecord {
        MetricRecord {
            index: 0,
            id: id.to_string(),
            year: 2025 - age,
            age,
            total_citations: total,
            num_references: 0,
            citations_per_year: total as f64 / (age + 1) as f64,
            early_citations: early,
            late_citations: late,
            beauty_ratio: if early > 0.0 { late / early } else { 0.0 },
            peak_year: None,
            peak_citations: None,
            delay_to_peak: None,
            beauty_coefficient: None,
            estimation: Estimation::Uniform,
            concepts: Vec::new(),
        }
    }

    fn sb10() -> Rule {
        Rule::new(
            "SB-10",
            Criterion::AgeThreshold {
                min_age: 10,
                min_citations: 10,
                min_beauty_ratio: None,
            },
        )
    }

    #[test]
    fn test_evaluate_sorted_by_score_descending() {
        let metrics = vec![
            metric("a", 12, 30, 6.0, 18.0),
            metric("b", 20, 40, 5.0, 35.0),
            metric("c", 15, 16, 3.0, 12.0),
            metric("young", 5, 100, 50.0, 50.0),
        ];
        let rule = sb10();
        let candidates = rule.evaluate(&metrics);

        let ids: Vec<&str> = candidates.iter().map(|c| c.metric.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(candidates.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(candidates.iter().all(|c| c.method == "SB-10"));
    }

    #[test]
    fn test_ties_broken_by_identifier() {
        let metrics = vec![
            metric("z", 12, 30, 6.0, 18.0),
            metric("m", 12, 30, 6.0, 18.0),
            metric("a", 12, 30, 6.0, 18.0),
        ];
        let rule = sb10();
        let ids: Vec<String> = rule
            .evaluate(&metrics)
            .iter()
            .map(|c| c.metric.id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_infinite_scores_rank_first() {
        let mut inf = metric("inf", 20, 30, 0.0, 30.0);
        inf.beauty_ratio = f64::INFINITY;
        let metrics = vec![metric("finite", 20, 30, 1.0, 29.0), inf];
        let rule = sb10();
        let candidates = rule.evaluate(&metrics);
        assert_eq!(candidates[0].metric.id, "inf");
    }

    #[test]
    fn test_classify_all_preserves_rule_order() {
        let metrics = vec![metric("a", 20, 40, 5.0, 35.0)];
        let rules = aggregate_presets();
        let outcomes = classify_all(&rules, &metrics);

        let names: Vec<&str> = outcomes.iter().map(|o| o.name()).collect();
        let expected: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_top_truncates() {
        let metrics: Vec<MetricRecord> = (0..5)
            .map(|i| metric(&format!("p{}", i), 20, 40 + i, 5.0, 35.0 + i as f64))
            .collect();
        let rule = sb10();
        let outcome = RuleOutcome {
            rule: &rule,
            candidates: rule.evaluate(&metrics),
        };
        assert_eq!(outcome.top(3).len(), 3);
        assert_eq!(outcome.top(30).len(), 5);
        assert_eq!(outcome.top(1)[0].metric.id, "p4");
    }

    #[test]
    fn test_rule_json_is_flat() {
        let json = serde_json::to_value(sb10()).unwrap();
        assert_eq!(json["name"], "SB-10");
        assert_eq!(json["kind"], "age-threshold");
        assert_eq!(json["min_age"], 10);
    }
}
