use std::collections::HashMap;

use crate::classify::{Candidate, RuleOutcome};
use crate::model::MetricRecord;

/// A paper flagged by at least one rule, with every rule that flagged it
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueCandidate<'a> {
    pub metric: &'a MetricRecord,
    /// Rule names in configuration order
    pub methods: Vec<&'a str>,
}

/// Deduplicated union of all rule outcomes
#[derive(Debug, Clone)]
pub struct CandidateUnion<'a> {
    /// Ranked by beauty ratio descending, then identifier ascending
    pub candidates: Vec<UniqueCandidate<'a>>,
    pub per_rule: Vec<(&'a str, usize)>,
}

impl<'a> CandidateUnion<'a> {
    /// Merge rule outcomes, deduplicating by paper identifier
    pub fn from_outcomes(outcomes: &[RuleOutcome<'a>]) -> Self {
        let mut by_id: HashMap<&'a str, UniqueCandidate<'a>> = HashMap::new();
        let mut per_rule = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            per_rule.push((outcome.name(), outcome.len()));
            for candidate in &outcome.candidates {
                let metric: &'a MetricRecord = candidate.metric;
                by_id
                    .entry(metric.id.as_str())
                    .or_insert_with(|| UniqueCandidate {
                        metric,
                        methods: Vec::new(),
                    })
                    .methods
                    .push(candidate.method);
            }
        }

        let mut candidates: Vec<UniqueCandidate<'a>> = by_id.into_values().collect();
        candidates.sort_by(|a, b| {
            b.metric
                .beauty_ratio
                .total_cmp(&a.metric.beauty_ratio)
                .then_with(|| a.metric.id.cmp(&b.metric.id))
        });

        Self {
            candidates,
            per_rule,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn metrics(&self) -> impl Iterator<Item = &'a MetricRecord> + '_ {
        self.candidates.iter().map(|c| c.metric)
    }
}

/// First `k` candidates of the named rule, if that rule was evaluated
pub fn top_k<'o, 'a>(outcomes: &'o [RuleOutcome<'a>], rule: &str, k: usize) -> Option<&'o [Candidate<'a>]> {
    outcomes
        .iter()
        .find(|o| o.name() == rule)
        .map(|o| o.top(k))
}
