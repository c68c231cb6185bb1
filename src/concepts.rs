use serde::Serialize;
use std::collections::HashMap;

use crate::model::MetricRecord;

/// Subject tags most common among a set of candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptSummary {
    pub total_sb_papers: usize,
    /// (concept, count), most frequent first
    pub concept_frequency: Vec<(String, usize)>,
}

/// Count concepts over all candidates and keep the `top_n` most frequent.
/// Ties are ordered by concept name.
pub fn analyze_concepts<'a, I>(candidates: I, top_n: usize) -> ConceptSummary
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    let mut total_sb_papers = 0;

    for metric in candidates {
        total_sb_papers += 1;
        for concept in &metric.concepts {
            *counts.entry(concept.as_str()).or_insert(0) += 1;
        }
    }

    let mut concept_frequency: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(concept, count)| (concept.to_string(), count))
        .collect();
    concept_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    concept_frequency.truncate(top_n);

    ConceptSummary {
        total_sb_papers,
        concept_frequency,
    }
}
