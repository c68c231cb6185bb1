use serde::{Deserialize, Serialize};

use crate::model::MetricRecord;

/// Which late-vs-early metric a ratio criterion compares against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioMetric {
    /// peak / early (timeline data only)
    BeautyCoefficient,
    /// late / early
    BeautyRatio,
}

impl RatioMetric {
    fn value(&self, m: &MetricRecord) -> Option<f64> {
        match self {
            RatioMetric::BeautyCoefficient => m.beauty_coefficient,
            RatioMetric::BeautyRatio => Some(m.beauty_ratio),
        }
    }
}

/// Filter predicate and scoring function of a classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Criterion {
    /// Citation peak arrives late and there is meaningful late volume
    PeakDelay {
        threshold_years: i32,
        min_late_citations: f64,
    },
    /// Late (or peak) volume is a large multiple of early volume
    Ratio {
        metric: RatioMetric,
        ratio_threshold: f64,
        min_early_citations: f64,
        min_total_citations: u64,
        #[serde(default)]
        min_age: i32,
    },
    /// Few early citations, many late ones
    Absolute {
        max_early_citations: f64,
        min_late_citations: f64,
        #[serde(default)]
        min_age: i32,
    },
    /// Old enough and cited enough; ranked by beauty ratio
    AgeThreshold {
        min_age: i32,
        min_citations: u64,
        /// Strict lower bound on the beauty ratio
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_beauty_ratio: Option<f64>,
    },
}

impl Criterion {
    pub fn kind(&self) -> &'static str {
        match self {
            Criterion::PeakDelay { .. } => "peak-delay",
            Criterion::Ratio { .. } => "ratio",
            Criterion::Absolute { .. } => "absolute",
            Criterion::AgeThreshold { .. } => "age-threshold",
        }
    }

    /// Whether the record passes the filter. Records lacking a required metric never pass.
    pub fn accepts(&self, m: &MetricRecord) -> bool {
        match self {
            Criterion::PeakDelay {
                threshold_years,
                min_late_citations,
            } => match m.delay_to_peak {
                Some(delay) => delay >= *threshold_years && m.late_citations >= *min_late_citations,
                None => false,
            },
            Criterion::Ratio {
                metric,
                ratio_threshold,
                min_early_citations,
                min_total_citations,
                min_age,
            } => match metric.value(m) {
                Some(value) => {
                    value >= *ratio_threshold
                        && m.early_citations >= *min_early_citations
                        && m.total_citations >= *min_total_citations
                        && m.age >= *min_age
                }
                None => false,
            },
            Criterion::Absolute {
                max_early_citations,
                min_late_citations,
                min_age,
            } => {
                m.early_citations <= *max_early_citations
                    && m.late_citations >= *min_late_citations
                    && m.age >= *min_age
            }
            Criterion::AgeThreshold {
                min_age,
                min_citations,
                min_beauty_ratio,
            } => {
                m.age >= *min_age
                    && m.total_citations >= *min_citations
                    && min_beauty_ratio.map_or(true, |r| m.beauty_ratio > r)
            }
        }
    }

    /// Ranking score, only meaningful within this criterion
    pub fn score(&self, m: &MetricRecord) -> Option<f64> {
        match self {
            Criterion::PeakDelay { .. } => {
                let delay = m.delay_to_peak?;
                let peak = m.peak_citations?;
                Some(delay as f64 * (peak as f64).ln_1p())
            }
            Criterion::Ratio { metric, .. } => {
                let value = metric.value(m)?;
                Some(value * (m.total_citations as f64).ln_1p())
            }
            Criterion::Absolute { .. } => Some(m.late_citations / (m.early_citations + 1.0)),
            Criterion::AgeThreshold { .. } => Some(m.beauty_ratio),
        }
    }

    /// Score for records that pass the filter, `None` otherwise
    pub fn evaluate(&self, m: &MetricRecord) -> Option<f64> {
        if self.accepts(m) {
            self.score(m)
        } else {
            None
        }
    }
}
