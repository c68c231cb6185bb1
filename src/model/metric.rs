use serde::{Deserialize, Serialize};

/// Which estimator produced a metric record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estimation {
    /// Early/late split from a constant annual citation rate
    Uniform,
    /// Exact sums over a citation histogram
    Timeline,
}

impl Estimation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estimation::Uniform => "uniform",
            Estimation::Timeline => "timeline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uniform" => Some(Estimation::Uniform),
            "timeline" => Some(Estimation::Timeline),
            _ => None,
        }
    }
}

impl std::fmt::Display for Estimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delayed-recognition metrics derived from one paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub index: u64,
    pub id: String,
    pub year: i32,
    pub age: i32,
    pub total_citations: u64,
    pub num_references: u64,
    pub citations_per_year: f64,
    pub early_citations: f64,
    pub late_citations: f64,
    /// late / early, +inf when only late citations exist, 0 when neither
    pub beauty_ratio: f64,
    pub peak_year: Option<i32>,
    pub peak_citations: Option<u64>,
    pub delay_to_peak: Option<i32>,
    /// peak / early, absent when early is zero or there is no peak
    pub beauty_coefficient: Option<f64>,
    pub estimation: Estimation,
    pub concepts: Vec<String>,
}
