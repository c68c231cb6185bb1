use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Citation timing data known for a paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationData {
    /// Only the total number of citing papers is known
    Count(u64),
    /// Citations per calendar year (years need not be contiguous)
    Timeline(BTreeMap<i32, u64>),
}

impl CitationData {
    pub fn total(&self) -> u64 {
        match self {
            CitationData::Count(n) => *n,
            CitationData::Timeline(by_year) => by_year.values().sum(),
        }
    }

    pub fn timeline(&self) -> Option<&BTreeMap<i32, u64>> {
        match self {
            CitationData::Count(_) => None,
            CitationData::Timeline(by_year) => Some(by_year),
        }
    }
}

/// A paper with its publication year and citation data, as read from the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Internal index in the citation graph
    pub index: u64,
    /// External identifier (arXiv id or zero-padded index)
    pub id: String,
    pub year: i32,
    pub citations: CitationData,
    pub num_references: u64,
    pub concepts: Vec<String>,
}

impl PaperRecord {
    /// Paper for which only an aggregate citation count is known
    pub fn with_count(index: u64, id: impl Into<String>, year: i32, total_citations: u64) -> Self {
        Self {
            index,
            id: id.into(),
            year,
            citations: CitationData::Count(total_citations),
            num_references: 0,
            concepts: Vec::new(),
        }
    }

    /// Paper with a year-by-year citation histogram
    pub fn with_timeline(
        index: u64,
        id: impl Into<String>,
        year: i32,
        citations_by_year: BTreeMap<i32, u64>,
    ) -> Self {
        Self {
            index,
            id: id.into(),
            year,
            citations: CitationData::Timeline(citations_by_year),
            num_references: 0,
            concepts: Vec::new(),
        }
    }

    pub fn references(mut self, num_references: u64) -> Self {
        self.num_references = num_references;
        self
    }

    pub fn concepts<I, S>(mut self, concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concepts = concepts.into_iter().map(Into::into).collect();
        self
    }

    pub fn total_citations(&self) -> u64 {
        self.citations.total()
    }

    pub fn citations_by_year(&self) -> Option<&BTreeMap<i32, u64>> {
        self.citations.timeline()
    }
}
