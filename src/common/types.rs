/// Statistics from reading the citation stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_read: usize,
    pub papers: usize,
    pub malformed_lines: usize,
    pub skipped_unknown_year: usize,
    pub skipped_unknown_identifier: usize,
    pub skipped_no_citation_data: usize,
    pub duplicate_papers: usize,
    /// Citing papers left out of derived timelines because their year is unknown
    pub citations_without_year: u64,
}

impl IngestStats {
    /// Well-formed lines that did not become a paper record
    pub fn skipped(&self) -> usize {
        self.skipped_unknown_year
            + self.skipped_unknown_identifier
            + self.skipped_no_citation_data
            + self.duplicate_papers
    }
}

/// Statistics from classification and aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub papers_analyzed: usize,
    /// (rule name, candidate count) in rule order
    pub per_rule: Vec<(String, usize)>,
    pub unique_candidates: usize,
    pub top_candidates: usize,
    /// Rows printed in the console top list
    pub displayed_candidates: usize,
    pub concepts_reported: usize,
}

/// Statistics from the analyze command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeStats {
    pub ingest: IngestStats,
    /// Records dropped by the estimator (too young or year out of range)
    pub papers_excluded: usize,
    pub classify: ClassifyStats,
}
