use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use super::{IdentifierMap, YearLookup};
use crate::common::{create_spinner, format_elapsed, IngestStats};
use crate::config::{AnalysisConfig, Mode, YearRange};
use crate::model::{CitationData, PaperRecord};

/// One line of the citation stream. Everything but the paper index is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitationEntry {
    pub paper_idx: u64,
    /// Indices of citing papers
    #[serde(default)]
    pub citations: Option<Vec<u64>>,
    #[serde(default)]
    pub citation_count: Option<u64>,
    #[serde(default)]
    pub citations_by_year: Option<BTreeMap<i32, u64>>,
    /// Indices of cited papers
    #[serde(default)]
    pub references: Option<Vec<u64>>,
    #[serde(default)]
    pub num_references: Option<u64>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// Why a citation entry did not become a paper record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownYear,
    UnknownIdentifier,
    NoCitationData,
}

/// Turns citation entries into paper records using the year and identifier lookups
pub struct PaperBuilder<'a> {
    years: &'a YearLookup,
    ids: Option<&'a IdentifierMap>,
    mode: Mode,
    valid_years: YearRange,
}

/// A built record plus the number of citing papers dropped for lack of a year
pub type Built = (PaperRecord, u64);

impl<'a> PaperBuilder<'a> {
    pub fn new(years: &'a YearLookup, ids: Option<&'a IdentifierMap>, config: &AnalysisConfig) -> Self {
        Self {
            years,
            ids,
            mode: config.mode,
            valid_years: config.valid_years(),
        }
    }

    fn valid_year(&self, index: u64) -> Option<i32> {
        self.years
            .get(index)
            .filter(|&y| self.valid_years.contains(y))
    }

    fn identifier(&self, index: u64) -> Option<String> {
        match self.ids {
            Some(map) => map.get(index).map(str::to_string),
            None => Some(format!("{:06}", index)),
        }
    }

    pub fn build(&self, entry: CitationEntry) -> std::result::Result<Built, SkipReason> {
        let year = self.valid_year(entry.paper_idx).ok_or(SkipReason::UnknownYear)?;
        let id = self
            .identifier(entry.paper_idx)
            .ok_or(SkipReason::UnknownIdentifier)?;

        let num_references = entry
            .num_references
            .or_else(|| entry.references.as_ref().map(|r| r.len() as u64))
            .unwrap_or(0);

        let (citations, dropped) = match self.mode {
            Mode::Aggregate => (self.aggregate_count(&entry)?, 0),
            Mode::Timeline => self.timeline(&entry)?,
        };

        let paper = PaperRecord {
            index: entry.paper_idx,
            id,
            year,
            citations,
            num_references,
            concepts: entry.concepts,
        };
        Ok((paper, dropped))
    }

    fn aggregate_count(&self, entry: &CitationEntry) -> std::result::Result<CitationData, SkipReason> {
        let total = entry
            .citations
            .as_ref()
            .map(|c| c.len() as u64)
            .or(entry.citation_count)
            .or_else(|| entry.citations_by_year.as_ref().map(|t| t.values().sum()))
            .ok_or(SkipReason::NoCitationData)?;
        Ok(CitationData::Count(total))
    }

    fn timeline(&self, entry: &CitationEntry) -> std::result::Result<(CitationData, u64), SkipReason> {
        if let Some(by_year) = &entry.citations_by_year {
            return Ok((CitationData::Timeline(by_year.clone()), 0));
        }

        if let Some(citing) = &entry.citations {
            let mut by_year = BTreeMap::new();
            let mut dropped = 0;
            for &citing_idx in citing {
                match self.valid_year(citing_idx) {
                    Some(y) => *by_year.entry(y).or_insert(0) += 1,
                    None => dropped += 1,
                }
            }
            return Ok((CitationData::Timeline(by_year), dropped));
        }

        // Only a count: the estimator falls back to a uniform rate
        entry
            .citation_count
            .map(|n| (CitationData::Count(n), 0))
            .ok_or(SkipReason::NoCitationData)
    }
}

enum LineOutcome {
    Blank,
    Malformed,
    Skipped(SkipReason),
    Paper(Built),
}

/// Lines are raw bytes; invalid UTF-8 fails JSON decoding and counts as malformed
fn parse_line(line: &[u8], builder: &PaperBuilder) -> LineOutcome {
    if line.iter().all(u8::is_ascii_whitespace) {
        return LineOutcome::Blank;
    }
    match serde_json::from_slice::<CitationEntry>(line) {
        Ok(entry) => match builder.build(entry) {
            Ok(built) => LineOutcome::Paper(built),
            Err(reason) => LineOutcome::Skipped(reason),
        },
        Err(_) => LineOutcome::Malformed,
    }
}

/// Open a JSON lines file, decompressing when it ends in `.gz`
pub fn open_lines(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let is_gz = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Accumulates outcomes into records and statistics; the first line for a paper wins
struct Collector {
    papers: Vec<PaperRecord>,
    seen: HashSet<u64>,
    stats: IngestStats,
}

impl Collector {
    fn new() -> Self {
        Self {
            papers: Vec::new(),
            seen: HashSet::new(),
            stats: IngestStats::default(),
        }
    }

    fn add(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Blank => {}
            LineOutcome::Malformed => self.stats.malformed_lines += 1,
            LineOutcome::Skipped(SkipReason::UnknownYear) => self.stats.skipped_unknown_year += 1,
            LineOutcome::Skipped(SkipReason::UnknownIdentifier) => {
                self.stats.skipped_unknown_identifier += 1
            }
            LineOutcome::Skipped(SkipReason::NoCitationData) => {
                self.stats.skipped_no_citation_data += 1
            }
            LineOutcome::Paper((paper, dropped)) => {
                if self.seen.insert(paper.index) {
                    self.stats.citations_without_year += dropped;
                    self.papers.push(paper);
                } else {
                    self.stats.duplicate_papers += 1;
                }
            }
        }
    }
}

/// Stream citation entries in batches, parsing each batch in parallel and
/// keeping only the built paper records.
pub fn read_citations<R: BufRead>(
    mut reader: R,
    builder: &PaperBuilder,
    batch_size: usize,
) -> Result<(Vec<PaperRecord>, IngestStats)> {
    let batch_size = batch_size.max(1);
    let mut collector = Collector::new();
    let mut batch: Vec<Vec<u8>> = Vec::with_capacity(batch_size);
    let progress = create_spinner("Processing citation records...");

    let flush = |batch: &mut Vec<Vec<u8>>, collector: &mut Collector| {
        let outcomes: Vec<LineOutcome> = batch.par_iter().map(|l| parse_line(l, builder)).collect();
        for outcome in outcomes {
            collector.add(outcome);
        }
        batch.clear();
        progress.set_message(format!(
            "Processed {} lines | {} papers",
            collector.stats.lines_read,
            collector.papers.len()
        ));
    };

    loop {
        let mut line = Vec::new();
        let read = reader
            .read_until(b'\n', &mut line)
            .context("Failed to read line")?;
        if read == 0 {
            break;
        }
        collector.stats.lines_read += 1;
        batch.push(line);

        if batch.len() >= batch_size {
            flush(&mut batch, &mut collector);
            debug!("Processed {} lines", collector.stats.lines_read);
        }
    }
    if !batch.is_empty() {
        flush(&mut batch, &mut collector);
    }

    progress.finish_with_message("Citation records processed");

    collector.stats.papers = collector.papers.len();
    Ok((collector.papers, collector.stats))
}

/// Load paper records from a (possibly gzipped) JSON lines citation file
pub fn load_citations(
    path: &Path,
    builder: &PaperBuilder,
    batch_size: usize,
) -> Result<(Vec<PaperRecord>, IngestStats)> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", path.display()));
    }

    info!("Loading citation data from: {}", path.display());
    let start = Instant::now();

    let reader = open_lines(path)?;
    let (papers, stats) = read_citations(reader, builder, batch_size)?;

    info!(
        "Built {} paper records from {} lines in {}",
        stats.papers,
        stats.lines_read,
        format_elapsed(start.elapsed())
    );
    if stats.malformed_lines > 0 {
        warn!("  ({} lines failed to parse and were skipped)", stats.malformed_lines);
    }
    if stats.skipped() > 0 {
        info!(
            "  Skipped: {} unknown year, {} unknown identifier, {} without citation data, {} duplicates",
            stats.skipped_unknown_year,
            stats.skipped_unknown_identifier,
            stats.skipped_no_citation_data,
            stats.duplicate_papers
        );
    }
    if stats.citations_without_year > 0 {
        info!(
            "  {} citing papers had no usable year and were left out of timelines",
            stats.citations_without_year
        );
    }

    Ok((papers, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    fn years() -> YearLookup {
        // 0: 2000, 1: 2005, 2: 2010, 3: unknown, 4: 2024, 5: 1980 (out of range)
        YearLookup::from_years(vec![
            Some(2000),
            Some(2005),
            Some(2010),
            None,
            Some(2024),
            Some(1980),
        ])
    }

    fn config(mode: Mode) -> AnalysisConfig {
        AnalysisConfig::for_mode(mode)
    }

    #[test]
    fn test_aggregate_counts_citation_list() {
        let years = years();
        let config = config(Mode::Aggregate);
        let builder = PaperBuilder::new(&years, None, &config);

        let entry: CitationEntry = serde_json::from_str(
            r#"{"paper_idx": 0, "citations": [1, 2, 4], "references": [7, 8]}"#,
        )
        .unwrap();
        let (paper, dropped) = builder.build(entry).unwrap();

        assert_eq!(paper.id, "000000");
        assert_eq!(paper.year, 2000);
        assert_eq!(paper.citations, CitationData::Count(3));
        assert_eq!(paper.num_references, 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_timeline_derived_from_citing_years() {
        let years = years();
        let config = config(Mode::Timeline);
        let builder = PaperBuilder::new(&years, None, &config);

        let entry: CitationEntry =
            serde_json::from_str(r#"{"paper_idx": 0, "citations": [1, 2, 2, 3, 5]}"#).unwrap();
        let (paper, dropped) = builder.build(entry).unwrap();

        let expected = BTreeMap::from([(2005, 1), (2010, 2)]);
        assert_eq!(paper.citations_by_year(), Some(&expected));
        assert_eq!(paper.total_citations(), 3);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn test_explicit_histogram_preferred() {
        let years = years();
        let config = config(Mode::Timeline);
        let builder = PaperBuilder::new(&years, None, &config);

        let entry: CitationEntry = serde_json::from_str(
            r#"{"paper_idx": 0, "citations": [1], "citations_by_year": {"2000": 1, "2010": 50}}"#,
        )
        .unwrap();
        let (paper, _) = builder.build(entry).unwrap();
        assert_eq!(paper.total_citations(), 51);
    }

    #[test]
    fn test_timeline_count_only_falls_back() {
        let years = years();
        let config = config(Mode::Timeline);
        let builder = PaperBuilder::new(&years, None, &config);

        let entry: CitationEntry =
            serde_json::from_str(r#"{"paper_idx": 1, "citation_count": 9}"#).unwrap();
        let (paper, _) = builder.build(entry).unwrap();
        assert_eq!(paper.citations, CitationData::Count(9));
    }

    #[test]
    fn test_skip_reasons() {
        let years = years();
        let config = config(Mode::Aggregate);
        let ids = IdentifierMap::from_pairs([(0, "astro-ph/0001001")]);
        let builder = PaperBuilder::new(&years, Some(&ids), &config);

        let build = |json: &str| builder.build(serde_json::from_str(json).unwrap());

        assert_eq!(
            build(r#"{"paper_idx": 3, "citations": []}"#).unwrap_err(),
            SkipReason::UnknownYear
        );
        assert_eq!(
            build(r#"{"paper_idx": 5, "citations": []}"#).unwrap_err(),
            SkipReason::UnknownYear
        );
        assert_eq!(
            build(r#"{"paper_idx": 99, "citations": []}"#).unwrap_err(),
            SkipReason::UnknownYear
        );
        assert_eq!(
            build(r#"{"paper_idx": 1, "citations": []}"#).unwrap_err(),
            SkipReason::UnknownIdentifier
        );
        assert_eq!(
            build(r#"{"paper_idx": 0}"#).unwrap_err(),
            SkipReason::NoCitationData
        );
        assert_eq!(
            build(r#"{"paper_idx": 0, "citations": []}"#).unwrap().0.id,
            "astro-ph/0001001"
        );
    }

    #[test]
    fn test_read_citations_counts_malformed_and_duplicates() {
        let years = years();
        let config = config(Mode::Aggregate);
        let builder = PaperBuilder::new(&years, None, &config);

        let input = [
            r#"{"paper_idx": 0, "citations": [1, 2]}"#,
            "",
            "not json",
            r#"{"paper_idx": 1, "citation_count": 4, "num_references": 12}"#,
            r#"{"paper_idx": 0, "citations": [1, 2, 4]}"#,
            r#"{"paper_idx": 3, "citations": [1]}"#,
        ]
        .join("\n");

        let (papers, stats) = read_citations(Cursor::new(input), &builder, 2).unwrap();

        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].citations, CitationData::Count(2));
        assert_eq!(papers[1].num_references, 12);
        assert_eq!(stats.lines_read, 6);
        assert_eq!(stats.papers, 2);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.duplicate_papers, 1);
        assert_eq!(stats.skipped_unknown_year, 1);
    }

    #[test]
    fn test_undecodable_line_counts_as_malformed() {
        let years = years();
        let config = config(Mode::Aggregate);
        let builder = PaperBuilder::new(&years, None, &config);

        let mut input = Vec::new();
        input.extend_from_slice(br#"{"paper_idx": 0, "citations": [1, 2]}"#);
        input.push(b'\n');
        input.extend_from_slice(&[0xff, 0xfe, b'{']);
        input.push(b'\n');
        input.extend_from_slice(br#"{"paper_idx": 1, "citation_count": 4}"#);
        input.extend_from_slice(b"\r\n");

        let (papers, stats) = read_citations(Cursor::new(input), &builder, 1).unwrap();

        assert_eq!(papers.len(), 2);
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.malformed_lines, 1);
    }

    #[test]
    fn test_load_gzipped_citations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("citations_indexed.jsonl.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, r#"{{"paper_idx": 0, "citations": [1, 2]}}"#).unwrap();
        writeln!(encoder, r#"{{"paper_idx": 2, "citations": []}}"#).unwrap();
        encoder.finish().unwrap();

        let years = years();
        let config = config(Mode::Aggregate);
        let builder = PaperBuilder::new(&years, None, &config);
        let (papers, stats) = load_citations(&path, &builder, 1000).unwrap();

        assert_eq!(papers.len(), 2);
        assert_eq!(stats.lines_read, 2);
    }
}
