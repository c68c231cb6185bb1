use anyhow::{anyhow, Context, Result};
use polars::prelude::*;

use crate::aggregate::UniqueCandidate;
use crate::classify::Candidate;
use crate::concepts::ConceptSummary;
use crate::ingest::cast_column;
use crate::model::{Estimation, MetricRecord};

/// Separator for the detection methods cell of the union table
pub const LIST_SEPARATOR: &str = ";";

/// Concepts are stored as a JSON array so any character survives a round trip
fn encode_concepts(concepts: &[String]) -> Result<String> {
    serde_json::to_string(concepts).context("Failed to encode concepts")
}

fn decode_concepts(cell: Option<&str>, row: usize) -> Result<Vec<String>> {
    match cell.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(s) => serde_json::from_str(s)
            .with_context(|| format!("Row {}: concepts cell is not a JSON array: {}", row, s)),
    }
}

fn metric_columns<'a, I>(metrics: I) -> Result<Vec<Column>>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let metrics: Vec<&MetricRecord> = metrics.into_iter().collect();

    let indices: Vec<u64> = metrics.iter().map(|m| m.index).collect();
    let ids: Vec<&str> = metrics.iter().map(|m| m.id.as_str()).collect();
    let years: Vec<i32> = metrics.iter().map(|m| m.year).collect();
    let ages: Vec<i32> = metrics.iter().map(|m| m.age).collect();
    let totals: Vec<u64> = metrics.iter().map(|m| m.total_citations).collect();
    let references: Vec<u64> = metrics.iter().map(|m| m.num_references).collect();
    let rates: Vec<f64> = metrics.iter().map(|m| m.citations_per_year).collect();
    let early: Vec<f64> = metrics.iter().map(|m| m.early_citations).collect();
    let late: Vec<f64> = metrics.iter().map(|m| m.late_citations).collect();
    let ratios: Vec<f64> = metrics.iter().map(|m| m.beauty_ratio).collect();
    let peak_years: Vec<Option<i32>> = metrics.iter().map(|m| m.peak_year).collect();
    let peak_citations: Vec<Option<u64>> = metrics.iter().map(|m| m.peak_citations).collect();
    let delays: Vec<Option<i32>> = metrics.iter().map(|m| m.delay_to_peak).collect();
    let coefficients: Vec<Option<f64>> = metrics.iter().map(|m| m.beauty_coefficient).collect();
    let estimations: Vec<&str> = metrics.iter().map(|m| m.estimation.as_str()).collect();
    let concepts: Vec<String> = metrics
        .iter()
        .map(|m| encode_concepts(&m.concepts))
        .collect::<Result<_>>()?;

    Ok(vec![
        Column::new("paper_idx".into(), indices),
        Column::new("id".into(), ids),
        Column::new("year".into(), years),
        Column::new("age".into(), ages),
        Column::new("total_citations".into(), totals),
        Column::new("num_references".into(), references),
        Column::new("citations_per_year".into(), rates),
        Column::new("early_citations".into(), early),
        Column::new("late_citations".into(), late),
        Column::new("beauty_ratio".into(), ratios),
        Column::new("peak_year".into(), peak_years),
        Column::new("peak_citations".into(), peak_citations),
        Column::new("delay_to_peak".into(), delays),
        Column::new("beauty_coefficient".into(), coefficients),
        Column::new("estimation".into(), estimations),
        Column::new("concepts".into(), concepts),
    ])
}

pub fn metrics_to_dataframe(metrics: &[MetricRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(metric_columns(metrics)?)?)
}

/// One rule's candidates in ranked order, with `method`, `score` and 1-based `rank`
pub fn candidates_to_dataframe(candidates: &[Candidate<'_>]) -> Result<DataFrame> {
    let mut columns = metric_columns(candidates.iter().map(|c| c.metric))?;

    let methods: Vec<&str> = candidates.iter().map(|c| c.method).collect();
    let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
    let ranks: Vec<u32> = (1..=candidates.len() as u32).collect();

    columns.push(Column::new("method".into(), methods));
    columns.push(Column::new("score".into(), scores));
    columns.push(Column::new("rank".into(), ranks));

    Ok(DataFrame::new(columns)?)
}

/// Deduplicated candidates with every rule that flagged them
pub fn union_to_dataframe(candidates: &[UniqueCandidate<'_>]) -> Result<DataFrame> {
    let mut columns = metric_columns(candidates.iter().map(|c| c.metric))?;

    let methods: Vec<String> = candidates
        .iter()
        .map(|c| c.methods.join(LIST_SEPARATOR))
        .collect();
    let counts: Vec<u32> = candidates.iter().map(|c| c.methods.len() as u32).collect();

    columns.push(Column::new("methods".into(), methods));
    columns.push(Column::new("num_methods".into(), counts));

    Ok(DataFrame::new(columns)?)
}

pub fn concepts_to_dataframe(summary: &ConceptSummary) -> Result<DataFrame> {
    let total = summary.total_sb_papers.max(1) as f64;

    let names: Vec<&str> = summary
        .concept_frequency
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    let counts: Vec<u64> = summary
        .concept_frequency
        .iter()
        .map(|(_, count)| *count as u64)
        .collect();
    let shares: Vec<f64> = counts.iter().map(|&count| count as f64 / total).collect();

    Ok(DataFrame::new(vec![
        Column::new("concept".into(), names),
        Column::new("count".into(), counts),
        Column::new("share".into(), shares),
    ])?)
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| anyhow!("Row {}: missing value in column '{}'", row, column))
}

fn int_values<T>(df: &DataFrame, name: &str) -> Result<Vec<Option<T>>>
where
    T: TryFrom<i64>,
{
    let column = cast_column(df, name, &DataType::Int64)?;
    column
        .i64()?
        .into_iter()
        .map(|v| {
            v.map(|v| {
                T::try_from(v).map_err(|_| anyhow!("Column '{}': value {} out of range", name, v))
            })
            .transpose()
        })
        .collect()
}

/// Float columns written as CSV carry `inf`; parse strings with Rust's float
/// grammar instead of relying on a polars cast.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Missing column '{}'", name))?;

    if column.dtype() == &DataType::String {
        return column
            .str()?
            .into_iter()
            .map(|v| match v.map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => s
                    .parse::<f64>()
                    .map(Some)
                    .with_context(|| format!("Column '{}': '{}' is not a number", name, s)),
            })
            .collect();
    }

    Ok(cast_column(df, name, &DataType::Float64)?
        .f64()?
        .into_iter()
        .collect())
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = cast_column(df, name, &DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Rebuild metric records from a previously written metrics table
pub fn metrics_from_dataframe(df: &DataFrame) -> Result<Vec<MetricRecord>> {
    let indices = int_values::<u64>(df, "paper_idx")?;
    let ids = string_values(df, "id")?;
    let years = int_values::<i32>(df, "year")?;
    let ages = int_values::<i32>(df, "age")?;
    let totals = int_values::<u64>(df, "total_citations")?;
    let references = int_values::<u64>(df, "num_references")?;
    let rates = float_values(df, "citations_per_year")?;
    let early = float_values(df, "early_citations")?;
    let late = float_values(df, "late_citations")?;
    let ratios = float_values(df, "beauty_ratio")?;
    let peak_years = int_values::<i32>(df, "peak_year")?;
    let peak_citations = int_values::<u64>(df, "peak_citations")?;
    let delays = int_values::<i32>(df, "delay_to_peak")?;
    let coefficients = float_values(df, "beauty_coefficient")?;
    let estimations = string_values(df, "estimation")?;
    let concepts = string_values(df, "concepts")?;

    let mut metrics = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let estimation = required(estimations[row].as_deref(), "estimation", row)?;
        let estimation = Estimation::parse(estimation)
            .ok_or_else(|| anyhow!("Row {}: unknown estimation '{}'", row, estimation))?;

        metrics.push(MetricRecord {
            index: required(indices[row], "paper_idx", row)?,
            id: required(ids[row].clone(), "id", row)?,
            year: required(years[row], "year", row)?,
            age: required(ages[row], "age", row)?,
            total_citations: required(totals[row], "total_citations", row)?,
            num_references: references[row].unwrap_or(0),
            citations_per_year: required(rates[row], "citations_per_year", row)?,
            early_citations: required(early[row], "early_citations", row)?,
            late_citations: required(late[row], "late_citations", row)?,
            beauty_ratio: required(ratios[row], "beauty_ratio", row)?,
            peak_year: peak_years[row],
            peak_citations: peak_citations[row],
            delay_to_peak: delays[row],
            beauty_coefficient: coefficients[row],
            estimation,
            concepts: decode_concepts(concepts[row].as_deref(), row)?,
        });
    }

    Ok(metrics)
}
