use anyhow::Result;
use log::{info, warn};
use std::path::Path;
use std::time::Instant;

use crate::aggregate::{top_k, CandidateUnion};
use crate::classify::{classify_all, Candidate};
use crate::cli::ClassifyArgs;
use crate::common::{
    create_count_progress_bar, format_elapsed, setup_logging, slugify, ClassifyStats, OutputLayout,
};
use crate::concepts::analyze_concepts;
use crate::config::{AnalysisConfig, Mode};
use crate::ingest::read_table;
use crate::model::MetricRecord;
use crate::report::{
    candidates_to_dataframe, concepts_to_dataframe, metrics_from_dataframe, union_to_dataframe,
};

/// Configuration from `--config` if given, else the presets of `mode`
pub fn resolve_config(mode: Mode, config_path: Option<&str>) -> Result<AnalysisConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            let config = AnalysisConfig::load(Path::new(path))?;
            if config.mode != mode {
                info!("Configuration file selects {} mode", config.mode);
            }
            Ok(config)
        }
        None => Ok(AnalysisConfig::for_mode(mode)),
    }
}

fn log_candidates(title: &str, candidates: &[Candidate<'_>]) {
    info!("{}", title);
    for (rank, c) in candidates.iter().enumerate() {
        let m = c.metric;
        info!(
            "  {:>3}. {:<20} year={} citations={} early={:.1} late={:.1} ratio={:.2} score={:.2}",
            rank + 1,
            m.id,
            m.year,
            m.total_citations,
            m.early_citations,
            m.late_citations,
            m.beauty_ratio,
            c.score
        );
    }
}

/// Evaluate every configured rule, then write per-rule, union, top-K and concept tables
pub fn classify_and_report(
    metrics: &[MetricRecord],
    config: &AnalysisConfig,
    layout: &OutputLayout,
) -> Result<ClassifyStats> {
    info!(
        "Classifying {} papers with {} rules ({} mode)",
        metrics.len(),
        config.rules.len(),
        config.mode
    );

    let outcomes = classify_all(&config.rules, metrics);

    let progress = create_count_progress_bar(outcomes.len() as u64, "rules");
    progress.set_message("Writing rule tables");
    for outcome in &outcomes {
        info!(
            "  {} ({}): {} candidates",
            outcome.name(),
            outcome.rule.criterion.kind(),
            outcome.len()
        );
        let mut df = candidates_to_dataframe(&outcome.candidates)?;
        layout.write(&mut df, &layout.rule_candidates(&slugify(outcome.name())))?;
        progress.inc(1);
    }
    progress.finish_with_message("Rule tables written");

    let union = CandidateUnion::from_outcomes(&outcomes);
    info!("Unique candidates across all rules: {}", union.len());
    let mut df = union_to_dataframe(&union.candidates)?;
    layout.write(&mut df, &layout.unique_candidates())?;

    let top = top_k(&outcomes, &config.top_k_rule, config.top_k).unwrap_or(&[]);
    let mut df = candidates_to_dataframe(top)?;
    layout.write(&mut df, &layout.top_candidates(config.top_k))?;

    let summary = analyze_concepts(union.metrics(), config.concept_top_n);
    if summary.concept_frequency.is_empty() {
        info!("No concepts among candidates; skipping concept frequency table");
    } else {
        let mut df = concepts_to_dataframe(&summary)?;
        layout.write(&mut df, &layout.concept_frequency())?;
    }

    // console list is independent of the persisted top-K size
    let shown = top_k(&outcomes, &config.top_k_rule, config.display_top).unwrap_or(&[]);

    if union.is_empty() {
        warn!("No Sleeping Beauty candidates found");
    } else {
        log_candidates(
            &format!("Top {} candidates by {}:", shown.len(), config.top_k_rule),
            shown,
        );
        if !summary.concept_frequency.is_empty() {
            info!("Most frequent concepts among {} candidates:", summary.total_sb_papers);
            for (concept, count) in &summary.concept_frequency {
                info!("  {:<40} {}", concept, count);
            }
        }
    }

    Ok(ClassifyStats {
        papers_analyzed: metrics.len(),
        per_rule: union
            .per_rule
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect(),
        unique_candidates: union.len(),
        top_candidates: top.len(),
        displayed_candidates: shown.len(),
        concepts_reported: summary.concept_frequency.len(),
    })
}

pub fn run_classify(args: ClassifyArgs) -> Result<ClassifyStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting Sleeping Beauty classification");
    info!("Metrics: {}", args.metrics);
    info!("Output directory: {}", args.output_dir);

    let mut config = resolve_config(args.mode, args.config.as_deref())?;
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    config.validate()?;

    let df = read_table(Path::new(&args.metrics))?;
    let metrics = metrics_from_dataframe(&df)?;
    info!("Loaded {} metric records", metrics.len());

    let layout = OutputLayout::new(&args.output_dir, args.format)?;
    let stats = classify_and_report(&metrics, &config, &layout)?;

    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Papers classified: {}", stats.papers_analyzed);
    for (rule, count) in &stats.per_rule {
        info!("  {}: {}", rule, count);
    }
    info!("Unique candidates: {}", stats.unique_candidates);
    info!("Top-{} table rows: {}", config.top_k, stats.top_candidates);
    info!("Output directory: {}", layout.dir.display());
    info!("========================================================");

    Ok(stats)
}
