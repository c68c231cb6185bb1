use anyhow::Result;
use log::{error, info};
use std::path::Path;
use std::time::Instant;

use crate::cli::AnalyzeArgs;
use crate::commands::classify::{classify_and_report, resolve_config};
use crate::common::{format_elapsed, setup_logging, AnalyzeStats, OutputLayout};
use crate::config::AnalysisConfig;
use crate::estimate::Estimator;
use crate::ingest::{load_citations, IdentifierMap, PaperBuilder, YearLookup};
use crate::report::metrics_to_dataframe;

fn apply_overrides(config: &mut AnalysisConfig, args: &AnalyzeArgs) {
    if let Some(year) = args.current_year {
        config.current_year = year;
    }
    if let Some(years) = args.early_years {
        config.early_years = years;
    }
    if let Some(age) = args.min_age {
        config.min_age = age;
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<AnalyzeStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting Sleeping Beauty analysis");
    info!("Years: {}", args.years);
    info!("Citations: {}", args.citations);
    if let Some(ref mapping) = args.index_mapping {
        info!("Index mapping: {}", mapping);
    }
    info!("Output directory: {}", args.output_dir);

    let num_threads = if args.threads == 0 {
        let cores = num_cpus::get();
        info!("Auto-detected {} CPU cores. Using {} threads.", cores, cores);
        cores
    } else {
        info!("Using specified {} threads.", args.threads);
        args.threads
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        error!("Failed to build thread pool: {}. Using default.", e);
    }

    let mut config = resolve_config(args.mode, args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;
    info!(
        "Mode: {}, current year: {}, early window: {} years, minimum age: {}",
        config.mode, config.current_year, config.early_years, config.min_age
    );

    let years = YearLookup::load(Path::new(&args.years))?;
    let ids = args
        .index_mapping
        .as_deref()
        .map(|path| IdentifierMap::load(Path::new(path)))
        .transpose()?;

    let builder = PaperBuilder::new(&years, ids.as_ref(), &config);
    let (papers, ingest) = load_citations(Path::new(&args.citations), &builder, args.batch_size)?;

    info!("Computing metrics...");
    let estimator = Estimator::from_config(&config);
    let metrics = estimator.estimate_all(&papers);
    let papers_excluded = papers.len() - metrics.len();
    info!(
        "Metrics computed for {} papers ({} excluded by age or year range)",
        metrics.len(),
        papers_excluded
    );

    let layout = OutputLayout::new(&args.output_dir, args.format)?;
    let mut df = metrics_to_dataframe(&metrics)?;
    layout.write(&mut df, &layout.metrics())?;
    info!("Metrics written to {}", layout.metrics().display());

    let classify = classify_and_report(&metrics, &config, &layout)?;

    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Citation lines read: {}", ingest.lines_read);
    info!("Paper records built: {}", ingest.papers);
    info!("Lines skipped: {}", ingest.skipped() + ingest.malformed_lines);
    info!("Papers analyzed: {}", classify.papers_analyzed);
    for (rule, count) in &classify.per_rule {
        info!("  {}: {}", rule, count);
    }
    info!("Unique candidates: {}", classify.unique_candidates);
    info!("Top-{} table rows: {}", config.top_k, classify.top_candidates);
    info!("Output directory: {}", layout.dir.display());
    info!("========================================================");

    Ok(AnalyzeStats {
        ingest,
        papers_excluded,
        classify,
    })
}
