use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// On-disk format of the output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Output directory plus format; turns table stems into file paths
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(dir: P, format: OutputFormat) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self { dir, format })
    }

    /// "sb_candidates_sb_10" -> "<dir>/sb_candidates_sb_10.csv"
    pub fn path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", stem, self.format.extension()))
    }

    pub fn metrics(&self) -> PathBuf {
        self.path("all_papers_metrics")
    }

    pub fn rule_candidates(&self, rule_slug: &str) -> PathBuf {
        self.path(&format!("sb_candidates_{}", rule_slug))
    }

    pub fn unique_candidates(&self) -> PathBuf {
        self.path("sb_unique_candidates")
    }

    pub fn top_candidates(&self, k: usize) -> PathBuf {
        self.path(&format!("top_{}_sb_candidates", k))
    }

    pub fn concept_frequency(&self) -> PathBuf {
        self.path("sb_concept_frequency")
    }

    pub fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        write_table(df, path, self.format)
    }
}

/// Write a DataFrame as CSV or zstd-compressed Parquet
pub fn write_table(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    match format {
        OutputFormat::Csv => CsvWriter::new(file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))?,
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Zstd(None))
                .with_row_group_size(Some(250_000))
                .finish(df)
                .with_context(|| format!("Failed to write Parquet: {}", path.display()))?;
        }
    }

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
