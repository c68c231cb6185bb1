use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::classify::{aggregate_presets, timeline_presets, Rule};
use crate::common::slugify;

/// Data fidelity the analysis runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Total citation counts only; early/late volumes estimated from a uniform rate
    #[default]
    Aggregate,
    /// Year-by-year citation histograms
    Timeline,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Aggregate => "aggregate",
            Mode::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const DEFAULT_CURRENT_YEAR: i32 = 2025;
pub const DEFAULT_EARLY_YEARS: i32 = 3;
pub const DEFAULT_MIN_AGE: i32 = 5;
pub const DEFAULT_MIN_VALID_YEAR: i32 = 1991;

/// Inclusive range of usable publication years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min_valid_year: i32,
    pub current_year: i32,
}

impl YearRange {
    pub fn new(min_valid_year: i32, current_year: i32) -> Self {
        Self {
            min_valid_year,
            current_year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min_valid_year && year <= self.current_year
    }
}

/// Thresholds, windows and rule sets for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub mode: Mode,
    /// Year the snapshot is analysed in
    pub current_year: i32,
    /// Length of the early window after publication
    pub early_years: i32,
    /// Papers younger than this are dropped
    pub min_age: i32,
    /// Publication years before this are treated as unknown
    pub min_valid_year: i32,
    /// Rule whose ranking feeds the top-K table
    pub top_k_rule: String,
    pub top_k: usize,
    /// Candidates printed in the final summary
    pub display_top: usize,
    pub concept_top_n: usize,
    pub rules: Vec<Rule>,
}

impl AnalysisConfig {
    pub fn for_mode(mode: Mode) -> Self {
        let rules = match mode {
            Mode::Aggregate => aggregate_presets(),
            Mode::Timeline => timeline_presets(),
        };
        Self {
            mode,
            current_year: DEFAULT_CURRENT_YEAR,
            early_years: DEFAULT_EARLY_YEARS,
            min_age: DEFAULT_MIN_AGE,
            min_valid_year: DEFAULT_MIN_VALID_YEAR,
            top_k_rule: "SB-ratio".to_string(),
            top_k: 100,
            display_top: 30,
            concept_top_n: 20,
            rules,
        }
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write config to {:?}", path))?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn valid_years(&self) -> YearRange {
        YearRange::new(self.min_valid_year, self.current_year)
    }


    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            anyhow::bail!("Configuration has no rules");
        }
        let mut seen = HashSet::new();
        let mut slugs: HashMap<String, &str> = HashMap::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                anyhow::bail!("Duplicate rule name: {}", rule.name);
            }
            if let Some(other) = slugs.insert(slugify(&rule.name), rule.name.as_str()) {
                anyhow::bail!(
                    "Rules '{}' and '{}' would write the same output file (sb_candidates_{})",
                    other,
                    rule.name,
                    slugify(&rule.name)
                );
            }
        }
        if self.rule(&self.top_k_rule).is_none() {
            anyhow::bail!(
                "Top-K rule '{}' is not one of the configured rules ({})",
                self.top_k_rule,
                self.rules
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if self.early_years < 0 {
            anyhow::bail!("early_years must be non-negative, got {}", self.early_years);
        }
        if self.min_valid_year > self.current_year {
            anyhow::bail!(
                "min_valid_year ({}) is after current_year ({})",
                self.min_valid_year,
                self.current_year
            );
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::for_mode(Mode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_validate() {
        AnalysisConfig::for_mode(Mode::Aggregate).validate().unwrap();
        AnalysisConfig::for_mode(Mode::Timeline).validate().unwrap();
    }

    #[test]
    fn test_save_load_keeps_rules() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let mut config = AnalysisConfig::for_mode(Mode::Timeline);
        config.current_year = 2030;
        config.save(&path).unwrap();

        let loaded = AnalysisConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_top_k_rule_rejected() {
        let mut config = AnalysisConfig::default();
        config.top_k_rule = "SB-99".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SB-99"));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut config = AnalysisConfig::default();
        let first = config.rules[0].clone();
        config.rules.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_colliding_rule_file_names_rejected() {
        let mut config = AnalysisConfig::default();
        let mut twin = config.rules[0].clone();
        twin.name = "SB 10".to_string();
        config.rules.push(twin);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("sb_candidates_sb_10"));
    }

    #[test]
    fn test_valid_year_range() {
        let config = AnalysisConfig::default();
        assert!(config.valid_years().contains(1991));
        assert!(config.valid_years().contains(2025));
        assert!(!config.valid_years().contains(1990));
        assert!(!config.valid_years().contains(2026));
        assert!(!config.valid_years().contains(0));
    }
}
