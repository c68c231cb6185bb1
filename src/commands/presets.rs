use anyhow::{anyhow, Result};
use log::info;
use std::path::Path;

use crate::cli::PresetsArgs;
use crate::common::setup_logging;
use crate::classify::preset;
use crate::config::AnalysisConfig;

/// Print or save the default configuration of a mode, optionally narrowed to one rule
pub fn run_presets(args: PresetsArgs) -> Result<AnalysisConfig> {
    setup_logging(&args.log_level)?;

    let mut config = AnalysisConfig::for_mode(args.mode);
    if let Some(ref name) = args.rule {
        let rule = preset(name, args.mode).ok_or_else(|| {
            anyhow!(
                "No preset rule '{}' in {} mode (available: {})",
                name,
                args.mode,
                config
                    .rules
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?;
        config.top_k_rule = rule.name.clone();
        config.rules = vec![rule];
    }
    config.validate()?;

    match args.output {
        Some(ref output) => {
            config.save(Path::new(output))?;
            info!(
                "Wrote {} mode configuration ({} rules) to {}",
                config.mode,
                config.rules.len(),
                output
            );
        }
        None => println!("{}", config.to_json()?),
    }

    Ok(config)
}
