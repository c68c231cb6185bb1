use anyhow::Result;
use clap::Parser;

use sleeping_beauty::cli::{Cli, Commands};
use sleeping_beauty::commands::{run_analyze, run_classify, run_presets};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => {
            run_analyze(args)?;
        }
        Commands::Classify(args) => {
            run_classify(args)?;
        }
        Commands::Presets(args) => {
            run_presets(args)?;
        }
    }

    Ok(())
}
