use std::path::Path;

use anyhow::{bail, Result};
use console::style;

use tidytweet_core::TweetAggregator;

use super::AggregateCommands;

pub fn run(command: &AggregateCommands) -> Result<()> {
    match command {
        AggregateCommands::Dates {
            input,
            output_dir,
            ranges,
            title,
        } => {
            let aggregator = load(input, output_dir)?;
            let written = aggregator.aggregate_by_daterange(ranges, title)?;
            report_written(&written);
        }
        AggregateCommands::Filter {
            input,
            output_dir,
            field,
        } => {
            let aggregator = load(input, output_dir)?;
            let written = aggregator.aggregate_by_filter(field)?;
            if written.is_empty() {
                eprintln!("No records have a value for '{field}'");
            }
            report_written(&written);
        }
        AggregateCommands::Multiple { input, output, min } => {
            let output_dir = output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let aggregator = load(input, output_dir)?;
            let kept = aggregator.aggregate_multiple_tweeters(output, *min)?;
            eprintln!(
                "{} Kept {} of {} tweets from users with at least {} -> {}",
                style("●").green(),
                kept,
                aggregator.records().len(),
                min,
                output.display()
            );
        }
        AggregateCommands::Tweeters {
            input,
            output_dir,
            suffix,
        } => {
            let aggregator = load(input, output_dir)?;
            let written = aggregator.aggregate_tweeters(suffix)?;
            report_written(&written);
        }
    }

    Ok(())
}

fn load(input: &Path, output_dir: &Path) -> Result<TweetAggregator> {
    if !input.is_file() {
        bail!("file not found: {}", input.display());
    }
    Ok(TweetAggregator::load(input, output_dir)?)
}

fn report_written(paths: &[std::path::PathBuf]) {
    for path in paths {
        eprintln!("Saved {}", path.display());
    }
    eprintln!("{} Aggregation complete: {} files", style("●").green(), paths.len());
}
