use anyhow::Result;
use clap::Parser;

use tidytweet::cli::{Cli, Commands};
use tidytweet_core::ScrapeQuery;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command)
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Normalize { text, options } => tidytweet::cli::normalize::run(&text, &options),
        Commands::Preprocess {
            input,
            output,
            text_field,
            skip_invalid,
            options,
        } => tidytweet::cli::preprocess::run(
            &input,
            &output,
            text_field.as_deref(),
            skip_invalid,
            &options,
        ),
        Commands::Collect {
            archive,
            output,
            username,
            search,
            lang,
            since,
            until,
            limit,
        } => {
            let query = ScrapeQuery {
                username,
                search,
                lang,
                since,
                until,
                limit,
            };
            tidytweet::cli::collect::run(&archive, &output, &query)
        }
        Commands::Aggregate { command } => tidytweet::cli::aggregate::run(&command),
        Commands::Stoplist { stoplist, check } => tidytweet::cli::stoplist::run(&stoplist, &check),
    }
}
