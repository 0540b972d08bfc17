pub mod aggregate;
pub mod collect;
pub mod normalize;
pub mod preprocess;
pub mod stoplist;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use tidytweet_core::{AccentMethod, DateRange, HashtagMode, PreprocessConfig};

#[derive(Parser)]
#[command(
    name = "tidytw",
    about = "Collect tweets and normalize their text for corpus analysis",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize text given as arguments (or stdin lines) and print the result
    Normalize {
        /// Text to normalize; reads stdin line by line when omitted
        text: Vec<String>,
        #[command(flatten)]
        options: NormalizeArgs,
    },
    /// Add a tidy_tweet field to every record of an NDJSON file
    Preprocess {
        /// Newline-delimited JSON input
        input: PathBuf,
        /// Output file (NDJSON)
        output: PathBuf,
        /// Record field holding the tweet text (default: text, then tweet)
        #[arg(long = "text-field", value_name = "FIELD")]
        text_field: Option<String>,
        /// Record bad lines and keep going instead of stopping at the first
        #[arg(long = "skip-invalid")]
        skip_invalid: bool,
        #[command(flatten)]
        options: NormalizeArgs,
    },
    /// Collect tweets from an exported archive into an NDJSON file
    Collect {
        /// Archive file (JSON array or NDJSON)
        archive: PathBuf,
        /// Output file (NDJSON)
        output: PathBuf,
        /// Only tweets by this user
        #[arg(long)]
        username: Option<String>,
        /// Only tweets containing every one of these terms
        #[arg(long)]
        search: Option<String>,
        /// Only tweets in this language
        #[arg(long)]
        lang: Option<String>,
        /// Only tweets on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Only tweets before this date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
        /// Maximum number of tweets
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Aggregate preprocessed tweets into manifests or slices
    Aggregate {
        #[command(subcommand)]
        command: AggregateCommands,
    },
    /// Print the effective stoplist, or check whether words are stopwords
    Stoplist {
        #[command(flatten)]
        stoplist: StoplistArgs,
        /// Word to check (repeatable)
        #[arg(long = "check", value_name = "WORD")]
        check: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum AggregateCommands {
    /// One manifest per date range (START:END, inclusive)
    Dates {
        input: PathBuf,
        output_dir: PathBuf,
        /// Date range, e.g. 2014-01-01:2014-12-31 (repeatable)
        #[arg(long = "range", value_name = "START:END", required = true)]
        ranges: Vec<DateRange>,
        /// Manifest title
        #[arg(long, default_value = "Twitter")]
        title: String,
    },
    /// One NDJSON file per distinct value of a field
    Filter {
        input: PathBuf,
        output_dir: PathBuf,
        /// Field to split on
        #[arg(long)]
        field: String,
    },
    /// Keep only tweets by users with at least --min tweets
    Multiple {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 2)]
        min: usize,
    },
    /// One manifest per user joining all of their tweets
    Tweeters {
        input: PathBuf,
        output_dir: PathBuf,
        /// Appended to each manifest name, e.g. _tweets_2014-2017
        #[arg(long, default_value = "")]
        suffix: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoplistArgs {
    /// Custom stoplist file; extends the bundled list
    #[arg(long = "stoplist", value_name = "FILE")]
    pub stoplist: Option<PathBuf>,
    /// Use the custom stoplist instead of the bundled one
    #[arg(long = "replace-stoplist")]
    pub replace_stoplist: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub stoplist: StoplistArgs,
    /// Hashtag handling: strip, keep or drop
    #[arg(long)]
    pub hashtags: Option<HashtagMode>,
    /// Accent folding: unicode, ascii or none
    #[arg(long)]
    pub accents: Option<AccentMethod>,
    /// Minimum token length in characters
    #[arg(long = "min-chars")]
    pub min_chars: Option<usize>,
    /// Leave HTML tags and entities in place
    #[arg(long = "keep-html")]
    pub keep_html: bool,
    /// Keep numeric tokens
    #[arg(long = "keep-numbers")]
    pub keep_numbers: bool,
    /// Keep month, weekday and time words
    #[arg(long = "keep-dates")]
    pub keep_dates: bool,
    /// Keep emoticons such as :) and <3
    #[arg(long = "keep-emoticons")]
    pub keep_emoticons: bool,
}

impl StoplistArgs {
    /// Environment configuration with these flags applied on top.
    pub fn config(&self) -> Result<PreprocessConfig> {
        let mut config = PreprocessConfig::from_env()?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut PreprocessConfig) {
        if let Some(path) = &self.stoplist {
            config.stoplist = Some(path.clone());
        }
        if self.replace_stoplist {
            config.replace_stoplist = true;
        }
    }
}

impl NormalizeArgs {
    pub fn config(&self) -> Result<PreprocessConfig> {
        let mut config = PreprocessConfig::from_env()?;
        self.stoplist.apply(&mut config);

        let options = &mut config.normalize;
        if let Some(hashtags) = self.hashtags {
            options.hashtags = hashtags;
        }
        if let Some(accents) = self.accents {
            options.accents = accents;
        }
        if let Some(min_chars) = self.min_chars {
            options.min_token_chars = min_chars;
        }
        options.strip_html &= !self.keep_html;
        options.drop_numbers &= !self.keep_numbers;
        options.drop_dates &= !self.keep_dates;
        options.drop_emoticons &= !self.keep_emoticons;

        Ok(config)
    }
}
