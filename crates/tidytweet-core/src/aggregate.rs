//! Aggregation of preprocessed tweets into corpus manifests.
//!
//! Input is the NDJSON written by the preprocessor. Date-range and per-author
//! aggregations join the `tidy_tweet` texts of a group into a single
//! manifest document; field filters split the records into one NDJSON file
//! per distinct value.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::{read_records, write_record, TweetRecord, TIDY_FIELD};
use crate::timer::Timer;

pub const NAMESPACE: &str = "we1sv2.0";
pub const CORPUS_METAPATH: &str = "Corpus,twitter";
pub const PROJECTS_METAPATH: &str = "Projects";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `<start>-<end>`, used for manifest and file names.
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl FromStr for DateRange {
    type Err = Error;

    /// Parses `START:END` or `START..END`.
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once("..")
            .or_else(|| s.split_once(':'))
            .ok_or_else(|| Error::InvalidOption {
                option: "date range",
                value: s.to_string(),
            })?;
        Self::new(parse_date(start)?, parse_date(end)?)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub namespace: String,
    pub metapath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub content: String,
}

impl Manifest {
    #[must_use]
    pub fn new(name: String, metapath: &str, content: String) -> Self {
        Self {
            name,
            namespace: NAMESPACE.to_string(),
            metapath: metapath.to_string(),
            title: None,
            date_range: None,
            content,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

pub struct TweetAggregator {
    records: Vec<TweetRecord>,
    output_dir: PathBuf,
}

impl TweetAggregator {
    /// Loads NDJSON records from `input` and makes sure `output_dir` exists.
    pub fn load(input: &Path, output_dir: &Path) -> Result<Self> {
        let timer = Timer::start();
        let records = read_records(BufReader::new(File::open(input)?))?;
        tracing::info!(
            input = %input.display(),
            records = records.len(),
            elapsed = %timer,
            "Records loaded"
        );
        Self::from_records(records, output_dir)
    }

    pub fn from_records(records: Vec<TweetRecord>, output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            records,
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn records(&self) -> &[TweetRecord] {
        &self.records
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes one manifest per date range joining the tidy texts of the
    /// tweets dated inside it.
    pub fn aggregate_by_daterange(&self, ranges: &[DateRange], title: &str) -> Result<Vec<PathBuf>> {
        let timer = Timer::start();
        let mut written = Vec::with_capacity(ranges.len());

        for range in ranges {
            let content = join_tidy(
                self.records
                    .iter()
                    .filter(|r| r.date().is_some_and(|d| range.contains(d))),
            );
            let label = range.label();
            let manifest = Manifest::new(format!("{label}_twitter_humanities"), CORPUS_METAPATH, content)
                .with_title(title)
                .with_date_range(*range);

            let path = self.output_dir.join(format!("{label}.json"));
            manifest.write_to(&path)?;
            tracing::info!("Saved {}", path.display());
            written.push(path);
        }

        tracing::info!(elapsed = %timer, "Aggregation complete");
        Ok(written)
    }

    /// Splits the records into `<value>.json` NDJSON files, one per distinct
    /// value of `field`, in sorted order.
    pub fn aggregate_by_filter(&self, field: &str) -> Result<Vec<PathBuf>> {
        let timer = Timer::start();
        let mut groups: BTreeMap<String, Vec<&TweetRecord>> = BTreeMap::new();

        for record in &self.records {
            match record.get_display(field) {
                Some(value) if !value.is_empty() => groups.entry(value).or_default().push(record),
                _ => tracing::debug!(field, "Record has no value for filter field"),
            }
        }

        let mut written = Vec::with_capacity(groups.len());
        for (value, records) in groups {
            let path = self.output_dir.join(format!("{}.json", file_stem(&value)));
            write_ndjson(&path, records)?;
            tracing::info!("Saved {}", path.display());
            written.push(path);
        }

        tracing::info!(elapsed = %timer, "Aggregation complete");
        Ok(written)
    }

    /// Records whose author has at least `minimum` tweets, in input order.
    pub fn multiple_tweeters(&self, minimum: usize) -> Vec<&TweetRecord> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for username in self.records.iter().filter_map(TweetRecord::username) {
            *counts.entry(username).or_default() += 1;
        }

        self.records
            .iter()
            .filter(|r| {
                r.username()
                    .is_some_and(|u| counts.get(u).copied().unwrap_or(0) >= minimum)
            })
            .collect()
    }

    /// Writes [`multiple_tweeters`](Self::multiple_tweeters) to `output` as
    /// NDJSON and returns how many records were kept.
    pub fn aggregate_multiple_tweeters(&self, output: &Path, minimum: usize) -> Result<usize> {
        let timer = Timer::start();
        let records = self.multiple_tweeters(minimum);
        let count = records.len();

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_ndjson(output, records)?;

        tracing::info!(kept = count, minimum, elapsed = %timer, "Aggregation complete");
        Ok(count)
    }

    /// Writes one manifest per author joining all of their tidy texts.
    pub fn aggregate_tweeters(&self, suffix: &str) -> Result<Vec<PathBuf>> {
        let timer = Timer::start();
        let mut groups: BTreeMap<&str, Vec<&TweetRecord>> = BTreeMap::new();
        for record in &self.records {
            if let Some(username) = record.username() {
                groups.entry(username).or_default().push(record);
            }
        }

        let mut written = Vec::with_capacity(groups.len());
        for (username, records) in groups {
            let manifest = Manifest::new(
                format!("{username}{suffix}"),
                PROJECTS_METAPATH,
                join_tidy(records.into_iter()),
            );
            let path = self
                .output_dir
                .join(format!("{}.json", file_stem(&manifest.name)));
            manifest.write_to(&path)?;
            written.push(path);
        }

        tracing::info!(authors = written.len(), elapsed = %timer, "Aggregation complete");
        Ok(written)
    }
}

fn join_tidy<'a>(records: impl Iterator<Item = &'a TweetRecord>) -> String {
    records
        .filter_map(|r| r.get_str(TIDY_FIELD))
        .filter(|tidy| !tidy.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_ndjson<'a>(path: &Path, records: impl IntoIterator<Item = &'a TweetRecord>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        write_record(&mut writer, record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Makes a field value safe to use as a file name.
fn file_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}
