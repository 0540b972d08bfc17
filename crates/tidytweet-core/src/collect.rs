//! The tweet collection boundary.
//!
//! Collection is delegated to a [`TweetSource`]: anything that can answer a
//! [`ScrapeQuery`] with raw [`TweetRecord`]s. The crate ships an offline
//! source over exported archives and an in-memory one; live scrapers plug in
//! behind the same trait.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::{write_record, TweetRecord};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed archive at entry {entry}: {reason}")]
    Malformed { entry: usize, reason: String },
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeQuery {
    pub username: Option<String>,
    /// Whitespace-separated terms; all must occur in the tweet text.
    pub search: Option<String>,
    pub lang: Option<String>,
    /// Inclusive.
    pub since: Option<NaiveDate>,
    /// Exclusive.
    pub until: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl ScrapeQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    #[must_use]
    pub const fn with_since(mut self, since: NaiveDate) -> Self {
        self.since = Some(since);
        self
    }

    #[must_use]
    pub const fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> SourceResult<()> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since >= until {
                return Err(SourceError::InvalidQuery(format!(
                    "since ({since}) must be before until ({until})"
                )));
            }
        }
        if self.limit == Some(0) {
            return Err(SourceError::InvalidQuery("limit must be positive".into()));
        }
        Ok(())
    }

    pub fn matches(&self, record: &TweetRecord) -> bool {
        if let Some(wanted) = &self.username {
            let wanted = wanted.trim_start_matches('@');
            if !record
                .username()
                .is_some_and(|u| u.eq_ignore_ascii_case(wanted))
            {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let Some(text) = record.text() else {
                return false;
            };
            let text = text.to_lowercase();
            if !search
                .split_whitespace()
                .all(|term| text.contains(&term.to_lowercase()))
            {
                return false;
            }
        }

        if let Some(lang) = &self.lang {
            if !record.language().is_some_and(|l| l.eq_ignore_ascii_case(lang)) {
                return false;
            }
        }

        if self.since.is_some() || self.until.is_some() {
            let Some(date) = record.date() else {
                return false;
            };
            if self.since.is_some_and(|since| date < since)
                || self.until.is_some_and(|until| date >= until)
            {
                return false;
            }
        }

        true
    }

    /// Filters `records` down to the matching ones, honoring `limit`.
    pub fn apply(&self, records: impl IntoIterator<Item = TweetRecord>) -> Vec<TweetRecord> {
        let matching = records.into_iter().filter(|r| self.matches(r));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

#[async_trait::async_trait]
pub trait TweetSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &ScrapeQuery) -> SourceResult<Vec<TweetRecord>>;
}

/// Reads tweets from an exported archive: either a JSON array of objects or
/// newline-delimited JSON (the twint export format).
pub struct ArchiveSource {
    path: PathBuf,
}

impl ArchiveSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl TweetSource for ArchiveSource {
    fn name(&self) -> &str {
        "archive"
    }

    async fn fetch(&self, query: &ScrapeQuery) -> SourceResult<Vec<TweetRecord>> {
        query.validate()?;
        let contents = tokio::fs::read_to_string(self.path()).await?;
        let records = parse_archive(&contents)?;
        let total = records.len();
        let matched = query.apply(records);
        tracing::debug!(
            path = %self.path().display(),
            total,
            matched = matched.len(),
            "Archive filtered"
        );
        Ok(matched)
    }
}

/// Serves a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<TweetRecord>,
}

impl StaticSource {
    #[must_use]
    pub const fn new(records: Vec<TweetRecord>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl TweetSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, query: &ScrapeQuery) -> SourceResult<Vec<TweetRecord>> {
        query.validate()?;
        Ok(query.apply(self.records.iter().cloned()))
    }
}

pub fn parse_archive(contents: &str) -> SourceResult<Vec<TweetRecord>> {
    if contents.trim_start().starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(contents).map_err(|e| SourceError::Malformed {
                entry: 0,
                reason: e.to_string(),
            })?;
        return values
            .into_iter()
            .enumerate()
            .map(|(index, value)| into_record(index + 1, value))
            .collect();
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let value = serde_json::from_str(line).map_err(|e| SourceError::Malformed {
                entry: index + 1,
                reason: e.to_string(),
            })?;
            into_record(index + 1, value)
        })
        .collect()
}

fn into_record(entry: usize, value: Value) -> SourceResult<TweetRecord> {
    match value {
        Value::Object(fields) => Ok(TweetRecord::from_map(fields)),
        _ => Err(SourceError::Malformed {
            entry,
            reason: "expected a JSON object".into(),
        }),
    }
}

/// Fetches from `source` and writes the records to `output` as NDJSON.
/// Returns the number of records written.
pub async fn collect_to_file(
    source: &dyn TweetSource,
    query: &ScrapeQuery,
    output: &Path,
) -> crate::Result<usize> {
    let records = source.fetch(query).await?;

    let mut buffer = Vec::new();
    for record in &records {
        write_record(&mut buffer, record)?;
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, buffer).await?;

    tracing::info!(
        source = source.name(),
        output = %output.display(),
        records = records.len(),
        "Collection complete"
    );
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tweet(username: &str, day: &str, text: &str, lang: &str) -> TweetRecord {
        TweetRecord::new()
            .with_field("username", username)
            .with_field("date", day)
            .with_field("tweet", text)
            .with_field("language", lang)
    }

    fn sample() -> Vec<TweetRecord> {
        vec![
            tweet("sekleinman", "2019-01-01", "Digital Humanities now", "en"),
            tweet("SEKleinman", "2019-02-01", "Humanities and data", "en"),
            tweet("other", "2019-02-15", "Les humanités numériques", "fr"),
            tweet("other", "2019-03-01", "Archives everywhere", "en"),
        ]
    }

    #[test]
    fn test_username_filter_is_case_insensitive() {
        let query = ScrapeQuery::new().with_username("@sekleinman");
        assert_eq!(query.apply(sample()).len(), 2);
    }

    #[test]
    fn test_search_requires_all_terms() {
        let query = ScrapeQuery::new().with_search("HUMANITIES digital");
        let found = query.apply(sample());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), Some("Digital Humanities now"));
    }

    #[test]
    fn test_lang_filter() {
        assert_eq!(ScrapeQuery::new().with_lang("fr").apply(sample()).len(), 1);
    }

    #[test]
    fn test_since_inclusive_until_exclusive() {
        let query = ScrapeQuery::new()
            .with_since(date("2019-02-01"))
            .with_until(date("2019-03-01"));
        let found = query.apply(sample());
        assert_eq!(found.len(), 2);

        let undated = TweetRecord::new().with_field("tweet", "when?");
        assert!(!query.matches(&undated));
    }

    #[test]
    fn test_limit() {
        let found = ScrapeQuery::new().with_limit(3).apply(sample());
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_validate() {
        assert!(ScrapeQuery::new().validate().is_ok());
        assert!(ScrapeQuery::new().with_limit(0).validate().is_err());
        let backwards = ScrapeQuery::new()
            .with_since(date("2019-03-01"))
            .with_until(date("2019-01-01"));
        assert!(matches!(backwards.validate(), Err(SourceError::InvalidQuery(_))));
    }

    #[test]
    fn test_parse_archive_formats() {
        let ndjson = "{\"tweet\": \"a\"}\n\n{\"tweet\": \"b\"}\n";
        assert_eq!(parse_archive(ndjson).unwrap().len(), 2);

        let array = "  [{\"tweet\": \"a\"}, {\"tweet\": \"b\"}, {\"tweet\": \"c\"}]";
        assert_eq!(parse_archive(array).unwrap().len(), 3);

        let err = parse_archive("{\"tweet\": \"a\"}\n42\n").unwrap_err();
        assert!(matches!(err, SourceError::Malformed { entry: 2, .. }));
    }

    #[tokio::test]
    async fn test_archive_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let lines: Vec<String> = sample()
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();

        let source = ArchiveSource::new(&path);
        assert_eq!(source.path(), path.as_path());
        let found = source
            .fetch(&ScrapeQuery::new().with_username("other"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_archive_source_missing_file() {
        let source = ArchiveSource::new("/no/such/export.json");
        let err = source.fetch(&ScrapeQuery::new()).await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn test_collect_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("collected/tweets.jsonl");
        let source = StaticSource::new(sample());

        let count = collect_to_file(&source, &ScrapeQuery::new().with_lang("en"), &output)
            .await
            .unwrap();
        assert_eq!(count, 3);

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(written.contains("Archives everywhere"));
    }

    #[tokio::test]
    async fn test_invalid_query_surfaces_as_crate_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticSource::new(sample());
        let err = collect_to_file(
            &source,
            &ScrapeQuery::new().with_limit(0),
            &dir.path().join("x.jsonl"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, crate::Error::Source(SourceError::InvalidQuery(_))));
    }
}
