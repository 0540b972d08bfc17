use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::record::{decode_line, write_record, NormalizedTweetRecord, TextField, TweetRecord};
use crate::stoplist::StopList;
use crate::text::{Normalizer, TweetNormalizer};
use crate::timer::Timer;

#[derive(Debug, Clone)]
pub struct RecordFailure {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreprocessStats {
    pub processed: usize,
    /// Records whose tidy text came out empty.
    pub empty: usize,
    pub failed: Vec<RecordFailure>,
    pub duration_ms: u64,
}

impl PreprocessStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped(&self) -> usize {
        self.failed.len()
    }
}

pub struct Preprocessor {
    normalizer: Box<dyn Normalizer>,
    stoplist: Arc<StopList>,
    text_field: TextField,
    skip_invalid: bool,
}

impl Preprocessor {
    #[must_use]
    pub fn new(stoplist: Arc<StopList>) -> Self {
        Self {
            normalizer: Box::new(TweetNormalizer::default()),
            stoplist,
            text_field: TextField::Auto,
            skip_invalid: false,
        }
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_text_field(mut self, text_field: TextField) -> Self {
        self.text_field = text_field;
        self
    }

    /// Record invalid lines in the stats instead of stopping at the first one.
    #[must_use]
    pub const fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    pub fn stoplist(&self) -> &StopList {
        &self.stoplist
    }

    pub fn normalize_text(&self, text: &str) -> String {
        self.normalizer.normalize(text, &self.stoplist)
    }

    pub fn preprocess_record(&self, record: TweetRecord) -> Result<NormalizedTweetRecord> {
        let tidy = self.normalize_text(self.text_field.resolve(&record)?);
        Ok(NormalizedTweetRecord::new(record, tidy))
    }

    pub fn preprocess_records<I>(&self, records: I) -> Result<Vec<NormalizedTweetRecord>>
    where
        I: IntoIterator<Item = TweetRecord>,
    {
        records
            .into_iter()
            .map(|record| self.preprocess_record(record))
            .collect()
    }

    pub fn preprocess_lines<R: BufRead, W: Write>(
        &self,
        reader: R,
        writer: &mut W,
    ) -> Result<PreprocessStats> {
        let timer = Timer::start();
        let mut stats = PreprocessStats::new();

        for (index, bytes) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let line = match decode_line(bytes?) {
                Ok(line) => line,
                Err(e) => {
                    self.record_failure(e.at_line(line_no), line_no, &mut stats)?;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let normalized = match TweetRecord::from_json(&line)
                .and_then(|record| self.preprocess_record(record))
            {
                Ok(normalized) => normalized,
                Err(e) => {
                    self.record_failure(e.at_line(line_no), line_no, &mut stats)?;
                    continue;
                }
            };

            if normalized.tidy_tweet().is_empty() {
                stats.empty += 1;
            }
            write_record(writer, &normalized)?;
            stats.processed += 1;
        }

        writer.flush()?;
        stats.duration_ms = timer.elapsed_ms();
        Ok(stats)
    }

    /// Returns the error unless invalid records are being skipped.
    fn record_failure(&self, error: Error, line: usize, stats: &mut PreprocessStats) -> Result<()> {
        if !self.skip_invalid {
            return Err(error);
        }
        tracing::warn!("Skipping record: {}", error);
        stats.failed.push(RecordFailure {
            line,
            message: error.to_string(),
        });
        Ok(())
    }

    /// Preprocesses an NDJSON file into a new NDJSON file whose records carry
    /// `tidy_tweet`.
    pub fn preprocess_file(&self, input: &Path, output: &Path) -> Result<PreprocessStats> {
        if input == output {
            return Err(Error::InvalidConfig(format!(
                "input and output are the same file: {}",
                input.display()
            )));
        }

        let timer = Timer::start();
        let reader = BufReader::new(File::open(input)?);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(output)?);

        let stats = self.preprocess_lines(reader, &mut writer)?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            processed = stats.processed,
            skipped = stats.skipped(),
            elapsed = %timer,
            "Preprocessing complete"
        );
        Ok(stats)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(Arc::new(StopList::bundled().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{HashtagMode, NormalizeOptions};
    use serde_json::Value;

    fn lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_preprocess_record() {
        let preprocessor = Preprocessor::default();
        let record = TweetRecord::new()
            .with_field("id", 1)
            .with_field("text", "RT @someone: The #DigitalHumanities are GREAT https://t.co/x");

        let normalized = preprocessor.preprocess_record(record).unwrap();
        assert_eq!(normalized.tidy_tweet(), "digitalhumanities great");
        assert_eq!(normalized.record().id().as_deref(), Some("1"));
    }

    #[test]
    fn test_missing_text_fails_fast() {
        let preprocessor = Preprocessor::default();
        let err = preprocessor
            .preprocess_record(TweetRecord::new().with_field("id", 1))
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_custom_text_field_and_normalizer() {
        let preprocessor = Preprocessor::new(Arc::new(StopList::empty()))
            .with_text_field(TextField::named("body"))
            .with_normalizer(Box::new(TweetNormalizer::new(NormalizeOptions {
                hashtags: HashtagMode::Keep,
                ..NormalizeOptions::default()
            })));

        let record = TweetRecord::new().with_field("body", "The #DH crowd");
        let normalized = preprocessor.preprocess_record(record).unwrap();
        assert_eq!(normalized.tidy_tweet(), "the #dh crowd");
    }

    #[test]
    fn test_preprocess_lines() {
        let input = concat!(
            r#"{"id": 1, "date": "2019-01-02", "link": "https://twitter.com/a/status/1", "tweet": "Humanities rock!"}"#,
            "\n\n",
            r#"{"id": 2, "tweet": "the and of"}"#,
            "\n"
        );
        let mut output = Vec::new();
        let stats = Preprocessor::default()
            .preprocess_lines(input.as_bytes(), &mut output)
            .unwrap();

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.skipped(), 0);

        let records = lines(&output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["tidy_tweet"], "humanities rock");
        assert_eq!(records[0]["name"], "2019-01-02__a_status_1");
        assert_eq!(records[1]["tidy_tweet"], "");
        assert!(records[1].get("name").is_none());
    }

    #[test]
    fn test_bad_line_fails_fast() {
        let input = "{\"text\": \"ok\"}\n{\"id\": 5}\n{\"text\": \"never\"}\n";
        let mut output = Vec::new();
        let err = Preprocessor::default()
            .preprocess_lines(input.as_bytes(), &mut output)
            .unwrap_err();
        assert_eq!(err.to_string(), "line 2: missing required field 'text'");
    }

    #[test]
    fn test_skip_invalid_records_failures() {
        let input = "{\"text\": \"archive work\"}\nnot json\n{\"id\": 5}\n{\"text\": \"more archives\"}\n";
        let mut output = Vec::new();
        let stats = Preprocessor::default()
            .with_skip_invalid(true)
            .preprocess_lines(input.as_bytes(), &mut output)
            .unwrap();

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped(), 2);
        assert_eq!(stats.failed[0].line, 2);
        assert_eq!(stats.failed[1].line, 3);
        assert_eq!(lines(&output).len(), 2);
    }

    #[test]
    fn test_invalid_utf8_line() {
        let input: &[u8] = b"{\"text\": \"archive work\"}\n\xff\n{\"text\": \"more archives\"}\r\n";

        let mut output = Vec::new();
        let stats = Preprocessor::default()
            .with_skip_invalid(true)
            .preprocess_lines(input, &mut output)
            .unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped(), 1);
        assert_eq!(stats.failed[0].line, 2);
        assert!(stats.failed[0].message.contains("invalid UTF-8"));
        assert_eq!(lines(&output)[1]["tidy_tweet"], "archives");

        let err = Preprocessor::default()
            .preprocess_lines(input, &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: Some(2), .. }));
    }

    #[test]
    fn test_preprocess_records() {
        let records = vec![
            TweetRecord::new().with_field("text", "Digital Humanities"),
            TweetRecord::new().with_field("tweet", "Close reading!"),
        ];
        let normalized = Preprocessor::default().preprocess_records(records).unwrap();
        let tidy: Vec<_> = normalized.iter().map(NormalizedTweetRecord::tidy_tweet).collect();
        assert_eq!(tidy, vec!["digital humanities", "close reading"]);

        let err = Preprocessor::default()
            .preprocess_records(vec![TweetRecord::new().with_field("id", 3)])
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_preprocess_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tweets.jsonl");
        let output = dir.path().join("out/tidy.jsonl");
        std::fs::write(&input, "{\"text\": \"Reading Moby-Dick tonight\"}\n").unwrap();

        let stats = Preprocessor::default().preprocess_file(&input, &output).unwrap();
        assert_eq!(stats.processed, 1);

        let written = std::fs::read(&output).unwrap();
        assert_eq!(lines(&written)[0]["tidy_tweet"], "reading moby dick tonight");
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let path = Path::new("tweets.jsonl");
        let err = Preprocessor::default().preprocess_file(path, path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_shared_across_threads() {
        let preprocessor = &Preprocessor::default();
        let texts = ["Hello World", "Digital Humanities", "@x Archives!"];
        std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|text| scope.spawn(move || preprocessor.normalize_text(text)))
                .collect();
            let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(results, vec!["hello world", "digital humanities", "archives"]);
        });
    }
}
