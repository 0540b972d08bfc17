use std::io::{BufRead, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const TEXT_FIELD: &str = "text";
/// Field name used by twint exports.
pub const TWINT_TEXT_FIELD: &str = "tweet";
pub const TIDY_FIELD: &str = "tidy_tweet";
pub const NAME_FIELD: &str = "name";

const TWITTER_URL_PREFIX: &str = "https://twitter.com/";

/// A raw tweet as produced by a collection source. Every field is kept as-is;
/// only the text, id, author, date and link have typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweetRecord {
    fields: Map<String, Value>,
}

impl TweetRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Parses one NDJSON line. The line must hold a JSON object.
    pub fn from_json(line: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::InvalidRecord {
                line: None,
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Field value rendered as a string, for grouping and file naming.
    pub fn get_display(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn id(&self) -> Option<String> {
        ["id", "id_str"].iter().find_map(|key| match self.fields.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Tweet body: `text`, falling back to twint's `tweet`.
    pub fn text(&self) -> Option<&str> {
        self.get_str(TEXT_FIELD)
            .or_else(|| self.get_str(TWINT_TEXT_FIELD))
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str("username")
            .or_else(|| self.get_str("screen_name"))
            .map(|name| name.trim_start_matches('@'))
    }

    pub fn language(&self) -> Option<&str> {
        self.get_str("language").or_else(|| self.get_str("lang"))
    }

    pub fn link(&self) -> Option<&str> {
        self.get_str("link")
    }

    /// Calendar date of the tweet, read from the leading `YYYY-MM-DD` of
    /// `date` (or `created_at`).
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.get_str("date").or_else(|| self.get_str("created_at"))?;
        parse_leading_date(raw)
    }

    /// `date + link`, with the Twitter URL prefix turned into `__` and the
    /// remaining slashes into `_`.
    pub fn derive_name(&self) -> Option<String> {
        let date = self.get_str("date")?;
        let link = self.link()?;
        let path = link.replacen(TWITTER_URL_PREFIX, "__", 1).replace('/', "_");
        Some(format!("{date}{path}"))
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }
}

impl From<Map<String, Value>> for TweetRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Which record field holds the tweet body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextField {
    /// `text`, then `tweet`.
    #[default]
    Auto,
    Named(String),
}

impl TextField {
    pub fn named(field: impl Into<String>) -> Self {
        Self::Named(field.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Auto => TEXT_FIELD,
            Self::Named(field) => field,
        }
    }

    pub fn resolve<'a>(&self, record: &'a TweetRecord) -> Result<&'a str> {
        let text = match self {
            Self::Auto => record.text(),
            Self::Named(field) => record.get_str(field),
        };
        text.ok_or_else(|| Error::missing_field(self.name()))
    }
}

/// A tweet with its derived `tidy_tweet` (and, when derivable, `name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTweetRecord {
    #[serde(flatten)]
    record: TweetRecord,
    tidy_tweet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl NormalizedTweetRecord {
    #[must_use]
    pub fn new(mut record: TweetRecord, tidy_tweet: String) -> Self {
        record.remove(TIDY_FIELD);
        let name = record.derive_name();
        if name.is_some() {
            record.remove(NAME_FIELD);
        }
        Self {
            record,
            tidy_tweet,
            name,
        }
    }

    pub fn record(&self) -> &TweetRecord {
        &self.record
    }

    pub fn tidy_tweet(&self) -> &str {
        &self.tidy_tweet
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Flattens back into a plain record carrying `tidy_tweet` as a field.
    pub fn into_record(self) -> TweetRecord {
        let mut fields = self.record.into_fields();
        fields.insert(TIDY_FIELD.to_string(), Value::String(self.tidy_tweet));
        if let Some(name) = self.name {
            fields.insert(NAME_FIELD.to_string(), Value::String(name));
        }
        TweetRecord::from_map(fields)
    }
}

pub fn parse_leading_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Reads newline-delimited JSON records, ignoring blank lines. Errors carry
/// the 1-based line number.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<TweetRecord>> {
    let mut records = Vec::new();
    for (index, bytes) in reader.split(b'\n').enumerate() {
        let line = decode_line(bytes?).map_err(|e| e.at_line(index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = TweetRecord::from_json(&line).map_err(|e| e.at_line(index + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Decodes one raw input line, dropping a trailing `\r`. Invalid UTF-8 is a
/// record error rather than an I/O error so callers can skip the line.
pub(crate) fn decode_line(mut bytes: Vec<u8>) -> Result<String> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|e| Error::InvalidRecord {
        line: None,
        reason: format!("invalid UTF-8: {}", e.utf8_error()),
    })
}

pub fn write_record<W: Write, T: Serialize>(writer: &mut W, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn twint_record() -> TweetRecord {
        TweetRecord::from_json(
            r#"{"id": 1100, "date": "2019-03-04", "username": "sekleinman",
                "tweet": "Hello #DH", "link": "https://twitter.com/sekleinman/status/1100"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let record = twint_record();
        assert_eq!(record.id().as_deref(), Some("1100"));
        assert_eq!(record.text(), Some("Hello #DH"));
        assert_eq!(record.username(), Some("sekleinman"));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2019, 3, 4));
    }

    #[test]
    fn test_text_prefers_text_field() {
        let record = TweetRecord::new()
            .with_field("text", "primary")
            .with_field("tweet", "fallback");
        assert_eq!(record.text(), Some("primary"));
    }

    #[test]
    fn test_text_field_resolution() {
        let record = twint_record();
        assert_eq!(TextField::Auto.resolve(&record).unwrap(), "Hello #DH");

        let err = TextField::named("body").resolve(&record).unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'body'");
    }

    #[test]
    fn test_non_string_text_is_missing() {
        let record = TweetRecord::new().with_field("text", 42);
        assert!(matches!(
            TextField::Auto.resolve(&record),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = TweetRecord::from_json("[1, 2]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid record: expected a JSON object, found an array"
        );
    }

    #[test]
    fn test_date_with_time() {
        let record = TweetRecord::new().with_field("created_at", "2020-01-31 23:59:59 UTC");
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2020, 1, 31));
        assert_eq!(TweetRecord::new().with_field("date", "soon").date(), None);
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(
            twint_record().derive_name().as_deref(),
            Some("2019-03-04__sekleinman_status_1100")
        );
        assert_eq!(TweetRecord::new().with_field("date", "2019-03-04").derive_name(), None);
    }

    #[test]
    fn test_normalized_record_serialization() {
        let record = twint_record().with_field("tidy_tweet", "stale");
        let normalized = NormalizedTweetRecord::new(record, "hello dh".into());

        let value = serde_json::to_value(&normalized).unwrap();
        assert_eq!(value["tidy_tweet"], json!("hello dh"));
        assert_eq!(value["name"], json!("2019-03-04__sekleinman_status_1100"));
        assert_eq!(value["tweet"], json!("Hello #DH"));
        assert_eq!(value["id"], json!(1100));

        let line = serde_json::to_string(&normalized).unwrap();
        assert_eq!(line.matches("\"tidy_tweet\"").count(), 1);
    }

    #[test]
    fn test_into_record() {
        let normalized = NormalizedTweetRecord::new(twint_record(), "hello dh".into());
        let record = normalized.into_record();
        assert_eq!(record.get_str(TIDY_FIELD), Some("hello dh"));
        assert_eq!(record.get_str(NAME_FIELD), Some("2019-03-04__sekleinman_status_1100"));
    }

    #[test]
    fn test_read_records_reports_line() {
        let input = "{\"text\": \"a\"}\n\n{\"text\": \"b\"}\nnot json\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: Some(4), .. }));

        let records = read_records("{\"text\": \"a\"}\n\n{\"text\": \"b\"}\n".as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_records_invalid_utf8() {
        let input: &[u8] = b"{\"text\": \"a\"}\r\n\xff\xfe\n";
        let err = read_records(input).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { line: Some(2), .. }));
        assert!(err.to_string().starts_with("line 2: invalid record: invalid UTF-8"));
    }

    #[test]
    fn test_write_record() {
        let mut out = Vec::new();
        write_record(&mut out, &TweetRecord::new().with_field("text", "x")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"text\":\"x\"}\n");
    }
}
