use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;

use super::cleanup::{fold, nfc, strip_html_tags, AccentMethod};
use super::patterns::{is_date_word, is_emoticon, is_numeric, HASHTAG, MENTION, URL};
use crate::error::Error;
use crate::stoplist::StopList;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashtagMode {
    /// `#word` becomes `word`.
    #[default]
    Strip,
    /// `#word` stays a single token.
    Keep,
    /// Hashtags are removed with their word.
    Drop,
}

impl fmt::Display for HashtagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strip => write!(f, "strip"),
            Self::Keep => write!(f, "keep"),
            Self::Drop => write!(f, "drop"),
        }
    }
}

impl FromStr for HashtagMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strip" => Ok(Self::Strip),
            "keep" => Ok(Self::Keep),
            "drop" => Ok(Self::Drop),
            _ => Err(Error::InvalidOption {
                option: "hashtags",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub strip_html: bool,
    pub accents: AccentMethod,
    pub hashtags: HashtagMode,
    pub min_token_chars: usize,
    pub drop_numbers: bool,
    /// Drop month and weekday names, their unambiguous abbreviations, and
    /// `am`/`pm`. `march` and `sunday` are still dropped; `may` and
    /// abbreviations such as `sun`, `sat` or `jan` are kept.
    pub drop_dates: bool,
    pub drop_emoticons: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            strip_html: true,
            accents: AccentMethod::Unicode,
            hashtags: HashtagMode::Strip,
            min_token_chars: 2,
            drop_numbers: true,
            drop_dates: true,
            drop_emoticons: true,
        }
    }
}

pub trait Normalizer: Send + Sync {
    /// Produces the tidy form of `text`. Must be a pure function of its inputs.
    fn normalize(&self, text: &str, stoplist: &StopList) -> String;
}

/// Stoplist-driven tweet cleaner.
///
/// Steps, in order: HTML tags and entities, NFC, accent folding, lowercasing,
/// URL and mention removal, hashtag handling, whitespace tokenization,
/// punctuation splitting, token filtering, and rejoining with single spaces.
#[derive(Debug, Clone, Default)]
pub struct TweetNormalizer {
    options: NormalizeOptions,
}

impl TweetNormalizer {
    #[must_use]
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    pub fn normalize(&self, text: &str, stoplist: &StopList) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let text = if self.options.strip_html {
            strip_html_tags(text)
        } else {
            Cow::Borrowed(text)
        };
        let folded = fold(&text, self.options.accents);
        let without_urls = URL.replace_all(&folded, " ");
        let without_mentions = MENTION.replace_all(&without_urls, " ");
        let cleaned = if self.options.hashtags == HashtagMode::Drop {
            HASHTAG.replace_all(&without_mentions, " ")
        } else {
            Cow::Borrowed(without_mentions.as_ref())
        };

        let mut tokens: Vec<String> = Vec::new();
        for raw in cleaned.split_whitespace() {
            if (self.options.drop_emoticons && is_emoticon(raw)) || stoplist.contains(raw) {
                continue;
            }
            tokens.extend(
                self.split_token(raw)
                    .into_iter()
                    .filter(|token| self.keep_token(token, stoplist)),
            );
        }

        tokens.join(" ")
    }

    /// Splits one whitespace-delimited token on punctuation. Dropping an
    /// apostrophe can leave a combining mark next to a new base letter, so
    /// every piece is recomposed to NFC.
    fn split_token(&self, raw: &str) -> Vec<String> {
        let word = raw
            .strip_suffix("'s")
            .or_else(|| raw.strip_suffix("\u{2019}s"))
            .unwrap_or(raw);

        let (hashtag, body) = match word.strip_prefix('#') {
            Some(rest) if self.options.hashtags == HashtagMode::Keep => {
                (rest.chars().next().is_some_and(is_word_char), rest)
            }
            _ => (false, word),
        };

        let mut pieces = Vec::new();
        let mut current = String::new();
        for c in body.chars() {
            if c == '\'' || c == '\u{2019}' {
                continue;
            }
            if is_word_char(c) {
                current.push(c);
            } else if !current.is_empty() {
                pieces.push(nfc(&std::mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            pieces.push(nfc(&current));
        }

        if hashtag {
            if let Some(first) = pieces.first_mut() {
                first.insert(0, '#');
            }
        }
        pieces
    }

    fn keep_token(&self, token: &str, stoplist: &StopList) -> bool {
        let bare = token.strip_prefix('#').unwrap_or(token);
        if bare.chars().count() < self.options.min_token_chars.max(1) {
            return false;
        }
        if stoplist.contains(token) || stoplist.contains(bare) {
            return false;
        }
        if self.options.drop_emoticons && is_emoticon(bare) {
            return false;
        }
        if self.options.drop_numbers && is_numeric(bare) {
            return false;
        }
        !(self.options.drop_dates && is_date_word(bare))
    }
}

impl Normalizer for TweetNormalizer {
    fn normalize(&self, text: &str, stoplist: &StopList) -> String {
        Self::normalize(self, text, stoplist)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_combining_mark(c)
}

/// Normalizes `text` with the default options.
pub fn normalize(text: &str, stoplist: &StopList) -> String {
    TweetNormalizer::default().normalize(text, stoplist)
}
