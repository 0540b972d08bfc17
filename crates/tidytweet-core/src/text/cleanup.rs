use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use scraper::Html;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::Error;

/// How accented characters are folded before tokenization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentMethod {
    /// Decompose and drop combining marks, keeping every other character.
    #[default]
    Unicode,
    /// Decompose and keep only ASCII characters.
    Ascii,
    None,
}

impl fmt::Display for AccentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unicode => write!(f, "unicode"),
            Self::Ascii => write!(f, "ascii"),
            Self::None => write!(f, "none"),
        }
    }
}

impl FromStr for AccentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "ascii" => Ok(Self::Ascii),
            "none" | "off" => Ok(Self::None),
            _ => Err(Error::InvalidOption {
                option: "accents",
                value: s.to_string(),
            }),
        }
    }
}

/// Extracts the text of an HTML fragment, decoding entities. Tags become
/// spaces; a `<` that does not open a tag (`<3`, `x < 5`) is kept as text.
pub fn strip_html_tags(text: &str) -> Cow<'_, str> {
    if !text.contains('<') && !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let fragment = Html::parse_fragment(text);
    let out = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    Cow::Owned(out)
}

pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

pub fn remove_accents(text: &str, method: AccentMethod) -> Cow<'_, str> {
    match method {
        AccentMethod::None => Cow::Borrowed(text),
        AccentMethod::Unicode => Cow::Owned(text.nfkd().filter(|c| !is_combining_mark(*c)).collect()),
        AccentMethod::Ascii => Cow::Owned(text.nfkd().filter(char::is_ascii).collect()),
    }
}

/// Character-level folding shared by text and stoplist entries.
pub fn fold(text: &str, method: AccentMethod) -> String {
    remove_accents(&nfc(text), method).to_lowercase()
}
