use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(?:https?|ftp)://|\bwww\.|\bpic\.twitter\.com/|\bt\.co/)\S+")
        .expect("URL pattern is valid")
});

// `\B` keeps e-mail addresses ("user@host") from counting as mentions.
pub static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B@\w+").expect("mention pattern is valid"));

pub static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B#\w+").expect("hashtag pattern is valid"));

// Ordinals, decades and clock times: 21st, 1990s, 3pm, 10am.
pub static NUMERIC_SUFFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:st|nd|rd|th|s|am|pm|h)$").expect("numeric pattern is valid")
});

const EMOTICON_LIST: &[&str] = &[
    // happy
    ":-)", ":)", ";)", ":o)", ":]", ":3", ":c)", ":>", "=]", "8)", "=)", ":}", ":^)", ":-D",
    ":D", "8-D", "8D", "x-D", "xD", "X-D", "XD", "=-D", "=D", "=-3", "=3", ":-))", ":'-)",
    ":')", ":*", ":^*", ">:P", ":-P", ":P", "X-P", "x-p", "xp", "XP", ":-p", ":p", "=p",
    ":-b", ":b", ">:)", ">;)", ">:-)", "<3",
    // sad
    ":L", ":-/", ">:/", ":S", ">:[", ":@", ":-(", ":[", ":-||", "=L", ":<", ":-[", ":-<",
    "=\\", "=/", ">:(", ":(", ">.<", ":'-(", ":'(", ":\\", ":-c", ":c", ":{", ">:\\", ";(",
];

/// Emoticons, case-folded so they match lowercased tokens.
pub static EMOTICONS: LazyLock<HashSet<String>> =
    LazyLock::new(|| EMOTICON_LIST.iter().map(|e| e.to_lowercase()).collect());

// Names and abbreviations that are also common words (may, jan, mar, dec, wed,
// sat, sun) are left out.
const DATE_WORD_LIST: &[&str] = &[
    "january", "february", "feb", "march", "april", "apr", "june", "jun", "july", "jul",
    "august", "aug", "september", "sep", "sept", "october", "oct", "november", "nov",
    "december", "monday", "mon", "tuesday", "tue", "tues", "wednesday", "thursday", "thu",
    "thur", "thurs", "friday", "fri", "saturday", "sunday", "am", "pm",
];

pub static DATE_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DATE_WORD_LIST.iter().copied().collect());

pub fn is_emoticon(token: &str) -> bool {
    EMOTICONS.contains(token)
}

pub fn is_numeric(token: &str) -> bool {
    (!token.is_empty() && token.chars().all(char::is_numeric)) || NUMERIC_SUFFIXED.is_match(token)
}

pub fn is_date_word(token: &str) -> bool {
    DATE_WORDS.contains(token)
}
