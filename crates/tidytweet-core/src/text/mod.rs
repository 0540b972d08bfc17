mod cleanup;
mod normalizer;
mod patterns;

pub use cleanup::{fold, nfc, remove_accents, strip_html_tags, AccentMethod};
pub use normalizer::{normalize, HashtagMode, NormalizeOptions, Normalizer, TweetNormalizer};
pub use patterns::{is_date_word, is_emoticon, is_numeric};
