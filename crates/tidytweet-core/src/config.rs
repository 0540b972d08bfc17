use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::preprocess::Preprocessor;
use crate::record::TextField;
use crate::stoplist::StopList;
use crate::text::{NormalizeOptions, TweetNormalizer};

pub const ENV_STOPLIST: &str = "TIDYTWEET_STOPLIST";
pub const ENV_REPLACE_STOPLIST: &str = "TIDYTWEET_REPLACE_STOPLIST";
pub const ENV_TEXT_FIELD: &str = "TIDYTWEET_TEXT_FIELD";
pub const ENV_ACCENTS: &str = "TIDYTWEET_ACCENTS";
pub const ENV_HASHTAGS: &str = "TIDYTWEET_HASHTAGS";
pub const ENV_MIN_CHARS: &str = "TIDYTWEET_MIN_CHARS";

/// Preprocessing configuration.
///
/// Stoplist resolution: an explicit `stoplist` path, otherwise
/// `<config dir>/tidytweet/stoplist.txt` if it exists. The custom list extends
/// the bundled one unless `replace_stoplist` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub stoplist: Option<PathBuf>,
    pub replace_stoplist: bool,
    /// Explicit text field; `None` means `text`, falling back to `tweet`.
    pub text_field: Option<String>,
    pub normalize: NormalizeOptions,
    pub skip_invalid: bool,
}

impl PreprocessConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_STOPLIST).filter(|v| !v.is_empty()) {
            config.stoplist = Some(PathBuf::from(path));
        }
        if let Some(v) = lookup(ENV_REPLACE_STOPLIST) {
            config.replace_stoplist = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Some(field) = lookup(ENV_TEXT_FIELD).filter(|v| !v.is_empty()) {
            config.text_field = Some(field);
        }
        if let Some(v) = lookup(ENV_ACCENTS) {
            config.normalize.accents = v.parse()?;
        }
        if let Some(v) = lookup(ENV_HASHTAGS) {
            config.normalize.hashtags = v.parse()?;
        }
        if let Some(v) = lookup(ENV_MIN_CHARS) {
            config.normalize.min_token_chars = v.parse().map_err(|_| Error::InvalidOption {
                option: ENV_MIN_CHARS,
                value: v.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.normalize.min_token_chars == 0 {
            return Err(Error::InvalidConfig(
                "min_token_chars must be at least 1".into(),
            ));
        }
        if self.replace_stoplist && self.stoplist.is_none() && user_stoplist_path().is_none() {
            return Err(Error::InvalidConfig(
                "replace_stoplist requires a stoplist file".into(),
            ));
        }
        if let Some(path) = &self.stoplist {
            if !path.is_file() {
                return Err(Error::InvalidConfig(format!(
                    "stoplist not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn text_field(&self) -> TextField {
        self.text_field
            .as_ref()
            .map_or(TextField::Auto, TextField::named)
    }

    /// Resolves and loads the effective stoplist.
    pub fn load_stoplist(&self) -> Result<StopList> {
        let custom = match self.stoplist.clone().or_else(user_stoplist_path) {
            Some(path) => Some(StopList::load(&path)?),
            None => None,
        };

        let stoplist = match (custom, self.replace_stoplist) {
            (Some(custom), true) => custom,
            (Some(custom), false) => StopList::bundled().extended_with(&custom),
            (None, _) => StopList::bundled().clone(),
        };
        tracing::debug!(entries = stoplist.len(), "Stoplist ready");
        Ok(stoplist)
    }

    pub fn build_preprocessor(&self) -> Result<Preprocessor> {
        self.validate()?;
        let stoplist = Arc::new(self.load_stoplist()?);
        Ok(Preprocessor::new(stoplist)
            .with_normalizer(Box::new(TweetNormalizer::new(self.normalize.clone())))
            .with_text_field(self.text_field())
            .with_skip_invalid(self.skip_invalid))
    }
}

/// `<config dir>/tidytweet/stoplist.txt`, when it exists.
pub fn user_stoplist_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("tidytweet").join("stoplist.txt"))
        .filter(|path| path.is_file())
}
