#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod aggregate;
pub mod collect;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod record;
pub mod stoplist;
pub mod text;
pub mod timer;

pub use aggregate::{DateRange, Manifest, TweetAggregator};
pub use collect::{
    collect_to_file, ArchiveSource, ScrapeQuery, SourceError, StaticSource, TweetSource,
};
pub use config::PreprocessConfig;
pub use error::{Error, Result};
pub use preprocess::{PreprocessStats, Preprocessor, RecordFailure};
pub use record::{NormalizedTweetRecord, TextField, TweetRecord};
pub use stoplist::StopList;
pub use text::{normalize, AccentMethod, HashtagMode, NormalizeOptions, Normalizer, TweetNormalizer};
pub use timer::Timer;
