//! Pipeline entry points.
//!
//! - `run_pipeline`: Aggregate every friend, merge with a peer, cap, persist
//! - `detect_new_articles`: Report posts a single blog published since last check

pub mod aggregate;
pub mod cache;
pub mod capper;
pub mod merge;
pub mod run;
pub mod updates;

pub use aggregate::{Aggregation, Aggregator};
pub use cache::FeedCache;
pub use capper::{MAX_ARTICLES, cap_corpus, sort_and_cap, sort_articles};
pub use merge::{PeerMerger, merge_articles, merge_error_lists};
pub use run::{load_roster, run_pipeline};
pub use updates::{Snapshot, detect_new_articles};
