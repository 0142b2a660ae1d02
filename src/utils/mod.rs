//! Utility functions and helpers.

pub mod http;
pub mod time;
pub mod url;

pub use self::http::{AcceptKind, FetchedPage, HttpClient, HttpFetch};
pub use self::time::normalize_timestamp;
pub use self::url::sanitize_link;
