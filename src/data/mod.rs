//! External data sources feeding the metric files.

pub mod github;

pub use github::{CollectSummary, GithubClient, collect_once};
