//! Loader: retrieve a metric CSV by resource name.
//!
//! A load either delivers the raw text or delivers nothing. Non-success
//! statuses and transport errors never reach the chart; they are logged and
//! swallowed here, so the chart currently on screen stays as it is.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

mod source;

pub use source::{FileSource, HttpSource};

/// Raw outcome of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

impl Fetched {
    /// Any 2xx, or `0`, which is what same-origin local file access reports.
    pub fn is_success(&self) -> bool {
        self.status == 0 || (200..300).contains(&self.status)
    }
}

/// Where resources come from.
pub trait ResourceSource: Send + Sync {
    /// Short human-readable location, used in logs and status lines.
    fn describe(&self) -> String;

    fn fetch(&self, name: &str) -> impl Future<Output = Result<Fetched, AppError>> + Send;
}

/// Source chosen at startup from a `--source` argument.
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Http(HttpSource),
}

impl Source {
    /// `http://` / `https://` prefixes select HTTP, anything else is a directory.
    pub fn parse(location: &str, timeout: Duration) -> Result<Self, AppError> {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Http(HttpSource::new(location, timeout)?))
        } else {
            Ok(Self::File(FileSource::new(location)))
        }
    }

    pub fn as_file(&self) -> Option<&FileSource> {
        match self {
            Self::File(src) => Some(src),
            Self::Http(_) => None,
        }
    }
}

impl ResourceSource for Source {
    fn describe(&self) -> String {
        match self {
            Self::File(src) => src.describe(),
            Self::Http(src) => src.describe(),
        }
    }

    async fn fetch(&self, name: &str) -> Result<Fetched, AppError> {
        match self {
            Self::File(src) => src.fetch(name).await,
            Self::Http(src) => src.fetch(name).await,
        }
    }
}

/// Retrieves resources and applies the delivery policy.
#[derive(Debug)]
pub struct Loader<S> {
    source: S,
}

impl<S: ResourceSource> Loader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Retrieve `name`; `Some(text)` only when the retrieval succeeded.
    pub async fn load(&self, name: &str) -> Option<String> {
        tracing::debug!(resource = name, source = %self.source.describe(), "loading resource");

        match self.source.fetch(name).await {
            Ok(fetched) if fetched.is_success() => {
                tracing::debug!(resource = name, bytes = fetched.body.len(), "resource loaded");
                Some(fetched.body)
            }
            Ok(fetched) => {
                tracing::warn!(
                    resource = name,
                    status = fetched.status,
                    "retrieval unsuccessful; chart left unchanged"
                );
                None
            }
            Err(err) => {
                tracing::warn!(resource = name, error = %err, "retrieval failed; chart left unchanged");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory source that records every requested name.
    #[derive(Debug, Default)]
    pub struct MemorySource {
        responses: HashMap<String, Fetched>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MemorySource {
        pub fn with(mut self, name: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                name.to_string(),
                Fetched {
                    status,
                    body: body.to_string(),
                },
            );
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ResourceSource for MemorySource {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        async fn fetch(&self, name: &str) -> Result<Fetched, AppError> {
            self.requests.lock().unwrap().push(name.to_string());
            self.responses
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::new(4, format!("connection refused for {name}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemorySource;
    use super::*;

    #[test]
    fn success_statuses() {
        let ok = |status| Fetched { status, body: String::new() }.is_success();
        assert!(ok(0));
        assert!(ok(200));
        assert!(ok(204));
        assert!(!ok(304));
        assert!(!ok(404));
        assert!(!ok(500));
    }

    #[tokio::test]
    async fn delivers_text_on_success() {
        let loader = Loader::new(MemorySource::default().with("commits.csv", 200, "1214913600,6.5"));
        assert_eq!(loader.load("commits.csv").await.as_deref(), Some("1214913600,6.5"));
    }

    #[tokio::test]
    async fn delivers_nothing_on_failure() {
        let loader = Loader::new(
            MemorySource::default()
                .with("missing.csv", 404, "not found")
                .with("broken.csv", 500, "oops"),
        );
        assert_eq!(loader.load("missing.csv").await, None);
        assert_eq!(loader.load("broken.csv").await, None);
        // Transport error.
        assert_eq!(loader.load("unreachable.csv").await, None);
        assert_eq!(
            loader.source().requested(),
            vec!["missing.csv", "broken.csv", "unreachable.csv"]
        );
    }

    #[test]
    fn source_spec_selects_backend() {
        let timeout = Duration::from_secs(5);
        assert!(matches!(Source::parse("assets", timeout).unwrap(), Source::File(_)));
        assert!(matches!(
            Source::parse("http://localhost:8080/", timeout).unwrap(),
            Source::Http(_)
        ));
        assert!(Source::parse("assets", timeout).unwrap().as_file().is_some());
    }
}
