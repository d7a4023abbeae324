//! Concrete resource sources: a local directory and an HTTP base URL.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, Url};

use super::{Fetched, ResourceSource};
use crate::error::AppError;

/// Resources are files directly under `root`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for FileSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, name: &str) -> Result<Fetched, AppError> {
        // Names resolve relative to the root and may not climb out of it.
        let relative = Path::new(name);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Ok(Fetched {
                status: 400,
                body: String::new(),
            });
        }

        let path = self.root.join(relative);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Fetched { status: 0, body }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Fetched {
                status: 404,
                body: String::new(),
            }),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(Fetched {
                status: 403,
                body: String::new(),
            }),
            Err(e) => Err(AppError::new(
                4,
                format!("Failed to read '{}': {e}", path.display()),
            )),
        }
    }
}

/// Resources are URLs relative to `base`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, AppError> {
        // `Url::join` replaces the last path segment unless the base ends in `/`.
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&base).map_err(|e| AppError::new(2, format!("Invalid source URL '{base}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    pub fn resource_url(&self, name: &str) -> Result<Url, AppError> {
        self.base
            .join(name)
            .map_err(|e| AppError::new(2, format!("Invalid resource name '{name}': {e}")))
    }
}

impl ResourceSource for HttpSource {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    async fn fetch(&self, name: &str) -> Result<Fetched, AppError> {
        let url = self.resource_url(name)?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::new(4, format!("Request to {url} failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::new(4, format!("Failed to read body from {url}: {e}")))?;

        Ok(Fetched { status, body })
    }
}
