use std::sync::Arc;

use crate::source::Source;

/// A map image available in a remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// `owner/name` of the repository the file lives in.
    pub repository: String,
    /// Branch the listing was resolved against.
    pub git_ref: String,
    /// Path relative to the repository root.
    pub path: String,
    /// Git blob SHA, used as the content identifier.
    pub sha: String,
}

/// Errors that can occur when talking to a remote source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limit exceeded{}: {message}", auth_hint(.authenticated))]
    RateLimited { authenticated: bool, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("parse error: {0}")]
    Parse(String),
}

fn auth_hint(authenticated: &bool) -> &'static str {
    if *authenticated {
        ""
    } else {
        " (unauthenticated, set GITHUB_TOKEN for a higher limit)"
    }
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Lists and downloads map images from a remote source.
#[async_trait::async_trait]
pub trait MapFetcher: Send + Sync {
    /// Human-readable label identifying this fetcher.
    fn label(&self) -> &str;

    /// List all map images visible for `source`, after its path filter.
    async fn list(&self, source: &Source) -> Result<Vec<RemoteFile>, FetchError>;

    /// Download the raw bytes of a listed file.
    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, FetchError>;
}

#[async_trait::async_trait]
impl<T: MapFetcher + ?Sized> MapFetcher for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn list(&self, source: &Source) -> Result<Vec<RemoteFile>, FetchError> {
        (**self).list(source).await
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, FetchError> {
        (**self).download(file).await
    }
}
