use pgm_maps::{FetchError, MapFetcher, RemoteFile, Source, is_map_image};
use serde::de::DeserializeOwned;

use crate::blob::BlobResponse;
use crate::repo::{BranchResponse, ErrorResponse, RepoResponse};
use crate::tree::TreeResponse;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = "pgm-map-sync";

/// Configuration for the GitHub map fetcher.
#[derive(Debug, Clone, Default)]
pub struct GitHubFetcherConfig {
    pub token: Option<String>,
    pub api_base_url: Option<String>,
    pub raw_base_url: Option<String>,
}

/// Lists `map.png` files through the Git Trees API and downloads them from
/// raw.githubusercontent.com, falling back to the Blobs API for private
/// repositories when a token is configured.
pub struct GitHubMapFetcher {
    config: GitHubFetcherConfig,
    client: reqwest::Client,
}

impl GitHubMapFetcher {
    pub fn new(config: GitHubFetcherConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    fn raw_base(&self) -> &str {
        self.config
            .raw_base_url
            .as_deref()
            .unwrap_or(DEFAULT_RAW_BASE)
            .trim_end_matches('/')
    }

    fn build_request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url).header("User-Agent", USER_AGENT);

        if let Some(token) = &self.config.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, FetchError> {
        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        self.check_status(response).await
    }

    /// Map non-success statuses onto `FetchError`, recognizing GitHub's
    /// rate limit responses (429, or 403 with an exhausted quota).
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }

        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));

        let rate_limited = status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || (status == reqwest::StatusCode::FORBIDDEN
                && (quota_exhausted || message.to_lowercase().contains("rate limit")));

        if rate_limited {
            return Err(FetchError::RateLimited {
                authenticated: self.is_authenticated(),
                message,
            });
        }

        Err(FetchError::Http {
            status: status.as_u16(),
            url,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, FetchError> {
        let req = self
            .build_request(url)
            .header("Accept", "application/vnd.github+json");

        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// The configured branch, or the repository's default branch.
    async fn resolve_branch(&self, source: &Source) -> Result<String, FetchError> {
        if let Some(branch) = &source.branch {
            return Ok(branch.clone());
        }

        let url = endpoint(self.api_base(), ["repos", source.repository.as_str()])?;
        let repo: RepoResponse = self.get_json(url).await?;

        Ok(repo.default_branch.unwrap_or_else(|| "main".into()))
    }

    async fn branch_commit(&self, repository: &str, branch: &str) -> Result<String, FetchError> {
        let url = endpoint(self.api_base(), ["repos", repository, "branches", branch])?;
        let response: BranchResponse = self.get_json(url).await?;
        Ok(response.commit.sha)
    }

    async fn download_blob(&self, file: &RemoteFile) -> Result<Vec<u8>, FetchError> {
        let url = endpoint(
            self.api_base(),
            ["repos", file.repository.as_str(), "git", "blobs", file.sha.as_str()],
        )?;
        let blob: BlobResponse = self.get_json(url).await?;
        blob.into_bytes()
    }
}

/// Append path segments to `base`, percent-encoding each one.
///
/// Segments are split on `/` first, so `owner/name`, branch names like
/// `feature/maps` and repository paths become one URL segment per component.
fn endpoint<'s>(
    base: &str,
    segments: impl IntoIterator<Item = &'s str>,
) -> Result<reqwest::Url, FetchError> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| FetchError::Parse(format!("invalid base URL {base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| FetchError::Parse(format!("base URL cannot take a path: {base}")))?
        .pop_if_empty()
        .extend(
            segments
                .into_iter()
                .flat_map(|s| s.split('/'))
                .filter(|s| !s.is_empty()),
        );

    Ok(url)
}

#[async_trait::async_trait]
impl MapFetcher for GitHubMapFetcher {
    fn label(&self) -> &str {
        "github"
    }

    async fn list(&self, source: &Source) -> Result<Vec<RemoteFile>, FetchError> {
        let branch = self.resolve_branch(source).await?;
        let commit = self.branch_commit(&source.repository, &branch).await?;

        let mut url = endpoint(
            self.api_base(),
            ["repos", source.repository.as_str(), "git", "trees", commit.as_str()],
        )?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let response: TreeResponse = self.get_json(url).await?;

        if response.truncated {
            tracing::warn!(
                repository = %source.repository,
                "tree response was truncated; some maps may be missing"
            );
        }

        Ok(response
            .tree
            .into_iter()
            .filter(|entry| entry.is_blob())
            .filter(|entry| is_map_image(&entry.path) && source.matches_path(&entry.path))
            .map(|entry| RemoteFile {
                repository: source.repository.clone(),
                git_ref: branch.clone(),
                path: entry.path,
                sha: entry.sha,
            })
            .collect())
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, FetchError> {
        let url = endpoint(
            self.raw_base(),
            [
                file.repository.as_str(),
                file.git_ref.as_str(),
                file.path.as_str(),
            ],
        )?;

        match self.send(self.build_request(url.clone())).await {
            Ok(response) => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| FetchError::Network(format!("failed to read {url}: {e}"))),
            // Private repositories are not served from the raw host
            Err(FetchError::NotFound(_)) if self.is_authenticated() => {
                tracing::debug!(path = %file.path, "raw download not found, using blob API");
                self.download_blob(file).await
            }
            Err(e) => Err(e),
        }
    }
}
