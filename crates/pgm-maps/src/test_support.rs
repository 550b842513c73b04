use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::layout::is_map_image;
use crate::{FetchError, MapFetcher, RemoteFile, Source};

/// In-memory fetcher for testing. Files are keyed by repository and path;
/// adding a file at an existing path replaces it.
pub struct InMemoryFetcher {
    label: String,
    repos: Mutex<HashMap<String, BTreeMap<String, (String, Vec<u8>)>>>,
    listing_failures: HashMap<String, fn() -> FetchError>,
    download_failures: HashSet<String>,
    list_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl InMemoryFetcher {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            repos: Mutex::new(HashMap::new()),
            listing_failures: HashMap::new(),
            download_failures: HashSet::new(),
            list_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, repository: &str, path: &str, sha: &str, bytes: &[u8]) {
        self.repos
            .lock()
            .unwrap()
            .entry(repository.to_owned())
            .or_default()
            .insert(path.to_owned(), (sha.to_owned(), bytes.to_vec()));
    }

    /// Make `list` fail for `repository` with the error built by `make_error`.
    pub fn fail_listing(&mut self, repository: &str, make_error: fn() -> FetchError) {
        self.listing_failures
            .insert(repository.to_owned(), make_error);
    }

    /// Make `download` fail for the file at `path`.
    pub fn fail_download(&mut self, path: &str) {
        self.download_failures.insert(path.to_owned());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MapFetcher for InMemoryFetcher {
    fn label(&self) -> &str {
        &self.label
    }

    async fn list(&self, source: &Source) -> Result<Vec<RemoteFile>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(make_error) = self.listing_failures.get(&source.repository) {
            return Err(make_error());
        }

        let repos = self.repos.lock().unwrap();
        let files = repos
            .get(&source.repository)
            .ok_or_else(|| FetchError::NotFound(source.repository.clone()))?;

        let git_ref = source.branch.clone().unwrap_or_else(|| "main".to_owned());

        Ok(files
            .iter()
            .filter(|(path, _)| is_map_image(path) && source.matches_path(path))
            .map(|(path, (sha, _))| RemoteFile {
                repository: source.repository.clone(),
                git_ref: git_ref.clone(),
                path: path.clone(),
                sha: sha.clone(),
            })
            .collect())
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>, FetchError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        if self.download_failures.contains(&file.path) {
            return Err(FetchError::Network(format!("download of {} failed", file.path)));
        }

        self.repos
            .lock()
            .unwrap()
            .get(&file.repository)
            .and_then(|files| files.get(&file.path))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| FetchError::NotFound(file.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_returns_only_map_images() {
        let fetcher = InMemoryFetcher::new("test");
        fetcher.add("a/b", "maps/one/map.png", "s1", b"1");
        fetcher.add("a/b", "maps/one/readme.md", "s2", b"2");

        let files = fetcher.list(&Source::new("a/b")).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "maps/one/map.png");
        assert_eq!(files[0].git_ref, "main");
        assert_eq!(fetcher.list_calls(), 1);
    }

    #[tokio::test]
    async fn list_unknown_repository_is_not_found() {
        let fetcher = InMemoryFetcher::new("test");
        let result = fetcher.list(&Source::new("no/such")).await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn download_returns_stored_bytes() {
        let fetcher = InMemoryFetcher::new("test");
        fetcher.add("a/b", "maps/one/map.png", "s1", b"bytes");

        let files = fetcher.list(&Source::new("a/b")).await.unwrap();
        let bytes = fetcher.download(&files[0]).await.unwrap();
        assert_eq!(bytes, b"bytes");
        assert_eq!(fetcher.download_calls(), 1);
    }
}
