pub mod blob;
pub mod fetcher;
pub mod repo;
pub mod tree;

pub use fetcher::{GitHubFetcherConfig, GitHubMapFetcher};
