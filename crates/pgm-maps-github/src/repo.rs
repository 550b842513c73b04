use serde::Deserialize;

/// `GET /repos/{owner}/{repo}`, only the fields we read.
#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    pub default_branch: Option<String>,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Deserialize)]
pub struct BranchResponse {
    pub commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// Error body GitHub returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
