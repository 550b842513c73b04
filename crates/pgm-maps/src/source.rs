use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur while loading the configured sources.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sources file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed sources file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("no GitHub repositories listed in {}", .0.display())]
    Empty(PathBuf),

    #[error("invalid repository {0:?}: expected owner/name")]
    InvalidRepository(String),
}

/// A remote repository to scan for map images.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    /// `owner/name` on GitHub.
    pub repository: String,
    /// Branch to read. Falls back to the repository's default branch.
    #[serde(default)]
    pub branch: Option<String>,
    /// Only consider files under this directory of the repository.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Source {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: None,
            path: None,
            enabled: true,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.repository
    }

    /// Normalized `path` filter with a trailing slash, or `None` when unset or empty.
    pub fn path_prefix(&self) -> Option<String> {
        let trimmed = self.path.as_deref()?.trim_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(format!("{trimmed}/"))
        }
    }

    /// True if a repository path passes this source's `path` filter.
    pub fn matches_path(&self, repo_path: &str) -> bool {
        match self.path_prefix() {
            Some(prefix) => repo_path.starts_with(&prefix),
            None => true,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.repository.split_once('/') {
            Some((owner, name))
                if !owner.trim().is_empty() && !name.trim().is_empty() && !name.contains('/') =>
            {
                Ok(())
            }
            _ => Err(ConfigError::InvalidRepository(self.repository.clone())),
        }
    }
}

/// The ordered list of sources loaded from a `sources.json` file.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Load sources from a JSON file of the form `{"sources": [...]}`.
    ///
    /// Disabled sources are dropped. An absent file, invalid JSON, a missing
    /// or non-list `sources` key, an empty list, or a bad repository
    /// identifier are all reported as [`ConfigError`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_owned())
            } else {
                ConfigError::Read {
                    path: path.to_owned(),
                    source: e,
                }
            }
        })?;

        Self::parse(&contents, path)
    }

    /// Parse the contents of a sources file. `origin` is only used in errors.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let malformed = |reason: String| ConfigError::Malformed {
            path: origin.to_owned(),
            reason,
        };

        let mut document: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;

        let entries = match document.get_mut("sources").map(serde_json::Value::take) {
            Some(value @ serde_json::Value::Array(_)) => value,
            _ => return Err(malformed(r#""sources" must be a list"#.into())),
        };

        let entries: Vec<Source> =
            serde_json::from_value(entries).map_err(|e| malformed(e.to_string()))?;

        let mut sources = Vec::with_capacity(entries.len());
        for source in entries {
            source.validate()?;
            if !source.enabled {
                tracing::info!(repository = %source.repository, "source disabled, skipping");
                continue;
            }
            sources.push(source);
        }

        if sources.is_empty() {
            return Err(ConfigError::Empty(origin.to_owned()));
        }

        Ok(Self { sources })
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(json: &str) -> Result<SourceRegistry, ConfigError> {
        SourceRegistry::parse(json, Path::new("sources.json"))
    }

    #[test]
    fn parses_sources_in_order() {
        let registry = parse(
            r#"{"sources": [
                {"repository": "alpha/maps"},
                {"repository": "beta/maps", "branch": "dev", "path": "assets/maps"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(registry.sources().len(), 2);
        assert_eq!(registry.sources()[0], Source::new("alpha/maps"));
        assert_eq!(
            registry.sources()[1],
            Source::new("beta/maps").with_branch("dev").with_path("assets/maps")
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceRegistry::load(&dir.path().join("sources.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sources": [{{"repository": "owner/repo"}}]}}"#).unwrap();

        let registry = SourceRegistry::load(file.path()).unwrap();
        assert_eq!(registry.sources()[0].repository, "owner/repo");
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse("{not json"),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn sources_must_be_a_list() {
        assert!(matches!(
            parse(r#"{"sources": {"repository": "a/b"}}"#),
            Err(ConfigError::Malformed { .. })
        ));
        assert!(matches!(
            parse(r#"{"repos": []}"#),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn entry_without_repository_is_malformed() {
        assert!(matches!(
            parse(r#"{"sources": [{"branch": "main"}]}"#),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            parse(r#"{"sources": []}"#),
            Err(ConfigError::Empty(_))
        ));
    }

    #[test]
    fn all_disabled_is_empty() {
        assert!(matches!(
            parse(r#"{"sources": [{"repository": "a/b", "enabled": false}]}"#),
            Err(ConfigError::Empty(_))
        ));
    }

    #[test]
    fn disabled_sources_are_dropped() {
        let registry = parse(
            r#"{"sources": [
                {"repository": "a/one", "enabled": false},
                {"repository": "a/two"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(registry.sources().len(), 1);
        assert_eq!(registry.sources()[0].repository, "a/two");
    }

    #[test]
    fn rejects_bad_repository_identifiers() {
        for repo in ["", "justname", "/name", "owner/", "a/b/c"] {
            let json = format!(r#"{{"sources": [{{"repository": "{repo}"}}]}}"#);
            assert!(
                matches!(parse(&json), Err(ConfigError::InvalidRepository(_))),
                "expected {repo:?} to be rejected"
            );
        }
    }

    #[test]
    fn path_prefix_is_normalized() {
        assert_eq!(
            Source::new("a/b").with_path("/maps/").path_prefix().as_deref(),
            Some("maps/")
        );
        assert_eq!(Source::new("a/b").with_path("").path_prefix(), None);
        assert_eq!(Source::new("a/b").path_prefix(), None);
    }

    #[test]
    fn path_filter_matches_whole_directories() {
        let source = Source::new("a/b").with_path("maps");
        assert!(source.matches_path("maps/city/map.png"));
        assert!(!source.matches_path("mapsold/city/map.png"));
        assert!(!source.matches_path("other/map.png"));
        assert!(Source::new("a/b").matches_path("anything/map.png"));
    }
}
