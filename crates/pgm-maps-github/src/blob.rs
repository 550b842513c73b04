use base64::Engine;
use serde::Deserialize;

use pgm_maps::FetchError;

/// Response from GitHub's Git Blobs API.
/// `GET /repos/{owner}/{repo}/git/blobs/{sha}`
#[derive(Debug, Deserialize)]
pub struct BlobResponse {
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl BlobResponse {
    /// Decode the blob body into raw bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, FetchError> {
        let content = self.content.unwrap_or_default();

        match self.encoding.as_deref() {
            None | Some("base64") => {
                // GitHub returns base64 with newlines embedded
                let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();

                base64::engine::general_purpose::STANDARD
                    .decode(&cleaned)
                    .map_err(|e| FetchError::Parse(format!("base64 decode failed: {e}")))
            }
            Some("utf-8") => Ok(content.into_bytes()),
            Some(other) => Err(FetchError::Parse(format!("unsupported blob encoding: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_with_newlines() {
        let blob = BlobResponse {
            content: Some("aGVs\nbG8=\n".into()),
            encoding: Some("base64".into()),
        };
        assert_eq!(blob.into_bytes().unwrap(), b"hello");
    }

    #[test]
    fn passes_utf8_through() {
        let blob = BlobResponse {
            content: Some("plain".into()),
            encoding: Some("utf-8".into()),
        };
        assert_eq!(blob.into_bytes().unwrap(), b"plain");
    }

    #[test]
    fn missing_content_is_empty() {
        let blob = BlobResponse {
            content: None,
            encoding: Some("base64".into()),
        };
        assert!(blob.into_bytes().unwrap().is_empty());
    }

    #[test]
    fn invalid_base64_is_parse_error() {
        let blob = BlobResponse {
            content: Some("!!!".into()),
            encoding: None,
        };
        assert!(matches!(blob.into_bytes(), Err(FetchError::Parse(_))));
    }
}
