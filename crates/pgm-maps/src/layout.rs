use std::fmt;
use std::path::{Path, PathBuf};

use crate::source::Source;

pub const MAP_FILE_NAME: &str = "map.png";
pub const MARKER_FILE_NAME: &str = ".map_sha";

/// True if the last path segment is `map.png`, ignoring case.
pub fn is_map_image(repo_path: &str) -> bool {
    repo_path
        .rsplit('/')
        .next()
        .is_some_and(|name| name.eq_ignore_ascii_case(MAP_FILE_NAME))
}

/// Destination directory of a map, relative to the output directory.
///
/// Holds one component (`{base}`) or two (`{base}/{variant}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapTarget {
    components: Vec<String>,
}

impl MapTarget {
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn relative_dir(&self) -> PathBuf {
        self.components.iter().collect()
    }

    pub fn image_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.relative_dir()).join(MAP_FILE_NAME)
    }

    pub fn marker_path(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.relative_dir()).join(MARKER_FILE_NAME)
    }
}

impl fmt::Display for MapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{MAP_FILE_NAME}", self.components.join("/"))
    }
}

/// Map a repository path to its destination.
///
/// Directory layout:
/// - `maps/<base>/map.png` -> `<base>`
/// - `maps/<base>/<variant>/map.png` -> `<base>/<variant>`
/// - `<base>/map.png` -> `<base>`
/// - deeper nesting keeps only `<base>` (the second directory)
///
/// Returns `None` for non-map files, a `map.png` at the repository root,
/// and components that would escape the output directory.
pub fn target_for(repo_path: &str) -> Option<MapTarget> {
    if !is_map_image(repo_path) {
        return None;
    }

    let segments = directories(repo_path);

    let kept: &[&str] = match segments.as_slice() {
        [] => return None,
        [only] => std::slice::from_ref(only),
        [_, base_and_variant @ ..] if base_and_variant.len() == 2 => base_and_variant,
        [_, base, ..] => std::slice::from_ref(base),
    };

    build_target(kept)
}

/// Map a repository path to its destination relative to a source's `path` filter.
///
/// Below the filter directory:
/// - `<base>/map.png` -> `<base>`
/// - `<base>/<variant>/map.png` -> `<base>/<variant>`
/// - deeper nesting keeps only `<base>`
/// - `map.png` directly in the filter directory uses the filter's last
///   directory as `<base>`
///
/// Without a filter this is [`target_for`]. Paths outside the filter have
/// no destination.
pub fn target_for_source(source: &Source, repo_path: &str) -> Option<MapTarget> {
    let Some(prefix) = source.path_prefix() else {
        return target_for(repo_path);
    };

    if !is_map_image(repo_path) {
        return None;
    }

    let relative = repo_path.strip_prefix(&prefix)?;
    let segments = directories(relative);

    let kept: &[&str] = match segments.as_slice() {
        [] => {
            let last = prefix.trim_end_matches('/').rsplit('/').next()?;
            return build_target(&[last]);
        }
        [base] | [base, _, _, ..] => std::slice::from_ref(base),
        base_and_variant => base_and_variant,
    };

    build_target(kept)
}

/// Directory segments of a path, without the file name.
fn directories(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.pop();
    segments
}

fn build_target(kept: &[&str]) -> Option<MapTarget> {
    if kept.iter().any(|c| !is_safe_component(c)) {
        return None;
    }

    Some(MapTarget {
        components: kept.iter().map(|c| (*c).to_owned()).collect(),
    })
}

fn is_safe_component(component: &str) -> bool {
    component != "." && component != ".." && !component.contains(['\\', ':'])
}
