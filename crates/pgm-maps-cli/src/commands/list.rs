use std::path::Path;

use anyhow::{Context, Result};
use pgm_maps::{MapFetcher, SourceRegistry, target_for_source};

/// Print every map each source exposes, with its destination.
pub async fn run(sources_file: &Path, fetcher: &dyn MapFetcher) -> Result<()> {
    let registry = SourceRegistry::load(sources_file)
        .with_context(|| format!("failed to load sources from {}", sources_file.display()))?;

    let mut failed = 0usize;

    for source in registry.sources() {
        let files = match fetcher.list(source).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(source = source.label(), error = %e, "could not list source");
                failed += 1;
                continue;
            }
        };

        println!("{} via {} ({}):", source.label(), fetcher.label(), files.len());
        for file in &files {
            match target_for_source(source, &file.path) {
                Some(target) => println!("  {} -> {target}", file.path),
                None => println!("  {} (no destination)", file.path),
            }
        }
    }

    if failed == registry.sources().len() {
        anyhow::bail!("all {failed} sources failed to list");
    }

    Ok(())
}
