use std::path::Path;

use anyhow::{Context, Result};
use pgm_maps::{MapFetcher, MapWriter, SourceRegistry, SyncEngine, SyncReport};

/// Load the source list, then sync every source into `out_dir`.
///
/// The source list is read before any request is made, so a bad
/// configuration never touches the network. Fails only when the
/// configuration is unusable or every source failed.
pub async fn run(
    sources_file: &Path,
    out_dir: &Path,
    fetcher: &dyn MapFetcher,
    dry_run: bool,
) -> Result<SyncReport> {
    let registry = SourceRegistry::load(sources_file)
        .with_context(|| format!("failed to load sources from {}", sources_file.display()))?;

    let engine = SyncEngine::new(fetcher, MapWriter::new(out_dir)).dry_run(dry_run);
    let report = engine.run(registry.sources()).await;

    print_report(&report, dry_run);

    if report.all_failed() {
        anyhow::bail!("all {} sources failed to sync", report.outcomes.len());
    }

    Ok(report)
}

fn print_report(report: &SyncReport, dry_run: bool) {
    for outcome in &report.outcomes {
        let Ok(source) = &outcome.result else {
            continue;
        };

        if dry_run {
            for change in &source.changed {
                println!("{} -> {} -> {}", outcome.label, change.remote.path, change.target);
            }
        }

        for failure in &source.failures {
            tracing::warn!(
                source = %outcome.label,
                path = %failure.path,
                error = %failure.error,
                "map not synced"
            );
        }
    }

    let verb = if dry_run { "to download" } else { "downloaded" };
    tracing::info!(
        "Finished processing map images: {} {verb}, {} up to date, {} skipped, {} failed ({} of {} sources failed)",
        report.changed(),
        report.up_to_date(),
        report.skipped(),
        report.file_failures(),
        report.failed_sources(),
        report.outcomes.len(),
    );
}
