use std::collections::HashSet;

use crate::fetch::{FetchError, MapFetcher, RemoteFile};
use crate::layout::{MapTarget, target_for_source};
use crate::source::Source;
use crate::writer::{MapWriter, WriteError};

/// Errors for a single file during a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// A file that could not be synced. The run continues past it.
#[derive(Debug)]
pub struct FileFailure {
    pub path: String,
    pub error: SyncError,
}

/// A remote file that was (or, in a dry run, would be) downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapChange {
    pub remote: RemoteFile,
    pub target: MapTarget,
}

/// Results of syncing a single source.
#[derive(Debug, Default)]
pub struct SourceReport {
    pub changed: Vec<MapChange>,
    pub up_to_date: u64,
    /// Files with no destination, or whose destination an earlier source claimed.
    pub skipped: u64,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug)]
pub struct SourceOutcome {
    pub label: String,
    pub result: Result<SourceReport, FetchError>,
}

/// Results of a whole sync run, one outcome per source in order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl SyncReport {
    fn reports(&self) -> impl Iterator<Item = &SourceReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn changed(&self) -> usize {
        self.reports().map(|r| r.changed.len()).sum()
    }

    pub fn up_to_date(&self) -> u64 {
        self.reports().map(|r| r.up_to_date).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.reports().map(|r| r.skipped).sum()
    }

    pub fn file_failures(&self) -> usize {
        self.reports().map(|r| r.failures.len()).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// True if there was at least one source and every one of them failed to list.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.failed_sources() == self.outcomes.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_sources() > 0 || self.file_failures() > 0
    }
}

/// Runs the fetch, compare and write cycle over a list of sources.
///
/// Sources are processed one at a time, files one at a time. When two
/// sources map a file to the same destination, the first one wins.
pub struct SyncEngine<'a> {
    fetcher: &'a dyn MapFetcher,
    writer: MapWriter,
    dry_run: bool,
}

impl<'a> SyncEngine<'a> {
    pub fn new(fetcher: &'a dyn MapFetcher, writer: MapWriter) -> Self {
        Self {
            fetcher,
            writer,
            dry_run: false,
        }
    }

    /// In a dry run, changed files are reported but never downloaded or written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn writer(&self) -> &MapWriter {
        &self.writer
    }

    pub async fn run(&self, sources: &[Source]) -> SyncReport {
        let mut claimed = HashSet::new();
        let mut report = SyncReport::default();

        tracing::info!(
            fetcher = self.fetcher.label(),
            out_dir = %self.writer.out_dir().display(),
            sources = sources.len(),
            "starting sync run"
        );

        for source in sources {
            tracing::info!(source = source.label(), "processing source");

            let result = self.sync_source(source, &mut claimed).await;
            if let Err(e) = &result {
                tracing::warn!(source = source.label(), error = %e, "skipping source");
            }

            report.outcomes.push(SourceOutcome {
                label: source.label().to_owned(),
                result,
            });
        }

        report
    }

    async fn sync_source(
        &self,
        source: &Source,
        claimed: &mut HashSet<MapTarget>,
    ) -> Result<SourceReport, FetchError> {
        let files = self.fetcher.list(source).await?;
        let mut report = SourceReport::default();

        for remote in files {
            let Some(target) = target_for_source(source, &remote.path) else {
                tracing::debug!(path = %remote.path, "no destination for map, skipping");
                report.skipped += 1;
                continue;
            };

            if !claimed.insert(target.clone()) {
                tracing::warn!(
                    path = %remote.path,
                    target = %target,
                    "destination already synced from another file this run, skipping"
                );
                report.skipped += 1;
                continue;
            }

            if self
                .writer
                .local_file(&target)
                .is_some_and(|local| local.sha == remote.sha)
            {
                tracing::debug!(path = %remote.path, target = %target, "up to date");
                report.up_to_date += 1;
                continue;
            }

            if self.dry_run {
                tracing::info!(path = %remote.path, target = %target, "would download");
                report.changed.push(MapChange { remote, target });
                continue;
            }

            tracing::info!(
                source = source.label(),
                path = %remote.path,
                target = %target,
                "downloading"
            );

            match self.download_and_write(&remote, &target).await {
                Ok(()) => report.changed.push(MapChange { remote, target }),
                Err(error) => {
                    tracing::error!(path = %remote.path, error = %error, "failed to sync map");
                    report.failures.push(FileFailure {
                        path: remote.path,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn download_and_write(
        &self,
        remote: &RemoteFile,
        target: &MapTarget,
    ) -> Result<(), SyncError> {
        let bytes = self.fetcher.download(remote).await?;
        self.writer.write(target, &bytes, &remote.sha)?;
        Ok(())
    }
}
