pub mod fetch;
pub mod layout;
pub mod source;
pub mod sync;
pub mod writer;

pub use fetch::{FetchError, MapFetcher, RemoteFile};
pub use layout::{MapTarget, is_map_image, target_for, target_for_source};
pub use source::{ConfigError, Source, SourceRegistry};
pub use sync::{
    FileFailure, MapChange, SourceOutcome, SourceReport, SyncEngine, SyncError, SyncReport,
};
pub use writer::{LocalFile, MapWriter, WriteError};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
