//! Errors surfaced by the ingestion entry points.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting a package archive or an index.
///
/// Failures are terminal for their unit of work: the whole file for
/// single-package ingestion, the current record only for index ingestion
/// (records already added to the catalog are retained).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The archive path could not be opened.
    #[error("failed to open {path}")]
    Open {
        /// The path as it was opened (after any root-dir resolution).
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The compressed stream or archive structure is corrupt or truncated.
    #[error("corrupt or truncated archive")]
    Archive(#[from] io::Error),

    /// A manifest entry declared a length over the 10 MiB guard; it is
    /// never parsed.
    #[error("oversized package manifest ({0} bytes)")]
    OversizedManifest(u64),

    /// The manifest was parsed to completion but never declared a name.
    #[error("package has no name")]
    MissingName,

    /// The archive contains no package manifest entry.
    #[error("archive contains no package manifest")]
    MissingManifest,
}
