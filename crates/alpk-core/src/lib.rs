//! Ingestion of Alpine-style package archives and indexes.
//!
//! Converts `.apk` package archives and `APKINDEX` streams into canonical
//! catalog records for the resolution engine. Two entry points:
//!
//! - [`ingest_package`] opens a path as a concatenated-gzip archive, skips
//!   the signature member, and parses the `.PKGINFO` manifest of the control
//!   member into one record.
//! - [`ingest_index`] consumes an already-decompressed byte stream of index
//!   text (or a tar archive containing it) into many records.
//!
//! Both take the shared [`SymbolPool`](alpk_schema::SymbolPool) and
//! [`Catalog`](alpk_schema::Catalog) as explicit handles; ingestion is
//! single-threaded, synchronous and append-only.

pub mod deps;
pub mod error;
pub mod hdrid;
pub mod index;
pub mod pkginfo;
mod record;
pub mod stream;

pub use error::IngestError;
pub use index::ingest_index;
pub use pkginfo::ingest_package;

/// Independent option flags for ingestion. The default is all off.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Compute the pkgid: an MD5 digest over the raw manifest text.
    pub with_pkgid: bool,
    /// Compute the hdrid: a SHA1 digest over the compressed bytes of the
    /// manifest's container member.
    pub with_hdrid: bool,
    /// Do not store the archive location on the record.
    pub no_location: bool,
    /// Do not compact catalog attribute storage after ingestion.
    pub no_compaction: bool,
    /// Resolve the archive path against the pool's configured root
    /// directory before opening.
    pub use_root_dir: bool,
    /// Treat the index stream as raw index text instead of a tar archive
    /// containing an `APKINDEX` entry.
    pub index_is_text: bool,
}
