//! Shared data model for the alpk catalog.
//!
//! This crate holds the pieces the ingestion engine and the resolution engine
//! exchange: the process-wide symbol pool, the catalog of package records,
//! and checksum value types. It has no I/O of its own.

pub mod catalog;
pub mod checksum;
pub mod pool;

pub use catalog::{Catalog, PackageRecord, RecordId, SourceName};
pub use checksum::{Checksum, ChecksumKind};
pub use pool::{DepId, RelFlags, RelId, RelOp, SymbolId, SymbolPool};
