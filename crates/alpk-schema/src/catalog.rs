//! Catalog records: one package's metadata and dependency lists.
//!
//! The catalog is append-only during ingestion. Records are built up
//! field-by-field by the parsers in `alpk-core` and handed over here once
//! finalized; a record that never received a name is discarded before it
//! reaches the catalog.

use serde::Serialize;

use crate::checksum::Checksum;
use crate::pool::{DepId, SymbolId};

/// Handle to a record inside a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(u32);

/// Whether a package was built from a source package distinct from itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SourceName {
    /// No distinct source name: either none was declared, or the declared
    /// origin equals the package's own name.
    #[default]
    SamePackage,
    /// The package was built from a differently-named source package.
    Distinct(SymbolId),
}

/// One package's canonical catalog record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageRecord {
    /// Interned package name. Always set on finalized records.
    pub name: Option<SymbolId>,
    /// Interned version; finalized records default to the empty token.
    pub version: Option<SymbolId>,
    /// Interned architecture; finalized records default to `noarch`.
    pub arch: Option<SymbolId>,

    /// Capabilities this package provides, including the implicit
    /// `name = version` self-provide.
    pub provides: Vec<DepId>,
    /// Capabilities this package requires.
    pub requires: Vec<DepId>,
    /// Capabilities this package conflicts with.
    pub conflicts: Vec<DepId>,
    /// Composite install-if conditions (one AND-folded id per declared field).
    pub supplements: Vec<DepId>,

    /// One-line package summary.
    pub summary: Option<String>,
    /// Package description (the manifest formats carry a single text that
    /// fills both summary and description).
    pub description: Option<String>,
    /// Upstream project URL.
    pub url: Option<String>,
    /// Packager / maintainer string.
    pub packager: Option<String>,
    /// Build time as a UNIX timestamp.
    pub build_time: Option<u64>,
    /// Installed size in bytes.
    pub install_size: Option<u64>,
    /// License identifiers, in declaration order.
    pub licenses: Vec<String>,
    /// Source-package marker.
    pub source: SourceName,

    /// Digest over the raw manifest text (MD5).
    pub pkgid: Option<Checksum>,
    /// Digest over the compressed bytes of the manifest's container member
    /// (SHA1 or SHA256).
    pub hdrid: Option<Checksum>,
    /// Archive location this record was ingested from.
    pub location: Option<String>,
}

impl PackageRecord {
    fn compact(&mut self) {
        self.provides.shrink_to_fit();
        self.requires.shrink_to_fit();
        self.conflicts.shrink_to_fit();
        self.supplements.shrink_to_fit();
        self.licenses.shrink_to_fit();
    }
}

/// Append-only collection of finalized package records.
#[derive(Debug, Default, Serialize)]
pub struct Catalog {
    records: Vec<PackageRecord>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized record, returning its handle.
    pub fn push(&mut self, record: PackageRecord) -> RecordId {
        let id = RecordId(self.records.len() as u32);
        self.records.push(record);
        id
    }

    /// Look up a record by handle.
    pub fn get(&self, id: RecordId) -> Option<&PackageRecord> {
        self.records.get(id.0 as usize)
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records have been ingested.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Release over-allocated attribute storage after an ingestion pass.
    pub fn compact(&mut self) {
        for record in &mut self.records {
            record.compact();
        }
        self.records.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_get_round_trip() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());

        let record = PackageRecord {
            summary: Some("a test package".to_string()),
            ..PackageRecord::default()
        };
        let id = catalog.push(record);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get(id).and_then(|r| r.summary.as_deref()),
            Some("a test package")
        );
    }

    #[test]
    fn source_name_defaults_to_same_package() {
        let record = PackageRecord::default();
        assert_eq!(record.source, SourceName::SamePackage);
    }
}
