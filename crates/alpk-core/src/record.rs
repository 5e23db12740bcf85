//! Shared field semantics for both manifest grammars.
//!
//! The single-manifest (`key = value`) and index (`<letter>:<value>`) forms
//! differ only in line syntax; the mapping from attributes to record fields
//! and the finalization rules are identical and live here.

use alpk_schema::{DepId, PackageRecord, RelFlags, RelOp, SourceName, SymbolPool};

use crate::deps::{DepKind, parse_dep_field};
use crate::hdrid::decode_checksum_id;

/// Architecture sentinel for records that never declared one.
const NOARCH: &str = "noarch";

/// A recognized manifest attribute, independent of line syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attr {
    /// Package name (`pkgname` / `P`).
    Name,
    /// Package version (`pkgver` / `V`).
    Version,
    /// One-line text filling both summary and description (`pkgdesc` / `T`).
    Description,
    /// Project URL (`url` / `U`).
    Url,
    /// Build timestamp (`builddate` / `t`).
    BuildTime,
    /// Packager string (`packager`).
    Packager,
    /// Installed size in bytes (`size` / `I`).
    InstallSize,
    /// Architecture (`arch` / `A`).
    Arch,
    /// License, appended to the license list (`license` / `L`).
    License,
    /// Source-package origin (`origin` / `o`).
    Origin,
    /// Requires dependency field (`depend` / `D`).
    Requires,
    /// Provides dependency field (`provides` / `p`).
    Provides,
    /// Install-if dependency field (`install_if` / `i`).
    InstallIf,
    /// Compact header-checksum identifier (`C`, index form only).
    HeaderChecksum,
}

/// Accumulates one record's fields while its manifest block is scanned.
#[derive(Debug, Default)]
pub(crate) struct RecordBuilder {
    record: PackageRecord,
}

impl RecordBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Apply one attribute line's value to the record in progress.
    pub(crate) fn apply(&mut self, pool: &mut SymbolPool, attr: Attr, value: &str) {
        let record = &mut self.record;
        match attr {
            Attr::Name => record.name = Some(pool.intern(value)),
            Attr::Version => record.version = Some(pool.intern(value)),
            Attr::Description => {
                record.summary = Some(value.to_string());
                record.description = Some(value.to_string());
            }
            Attr::Url => record.url = Some(value.to_string()),
            Attr::BuildTime => record.build_time = Some(parse_uint(value)),
            Attr::Packager => record.packager = Some(value.to_string()),
            Attr::InstallSize => record.install_size = Some(parse_uint(value)),
            Attr::Arch => record.arch = Some(pool.intern(value)),
            Attr::License => record.licenses.push(value.to_string()),
            Attr::Origin => {
                record.source = match record.name {
                    // A self-referential origin carries no information.
                    Some(name) if pool.resolve(name) == value => SourceName::SamePackage,
                    _ => SourceName::Distinct(pool.intern(value)),
                };
            }
            Attr::Requires => parse_dep_field(pool, record, DepKind::Requires, value),
            Attr::Provides => parse_dep_field(pool, record, DepKind::Provides, value),
            Attr::InstallIf => parse_dep_field(pool, record, DepKind::Supplements, value),
            Attr::HeaderChecksum => {
                // Malformed identifiers are ignored; the record simply keeps
                // no header checksum.
                if let Some(sum) = decode_checksum_id(value) {
                    record.hdrid = Some(sum);
                }
            }
        }
    }

    /// Finish the record: apply defaults and the implicit self-provide.
    /// Returns `None` if no name was ever set, discarding the record.
    pub(crate) fn finalize(mut self, pool: &mut SymbolPool) -> Option<PackageRecord> {
        let name = self.record.name?;

        let version = *self
            .record
            .version
            .get_or_insert_with(|| pool.intern(""));
        if self.record.arch.is_none() {
            self.record.arch = Some(pool.intern(NOARCH));
        }

        let self_provide = pool.rel(
            DepId::Name(name),
            DepId::Name(version),
            RelOp::Cmp(RelFlags::EQ),
        );
        if !self.record.provides.contains(&self_provide) {
            self.record.provides.push(self_provide);
        }

        Some(self.record)
    }
}

/// `strtoull`-style parse: optional leading ASCII whitespace and `+`, then
/// decimal digits; anything else is 0.
fn parse_uint(value: &str) -> u64 {
    let rest = value.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let rest = rest.strip_prefix('+').unwrap_or(rest);
    let digits: &str = &rest[..rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len())];
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_record_is_discarded() {
        let mut pool = SymbolPool::new();
        let mut builder = RecordBuilder::new();
        builder.apply(&mut pool, Attr::Version, "1.0");
        assert!(builder.finalize(&mut pool).is_none());
    }

    #[test]
    fn finalize_applies_defaults_and_self_provide() {
        let mut pool = SymbolPool::new();
        let mut builder = RecordBuilder::new();
        builder.apply(&mut pool, Attr::Name, "busybox");
        let record = builder.finalize(&mut pool).unwrap();

        assert_eq!(record.arch.map(|a| pool.resolve(a)), Some(NOARCH));
        assert_eq!(record.version.map(|v| pool.resolve(v)), Some(""));
        assert_eq!(record.provides.len(), 1);
        assert_eq!(pool.dep_str(record.provides[0]), "busybox=");
    }

    #[test]
    fn explicit_self_provide_is_not_duplicated() {
        let mut pool = SymbolPool::new();
        let mut builder = RecordBuilder::new();
        builder.apply(&mut pool, Attr::Name, "busybox");
        builder.apply(&mut pool, Attr::Version, "1.36.1-r5");
        builder.apply(&mut pool, Attr::Provides, "busybox=1.36.1-r5 /bin/sh");
        let record = builder.finalize(&mut pool).unwrap();

        let rendered: Vec<String> = record
            .provides
            .iter()
            .map(|&d| pool.dep_str(d))
            .collect();
        assert_eq!(rendered, ["busybox=1.36.1-r5", "/bin/sh"]);
    }

    #[test]
    fn self_referential_origin_is_no_distinct_source() {
        let mut pool = SymbolPool::new();
        let mut builder = RecordBuilder::new();
        builder.apply(&mut pool, Attr::Name, "busybox");
        builder.apply(&mut pool, Attr::Origin, "busybox");
        let record = builder.finalize(&mut pool).unwrap();
        assert_eq!(record.source, SourceName::SamePackage);
    }

    #[test]
    fn distinct_origin_is_interned() {
        let mut pool = SymbolPool::new();
        let mut builder = RecordBuilder::new();
        builder.apply(&mut pool, Attr::Name, "busybox-extras");
        builder.apply(&mut pool, Attr::Origin, "busybox");
        let record = builder.finalize(&mut pool).unwrap();
        let SourceName::Distinct(origin) = record.source else {
            panic!("expected a distinct source name");
        };
        assert_eq!(pool.resolve(origin), "busybox");
    }

    #[test]
    fn numeric_fields_parse_like_strtoull() {
        assert_eq!(parse_uint("1700000000"), 1_700_000_000);
        assert_eq!(parse_uint("42junk"), 42);
        assert_eq!(parse_uint(" \t42"), 42);
        assert_eq!(parse_uint("+42"), 42);
        assert_eq!(parse_uint(""), 0);
        assert_eq!(parse_uint("junk"), 0);
        assert_eq!(parse_uint("+ 42"), 0);
    }
}
