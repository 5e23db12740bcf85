//! Process-wide symbol interning and relational dependency identifiers.
//!
//! The pool is the shared, append-only collaborator of every parsing call:
//! strings and relation tuples are interned exactly once and never removed,
//! so identical text always yields the same identifier.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Identifier for an interned string in a [`SymbolPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SymbolId(u32);

/// Identifier for an interned relation tuple in a [`SymbolPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelId(u32);

/// A dependency identifier: either a bare package name or an interned
/// relation over other identifiers (`name >= 1.2`, `a & b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DepId {
    /// A plain interned name with no version constraint.
    Name(SymbolId),
    /// An interned relation; resolve it with [`SymbolPool::rel_parts`].
    Rel(RelId),
}

/// Bitset of version-comparison operators attached to a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RelFlags(u8);

impl RelFlags {
    /// Strictly-less-than comparison (`<`).
    pub const LT: RelFlags = RelFlags(1);
    /// Strictly-greater-than comparison (`>`).
    pub const GT: RelFlags = RelFlags(2);
    /// Equality comparison (`=`, and the `~` synonym).
    pub const EQ: RelFlags = RelFlags(4);

    /// The empty set: no comparison operator.
    pub fn empty() -> Self {
        RelFlags(0)
    }

    /// Returns `true` if no operator bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub fn contains(self, other: RelFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for RelFlags {
    type Output = RelFlags;

    fn bitor(self, rhs: RelFlags) -> RelFlags {
        RelFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RelFlags {
    fn bitor_assign(&mut self, rhs: RelFlags) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for RelFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.contains(RelFlags::LT) {
            write!(f, "<")?;
        }
        if self.contains(RelFlags::GT) {
            write!(f, ">")?;
        }
        if self.contains(RelFlags::EQ) {
            write!(f, "=")?;
        }
        Ok(())
    }
}

/// The operator of an interned relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelOp {
    /// Version comparison between a name and a version token.
    Cmp(RelFlags),
    /// Logical conjunction of two dependency identifiers.
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RelEntry {
    left: DepId,
    right: DepId,
    op: RelOp,
}

/// Interning table for strings and relation tuples, shared between the
/// ingestion code and the resolution engine.
///
/// Also carries the configured root directory that the root-relative path
/// option resolves archive paths against.
#[derive(Debug, Default)]
pub struct SymbolPool {
    strings: Vec<String>,
    by_name: HashMap<String, SymbolId>,
    rels: Vec<RelEntry>,
    by_rel: HashMap<RelEntry, RelId>,
    root_dir: Option<PathBuf>,
}

impl SymbolPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its identifier. Idempotent: the same text
    /// always yields the same id.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(s) {
            return id;
        }
        let id = SymbolId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.by_name.insert(s.to_string(), id);
        id
    }

    /// Resolve an interned string.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this pool.
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Intern a relation tuple, returning its dependency identifier.
    /// Idempotent: identical tuples always yield the same id.
    pub fn rel(&mut self, left: DepId, right: DepId, op: RelOp) -> DepId {
        let entry = RelEntry { left, right, op };
        if let Some(&id) = self.by_rel.get(&entry) {
            return DepId::Rel(id);
        }
        let id = RelId(self.rels.len() as u32);
        self.rels.push(entry);
        self.by_rel.insert(entry, id);
        DepId::Rel(id)
    }

    /// Return the `(left, right, op)` tuple of an interned relation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this pool.
    pub fn rel_parts(&self, id: RelId) -> (DepId, DepId, RelOp) {
        let entry = &self.rels[id.0 as usize];
        (entry.left, entry.right, entry.op)
    }

    /// Render a dependency identifier as the text it was parsed from,
    /// e.g. `foo`, `foo>=1.2` or `a & b`. Intended for logs and tests.
    pub fn dep_str(&self, id: DepId) -> String {
        match id {
            DepId::Name(sym) => self.resolve(sym).to_string(),
            DepId::Rel(rel) => {
                let (left, right, op) = self.rel_parts(rel);
                match op {
                    RelOp::Cmp(flags) => {
                        format!("{}{flags}{}", self.dep_str(left), self.dep_str(right))
                    }
                    RelOp::And => format!("{} & {}", self.dep_str(left), self.dep_str(right)),
                }
            }
        }
    }

    /// Set the root directory used by root-relative path resolution.
    pub fn set_root_dir(&mut self, root: impl Into<PathBuf>) {
        self.root_dir = Some(root.into());
    }

    /// The configured root directory, if any.
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// Resolve `path` against the configured root directory. Without a
    /// configured root the path is returned unchanged.
    pub fn resolve_root(&self, path: &Path) -> PathBuf {
        match &self.root_dir {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut pool = SymbolPool::new();
        let a = pool.intern("busybox");
        let b = pool.intern("busybox");
        assert_eq!(a, b);
        assert_eq!(pool.resolve(a), "busybox");
        assert_ne!(pool.intern("musl"), a);
    }

    #[test]
    fn rel_is_idempotent() {
        let mut pool = SymbolPool::new();
        let name = DepId::Name(pool.intern("foo"));
        let ver = DepId::Name(pool.intern("1.2"));
        let op = RelOp::Cmp(RelFlags::GT | RelFlags::EQ);
        let r1 = pool.rel(name, ver, op);
        let r2 = pool.rel(name, ver, op);
        assert_eq!(r1, r2);
        // A different operator is a different relation.
        let r3 = pool.rel(name, ver, RelOp::Cmp(RelFlags::EQ));
        assert_ne!(r1, r3);
    }

    #[test]
    fn dep_str_renders_relations() {
        let mut pool = SymbolPool::new();
        let name = DepId::Name(pool.intern("foo"));
        let ver = DepId::Name(pool.intern("1.2"));
        let rel = pool.rel(name, ver, RelOp::Cmp(RelFlags::GT | RelFlags::EQ));
        assert_eq!(pool.dep_str(rel), "foo>=1.2");

        let other = DepId::Name(pool.intern("bar"));
        let both = pool.rel(rel, other, RelOp::And);
        assert_eq!(pool.dep_str(both), "foo>=1.2 & bar");
    }

    #[test]
    fn resolve_root_joins_configured_prefix() {
        let mut pool = SymbolPool::new();
        assert_eq!(
            pool.resolve_root(Path::new("x/y.apk")),
            PathBuf::from("x/y.apk")
        );
        pool.set_root_dir("/sysroot");
        assert_eq!(
            pool.resolve_root(Path::new("x/y.apk")),
            PathBuf::from("/sysroot/x/y.apk")
        );
    }
}
