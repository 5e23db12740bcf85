//! Dependency-expression mini-language.
//!
//! A field's text is a whitespace-separated list of tokens:
//!
//! ```text
//! token := ['!'] name [relop version]
//! relop := one or more of '<' '>' '=' ; '~' is synonymous with '='
//! ```
//!
//! Tokens become interned dependency identifiers and are filed into the
//! record list matching the field kind. Two kinds have special behavior: in a
//! requires field a leading `!` redirects that one token to the conflicts
//! list, and a supplements field is folded into a single AND-composite id.

use alpk_schema::{DepId, PackageRecord, RelFlags, RelOp, SymbolPool};

/// Which record list a dependency field feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepKind {
    /// Capabilities the package provides.
    Provides,
    /// Capabilities the package requires (`!` tokens become conflicts).
    Requires,
    /// Capabilities the package conflicts with.
    Conflicts,
    /// Install-if conditions; the whole field means "AND of all listed
    /// conditions" and yields one composite id.
    Supplements,
}

/// Parse one dependency field and file its tokens into `record`.
pub fn parse_dep_field(
    pool: &mut SymbolPool,
    record: &mut PackageRecord,
    kind: DepKind,
    text: &str,
) {
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut composite: Option<DepId> = None;

    while i < bytes.len() {
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let mut dest = kind;
        if dest == DepKind::Requires && bytes[i] == b'!' {
            dest = DepKind::Conflicts;
            i += 1;
        }

        let name_start = i;
        while i < bytes.len() && !matches!(bytes[i], b' ' | b'\t' | b'<' | b'>' | b'=' | b'~') {
            i += 1;
        }
        let mut id = DepId::Name(pool.intern(&text[name_start..i]));

        let mut flags = RelFlags::empty();
        while i < bytes.len() {
            match bytes[i] {
                b'<' => flags |= RelFlags::LT,
                b'>' => flags |= RelFlags::GT,
                b'=' => flags |= RelFlags::EQ,
                _ => break,
            }
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'~' {
            flags |= RelFlags::EQ;
            i += 1;
        }
        if !flags.is_empty() {
            let version_start = i;
            while i < bytes.len() && !matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            let version = DepId::Name(pool.intern(&text[version_start..i]));
            id = pool.rel(id, version, RelOp::Cmp(flags));
        }

        match dest {
            DepKind::Provides => record.provides.push(id),
            DepKind::Requires => record.requires.push(id),
            DepKind::Conflicts => record.conflicts.push(id),
            DepKind::Supplements => {
                composite = Some(match composite {
                    None => id,
                    Some(acc) => pool.rel(acc, id, RelOp::And),
                });
            }
        }
    }

    if let Some(id) = composite {
        record.supplements.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: DepKind, text: &str) -> (SymbolPool, PackageRecord) {
        let mut pool = SymbolPool::new();
        let mut record = PackageRecord::default();
        parse_dep_field(&mut pool, &mut record, kind, text);
        (pool, record)
    }

    #[test]
    fn versioned_token_combines_relation_flags() {
        let (pool, record) = parse(DepKind::Requires, "foo>=1.2");
        assert_eq!(record.requires.len(), 1);

        let DepId::Rel(rel) = record.requires[0] else {
            panic!("expected a relational id");
        };
        let (name, version, op) = pool.rel_parts(rel);
        assert_eq!(pool.dep_str(name), "foo");
        assert_eq!(pool.dep_str(version), "1.2");
        assert_eq!(op, RelOp::Cmp(RelFlags::GT | RelFlags::EQ));
    }

    #[test]
    fn tilde_means_equals() {
        let (pool, record) = parse(DepKind::Requires, "foo~1.2");
        let DepId::Rel(rel) = record.requires[0] else {
            panic!("expected a relational id");
        };
        let (_, version, op) = pool.rel_parts(rel);
        assert_eq!(op, RelOp::Cmp(RelFlags::EQ));
        assert_eq!(pool.dep_str(version), "1.2");
    }

    #[test]
    fn bare_name_yields_non_relational_id() {
        let (pool, record) = parse(DepKind::Provides, "so:libc.musl-x86_64.so.1");
        assert_eq!(record.provides.len(), 1);
        assert_eq!(
            pool.dep_str(record.provides[0]),
            "so:libc.musl-x86_64.so.1"
        );
    }

    #[test]
    fn negated_requires_token_becomes_conflict() {
        let (pool, record) = parse(DepKind::Requires, "!a b");
        assert_eq!(record.conflicts.len(), 1);
        assert_eq!(record.requires.len(), 1);
        assert_eq!(pool.dep_str(record.conflicts[0]), "a");
        assert_eq!(pool.dep_str(record.requires[0]), "b");
    }

    #[test]
    fn bang_is_part_of_the_name_outside_requires() {
        // Only a requires field honors the negation prefix.
        let (pool, record) = parse(DepKind::Provides, "!weird");
        assert_eq!(record.conflicts.len(), 0);
        assert_eq!(pool.dep_str(record.provides[0]), "!weird");
    }

    #[test]
    fn supplements_fold_into_one_composite() {
        let (pool, record) = parse(DepKind::Supplements, "a b c");
        assert_eq!(record.supplements.len(), 1);
        assert_eq!(pool.dep_str(record.supplements[0]), "a & b & c");

        // Left fold: AND(AND(a, b), c).
        let DepId::Rel(outer) = record.supplements[0] else {
            panic!("expected a composite id");
        };
        let (left, right, op) = pool.rel_parts(outer);
        assert_eq!(op, RelOp::And);
        assert_eq!(pool.dep_str(right), "c");
        assert_eq!(pool.dep_str(left), "a & b");
    }

    #[test]
    fn versioned_supplements_participate_in_the_composite() {
        let (pool, record) = parse(DepKind::Supplements, "docs man-pages>2");
        assert_eq!(record.supplements.len(), 1);
        assert_eq!(pool.dep_str(record.supplements[0]), "docs & man-pages>2");
    }

    #[test]
    fn mixed_whitespace_and_empty_fields() {
        let (pool, record) = parse(DepKind::Requires, " \t a \t\t b ");
        assert_eq!(record.requires.len(), 2);
        assert_eq!(pool.dep_str(record.requires[0]), "a");
        assert_eq!(pool.dep_str(record.requires[1]), "b");

        let (_, empty) = parse(DepKind::Requires, "   ");
        assert!(empty.requires.is_empty());
    }

    #[test]
    fn identical_tokens_intern_to_the_same_id() {
        let (_, record) = parse(DepKind::Requires, "musl>=1.2 musl>=1.2");
        assert_eq!(record.requires[0], record.requires[1]);
    }
}
