//! Index ingestion: multi-record `<letter>:<value>` stanzas.
//!
//! An index stream is either the index text itself or a tar archive whose
//! `APKINDEX` entry holds it (the caller resolves any stream compression
//! before invoking). Records are separated by blank lines; a record begins at
//! the first `<letter>:` line after a separator and is finalized at the next
//! blank line or input end. A record that never names its package is
//! discarded without disturbing the rest of the stream.

use std::io::{BufRead, BufReader, Read};

use tar::EntryType;
use tracing::{debug, warn};

use alpk_schema::{Catalog, SymbolPool};

use crate::IngestOptions;
use crate::error::IngestError;
use crate::record::{Attr, RecordBuilder};

/// Name of the index entry inside an index archive.
const INDEX_ENTRY: &[u8] = b"APKINDEX";

/// Ingest a package index into the catalog, returning the number of records
/// added.
///
/// With `options.index_is_text` the stream is parsed as index text directly;
/// otherwise it is scanned as a tar archive and every regular entry named
/// `APKINDEX` is parsed, all other entries skipped.
///
/// # Errors
///
/// Returns [`IngestError::Archive`] on a corrupt or truncated stream.
/// Records already added are retained; only the record in progress is lost.
pub fn ingest_index<R: Read>(
    pool: &mut SymbolPool,
    catalog: &mut Catalog,
    reader: R,
    options: &IngestOptions,
) -> Result<usize, IngestError> {
    let added = if options.index_is_text {
        parse_index(pool, catalog, BufReader::new(reader))?
    } else {
        let mut added = 0;
        let mut archive = tar::Archive::new(reader);
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type() != EntryType::Regular
                || entry.path_bytes().as_ref() != INDEX_ENTRY
            {
                continue;
            }
            added += parse_index(pool, catalog, BufReader::new(&mut entry))?;
        }
        added
    };

    if !options.no_compaction {
        catalog.compact();
    }
    debug!(records = added, "index ingestion complete");
    Ok(added)
}

/// Parse index text, appending finalized records to the catalog.
///
/// Line structure is matched on raw bytes; only the value text is converted
/// to UTF-8 (lossily) when it is stored.
fn parse_index(
    pool: &mut SymbolPool,
    catalog: &mut Catalog,
    mut lines: impl BufRead,
) -> Result<usize, IngestError> {
    let mut builder: Option<RecordBuilder> = None;
    let mut added = 0;
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();
        let eof = lines.read_until(b'\n', &mut line)? == 0;
        let bytes = line.strip_suffix(b"\n").unwrap_or(&line);

        if eof || bytes.is_empty() {
            if let Some(builder) = builder.take() {
                match builder.finalize(pool) {
                    Some(record) => {
                        catalog.push(record);
                        added += 1;
                    }
                    None => warn!("discarding index record with no package name"),
                }
            }
            if eof {
                break;
            }
            continue;
        }

        if bytes.len() < 2 || bytes[1] != b':' {
            continue;
        }
        // Any `?:` line opens a record, even one with an unrecognized letter.
        let builder = builder.get_or_insert_with(RecordBuilder::new);
        let value = String::from_utf8_lossy(&bytes[2..]);
        let attr = match bytes[0] {
            b'P' => Attr::Name,
            b'V' => Attr::Version,
            b'T' => Attr::Description,
            b'U' => Attr::Url,
            b't' => Attr::BuildTime,
            b'I' => Attr::InstallSize,
            b'A' => Attr::Arch,
            b'L' => Attr::License,
            b'o' => Attr::Origin,
            b'D' => Attr::Requires,
            b'p' => Attr::Provides,
            b'i' => Attr::InstallIf,
            b'C' => Attr::HeaderChecksum,
            _ => continue,
        };
        builder.apply(pool, attr, &value);
    }

    Ok(added)
}
