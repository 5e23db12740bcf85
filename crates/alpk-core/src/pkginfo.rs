//! Single-package ingestion: `.apk` archives with a `key = value` manifest.
//!
//! An `.apk` file is concatenated gzip members: a signature container first,
//! then the control container holding the `.PKGINFO` manifest. The signature
//! member is drained and discarded; the manifest member is decoded as a tar
//! archive and its `.PKGINFO` entry parsed line by line. Two digests can be
//! requested: the pkgid (MD5 over the raw manifest text) and the hdrid (SHA1
//! over the compressed bytes of the manifest container, captured as the
//! decoder consumes them).

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::rc::Rc;

use md5::Md5;
use sha1::digest::Digest;
use sha1::Sha1;
use tar::EntryType;
use tracing::debug;

use alpk_schema::{Catalog, Checksum, RecordId, SymbolPool};

use crate::IngestOptions;
use crate::error::IngestError;
use crate::record::{Attr, RecordBuilder};
use crate::stream::{CaptureHandle, DecompressionStream, DigestCapture};

/// Name of the manifest entry inside the control container.
const MANIFEST_ENTRY: &[u8] = b".PKGINFO";

/// Manifest entries declaring more than this are rejected unparsed.
const MAX_MANIFEST_LEN: u64 = 10 * 1024 * 1024;

/// Ingest one package archive into the catalog, returning the new record's
/// handle.
///
/// When `options.use_root_dir` is set, `path` is resolved against the pool's
/// configured root directory before opening; the record's location attribute
/// keeps the path as given.
///
/// # Errors
///
/// Returns [`IngestError::Open`] if the path cannot be opened,
/// [`IngestError::Archive`] on a corrupt or truncated stream,
/// [`IngestError::OversizedManifest`] if the manifest entry declares more
/// than 10 MiB, [`IngestError::MissingManifest`] if no `.PKGINFO` entry
/// exists, and [`IngestError::MissingName`] if the manifest never names the
/// package.
pub fn ingest_package(
    pool: &mut SymbolPool,
    catalog: &mut Catalog,
    path: impl AsRef<Path>,
    options: &IngestOptions,
) -> Result<RecordId, IngestError> {
    let path = path.as_ref();
    let open_path = if options.use_root_dir {
        pool.resolve_root(path)
    } else {
        path.to_path_buf()
    };
    debug!(path = %open_path.display(), "ingesting package archive");

    let file = File::open(&open_path).map_err(|source| IngestError::Open {
        path: open_path,
        source,
    })?;
    let mut stream = DecompressionStream::new(file);

    // The leading member is the signature container; only its member
    // boundary matters, the decoded bytes are discarded unvalidated.
    stream.drain_member()?;
    if !stream.reset()? {
        return Err(IngestError::Archive(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no manifest member after the signature member",
        )));
    }

    // Registered only now, so the digest covers exactly the compressed
    // bytes of the manifest container.
    let capture = options.with_hdrid.then(|| {
        let capture = Rc::new(RefCell::new(DigestCapture::<Sha1>::new()));
        stream.set_capture(Some(capture.clone() as CaptureHandle));
        capture
    });

    let mut parsed: Option<(RecordBuilder, Option<Checksum>)> = None;
    {
        let mut archive = tar::Archive::new(&mut stream);
        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry.header().entry_type() != EntryType::Regular
                || entry.path_bytes().as_ref() != MANIFEST_ENTRY
            {
                continue;
            }
            let declared = entry.size();
            if declared > MAX_MANIFEST_LEN {
                return Err(IngestError::OversizedManifest(declared));
            }
            parsed = Some(parse_manifest(pool, &mut entry, options.with_pkgid)?);
            break;
        }
    }
    // Drain the member so an hdrid capture sees all of its compressed bytes.
    stream.drain_member()?;

    let Some((builder, pkgid)) = parsed else {
        return Err(IngestError::MissingManifest);
    };
    let mut record = builder.finalize(pool).ok_or(IngestError::MissingName)?;

    record.pkgid = pkgid;
    if let Some(capture) = capture {
        record.hdrid = Checksum::from_bytes(capture.borrow_mut().take_digest());
    }
    if !options.no_location {
        record.location = Some(path.display().to_string());
    }

    let id = catalog.push(record);
    if !options.no_compaction {
        catalog.compact();
    }
    debug!(path = %path.display(), "package archive ingested");
    Ok(id)
}

/// Parse the `.PKGINFO` entry with the single-manifest grammar, optionally
/// accumulating the MD5 pkgid over the raw (untrimmed) line bytes.
///
/// Line structure and keys are matched on raw bytes; only the value text is
/// converted to UTF-8 (lossily) when it is stored.
fn parse_manifest(
    pool: &mut SymbolPool,
    entry: &mut impl Read,
    with_pkgid: bool,
) -> Result<(RecordBuilder, Option<Checksum>), IngestError> {
    let mut builder = RecordBuilder::new();
    let mut pkgid = with_pkgid.then(Md5::new);

    let mut lines = BufReader::new(entry);
    let mut line = Vec::with_capacity(256);
    loop {
        line.clear();
        if lines.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if let Some(digest) = &mut pkgid {
            digest.update(&line);
        }
        let bytes = line.strip_suffix(b"\n").unwrap_or(&line);
        if bytes.is_empty() || bytes.starts_with(b"#") {
            continue;
        }
        if let Some((attr, value)) = manifest_attr(bytes) {
            builder.apply(pool, attr, &String::from_utf8_lossy(value));
        }
    }

    let pkgid = pkgid
        .map(|digest| digest.finalize().to_vec())
        .and_then(Checksum::from_bytes);
    Ok((builder, pkgid))
}

/// Match a `key = value` manifest line against the recognized keys.
/// Unknown keys (and lines without the ` = ` form) are ignored.
fn manifest_attr(line: &[u8]) -> Option<(Attr, &[u8])> {
    const KEYS: &[(&[u8], Attr)] = &[
        (b"pkgname = ", Attr::Name),
        (b"pkgver = ", Attr::Version),
        (b"pkgdesc = ", Attr::Description),
        (b"url = ", Attr::Url),
        (b"builddate = ", Attr::BuildTime),
        (b"packager = ", Attr::Packager),
        (b"size = ", Attr::InstallSize),
        (b"arch = ", Attr::Arch),
        (b"license = ", Attr::License),
        (b"origin = ", Attr::Origin),
        (b"depend = ", Attr::Requires),
        (b"provides = ", Attr::Provides),
        (b"install_if = ", Attr::InstallIf),
    ];
    KEYS.iter()
        .find_map(|&(prefix, attr)| line.strip_prefix(prefix).map(|rest| (attr, rest)))
}
