//! Fixed-length binary digests with the algorithm implied by their length.

use serde::Serialize;

/// The digest algorithm of a [`Checksum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChecksumKind {
    /// MD5, 16 bytes. Used for manifest-text package ids.
    Md5,
    /// SHA1, 20 bytes. Used for header ids of compressed containers.
    Sha1,
    /// SHA256, 32 bytes.
    Sha256,
}

impl ChecksumKind {
    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            ChecksumKind::Md5 => 16,
            ChecksumKind::Sha1 => 20,
            ChecksumKind::Sha256 => 32,
        }
    }

    /// Infer the algorithm from a digest length, if it is one we know.
    pub fn from_digest_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(ChecksumKind::Md5),
            20 => Some(ChecksumKind::Sha1),
            32 => Some(ChecksumKind::Sha256),
            _ => None,
        }
    }

    /// Conventional lowercase name of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            ChecksumKind::Md5 => "md5",
            ChecksumKind::Sha1 => "sha1",
            ChecksumKind::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A binary digest paired with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Checksum {
    kind: ChecksumKind,
    bytes: Vec<u8>,
}

impl Checksum {
    /// Wrap a digest whose algorithm is implied by its length
    /// (16 → MD5, 20 → SHA1, 32 → SHA256). Other lengths yield `None`.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let kind = ChecksumKind::from_digest_len(bytes.len())?;
        Some(Self { kind, bytes })
    }

    /// The digest algorithm.
    pub fn kind(&self) -> ChecksumKind {
        self.kind
    }

    /// The raw digest bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, hex::encode(&self.bytes))
    }
}
