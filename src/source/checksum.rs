//! Checksum policy and incremental hashing
//!
//! The algorithm is inferred from the shape of the configured checksum:
//! 64 lowercase hex chars (optionally `sha256:`-prefixed) is SHA-256,
//! 40 lowercase hex chars (optionally `sha1:`-prefixed) is SHA-1.

use crate::error::{FryerError, FryerResult};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Buffer size for streamed downloads and engine pipes
pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha1,
}

impl ChecksumAlgorithm {
    /// Infer the algorithm from a checksum string.
    ///
    /// No checksum means SHA-256. Anything that is not a well-formed
    /// SHA-256 or SHA-1 digest is a configuration error.
    pub fn guess(checksum: Option<&str>) -> FryerResult<Self> {
        let Some(checksum) = checksum else {
            return Ok(Self::Sha256);
        };

        Self::all()
            .iter()
            .copied()
            .find(|alg| alg.matches(checksum))
            .ok_or_else(|| FryerError::UnknownChecksumAlgorithm(checksum.to_string()))
    }

    /// Start an incremental hash
    pub fn hasher(self) -> Hasher {
        match self {
            Self::Sha256 => Hasher::Sha256(Sha256::new()),
            Self::Sha1 => Hasher::Sha1(Sha1::new()),
        }
    }

    /// Hash everything a reader yields, returning lowercase hex
    pub fn hash_reader(self, mut reader: impl Read) -> io::Result<String> {
        let mut hasher = self.hasher();
        io::copy(&mut reader, &mut hasher)?;
        Ok(hasher.finalize_hex())
    }

    /// Hash a file's contents, returning lowercase hex
    pub fn hash_file(self, path: &Path) -> io::Result<String> {
        self.hash_reader(File::open(path)?)
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256:",
            Self::Sha1 => "sha1:",
        }
    }

    fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha1 => 40,
        }
    }

    fn matches(self, checksum: &str) -> bool {
        let bare = checksum.strip_prefix(self.prefix()).unwrap_or(checksum);
        bare.len() == self.hex_len()
            && bare
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    fn all() -> &'static [Self] {
        &[Self::Sha256, Self::Sha1]
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha256 => "sha256",
            Self::Sha1 => "sha1",
        };
        write!(f, "{}", name)
    }
}

/// Drop an `sha256:`/`sha1:` prefix, leaving the bare hex digest
pub fn bare_digest(checksum: &str) -> &str {
    ChecksumAlgorithm::all()
        .iter()
        .find_map(|alg| checksum.strip_prefix(alg.prefix()))
        .unwrap_or(checksum)
}

/// Running digest over one of the supported algorithms.
///
/// Also an `io::Write` sink, so readers can be hashed with `io::copy`.
pub enum Hasher {
    Sha256(Sha256),
    Sha1(Sha1),
}

impl Hasher {
    pub fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(chunk),
            Self::Sha1(h) => h.update(chunk),
        }
    }

    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Sha256(h) => h.write(buf),
            Self::Sha1(h) => h.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
