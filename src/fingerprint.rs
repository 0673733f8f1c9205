//! Content fingerprints for individual files.
//!
//! A [`ContentDigest`] is the 64-bit xxHash3 of a file's bytes, shown as 16
//! lowercase hex characters. Files that cannot be read get the
//! [`ContentDigest::Unreadable`] sentinel instead of an error, so one racing or
//! locked file never aborts a scan.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Text form of the unreadable sentinel.
pub const UNREADABLE: &str = "unreadable";

/// Default size at which files are hashed in chunks instead of read whole.
pub const DEFAULT_STREAM_THRESHOLD: u64 = 1_048_576;

/// Chunk size for streamed hashing.
const STREAM_CHUNK: usize = 65_536;

/// Fingerprint of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentDigest {
    /// xxHash3-64 of the full file content.
    Xxh3(u64),
    /// The file could not be read when the snapshot was taken.
    Unreadable,
}

impl ContentDigest {
    /// Digest an in-memory buffer.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::Xxh3(xxh3_64(data))
    }

    /// Whether this is the unreadable sentinel.
    #[must_use]
    pub const fn is_unreadable(&self) -> bool {
        matches!(self, Self::Unreadable)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xxh3(hash) => write!(f, "{hash:016x}"),
            Self::Unreadable => f.write_str(UNREADABLE),
        }
    }
}

impl FromStr for ContentDigest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == UNREADABLE {
            return Ok(Self::Unreadable);
        }
        if s.len() != 16 {
            anyhow::bail!("Digest must be 16 hex characters, got {}", s.len());
        }
        let hash = u64::from_str_radix(s, 16).with_context(|| format!("Invalid digest: {s}"))?;
        Ok(Self::Xxh3(hash))
    }
}

/// Computes content digests for single files.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    /// Files at least this large are hashed in chunks.
    stream_threshold: u64,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_THRESHOLD)
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the given streaming threshold in bytes.
    #[must_use]
    pub const fn new(stream_threshold: u64) -> Self {
        Self { stream_threshold }
    }

    /// Digest a file, absorbing any I/O failure into the unreadable sentinel.
    #[must_use]
    pub fn digest(&self, path: &Path) -> ContentDigest {
        match self.try_digest(path) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "File unreadable, using sentinel digest");
                ContentDigest::Unreadable
            }
        }
    }

    /// Digest a file, reporting why it could not be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read, or if the path
    /// names a directory.
    pub fn try_digest(&self, path: &Path) -> Result<ContentDigest> {
        let mut file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let metadata = file
            .metadata()
            .with_context(|| format!("Failed to stat: {}", path.display()))?;

        if metadata.is_dir() {
            anyhow::bail!("Not a file: {}", path.display());
        }

        if metadata.len() < self.stream_threshold {
            // Read through the open handle so a concurrent replace cannot mix
            // two files' metadata and content.
            let mut content = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or(0));
            file.read_to_end(&mut content)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            return Ok(ContentDigest::of_bytes(&content));
        }

        let mut hasher = Xxh3::new();
        let mut buffer = vec![0u8; STREAM_CHUNK];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .with_context(|| format!("Failed to read: {}", path.display()))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(ContentDigest::Xxh3(hasher.digest()))
    }
}
