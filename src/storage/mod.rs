//! Persistence for snapshots.
//!
//! Snapshots are stored one file per name, encoded with bincode and
//! compressed with zstd. See [`snapshots::SnapshotStore`].

/// Named snapshot slots on disk
pub mod snapshots;

pub use snapshots::{SnapshotStore, StoredSnapshotInfo};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Version of the persisted envelope. Bump when field semantics change;
/// records with another version load as absent.
pub const STORE_FORMAT_VERSION: u32 = 1;

/// Default zstd level for snapshot files.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Largest serialized (uncompressed) record the store writes or reads back.
pub const MAX_ENCODED_BYTES: usize = 100 * 1024 * 1024;

/// Bincode configuration shared by encode and decode.
fn bincode_config() -> impl bincode::config::Config {
    // Limit allocation so a corrupt length prefix cannot exhaust memory
    bincode::config::legacy().with_limit::<MAX_ENCODED_BYTES>()
}

/// Serialize with bincode, then compress with zstd.
///
/// # Errors
///
/// Returns an error if serialization or compression fails, or if the
/// serialized form exceeds [`MAX_ENCODED_BYTES`] and could never be decoded.
pub fn encode<T: Serialize>(value: &T, compression_level: i32) -> Result<Vec<u8>> {
    encode_within(value, compression_level, MAX_ENCODED_BYTES)
}

/// [`encode`] with an explicit size bound, never above [`MAX_ENCODED_BYTES`].
pub(crate) fn encode_within<T: Serialize>(
    value: &T,
    compression_level: i32,
    max_bytes: usize,
) -> Result<Vec<u8>> {
    let raw = bincode::serde::encode_to_vec(value, bincode::config::legacy())
        .context("Failed to serialize snapshot")?;
    let limit = max_bytes.min(MAX_ENCODED_BYTES);
    if raw.len() > limit {
        bail!(
            "Snapshot is too large to store: {} bytes serialized, limit is {limit}",
            raw.len()
        );
    }
    zstd::encode_all(&raw[..], compression_level).context("Failed to compress snapshot")
}

/// Decompress with zstd, then deserialize with bincode.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid zstd frame or do not decode
/// into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let raw = zstd::decode_all(bytes).context("Failed to decompress snapshot")?;
    let (value, _read) = bincode::serde::decode_from_slice(&raw, bincode_config())
        .context("Failed to deserialize snapshot")?;
    Ok(value)
}
