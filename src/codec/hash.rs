//! BLAKE2b digests used by the ledger

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};

/// 32-byte digest (transaction ids, data hashes)
pub type Hash32 = [u8; 32];

/// 28-byte digest (key and script hashes)
pub type Hash28 = [u8; 28];

/// Unkeyed BLAKE2b-256, the transaction body identifier
pub fn hash(bytes: &[u8]) -> Hash32 {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Unkeyed BLAKE2b-224, the hash behind key credentials
pub fn key_hash(bytes: &[u8]) -> Hash28 {
    let mut hasher = Blake2b::<U28>::new();
    hasher.update(bytes);
    let mut out = [0u8; 28];
    out.copy_from_slice(&hasher.finalize());
    out
}
