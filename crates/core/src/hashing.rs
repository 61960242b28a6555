//! Hashing helpers for the audit integrity chain.

use sha2::{Digest, Sha256};

/// Known seed value for the first entry in a batch's hash chain.
const CHAIN_SEED: &str = "INTAKE_AUDIT_CHAIN_SEED_V1";

/// SHA-256 digest of `data`, hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute the integrity hash for an audit entry.
///
/// `prev_hash` is the hash of the previous entry in the same batch, or
/// `None` for the first entry (which chains from a known seed).
/// `entry_data` is the canonical string form of the entry's content.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    sha256_hex(combined.as_bytes())
}
