use std::fmt::Write;

use sha2::{Digest, Sha256};

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}

/// SHA-256 of the exact bytes, lowercase hex. Used as the dedup key.
pub fn content_hash(bytes: &[u8]) -> String {
    hex_digest(&Sha256::digest(bytes))
}
