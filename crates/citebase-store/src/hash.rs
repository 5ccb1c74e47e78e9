//! Blake3 hashing helpers for checkpoint fingerprints

use std::io;
use std::path::Path;

/// Hash a file's contents (mmap-backed for large partitions).
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(hasher.finalize())
}

pub fn hash_bytes(data: &[u8]) -> blake3::Hash {
    blake3::hash(data)
}

/// Order-sensitive combination of several hashes into one fingerprint.
pub fn combine_hashes(hashes: &[blake3::Hash]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize()
}

/// First 8 hex characters, for log lines.
pub fn short_hash(hash: &blake3::Hash) -> String {
    hash.to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"shard"), hash_bytes(b"shard"));
        assert_ne!(hash_bytes(b"shard"), hash_bytes(b"other"));
    }

    #[test]
    fn combine_hashes_order_sensitive() {
        let a = hash_bytes(b"a");
        let b = hash_bytes(b"b");
        assert_eq!(combine_hashes(&[a, b]), combine_hashes(&[a, b]));
        assert_ne!(combine_hashes(&[a, b]), combine_hashes(&[b, a]));
    }

    #[test]
    fn short_hash_is_eight_chars() {
        assert_eq!(short_hash(&hash_bytes(b"x")).len(), 8);
    }

    #[test]
    fn hash_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.parquet");
        std::fs::write(&path, b"partition bytes").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"partition bytes"));
    }
}
