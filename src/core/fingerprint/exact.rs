//! Exact content fingerprinting.
//!
//! Streams file bytes through SHA-256 in fixed-size chunks. The digest is
//! the primary duplicate key: byte-identical files collide, everything
//! else does not (with overwhelming probability).

use crate::error::HashError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size. Large enough to amortize syscalls, small enough to
/// never matter for memory.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-256 digest of a file's full content.
///
/// The file is streamed; it is never loaded into memory whole. A file that
/// becomes unreadable mid-stream (deleted, permission change) yields
/// [`HashError::Io`] and must be treated as unprocessable for this pass.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
    let mut file = File::open(path).map_err(|e| HashError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(|e| HashError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn hash_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.jpg", b"same content");

        assert_eq!(hash_file(&path).unwrap(), hash_file(&path).unwrap());
    }

    #[test]
    fn identical_content_same_hash_regardless_of_name() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"pixels");
        let b = write_file(&dir, "b.jpg", b"pixels");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn different_content_different_hash() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"pixels");
        let b = write_file(&dir, "b.jpg", b"pixelz");

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.jpg", b"");

        let digest = hash_file(&path).unwrap();
        // SHA-256 of the empty string
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let result = hash_file(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }
}
