//! Scratch directories and deliberately broken input files.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// This is determined by walking up from the current crate's manifest directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Writes raw bytes to `dir/name` and returns the path.
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write test file");
    path
}

/// Copies the first `len` bytes of `src` into `dir/name`, simulating an
/// interrupted download.
pub fn write_truncated_copy(src: &Path, dir: &Path, name: &str, len: usize) -> PathBuf {
    let bytes = std::fs::read(src).expect("Failed to read source file");
    write_bytes(dir, name, &bytes[..len.min(bytes.len())])
}

/// An HTML error page, as returned by a misbehaving provider.
pub const HTML_ERROR_PAGE: &[u8] =
    b"<html><head><title>503</title></head><body>Service unavailable</body></html>";
