//! Utility functions for cross-platform path handling

use std::path::Path;

/// Check if a feed location is a local filesystem path (not a remote URL)
///
/// Returns true for:
/// - Absolute paths on Unix: /srv/feeds/release
/// - Absolute paths on Windows: C:\feeds\release or C:/feeds/release
/// - Relative paths: ./feed or ../feed
/// - UNC paths on Windows: \\server\share\feed
///
/// Returns false for:
/// - URLs: <https://feed.example.org/nuget>
/// - Bare names, which are ambiguous
pub fn is_local_path(path: &str) -> bool {
  let p = Path::new(path);

  if path.starts_with("./") || path.starts_with("../") {
    return true;
  }

  // Windows drive letter (C:\ or C:/), checked before the URL test since it contains ':'
  if path.len() >= 3 {
    let bytes = path.as_bytes();
    if bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') {
      return true;
    }
  }

  // File shares (\\server\share) are the usual home of a drop feed
  if path.starts_with("\\\\") {
    return true;
  }

  // Unix absolute path. Checked before is_absolute() because on Windows,
  // Path::is_absolute() returns false for Unix-style paths
  if path.starts_with('/') && !path.contains("://") {
    return true;
  }

  if p.is_absolute() {
    return true;
  }

  false
}
