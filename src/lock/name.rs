//! Derives an advisory lock name from a file path.

use crate::base::JarError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Number of hash characters kept in a lock name.
const HASH_PREFIX_LEN: usize = 29;

/// Number of trailing path characters kept for readability.
const PATH_TAIL_LEN: usize = 10;

/// Map `path` to a short lock name made only of `[A-Za-z0-9]`.
///
/// The name is `L`, then the first 29 characters of the URL-safe base64
/// SHA-256 of the whole path, then the last 10 characters of the path, with
/// everything outside `[A-Za-z0-9]` removed. The hash keeps similar paths
/// apart; the tail keeps names recognisable in lock directories.
///
/// This only transforms the string; it never touches the filesystem.
///
/// # Example
/// ```
/// use persistjar::lock::name::lock_name_from_path;
///
/// let name = lock_name_from_path("/home/user/.cookies.json").unwrap();
/// assert!(name.starts_with('L'));
/// assert!(name.ends_with("kiesjson"));
/// ```
pub fn lock_name_from_path(path: &str) -> Result<String, JarError> {
    if path.is_empty() {
        return Err(JarError::InvalidInput("path cannot be empty".to_string()));
    }

    let digest = Sha256::digest(path.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);

    let tail = match path.char_indices().rev().nth(PATH_TAIL_LEN - 1) {
        Some((idx, _)) => &path[idx..],
        None => path,
    };

    // The leading letter keeps the name from starting with a digit.
    let name = std::iter::once('L')
        .chain(encoded.chars().take(HASH_PREFIX_LEN))
        .chain(tail.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect();
    Ok(name)
}
