//! Order in which cookies are written to disk.
//!
//! Cookies are sorted by canonical host, then by path length, so the file
//! reads host by host with broader paths first. Remaining ties are broken by
//! path, name and domain so that the same set of cookies always produces the
//! same bytes, whatever order the store hands them over in.

use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::store::CookieStore;
use std::cmp::Ordering;

/// Total order used for serialization.
pub fn compare(a: &CanonicalCookie, b: &CanonicalCookie) -> Ordering {
    a.canonical_host
        .cmp(&b.canonical_host)
        .then_with(|| a.path.len().cmp(&b.path.len()))
        .then_with(|| a.path.cmp(&b.path))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.domain.cmp(&b.domain))
}

/// Stable sort by [`compare`].
pub fn sort_for_persistence(cookies: &mut [CanonicalCookie]) {
    cookies.sort_by(compare);
}

/// All persistent cookies in `store`, ready to be written.
pub fn persistent_snapshot<S: CookieStore + ?Sized>(store: &S) -> Vec<CanonicalCookie> {
    let mut cookies: Vec<CanonicalCookie> = store
        .records()
        .filter(|c| c.persistent)
        .cloned()
        .collect();
    sort_for_persistence(&mut cookies);
    cookies
}
