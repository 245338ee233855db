//! The interface the persistence layer needs from an in-memory cookie store.

use crate::cookies::canonical_cookie::CanonicalCookie;
use time::OffsetDateTime;

/// In-memory cookie storage that [`PersistentJar`](crate::cookies::persistence::PersistentJar)
/// can save and load.
///
/// The store owns its conflict rules: `merge` decides which copy of a cookie
/// wins, and `delete_expired` decides what "expired" means for it.
pub trait CookieStore: Send {
    /// Every stored cookie, persistent or not, in any order.
    fn records(&self) -> Box<dyn Iterator<Item = &CanonicalCookie> + '_>;

    /// Fold externally loaded cookies into the store. Returns how many were
    /// taken.
    fn merge(&mut self, cookies: Vec<CanonicalCookie>) -> usize;

    /// Drop every cookie whose expiry is at or before `now`.
    fn delete_expired(&mut self, now: OffsetDateTime);
}
