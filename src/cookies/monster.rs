use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::psl;
use crate::cookies::store::CookieStore;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use url::Url;

/// Latest expiry kept for a cookie: 9999-12-31T23:59:59Z, the last instant
/// RFC 3339 can write.
pub const MAX_EXPIRY: OffsetDateTime =
    match OffsetDateTime::from_unix_timestamp(253_402_300_799) {
        Ok(t) => t,
        Err(_) => OffsetDateTime::UNIX_EPOCH,
    };

/// In-memory cookie jar.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// Cookies are grouped by registrable domain ([`psl::jar_key`]) and keyed
/// within a group by [`CanonicalCookie::id`]. Deleting a cookie keeps a
/// tombstone (an entry expired at the deletion time) until the next
/// [`delete_expired`](CookieStore::delete_expired), so that a deletion made
/// here still wins when another process's copy of the file is merged in.
#[derive(Debug, Default, Clone)]
pub struct CookieMonster {
    // Store: Map<JarKey, Map<Id, Cookie>>
    entries: BTreeMap<String, BTreeMap<String, CanonicalCookie>>,
}

impl CookieMonster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie by identity.
    ///
    /// Returns the cookie it replaced, if any.
    pub fn set_canonical_cookie(&mut self, cookie: CanonicalCookie) -> Option<CanonicalCookie> {
        let key = psl::jar_key(&cookie.canonical_host);
        self.entries
            .entry(key)
            .or_default()
            .insert(cookie.id(), cookie)
    }

    /// Look up a cookie by domain, path and name.
    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<&CanonicalCookie> {
        let id = format!("{};{};{}", domain.to_ascii_lowercase(), path, name);
        self.entries
            .get(&psl::jar_key(&canonical_host(domain)))
            .and_then(|group| group.get(&id))
    }

    /// Parse a `Set-Cookie` line received from `url` and store the result.
    ///
    /// `Max-Age` takes precedence over `Expires`; a cookie with either is
    /// persistent, and expiries past [`MAX_EXPIRY`] are clamped to it. A line
    /// whose expiry is already at or before `now` deletes the matching cookie,
    /// leaving a tombstone whether or not this jar held it. Returns false if
    /// the line was rejected.
    pub fn parse_and_save_cookie(
        &mut self,
        url: &Url,
        cookie_line: &str,
        now: OffsetDateTime,
    ) -> bool {
        use cookie::Cookie;

        let parsed = match Cookie::parse(cookie_line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "failed to parse cookie line");
                return false;
            }
        };

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => canonical_host(host),
            _ => return false,
        };

        // Domain logic
        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                // Explicit domain: not host-only. Leading dot is ignored.
                let d = d.trim_start_matches('.').to_ascii_lowercase();
                if !psl::is_valid_cookie_domain(&d, &host) {
                    tracing::debug!(domain = %d, host = %host, "rejecting cookie domain");
                    return false;
                }
                (d, false)
            }
            None => (host.clone(), true),
        };

        let path = parsed
            .path()
            .filter(|p| p.starts_with('/'))
            .unwrap_or("/")
            .to_string();

        // Expiry logic
        let expires = match parsed.max_age() {
            Some(max_age) if max_age <= time::Duration::ZERO => Some(now),
            Some(max_age) => Some(
                now.checked_add(max_age)
                    .map_or(MAX_EXPIRY, |t| t.min(MAX_EXPIRY)),
            ),
            None => parsed
                .expires()
                .and_then(|e| e.datetime())
                .map(|t| t.min(MAX_EXPIRY)),
        };

        let name = parsed.name().to_string();
        let deleted = expires.is_some_and(|t| t <= now);
        let creation_time = if deleted {
            now
        } else {
            self.get(&domain, &path, &name)
                .map_or(now, |old| old.creation_time)
        };

        let cookie = CanonicalCookie {
            name,
            value: if deleted { String::new() } else { parsed.value().to_string() },
            domain,
            path,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            persistent: expires.is_some(),
            host_only,
            // Tombstones expire exactly at the deletion time.
            expires: if deleted { Some(now) } else { expires },
            creation_time,
            last_access_time: now,
            updated: now,
            canonical_host: host,
        };

        self.set_canonical_cookie(cookie);
        true
    }

    /// Delete a cookie as of `now`.
    ///
    /// An entry expired and stamped with `now` stays behind until the next
    /// expiry sweep, also when this jar never held the cookie, so the
    /// deletion outranks older copies merged in from the file. Returns false
    /// if there was no such cookie.
    pub fn remove(&mut self, domain: &str, path: &str, name: &str, now: OffsetDateTime) -> bool {
        let domain = domain.to_ascii_lowercase();
        let id = format!("{};{};{}", domain, path, name);
        let group = self
            .entries
            .entry(psl::jar_key(&canonical_host(&domain)))
            .or_default();

        match group.get_mut(&id) {
            Some(cookie) => {
                cookie.expires = Some(now);
                cookie.updated = now;
                true
            }
            None => {
                let tombstone = CanonicalCookie::new(
                    name.to_string(),
                    String::new(),
                    domain,
                    path.to_string(),
                    now,
                    Some(now),
                );
                group.insert(id, tombstone);
                false
            }
        }
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Clear all cookies.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over all cookies.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = &CanonicalCookie> + '_ {
        self.entries.values().flat_map(BTreeMap::values)
    }
}

impl CookieStore for CookieMonster {
    fn records(&self) -> Box<dyn Iterator<Item = &CanonicalCookie> + '_> {
        Box::new(self.iter_all_cookies())
    }

    fn merge(&mut self, cookies: Vec<CanonicalCookie>) -> usize {
        let mut taken = 0;
        for cookie in cookies {
            if cookie.canonical_host.is_empty() {
                continue;
            }
            let group = self
                .entries
                .entry(psl::jar_key(&cookie.canonical_host))
                .or_default();
            let id = cookie.id();
            // Only a strictly newer copy replaces what we already have.
            let newer = group.get(&id).map_or(true, |old| cookie.updated > old.updated);
            if newer {
                group.insert(id, cookie);
                taken += 1;
            }
        }
        taken
    }

    fn delete_expired(&mut self, now: OffsetDateTime) {
        for group in self.entries.values_mut() {
            group.retain(|_, cookie| !cookie.is_expired(now));
        }
        self.entries.retain(|_, group| !group.is_empty());
    }
}

/// Normalize a host for use as a grouping and sort key.
///
/// Lowercases, drops any port and IPv6 brackets, and strips a trailing dot.
pub fn canonical_host(host: &str) -> String {
    let host = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-06-01 10:00 UTC);

    fn make_test_cookie(name: &str, domain: &str, updated: OffsetDateTime) -> CanonicalCookie {
        let mut cookie = CanonicalCookie::new(
            name.to_string(),
            "test_value".to_string(),
            domain.to_string(),
            "/".to_string(),
            updated,
            Some(updated + Duration::days(30)),
        );
        cookie.secure = true;
        cookie
    }

    #[test]
    fn test_canonical_host() {
        assert_eq!(canonical_host("Example.COM"), "example.com");
        assert_eq!(canonical_host("example.com:8080"), "example.com");
        assert_eq!(canonical_host("example.com."), "example.com");
        assert_eq!(canonical_host("[::1]:443"), "::1");
        assert_eq!(canonical_host("[::1]"), "::1");
    }

    #[test]
    fn test_set_replaces_same_identity() {
        let mut jar = CookieMonster::new();
        let first = jar.set_canonical_cookie(make_test_cookie("a", "example.com", NOW));
        assert!(first.is_none());
        let old = jar.set_canonical_cookie(make_test_cookie("a", "example.com", NOW));

        assert!(old.is_some());
        assert_eq!(jar.total_cookie_count(), 1);
    }

    #[test]
    fn test_subdomains_share_a_group() {
        let mut jar = CookieMonster::new();
        jar.set_canonical_cookie(make_test_cookie("a", "www.example.com", NOW));
        jar.set_canonical_cookie(make_test_cookie("b", "api.example.com", NOW));

        assert_eq!(jar.entries.len(), 1);
        assert!(jar.entries.contains_key("example.com"));
    }

    #[test]
    fn test_merge_newer_wins() {
        let mut jar = CookieMonster::new();
        let mut mine = make_test_cookie("sid", "example.com", NOW);
        mine.value = "mine".into();
        jar.set_canonical_cookie(mine);

        let mut older = make_test_cookie("sid", "example.com", NOW - Duration::hours(1));
        older.value = "older".into();
        let mut newer = make_test_cookie("sid", "example.com", NOW + Duration::hours(1));
        newer.value = "newer".into();

        assert_eq!(jar.merge(vec![older]), 0);
        assert_eq!(jar.get("example.com", "/", "sid").unwrap().value, "mine");

        assert_eq!(jar.merge(vec![newer]), 1);
        assert_eq!(jar.get("example.com", "/", "sid").unwrap().value, "newer");
    }

    #[test]
    fn test_merge_equal_timestamp_keeps_existing() {
        let mut jar = CookieMonster::new();
        let mut mine = make_test_cookie("sid", "example.com", NOW);
        mine.value = "mine".into();
        jar.set_canonical_cookie(mine);

        let mut theirs = make_test_cookie("sid", "example.com", NOW);
        theirs.value = "theirs".into();
        jar.merge(vec![theirs]);

        assert_eq!(jar.get("example.com", "/", "sid").unwrap().value, "mine");
    }

    #[test]
    fn test_merge_skips_missing_host() {
        let mut jar = CookieMonster::new();
        let mut cookie = make_test_cookie("a", "example.com", NOW);
        cookie.canonical_host.clear();

        assert_eq!(jar.merge(vec![cookie]), 0);
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_delete_expired() {
        let mut jar = CookieMonster::new();
        let mut stale = make_test_cookie("stale", "old.com", NOW);
        stale.expires = Some(NOW);
        let mut session = make_test_cookie("session", "example.com", NOW);
        session.expires = None;
        session.persistent = false;
        jar.set_canonical_cookie(stale);
        jar.set_canonical_cookie(session);
        jar.set_canonical_cookie(make_test_cookie("fresh", "example.com", NOW));

        jar.delete_expired(NOW);

        assert_eq!(jar.total_cookie_count(), 2);
        assert!(jar.get("old.com", "/", "stale").is_none());
        assert!(!jar.entries.contains_key("old.com"));
    }

    #[test]
    fn test_remove_leaves_tombstone_that_wins_merge() {
        let mut jar = CookieMonster::new();
        jar.set_canonical_cookie(make_test_cookie("sid", "example.com", NOW - Duration::hours(2)));

        let later = NOW - Duration::hours(1);
        assert!(jar.remove("example.com", "/", "sid", later));
        assert!(!jar.remove("example.com", "/", "missing", later));

        // A copy read back from disk is older than the deletion.
        jar.merge(vec![make_test_cookie("sid", "example.com", NOW - Duration::hours(2))]);
        jar.delete_expired(NOW);
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_remove_unknown_cookie_still_wins_merge() {
        let mut jar = CookieMonster::new();
        assert!(!jar.remove("Example.com", "/", "sid", NOW));

        // The file still has the cookie from before the deletion.
        let on_disk = make_test_cookie("sid", "example.com", NOW - Duration::hours(1));
        assert_eq!(jar.merge(vec![on_disk]), 0);

        let tombstone = jar.get("example.com", "/", "sid").unwrap();
        assert!(tombstone.is_expired(NOW));
        jar.delete_expired(NOW);
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_get_ignores_domain_case() {
        let mut jar = CookieMonster::new();
        jar.set_canonical_cookie(make_test_cookie("sid", "Example.COM", NOW));

        assert!(jar.get("example.com", "/", "sid").is_some());
        assert!(jar.get("EXAMPLE.com", "/", "sid").is_some());
        jar.set_canonical_cookie(make_test_cookie("sid", "example.com", NOW));
        assert_eq!(jar.total_cookie_count(), 1);
    }

    #[test]
    fn test_parse_host_only_session_cookie() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://Example.com/foo").unwrap();
        assert!(jar.parse_and_save_cookie(&url, "foo=bar; Path=/; Secure", NOW));

        let cookie = jar.get("example.com", "/", "foo").unwrap();
        assert_eq!(cookie.value, "bar");
        assert!(cookie.host_only);
        assert!(cookie.secure);
        assert!(!cookie.persistent);
        assert_eq!(cookie.expires, None);
    }

    #[test]
    fn test_parse_max_age_is_persistent() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://a.example.com/").unwrap();
        assert!(jar.parse_and_save_cookie(&url, "id=1; Domain=example.com; Max-Age=3600", NOW));

        let cookie = jar.get("example.com", "/", "id").unwrap();
        assert!(!cookie.host_only);
        assert!(cookie.persistent);
        assert_eq!(cookie.expires, Some(NOW + Duration::hours(1)));
        assert_eq!(cookie.canonical_host, "a.example.com");
    }

    #[test]
    fn test_parse_rejects_public_suffix_domain() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert!(!jar.parse_and_save_cookie(&url, "evil=1; Domain=com", NOW));
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_parse_negative_max_age_deletes() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.parse_and_save_cookie(&url, "sid=1; Max-Age=600", NOW - Duration::minutes(5));
        jar.parse_and_save_cookie(&url, "sid=; Max-Age=0", NOW);

        let cookie = jar.get("example.com", "/", "sid").unwrap();
        assert!(cookie.is_expired(NOW));
        jar.delete_expired(NOW);
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_parse_deletion_of_unknown_cookie_leaves_tombstone() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert!(jar.parse_and_save_cookie(&url, "x=; Max-Age=0", NOW));

        let tombstone = jar.get("example.com", "/", "x").unwrap();
        assert_eq!(tombstone.expires, Some(NOW));
        assert_eq!(tombstone.updated, NOW);
        assert_eq!(tombstone.creation_time, NOW);
        assert_eq!(tombstone.value, "");

        let on_disk = make_test_cookie("x", "example.com", NOW - Duration::minutes(1));
        assert_eq!(jar.merge(vec![on_disk]), 0);
    }

    #[test]
    fn test_parse_huge_max_age_is_clamped() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert!(jar.parse_and_save_cookie(&url, "a=1; Max-Age=999999999999", NOW));
        assert!(jar.parse_and_save_cookie(&url, "b=1; Max-Age=253402300000", NOW));

        for name in ["a", "b"] {
            let cookie = jar.get("example.com", "/", name).unwrap();
            assert_eq!(cookie.expires, Some(MAX_EXPIRY));
            assert!(cookie.persistent);
            // Still writable as RFC 3339.
            serde_json::to_string(cookie).unwrap();
        }
        assert_eq!(MAX_EXPIRY.year(), 9999);
    }

    #[test]
    fn test_update_keeps_creation_time() {
        let mut jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        let first = NOW - Duration::days(1);
        jar.parse_and_save_cookie(&url, "sid=1; Max-Age=86400000", first);
        jar.parse_and_save_cookie(&url, "sid=2; Max-Age=86400000", NOW);

        let cookie = jar.get("example.com", "/", "sid").unwrap();
        assert_eq!(cookie.value, "2");
        assert_eq!(cookie.creation_time, first);
        assert_eq!(cookie.updated, NOW);
    }
}
