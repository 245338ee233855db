use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single stored cookie, in the shape it is written to disk.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// Field names on disk are PascalCase (`Name`, `HttpOnly`, `CanonicalHost`, ...)
/// and timestamps are RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub host_only: bool,
    /// `None` for cookies that never expire by time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
    #[serde(rename = "Creation", with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(rename = "LastAccess", with = "time::serde::rfc3339")]
    pub last_access_time: OffsetDateTime,
    /// Last modification; the newer copy wins when two jars are merged.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    /// Normalized host the cookie was set for. Primary sort key on disk.
    pub canonical_host: String,
}

impl CanonicalCookie {
    /// Host-only cookie for `domain`, created at `now`.
    ///
    /// The domain is lowercased. The cookie is persistent exactly when it has
    /// an expiry.
    pub fn new(
        name: String,
        value: String,
        domain: String,
        path: String,
        now: OffsetDateTime,
        expires: Option<OffsetDateTime>,
    ) -> Self {
        let domain = domain.to_ascii_lowercase();
        let canonical_host = crate::cookies::monster::canonical_host(&domain);
        Self {
            name,
            value,
            domain,
            path,
            secure: false,
            http_only: false,
            persistent: expires.is_some(),
            host_only: true,
            expires,
            creation_time: now,
            last_access_time: now,
            updated: now,
            canonical_host,
        }
    }

    /// Identity of the cookie within its group.
    pub fn id(&self) -> String {
        format!("{};{};{}", self.domain, self.path, self.name)
    }

    /// True once the expiry is at or before `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expiry| expiry <= now)
    }
}
