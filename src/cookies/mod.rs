//! Cookie storage and its on-disk persistence.
//!
//! # Architecture
//!
//! | Piece | Type | Responsibility |
//! |-------|------|----------------|
//! | Record | [`CanonicalCookie`](canonical_cookie::CanonicalCookie) | one cookie, as written to disk |
//! | Store | [`CookieMonster`](monster::CookieMonster) | in-memory jar, merge rules, expiry |
//! | Store interface | [`CookieStore`](store::CookieStore) | what persistence needs from a store |
//! | Codec | [`codec`] | JSON array on disk, tolerant of old formats |
//! | Ordering | [`ordering`] | deterministic order of the written file |
//! | Persistence | [`PersistentJar`](persistence::PersistentJar) | locked merge-then-write `save`, `load` |
//! | Config | [`JarOptions`](options::JarOptions) | file, lock timing, lock directory |
//!
//! # Sharing a cookie file between processes
//!
//! ```rust,no_run
//! use persistjar::cookies::options::JarOptions;
//! use persistjar::cookies::persistence::PersistentJar;
//! use time::OffsetDateTime;
//! use url::Url;
//!
//! let options = JarOptions::new().filename("/tmp/shared-cookies.json");
//! let jar = PersistentJar::open(options)?;
//!
//! let url = Url::parse("https://example.com/login").unwrap();
//! let now = OffsetDateTime::now_utc();
//! jar.store().parse_and_save_cookie(&url, "sid=abc; Path=/; Max-Age=86400", now);
//!
//! // Picks up whatever other processes saved meanwhile, then writes.
//! jar.save(now)?;
//! # Ok::<(), persistjar::base::JarError>(())
//! ```

pub mod canonical_cookie;
pub mod codec;
pub mod monster;
pub mod options;
pub mod ordering;
pub mod persistence;
pub mod psl;
pub mod store;
