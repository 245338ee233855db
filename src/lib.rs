//! # persistjar
//!
//! A file-backed cookie jar that independent processes can share safely.
//!
//! Saving follows a lock, merge, write protocol: take an advisory lock named
//! after the cookie file, merge what is on disk into memory, purge expired
//! cookies, then write a sorted snapshot of the persistent ones. Nothing
//! another process saved in the meantime is lost.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use persistjar::cookies::options::JarOptions;
//! use persistjar::cookies::persistence::PersistentJar;
//! use time::OffsetDateTime;
//!
//! let jar = PersistentJar::open(JarOptions::new().filename("cookies.json"))?;
//! println!("loaded {} cookies", jar.store().total_cookie_count());
//! jar.save(OffsetDateTime::now_utc())?;
//! # Ok::<(), persistjar::base::JarError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and diagnostic sinks
//! - [`cookies`] - Cookie records, the in-memory jar, codec and persistence
//! - [`lock`] - Lock name derivation and cross-process advisory locks

pub mod base;
pub mod cookies;
pub mod lock;
