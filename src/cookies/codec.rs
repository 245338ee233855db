//! JSON encoding of the cookie file.
//!
//! The file holds a single JSON array of [`CanonicalCookie`] objects. Reading
//! distinguishes three cases:
//!
//! | Input | Result |
//! |-------|--------|
//! | empty or whitespace only | `Ok(vec![])` |
//! | valid JSON, not a cookie array (older formats) | `Ok(vec![])`, diagnostic reported |
//! | invalid JSON | `Err(JarError::Decode)` |

use crate::base::{Diagnostic, DiagnosticSink, JarError};
use crate::cookies::canonical_cookie::CanonicalCookie;
use serde_json::Value;
use std::io::{self, Read, Write};

/// Read one JSON value from `reader` and interpret it as a cookie list.
///
/// Anything after the first value is ignored.
pub fn decode<R: Read>(
    reader: R,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<CanonicalCookie>, JarError> {
    let mut values = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    let value = match values.next() {
        Some(value) => value?,
        None => return Ok(Vec::new()),
    };

    match serde_json::from_value::<Vec<CanonicalCookie>>(value) {
        Ok(cookies) => Ok(cookies),
        Err(e) => {
            sink.report(Diagnostic::DiscardedLegacyData {
                reason: e.to_string(),
            });
            Ok(Vec::new())
        }
    }
}

/// Write `cookies` to `writer` as one JSON array followed by a newline.
///
/// Cookies are written in the order given; see
/// [`ordering`](crate::cookies::ordering) for the order the jar uses.
pub fn encode<W: Write>(mut writer: W, cookies: &[CanonicalCookie]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, cookies)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
