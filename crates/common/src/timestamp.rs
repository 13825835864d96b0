//! Wall-clock timestamp helpers.
//!
//! Timestamps carried on the wire are treated as opaque by every consumer;
//! this module is the single place that decides how they are rendered.

use chrono::Utc;

/// Current wall-clock time, rendered as RFC 3339 (ISO 8601).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
