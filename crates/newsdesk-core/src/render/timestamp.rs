//! Server-side presentation of `<t:unix:code>` timestamps.
//!
//! Text is produced in en-US and anchored to UTC. The bundled client
//! script re-renders each `<time data-format>` in the viewer's own locale
//! and zone, so this is only the no-script fallback.

use chrono::{DateTime, SecondsFormat, Utc};

/// chrono pattern for a single-character presentation code.
fn pattern(code: &str) -> Option<&'static str> {
    Some(match code {
        "t" => "%-I:%M %p",
        "T" => "%-I:%M:%S %p",
        "d" => "%-m/%-d/%y",
        "D" => "%b %-d, %Y",
        // `R` is relative client-side; the static text matches `f`.
        "f" | "R" => "%b %-d, %Y, %-I:%M %p",
        "F" => "%B %-d, %Y at %-I:%M:%S %p",
        _ => return None,
    })
}

fn instant(unix: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(unix, 0)
}

/// Presentation text for a timestamp.
///
/// Unknown codes and out-of-range instants render as `"<unix> (<code>)"`.
pub fn format_timestamp(unix: i64, code: &str) -> String {
    match (pattern(code), instant(unix)) {
        (Some(pattern), Some(at)) => at.format(pattern).to_string(),
        _ => format!("{unix} ({code})"),
    }
}

/// ISO-8601 UTC form for the `datetime` attribute.
pub fn iso_utc(unix: i64) -> Option<String> {
    instant(unix).map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}
