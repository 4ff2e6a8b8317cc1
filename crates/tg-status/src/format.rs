//! Display formatting for byte counts, durations and timestamps.

use std::time::{Duration, SystemTime};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;
const TIB: u64 = GIB * 1024;

/// Format a byte count with binary units.
///
/// Counts below 1 KiB are printed as an integer (`"512 B"`); larger counts
/// use the largest unit not exceeding the value with two decimals
/// (`"1.50 KiB"`). TiB is the largest unit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    let (divisor, unit) = match bytes {
        b if b < KIB => return format!("{b} B"),
        b if b < MIB => (KIB, "KiB"),
        b if b < GIB => (MIB, "MiB"),
        b if b < TIB => (GIB, "GiB"),
        _ => (TIB, "TiB"),
    };
    format!("{:.2} {unit}", bytes as f64 / divisor as f64)
}

/// Format a signed duration compactly (`"0s"`, `"5m32s"`, `"1h0m5s"`),
/// rounded to whole seconds half away from zero.
#[must_use]
pub fn format_duration(delta: TimeDelta) -> String {
    let millis = delta.num_milliseconds();
    let seconds = (millis.unsigned_abs() + 500) / 1000;
    let sign = if millis < 0 && seconds > 0 { "-" } else { "" };
    format!("{sign}{}", compact_seconds(seconds))
}

/// Format an unsigned interval the same way as [`format_duration`].
#[must_use]
pub fn format_interval(interval: Duration) -> String {
    let seconds = interval.as_secs() + u64::from(interval.subsec_millis() >= 500);
    compact_seconds(seconds)
}

fn compact_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Render a timestamp as RFC 3339 in UTC with whole seconds.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a driver handshake time, treating the Unix epoch as "never".
#[must_use]
pub fn handshake_time(at: Option<SystemTime>) -> Option<DateTime<Utc>> {
    at.filter(|t| *t > SystemTime::UNIX_EPOCH).map(DateTime::<Utc>::from)
}
