//! Extraction and freshness validation of the revealed code.
//!
//! On a win the page announces something like
//! `You win! Here's your secret: 20250902093507`. The code is a
//! `YYYYMMDDHHMMSS` timestamp in the host's local timezone, so freshness can
//! be checked against an injected clock and UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, warn};

/// Marker preceding the code in the win announcement.
const CODE_MARKER: &str = "secret:";

/// Minimum digit-run length accepted by the fallback scan.
const MIN_CODE_DIGITS: usize = 13;

/// Pulls the code out of announcement text.
///
/// Digits following the `secret:` marker win; otherwise the first run of 13
/// or more consecutive digits anywhere in the text is taken.
pub fn extract_code(text: &str) -> Option<String> {
    if let Some(idx) = text.find(CODE_MARKER) {
        let tail = &text[idx + CODE_MARKER.len()..];
        let digits: String = tail
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            debug!(code_length = digits.len(), "Extracted code after marker");
            return Some(digits);
        }
    }
    first_long_digit_run(text)
}

/// First run of at least [`MIN_CODE_DIGITS`] consecutive digits.
fn first_long_digit_run(text: &str) -> Option<String> {
    let mut run = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            run.push(c);
        } else {
            if run.len() >= MIN_CODE_DIGITS {
                return Some(run);
            }
            run.clear();
        }
    }
    (run.len() >= MIN_CODE_DIGITS).then_some(run)
}

/// Checks that a code parses as a recent host-local timestamp.
///
/// `now` is the caller's clock and `host_offset` the host's timezone;
/// validation never reads the process environment. The check is advisory:
/// the session reports a stale code with a warning rather than dropping it.
pub fn validate_code(
    code: &str,
    now: DateTime<Utc>,
    host_offset: FixedOffset,
    freshness: TimeDelta,
) -> bool {
    let Ok(stamp) = NaiveDateTime::parse_from_str(code, "%Y%m%d%H%M%S") else {
        warn!(code, "Code does not parse as a timestamp");
        return false;
    };
    let host_now = now.with_timezone(&host_offset).naive_local();
    let skew = (host_now - stamp).abs();
    let fresh = skew <= freshness;
    if !fresh {
        warn!(code, skew_secs = skew.num_seconds(), "Code is outside the freshness window");
    }
    fresh
}
