//! Fixed-width SVN timestamp codec and MD5 helpers.
//!
//! The wire format is the 27-byte string `YYYY-MM-DDTHH:MM:SS.uuuuuuZ`. Any
//! other length or layout parses to `Timestamp::ZERO` rather than failing —
//! that mirrors what the format's producers tolerate in practice.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Seconds-since-epoch plus a microsecond fraction in `[0, 999_999]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: u32,
}

const RENDERED_LEN: usize = 27;

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { sec: 0, usec: 0 };

    pub fn new(sec: i64, usec: u32) -> Self {
        let mut ts = Timestamp { sec, usec };
        ts.normalize();
        ts
    }

    fn normalize(&mut self) {
        if self.usec >= 1_000_000 {
            self.sec += (self.usec / 1_000_000) as i64;
            self.usec %= 1_000_000;
        }
    }

    /// Parse the canonical 27-byte form; any malformed input parses to `ZERO`.
    pub fn parse(s: &str) -> Timestamp {
        if s.len() != RENDERED_LEN {
            return Timestamp::ZERO;
        }
        let bytes = s.as_bytes();
        if bytes[4] != b'-'
            || bytes[7] != b'-'
            || bytes[10] != b'T'
            || bytes[13] != b':'
            || bytes[16] != b':'
            || bytes[19] != b'.'
            || bytes[26] != b'Z'
        {
            return Timestamp::ZERO;
        }
        let year: i32 = match s[0..4].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let month: u32 = match s[5..7].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let day: u32 = match s[8..10].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let hour: u32 = match s[11..13].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let minute: u32 = match s[14..16].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let second: u32 = match s[17..19].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let usec: u32 = match s[20..26].parse() {
            Ok(v) => v,
            Err(_) => return Timestamp::ZERO,
        };
        let dt = match Utc.with_ymd_and_hms(year, month, day, hour, minute, second) {
            chrono::LocalResult::Single(dt) => dt,
            _ => return Timestamp::ZERO,
        };
        Timestamp {
            sec: dt.timestamp(),
            usec,
        }
    }

    /// Render the canonical 27-byte form.
    pub fn render(&self) -> String {
        let dt = DateTime::<Utc>::from_timestamp(self.sec, 0).unwrap_or_else(|| {
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0)
                .single()
                .expect("epoch is a valid date")
        });
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}Z",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            self.usec
        )
    }

    /// Returns `cand` if strictly greater than `prev`, else `prev` advanced by one microsecond.
    pub fn advance_if_not_monotone(prev: Timestamp, cand: Timestamp) -> Timestamp {
        if cand > prev {
            cand
        } else {
            Timestamp::new(prev.sec, prev.usec + 1)
        }
    }
}

/// Streaming MD5 accumulator, thin enough to wrap `md5::Context` without
/// leaking the dependency's types into callers that only ever finalize once.
#[derive(Default)]
pub struct Md5Builder {
    ctx: md5::Context,
}

impl Md5Builder {
    pub fn new() -> Self {
        Self {
            ctx: md5::Context::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.ctx.consume(data);
    }

    pub fn finalize_hex(self) -> String {
        format!("{:x}", self.ctx.compute())
    }
}

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Accepts exactly 32 lowercase hex characters.
pub fn is_valid_md5_hex(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_render_roundtrip() {
        let s = "2024-06-01T00:00:00.500000Z";
        let ts = Timestamp::parse(s);
        assert_eq!(ts.render(), s);
    }

    #[test]
    fn malformed_parses_to_zero() {
        assert_eq!(Timestamp::parse("garbage"), Timestamp::ZERO);
        assert_eq!(Timestamp::parse("2024-06-01T00:00:00.500000"), Timestamp::ZERO);
    }

    #[test]
    fn advance_carries_seconds() {
        let prev = Timestamp::new(100, 999_999);
        let cand = Timestamp::new(100, 999_999);
        let next = Timestamp::advance_if_not_monotone(prev, cand);
        assert_eq!(next, Timestamp::new(101, 0));
    }

    #[test]
    fn advance_keeps_strictly_greater_candidate() {
        let prev = Timestamp::new(100, 0);
        let cand = Timestamp::new(100, 1);
        assert_eq!(Timestamp::advance_if_not_monotone(prev, cand), cand);
    }

    #[test]
    fn md5_known_values() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hi\n"), "b1946ac92492d2347c6235b4d2611184");
    }

    #[test]
    fn md5_validator() {
        assert!(is_valid_md5_hex("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(!is_valid_md5_hex("D41D8CD98F00B204E9800998ECF8427E"));
        assert!(!is_valid_md5_hex("short"));
    }
}
