//! Field encodings found in review exports, folded into the store's types.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Canonical timestamp layout of the comment table.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored when a date is missing, or unreadable under
/// [`DatePolicy::Epoch`](crate::DatePolicy::Epoch).
pub const EPOCH: &str = "1970-01-01 00:00:00";

const DATETIME_LAYOUTS: [&str; 13] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

// Slashes read month-first, dashes and dots day-first.
const DATE_LAYOUTS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// `"1"` and `"yes"` in any case are true; everything else is false.
pub fn parse_flag(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    lowered == "1" || lowered == "yes"
}

/// Leading-integer parse: optional whitespace and sign, then digits up to the
/// first non-digit. No digits reads as 0; overflow saturates.
pub fn parse_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        value = match value.checked_mul(10).and_then(|v| v.checked_add(d)) {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }
    if negative {
        -value
    } else {
        value
    }
}

/// A timestamp read from a loosely formatted cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LooseDateTime {
    /// Clock time as written.
    pub wall: NaiveDateTime,
    /// Present when the cell carried a zone offset.
    pub utc: Option<NaiveDateTime>,
}

impl LooseDateTime {
    pub fn to_local_string(&self) -> String {
        self.wall.format(DATETIME_FORMAT).to_string()
    }

    /// Without an offset the wall clock is taken to already be UTC.
    pub fn to_utc_string(&self) -> String {
        self.utc
            .unwrap_or(self.wall)
            .format(DATETIME_FORMAT)
            .to_string()
    }

    fn zoned(dt: DateTime<FixedOffset>) -> Self {
        Self {
            wall: dt.naive_local(),
            utc: Some(dt.naive_utc()),
        }
    }
}

/// Reads the date layouts review exports actually contain. `None` when the
/// cell is blank or matches nothing.
pub fn parse_loose_datetime(raw: &str) -> Option<LooseDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(secs) = s.strip_prefix('@') {
        let secs: i64 = secs.trim().parse().ok()?;
        let dt = DateTime::<Utc>::from_timestamp(secs, 0)?;
        return Some(LooseDateTime::zoned(dt.fixed_offset()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(LooseDateTime::zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(LooseDateTime::zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(LooseDateTime::zoned(dt));
    }

    let wall = DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some(LooseDateTime { wall, utc: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_only_accept_one_and_yes() {
        let truthy = ["1", "yes", "YES", "Yes", "yEs"];
        let falsy = [
            "", "0", "no", "NO", "true", "TRUE", "y", "on", " yes", "1 ", "11", "garbage",
        ];
        for v in truthy {
            assert!(parse_flag(v), "{v:?} should be true");
        }
        for v in falsy {
            assert!(!parse_flag(v), "{v:?} should be false");
        }
    }

    #[test]
    fn ints_read_leading_digits() {
        assert_eq!(parse_int("5"), 5);
        assert_eq!(parse_int("  42"), 42);
        assert_eq!(parse_int("-3"), -3);
        assert_eq!(parse_int("+7"), 7);
        assert_eq!(parse_int("4.9"), 4);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("99999999999999999999"), i64::MAX);
    }

    #[test]
    fn canonical_dates_pass_through() {
        let dt = parse_loose_datetime("2023-04-05 06:07:08").unwrap();
        assert_eq!(dt.to_local_string(), "2023-04-05 06:07:08");
        assert_eq!(dt.to_utc_string(), "2023-04-05 06:07:08");
    }

    #[test]
    fn loose_layouts() {
        let cases = [
            ("2023-04-05", "2023-04-05 00:00:00"),
            ("2023-04-05 06:07", "2023-04-05 06:07:00"),
            ("2023-04-05T06:07:08.250", "2023-04-05 06:07:08"),
            ("2023/04/05 06:07:08", "2023-04-05 06:07:08"),
            ("04/05/2023", "2023-04-05 00:00:00"),
            ("05-04-2023", "2023-04-05 00:00:00"),
            ("05.04.2023", "2023-04-05 00:00:00"),
            ("  2023-04-05 06:07:08  ", "2023-04-05 06:07:08"),
        ];
        for (raw, want) in cases {
            let got = parse_loose_datetime(raw).map(|d| d.to_local_string());
            assert_eq!(got.as_deref(), Some(want), "input {raw:?}");
        }
    }

    #[test]
    fn offsets_shift_only_the_utc_rendering() {
        let dt = parse_loose_datetime("2023-04-05T06:07:08+02:00").unwrap();
        assert_eq!(dt.to_local_string(), "2023-04-05 06:07:08");
        assert_eq!(dt.to_utc_string(), "2023-04-05 04:07:08");

        let dt = parse_loose_datetime("Wed, 05 Apr 2023 06:07:08 -0100").unwrap();
        assert_eq!(dt.to_utc_string(), "2023-04-05 07:07:08");
    }

    #[test]
    fn unix_seconds() {
        let dt = parse_loose_datetime("@86400").unwrap();
        assert_eq!(dt.to_utc_string(), "1970-01-02 00:00:00");
    }

    #[test]
    fn garbage_dates_are_none() {
        for raw in ["", "   ", "soon", "2023-13-45", "@later", "31/31/2023"] {
            assert!(parse_loose_datetime(raw).is_none(), "input {raw:?}");
        }
    }
}
