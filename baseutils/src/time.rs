//! Wall-clock helpers in China Standard Time (UTC+8).
//!
//! Every function takes the current instant explicitly so results are
//! reproducible; the `*_now` variants read the system clock.

use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Timelike, Utc};

/// China Standard Time, a fixed UTC+8 offset.
pub const CST: FixedOffset = match FixedOffset::east_opt(8 * 3600) {
    Some(offset) => offset,
    None => panic!("UTC+8 is a valid offset"),
};

/// `2006-01-02 15:04:05`
pub const DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";
/// `2006-01-02 00:00:00`
pub const DAY_START: &str = "%Y-%m-%d 00:00:00";
/// `2006年01月02日 15:04`
pub const DATE_TIME_MINUTE_CN: &str = "%Y年%m月%d日 %H:%M";
/// `2006-01-02`
pub const DATE: &str = "%Y-%m-%d";
/// `2006年01月02日`
pub const DATE_CN: &str = "%Y年%m月%d日";
/// `2006_01_02`
pub const DATE_UNDERSCORE: &str = "%Y_%m_%d";
/// `20060102`
pub const COMPACT_DATE: &str = "%Y%m%d";
/// `20060102150405`
pub const COMPACT_DATE_TIME: &str = "%Y%m%d%H%M%S";

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: i64 = 3600;

const SECONDS_PER_DAY: i64 = 86_400;

/// Current time in [`CST`].
pub fn now_cst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&CST)
}

/// Seconds from `now` until the next CST midnight, in `1..=86400`.
pub fn seconds_left_today(now: DateTime<Utc>) -> i64 {
    let local = now.with_timezone(&CST);
    SECONDS_PER_DAY - i64::from(local.num_seconds_from_midnight())
}

/// [`seconds_left_today`] for the current time.
pub fn seconds_left_today_now() -> i64 {
    seconds_left_today(Utc::now())
}

/// Formats the CST time `seconds` before `now` with a chrono `layout`.
///
/// An invalid layout yields an empty string.
pub fn format_seconds_ago(now: DateTime<Utc>, seconds: i64, layout: &str) -> String {
    let then = TimeDelta::try_seconds(seconds)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(now);
    render(then.with_timezone(&CST), layout)
}

/// Formats CST `now` with a PHP-style pattern.
///
/// The letters `Y` (4-digit year), `y` (2-digit year), `m`, `d`, `H`, `i`
/// (minutes) and `s` are replaced by zero-padded date parts; every other
/// character is copied verbatim.
///
/// ```
/// use baseutils::time::format_pattern;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 9, 16, 5, 7).unwrap();
/// assert_eq!(format_pattern(now, "Y/m/d H:i:s"), "2024/03/10 00:05:07");
/// assert_eq!(format_pattern(now, "100%"), "100%");
/// ```
pub fn format_pattern(now: DateTime<Utc>, pattern: &str) -> String {
    let layout: String = pattern
        .chars()
        .map(|ch| match pattern_spec(ch) {
            Some(spec) => spec.to_owned(),
            None if ch == '%' => "%%".to_owned(),
            None => ch.to_string(),
        })
        .collect();
    render(now.with_timezone(&CST), &layout)
}

/// [`format_pattern`] for the current time.
pub fn format_pattern_now(pattern: &str) -> String {
    format_pattern(Utc::now(), pattern)
}

/// Formats CST `now` with only the pattern letters of `pattern` and parses
/// the digits, e.g. `"Y-m-d"` gives `20240310`. Returns 0 when nothing
/// parsable remains.
pub fn format_pattern_int(now: DateTime<Utc>, pattern: &str) -> i64 {
    let layout: String = pattern.chars().filter_map(pattern_spec).collect();
    render(now.with_timezone(&CST), &layout)
        .parse()
        .unwrap_or(0)
}

/// [`format_pattern_int`] for the current time.
pub fn format_pattern_int_now(pattern: &str) -> i64 {
    format_pattern_int(Utc::now(), pattern)
}

/// The CST day before `now` as `YYYYMMDD`.
pub fn yesterday_int(now: DateTime<Utc>) -> i64 {
    now.with_timezone(&CST)
        .date_naive()
        .pred_opt()
        .and_then(|day| day.format(COMPACT_DATE).to_string().parse().ok())
        .unwrap_or(0)
}

/// [`yesterday_int`] for the current time.
pub fn yesterday_int_now() -> i64 {
    yesterday_int(Utc::now())
}

/// CST day of week of `now`, 0 for Sunday through 6 for Saturday.
pub fn weekday(now: DateTime<Utc>) -> u32 {
    now.with_timezone(&CST).weekday().num_days_from_sunday()
}

/// [`weekday`] for the current time.
pub fn weekday_now() -> u32 {
    weekday(Utc::now())
}

fn pattern_spec(ch: char) -> Option<&'static str> {
    match ch {
        'Y' => Some("%Y"),
        'y' => Some("%y"),
        'm' => Some("%m"),
        'd' => Some("%d"),
        'H' => Some("%H"),
        'i' => Some("%M"),
        's' => Some("%S"),
        _ => None,
    }
}

fn render(time: DateTime<FixedOffset>, layout: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(layout)).is_err() {
        out.clear();
    }
    out
}
