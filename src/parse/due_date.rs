use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Resolve the value of a `due:` token relative to `today`.
///
/// Accepts `today`, `tomorrow`, `nextweek`/`next-week` (Monday of the next
/// ISO week), a strict `YYYY-MM-DD` date, or a weekday (`mon`, `monday`, ...)
/// meaning its next occurrence on or after today. Returns `None` for anything
/// else.
pub fn resolve_due_date(value: &str, today: NaiveDate) -> Option<NaiveDate> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "nextweek" | "next-week" => next_week_start(today),
        other => parse_iso_date(other)
            .or_else(|| parse_weekday(other).and_then(|day| next_weekday(today, day))),
    }
}

/// Strict `YYYY-MM-DD`: exactly four, two and two digits, and a date that
/// exists on the calendar.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "sun" | "sunday" => Some(Weekday::Sun),
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Next occurrence of `day` at or after `today`
fn next_weekday(today: NaiveDate, day: Weekday) -> Option<NaiveDate> {
    let ahead = (day.num_days_from_sunday() + 7 - today.weekday().num_days_from_sunday()) % 7;
    today.checked_add_days(Days::new(u64::from(ahead)))
}

/// Monday of the ISO week after the one containing `today`
fn next_week_start(today: NaiveDate) -> Option<NaiveDate> {
    let ahead = 7 - today.weekday().num_days_from_monday();
    today.checked_add_days(Days::new(u64::from(ahead)))
}
