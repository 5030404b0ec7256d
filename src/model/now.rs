use chrono::{Local, NaiveDate};

/// A single reading of the clock, captured once per command so every step of
/// that command agrees on what "today" and "now" are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    /// Local calendar date
    pub today: NaiveDate,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl Now {
    pub fn local() -> Self {
        let now = Local::now();
        Now {
            today: now.date_naive(),
            timestamp_ms: now.timestamp_millis(),
        }
    }

    pub fn fixed(today: NaiveDate, timestamp_ms: i64) -> Self {
        Now {
            today,
            timestamp_ms,
        }
    }
}
