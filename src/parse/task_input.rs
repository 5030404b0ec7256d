use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::task::normalize_tags;
use crate::parse::due_date::resolve_due_date;
use crate::util::text::{collapse_whitespace, sanitize_line};

/// `due:<value>`, the value running to the next whitespace
static DUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)due:(\S+)").expect("due pattern is valid"));

/// `@name` or `#name`, names made of ASCII word characters and hyphens
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[@#]([A-Za-z0-9_-]+)").expect("tag pattern is valid"));

/// `p:high` or `!important` (any case), not glued to a preceding word and
/// ending at a word boundary
static IMPORTANCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\w:!])(p:high|!important)\b").expect("importance pattern is valid")
});

/// Why a line of input could not become a task
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("please enter a task description")]
    Empty,
    #[error("invalid date: \"{0}\". Use YYYY-MM-DD, today, tomorrow, nextweek, or Mon-Sun")]
    InvalidDate(String),
    #[error("task description cannot be empty after parsing keywords")]
    EmptyAfterParsing,
}

/// Structured fields extracted from one line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTask {
    pub text: String,
    /// Lowercase, deduplicated, first-seen order
    pub tags: Vec<String>,
    pub is_important: bool,
    pub due_date: Option<NaiveDate>,
}

/// Parse a raw input line like `Buy milk due:tomorrow #errand !important`.
///
/// Extraction runs in a fixed order: the due-date token, then the importance
/// token, then tags. Tags are collected from the raw input so that an earlier
/// strip can never split a tag. Whitespace is collapsed after every strip.
pub fn parse_task_input(raw: &str, today: NaiveDate) -> Result<ParsedTask, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut text = raw.to_string();

    // 1. Due date
    let mut due_date = None;
    if let Some(caps) = DUE_PATTERN.captures(raw) {
        let token = caps.get(0).map_or("", |m| m.as_str());
        let value = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
        let date = resolve_due_date(&value, today).ok_or(ParseError::InvalidDate(value))?;
        due_date = Some(date);
        text = collapse_whitespace(&text.replacen(token, "", 1));
    }

    // 2. Importance
    let (stripped, is_important) = strip_importance(&text);
    text = stripped;

    // 3. Tags, matched against the raw input
    let mut tags = Vec::new();
    for caps in TAG_PATTERN.captures_iter(raw) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        tags.push(name.as_str().to_ascii_lowercase());
        text = collapse_whitespace(&text.replacen(whole.as_str(), "", 1));
    }
    // A due token cut out of a tag can leave a shorter tag behind
    while TAG_PATTERN.is_match(&text) {
        text = collapse_whitespace(&TAG_PATTERN.replace_all(&text, ""));
    }

    let text = sanitize_line(&text);
    if text.is_empty() {
        return Err(ParseError::EmptyAfterParsing);
    }

    Ok(ParsedTask {
        text,
        tags: normalize_tags(tags),
        is_important,
        due_date,
    })
}

/// Remove the first `p:high` or `!important` token.
fn strip_importance(text: &str) -> (String, bool) {
    match IMPORTANCE_PATTERN.captures(text).and_then(|caps| caps.get(1)) {
        Some(token) => {
            let stripped = format!("{}{}", &text[..token.start()], &text[token.end()..]);
            (collapse_whitespace(&stripped), true)
        }
        None => (text.to_string(), false),
    }
}
