use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error for unrecognized filter or sort names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewParseError {
    #[error("unknown filter: {0} (expected all, active, completed, important, archived, or tag:<name>)")]
    UnknownFilter(String),
    #[error("unknown sort mode: {0} (expected manual, creation-asc, creation-desc, due-date, priority, or alphabetical)")]
    UnknownSort(String),
}

/// Named predicate selecting which tasks a view shows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    /// Important and not completed
    Important,
    /// The only filter that shows archived tasks
    Archived,
    /// Case-insensitive exact tag match
    Tag(String),
}

impl FromStr for Filter {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            "important" => Ok(Filter::Important),
            "archived" => Ok(Filter::Archived),
            lower => match lower.strip_prefix("tag:") {
                Some(tag) if !tag.trim().is_empty() => Ok(Filter::Tag(tag.trim().to_string())),
                _ => Err(ViewParseError::UnknownFilter(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "active"),
            Filter::Completed => write!(f, "completed"),
            Filter::Important => write!(f, "important"),
            Filter::Archived => write!(f, "archived"),
            Filter::Tag(tag) => write!(f, "tag:{}", tag),
        }
    }
}

impl TryFrom<String> for Filter {
    type Error = ViewParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.to_string()
    }
}

/// Ordering rule applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Stored order, as arranged by the user
    #[default]
    Manual,
    CreationAsc,
    CreationDesc,
    DueDate,
    Priority,
    Alphabetical,
}

impl SortMode {
    pub fn name(self) -> &'static str {
        match self {
            SortMode::Manual => "manual",
            SortMode::CreationAsc => "creation-asc",
            SortMode::CreationDesc => "creation-desc",
            SortMode::DueDate => "due-date",
            SortMode::Priority => "priority",
            SortMode::Alphabetical => "alphabetical",
        }
    }
}

impl FromStr for SortMode {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(SortMode::Manual),
            "creation-asc" => Ok(SortMode::CreationAsc),
            "creation-desc" => Ok(SortMode::CreationDesc),
            "due-date" => Ok(SortMode::DueDate),
            "priority" => Ok(SortMode::Priority),
            "alphabetical" => Ok(SortMode::Alphabetical),
            _ => Err(ViewParseError::UnknownSort(s.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The filter, search term and sort mode that together select a view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: SortMode,
}

impl ViewState {
    /// The trimmed search term, or `None` when no search is active
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        if term.is_empty() { None } else { Some(term) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_parses_names() {
        assert_eq!("all".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!("Active".parse::<Filter>().unwrap(), Filter::Active);
        assert_eq!("archived".parse::<Filter>().unwrap(), Filter::Archived);
        assert_eq!(
            "tag:Errand".parse::<Filter>().unwrap(),
            Filter::Tag("errand".into())
        );
    }

    #[test]
    fn filter_rejects_unknown_and_empty_tag() {
        assert!("someday".parse::<Filter>().is_err());
        assert!("tag:".parse::<Filter>().is_err());
        assert!("tag:   ".parse::<Filter>().is_err());
    }

    #[test]
    fn filter_display_matches_parse() {
        let filter = Filter::Tag("home".into());
        assert_eq!(filter.to_string(), "tag:home");
        assert_eq!(filter.to_string().parse::<Filter>().unwrap(), filter);
    }

    #[test]
    fn sort_mode_parses_kebab_names() {
        assert_eq!("due-date".parse::<SortMode>().unwrap(), SortMode::DueDate);
        assert_eq!(
            "CREATION-DESC".parse::<SortMode>().unwrap(),
            SortMode::CreationDesc
        );
        assert!("random".parse::<SortMode>().is_err());
    }

    #[test]
    fn view_state_serde_defaults() {
        let state: ViewState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, ViewState::default());

        let state: ViewState =
            serde_json::from_str(r#"{"filter":"tag:work","sort":"priority"}"#).unwrap();
        assert_eq!(state.filter, Filter::Tag("work".into()));
        assert_eq!(state.sort, SortMode::Priority);
    }

    #[test]
    fn view_state_rejects_bad_filter() {
        assert!(serde_json::from_str::<ViewState>(r#"{"filter":"nope"}"#).is_err());
    }

    #[test]
    fn search_term_trims() {
        let mut state = ViewState::default();
        assert_eq!(state.search_term(), None);
        state.search = "   ".into();
        assert_eq!(state.search_term(), None);
        state.search = "  milk ".into();
        assert_eq!(state.search_term(), Some("milk"));
    }
}
