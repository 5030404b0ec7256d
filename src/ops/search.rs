use serde::Serialize;

use crate::model::task::Task;

/// Which part of a task matched a search term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Note,
    Tag,
    Subtask,
}

/// A case-insensitive substring query over task text, notes, tags and
/// subtask text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    /// Returns `None` for a blank term, which means "no search".
    pub fn new(term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        Some(SearchQuery {
            needle: term.to_lowercase(),
        })
    }

    fn hit(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle)
    }

    /// Every field of `task` containing the term, each reported once, in
    /// title / note / tag / subtask order.
    pub fn match_fields(&self, task: &Task) -> Vec<MatchField> {
        let mut fields = Vec::new();
        if self.hit(&task.text) {
            fields.push(MatchField::Title);
        }
        if self.hit(&task.notes) {
            fields.push(MatchField::Note);
        }
        if task.tags.iter().any(|t| self.hit(t)) {
            fields.push(MatchField::Tag);
        }
        if task.subtasks.iter().any(|s| self.hit(&s.text)) {
            fields.push(MatchField::Subtask);
        }
        fields
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.hit(&task.text)
            || self.hit(&task.notes)
            || task.tags.iter().any(|t| self.hit(t))
            || task.subtasks.iter().any(|s| self.hit(&s.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Subtask;

    fn sample_task() -> Task {
        let mut task = Task::new("t1".into(), 1, "Plan Garden".into());
        task.notes = "order seeds from the catalog".into();
        task.tags = vec!["outdoors".into(), "spring".into()];
        task.subtasks = vec![Subtask::new("s1".into(), "Buy compost".into())];
        task
    }

    #[test]
    fn blank_term_is_no_query() {
        assert_eq!(SearchQuery::new(""), None);
        assert_eq!(SearchQuery::new("   "), None);
    }

    #[test]
    fn matches_each_field_case_insensitively() {
        let task = sample_task();
        let field = |term: &str| SearchQuery::new(term).unwrap().match_fields(&task);
        assert_eq!(field("garden"), vec![MatchField::Title]);
        assert_eq!(field("SEEDS"), vec![MatchField::Note]);
        assert_eq!(field("door"), vec![MatchField::Tag]);
        assert_eq!(field("compost"), vec![MatchField::Subtask]);
        assert!(field("harvest").is_empty());
    }

    #[test]
    fn field_reported_once_when_term_in_several_places() {
        let task = sample_task();
        let query = SearchQuery::new("  o ").unwrap();
        assert_eq!(
            query.match_fields(&task),
            vec![MatchField::Note, MatchField::Tag, MatchField::Subtask]
        );
        assert!(query.matches(&task));
    }

    #[test]
    fn matches_agrees_with_match_fields() {
        let task = sample_task();
        for term in ["plan", "catalog", "spring", "buy", "winter"] {
            let query = SearchQuery::new(term).unwrap();
            assert_eq!(query.matches(&task), !query.match_fields(&task).is_empty());
        }
    }
}
