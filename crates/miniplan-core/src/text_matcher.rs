use crate::model::{Tag, Task};

/// Case-insensitive substring matcher for task fields.
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    #[must_use]
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    /// Determine whether any textual field of the task contains the query.
    ///
    /// Tag names are resolved through `tags`; unknown tag ids never match.
    #[must_use]
    pub fn matches(&self, task: &Task, tags: &[Tag]) -> bool {
        self.matches_field(&task.title)
            || self.matches_field(&task.description)
            || task
                .description_entries
                .iter()
                .any(|entry| self.matches_field(&entry.text))
            || task
                .subtasks
                .iter()
                .any(|subtask| self.matches_field(&subtask.title))
            || task.tags.iter().any(|tag_id| {
                tags.iter()
                    .find(|tag| &tag.id == tag_id)
                    .is_some_and(|tag| self.matches_field(&tag.name))
            })
    }

    fn matches_field(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{SubtaskId, TagId};
    use crate::model::{DescriptionEntry, Subtask};
    use time::OffsetDateTime;

    fn matcher(query: &str) -> TextMatcher {
        TextMatcher::new(query).unwrap_or_else(|| panic!("matcher must exist for queries with content"))
    }

    #[test]
    fn matcher_skips_blank_queries() {
        assert!(TextMatcher::new("").is_none());
        assert!(TextMatcher::new("   ").is_none());
        assert!(TextMatcher::new("\n").is_none());
    }

    #[test]
    fn matcher_finds_text_across_fields() {
        let tag = Tag {
            id: TagId::new(),
            name: "Urgent".into(),
            color: "#ef4444".into(),
        };
        let mut task = Task::new("Renew Passport", None, 0);
        task.description = "bring photos".into();
        task.description_entries
            .push(DescriptionEntry::new("Office opens at nine", OffsetDateTime::now_utc()));
        task.subtasks.push(Subtask {
            id: SubtaskId::new(),
            title: "Book appointment".into(),
            completed: false,
        });
        task.tags.push(tag.id.clone());
        let tags = vec![tag];

        for query in ["passport", "PHOTOS", "nine", "appointment", "urgent"] {
            assert!(matcher(query).matches(&task, &tags), "query {query}");
        }
        assert!(!matcher("groceries").matches(&task, &tags));
    }

    #[test]
    fn matcher_ignores_unknown_tags() {
        let mut task = Task::new("Plain", None, 0);
        task.tags.push(TagId::new());
        assert!(!matcher("urgent").matches(&task, &[]));
    }

    #[test]
    fn matcher_handles_non_ascii_case() {
        let task = Task::new("Übungen machen", None, 0);
        assert!(matcher("übungen").matches(&task, &[]));
    }
}
