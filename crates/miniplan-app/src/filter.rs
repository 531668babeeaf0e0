//! Task filters built from user-facing inputs.

use std::str::FromStr;

use miniplan_core::PlannerState;
use miniplan_core::id::{GroupId, TagId};
use miniplan_core::model::Task;
use miniplan_core::text_matcher::TextMatcher;
use thiserror::Error;

/// Error type returned while constructing task filters from user-facing inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterBuildError {
    /// Status token not understood.
    #[error("invalid status: {token} (expected all, active or completed)")]
    InvalidStatus {
        /// Offending input.
        token: String,
    },
    /// No tag carries this name.
    #[error("unknown tag: {name}")]
    UnknownTag {
        /// Requested tag name.
        name: String,
    },
}

/// Result alias for filter construction helpers.
pub type FilterBuildResult<T> = Result<T, FilterBuildError>;

/// Which group a filter selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupSelector {
    /// Every group, ungrouped included.
    #[default]
    Any,
    /// Only tasks without a group.
    Ungrouped,
    /// Only tasks in the given group.
    Group(GroupId),
}

impl GroupSelector {
    fn matches(&self, task: &Task) -> bool {
        match self {
            Self::Any => true,
            Self::Ungrouped => task.group_id.is_none(),
            Self::Group(id) => task.in_group(Some(id)),
        }
    }
}

/// Completion status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Active and completed tasks.
    #[default]
    All,
    /// Tasks not yet completed.
    Active,
    /// Completed tasks.
    Completed,
}

impl StatusFilter {
    const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = FilterBuildError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "open" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(FilterBuildError::InvalidStatus { token: raw.to_owned() }),
        }
    }
}

/// Resolved task filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Group selection.
    pub group: GroupSelector,
    /// Completion status.
    pub status: StatusFilter,
    /// Required tags (logical AND).
    pub tags: Vec<TagId>,
    /// Case-insensitive search text.
    pub text: Option<String>,
}

impl TaskFilter {
    /// Tasks of `state` matching every clause, in display order.
    #[must_use]
    pub fn apply<'a>(&self, state: &'a PlannerState) -> Vec<&'a Task> {
        let matcher = self.text.as_deref().and_then(TextMatcher::new);
        state
            .tasks()
            .iter()
            .filter(|task| self.group.matches(task))
            .filter(|task| self.status.matches(task))
            .filter(|task| self.tags.iter().all(|tag| task.tags.contains(tag)))
            .filter(|task| {
                matcher
                    .as_ref()
                    .is_none_or(|matcher| matcher.matches(task, state.tags()))
            })
            .collect()
    }
}

/// Builder that accepts user-facing strings and resolves them into a [`TaskFilter`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    group: GroupSelector,
    status: StatusFilter,
    tag_names: Vec<String>,
    text: Option<String>,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a group.
    #[must_use]
    pub fn with_group(mut self, group: GroupSelector) -> Self {
        self.group = group;
        self
    }

    /// Parse and set the status clause.
    ///
    /// # Errors
    /// Returns an error if the token is not a known status.
    pub fn with_status(mut self, raw: &str) -> FilterBuildResult<Self> {
        self.status = raw.parse()?;
        Ok(self)
    }

    /// Extend the required tag names (logical AND, case-insensitive).
    #[must_use]
    pub fn with_tag_names(mut self, names: &[String]) -> Self {
        self.tag_names.extend(names.iter().cloned());
        self
    }

    /// Configure the optional search text (whitespace-only inputs become `None`).
    #[must_use]
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text.and_then(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        });
        self
    }

    /// Resolve tag names against `state` and produce the filter.
    ///
    /// # Errors
    /// Returns an error if a tag name matches no tag.
    pub fn build(self, state: &PlannerState) -> FilterBuildResult<TaskFilter> {
        let tags = self
            .tag_names
            .into_iter()
            .map(|name| {
                state
                    .tags()
                    .iter()
                    .find(|tag| tag.name.eq_ignore_ascii_case(name.trim()))
                    .map(|tag| tag.id.clone())
                    .ok_or(FilterBuildError::UnknownTag { name })
            })
            .collect::<FilterBuildResult<Vec<_>>>()?;
        Ok(TaskFilter {
            group: self.group,
            status: self.status,
            tags,
            text: self.text,
        })
    }
}
