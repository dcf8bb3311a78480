//! Storage types for the project storage abstraction layer.
//!
//! This module defines the persisted [`Project`] entity, the [`ProjectInput`]
//! payload used for create/overwrite, and the [`ProjectFilter`] used for
//! secondary (uncached) queries.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Known project status values.
pub mod status {
    pub const PLANNING: &str = "PLANNING";
    pub const ACTIVE: &str = "ACTIVE";
    pub const COMPLETED: &str = "COMPLETED";
    pub const PAUSED: &str = "PAUSED";

    /// All statuses the system knows about.
    pub const ALL: [&str; 4] = [PLANNING, ACTIVE, COMPLETED, PAUSED];
}

/// Maximum length of `title`, in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length of `description`, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum length of `status`, in characters.
pub const MAX_STATUS_LEN: usize = 50;
/// Maximum length of `tech_stack`, in characters.
pub const MAX_TECH_STACK_LEN: usize = 500;
/// Maximum length of `category`, in characters.
pub const MAX_CATEGORY_LEN: usize = 100;

/// A project as stored in the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Identity assigned by the storage backend on insert.
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Grouping field, e.g. `PLANNING` or `ACTIVE`.
    pub status: String,
    /// When the project was created. Set by the storage backend.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the project was last overwritten, if ever.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    pub tech_stack: Option<String>,
    pub team_size: Option<i32>,
    pub category: Option<String>,
    pub is_public: bool,
}

impl Project {
    /// Builds a freshly inserted project from its input.
    #[must_use]
    pub fn from_input(id: i32, input: &ProjectInput, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status.clone(),
            created_at,
            updated_at: None,
            tech_stack: input.tech_stack.clone(),
            team_size: input.team_size,
            category: input.category.clone(),
            is_public: input.is_public,
        }
    }

    /// Returns a copy with every mutable field replaced by `input`.
    ///
    /// `id` and `created_at` are preserved; `updated_at` is stamped with `now`.
    #[must_use]
    pub fn overwritten(&self, input: &ProjectInput, now: OffsetDateTime) -> Self {
        Self {
            updated_at: Some(now),
            ..Self::from_input(self.id, input, self.created_at)
        }
    }

    /// Timestamp of the last change, falling back to creation time.
    #[must_use]
    pub fn last_changed(&self) -> OffsetDateTime {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// The client-supplied fields of a project, used for create and overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default)]
    pub team_size: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

fn default_status() -> String {
    status::PLANNING.to_string()
}

fn default_is_public() -> bool {
    true
}

impl Default for ProjectInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            status: default_status(),
            tech_stack: None,
            team_size: None,
            category: None,
            is_public: default_is_public(),
        }
    }
}

impl ProjectInput {
    /// Creates a new input with the given title and defaults for the rest.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    #[must_use]
    pub fn with_tech_stack(mut self, tech_stack: impl Into<String>) -> Self {
        self.tech_stack = Some(tech_stack.into());
        self
    }

    #[must_use]
    pub fn with_team_size(mut self, team_size: i32) -> Self {
        self.team_size = Some(team_size);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Checks field constraints.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidProject` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.title.trim().is_empty() {
            return Err(StorageError::invalid_project("title is required"));
        }
        check_len("title", &self.title, MAX_TITLE_LEN)?;
        if let Some(ref description) = self.description {
            check_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        if self.status.trim().is_empty() {
            return Err(StorageError::invalid_project("status is required"));
        }
        check_len("status", &self.status, MAX_STATUS_LEN)?;
        if let Some(ref tech_stack) = self.tech_stack {
            check_len("tech_stack", tech_stack, MAX_TECH_STACK_LEN)?;
        }
        if let Some(ref category) = self.category {
            check_len("category", category, MAX_CATEGORY_LEN)?;
        }
        if let Some(team_size) = self.team_size
            && team_size < 0
        {
            return Err(StorageError::invalid_project(
                "team_size must not be negative",
            ));
        }
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), StorageError> {
    if value.chars().count() > max {
        return Err(StorageError::invalid_project(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Predicate for secondary queries. Results are never cached.
///
/// String comparisons are case-insensitive. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

impl ProjectFilter {
    /// Creates an empty filter that matches every project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status only.
    #[must_use]
    pub fn by_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    /// Returns `true` if no criteria are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.category.is_none() && self.is_public.is_none()
    }

    /// Evaluates the filter against a project.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(ref status) = self.status
            && !project.status.eq_ignore_ascii_case(status)
        {
            return false;
        }
        if let Some(ref category) = self.category {
            match project.category {
                Some(ref c) if c.eq_ignore_ascii_case(category) => {}
                _ => return false,
            }
        }
        if let Some(is_public) = self.is_public
            && project.is_public != is_public
        {
            return false;
        }
        true
    }
}

/// Sorts projects newest first, breaking creation-time ties by descending id.
pub fn sort_newest_first(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
