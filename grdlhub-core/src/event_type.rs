//! The title catalog: named kinds of appointments with their staffing rules.

use serde::{Deserialize, Serialize};

use crate::appointment::Category;
use crate::constants::MAX_DESIGNATIONS_LIMIT;
use crate::error::{HubError, HubResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Privilege name a designated user must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_privilege: Option<String>,
    pub max_designations: usize,
}

impl EventType {
    pub fn new(name: impl Into<String>, category: Category, max_designations: usize) -> Self {
        EventType {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            required_privilege: None,
            max_designations,
        }
    }

    pub fn validate(&self) -> HubResult<()> {
        if self.name.trim().is_empty() {
            return Err(HubError::validation("Event type name is required"));
        }
        if !(1..=MAX_DESIGNATIONS_LIMIT).contains(&self.max_designations) {
            return Err(HubError::validation(format!(
                "Designation limit for '{}' must be between 1 and {MAX_DESIGNATIONS_LIMIT}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn matches_title(&self, title: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(title.trim())
    }
}

/// The catalog entry for an appointment title, if the title is not free text.
pub fn for_title<'a>(event_types: &'a [EventType], title: &str) -> Option<&'a EventType> {
    event_types.iter().find(|t| t.matches_title(title))
}
