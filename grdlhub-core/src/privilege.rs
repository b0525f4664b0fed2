//! Privileges held by users and required by event types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Privilege {
    pub fn new(name: impl Into<String>) -> Self {
        Privilege {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            active: true,
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Find an active privilege by display name (case-insensitive).
pub fn find_active_by_name<'a>(privileges: &'a [Privilege], name: &str) -> Option<&'a Privilege> {
    privileges.iter().find(|p| p.active && p.has_name(name))
}
