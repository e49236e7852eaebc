//! Active dashboard user profile.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub target_role: Option<String>,
    pub last_updated: i64,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            target_role: None,
            last_updated: 0,
        }
    }
}

/// Partial profile update. `target_role: Some(None)` clears the role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub target_role: Option<Option<String>>,
}

impl UserPatch {
    pub(crate) fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(target_role) = &self.target_role {
            user.target_role = target_role.clone();
        }
    }
}
