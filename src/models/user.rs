use serde::{Deserialize, Serialize};

/// An API consumer managed by the console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Body for `POST /admin/users` and `PUT /admin/users/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UserInput {
    pub username: String,
    pub is_active: bool,
}

impl UserInput {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: true,
        }
    }
}
