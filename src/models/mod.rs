pub mod analytics;
pub mod service;
pub mod token;
pub mod user;

use serde::{Deserialize, Serialize};

/// Acknowledgement body returned by delete/logout style endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `PATCH /admin/{users|services|tokens}/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(default)]
    pub message: Option<String>,
    pub is_active: bool,
}
