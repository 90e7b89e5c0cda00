//! Access tokens and their expiry lifecycle.
//!
//! The server has no "never expires" flag: permanent tokens carry an expiry
//! roughly 1000 years out, and anything at least [`PERMANENT_YEARS`] calendar
//! years ahead is read as permanent. Inside this crate expiry is the tagged
//! [`Expiry`] variant; the sentinel only exists at the serde boundary.

use chrono::{DateTime, Datelike, Local, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::service::Service;
use super::user::User;

/// Year distance at which an expiry timestamp means "never expires".
/// Must match the server exactly.
pub const PERMANENT_YEARS: i32 = 900;

/// How far ahead the server places the sentinel for permanent tokens.
const SENTINEL_MONTHS: u32 = 1000 * 12;

/// True iff `expires_at` lies at least 900 calendar years after `now`.
///
/// Only the year fields are compared, so the boundary moves with the
/// calendar rather than with elapsed time.
pub fn is_permanent_at<Tz: TimeZone>(expires_at: &DateTime<Tz>, now: &DateTime<Tz>) -> bool {
    expires_at.year() - now.year() >= PERMANENT_YEARS
}

/// [`is_permanent_at`] on the viewer's local calendar. Every token read
/// from the server is classified through here.
pub fn is_permanent_as_of(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    is_permanent_at(&expires_at.with_timezone(&Local), &now.with_timezone(&Local))
}

/// [`is_permanent_as_of`] against the current time.
pub fn is_permanent(expires_at: DateTime<Utc>) -> bool {
    is_permanent_as_of(expires_at, Utc::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Classify a timestamp as received from the server.
    pub fn from_wire(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if is_permanent_as_of(expires_at, now) {
            Expiry::Never
        } else {
            Expiry::At(expires_at)
        }
    }

    /// Timestamp to send to the server; `Never` becomes the far-future sentinel.
    pub fn to_wire(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Expiry::At(t) => t,
            Expiry::Never => now
                .checked_add_months(Months::new(SENTINEL_MONTHS))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Expiry::Never)
    }
}

/// Observable token state. Expired-but-active is distinct from disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Active,
    Permanent,
    Expired,
    Disabled,
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenStatus::Active => "active",
            TokenStatus::Permanent => "permanent",
            TokenStatus::Expired => "expired",
            TokenStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: u64,
    /// Opaque secret. Never print it in full outside of `token show`.
    pub token_value: String,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub service_id: u64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub service: Option<Service>,
    /// `None` means the server sent no usable expiry, which is not the same
    /// as `Some(Expiry::Never)`.
    #[serde(default, rename = "expires_at", with = "expiry_wire")]
    pub expiry: Option<Expiry>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl Token {
    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if !self.is_active {
            return TokenStatus::Disabled;
        }
        match self.expiry {
            Some(Expiry::Never) => TokenStatus::Permanent,
            Some(Expiry::At(t)) if t < now => TokenStatus::Expired,
            _ => TokenStatus::Active,
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status_at(Utc::now())
    }

    /// Chart/legend label that does not reveal the secret.
    pub fn label(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => mask_secret(&self.token_value),
        }
    }

    pub fn owner_name(&self) -> &str {
        self.user.as_ref().map(|u| u.username.as_str()).unwrap_or("-")
    }

    pub fn service_name(&self) -> &str {
        self.service.as_ref().map(|s| s.name.as_str()).unwrap_or("-")
    }
}

/// First 8 characters of a token value followed by an ellipsis.
pub fn mask_secret(value: &str) -> String {
    let prefix: String = value.chars().take(8).collect();
    if prefix.len() < value.len() {
        format!("{}…", prefix)
    } else {
        prefix
    }
}

/// Expiry fields of token create/update bodies: `is_permanent` plus an
/// optional `expires_at`. Without either, the server picks its default (30 days).
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryBody {
    pub is_permanent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Option<Expiry>> for ExpiryBody {
    fn from(expiry: Option<Expiry>) -> Self {
        match expiry {
            Some(Expiry::Never) => ExpiryBody { is_permanent: true, expires_at: None },
            Some(Expiry::At(t)) => ExpiryBody { is_permanent: false, expires_at: Some(t) },
            None => ExpiryBody { is_permanent: false, expires_at: None },
        }
    }
}

/// Body for `POST /admin/tokens`.
#[derive(Debug, Clone, Serialize)]
pub struct NewToken {
    pub user_id: u64,
    pub service_id: u64,
    #[serde(flatten)]
    pub expiry: ExpiryBody,
}

impl NewToken {
    pub fn new(user_id: u64, service_id: u64, expiry: Option<Expiry>) -> Self {
        Self {
            user_id,
            service_id,
            expiry: expiry.into(),
        }
    }
}

/// Body for `PUT /admin/tokens/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenUpdate {
    pub is_active: bool,
    #[serde(flatten)]
    pub expiry: ExpiryBody,
}

impl TokenUpdate {
    pub fn new(is_active: bool, expiry: Option<Expiry>) -> Self {
        Self {
            is_active,
            expiry: expiry.into(),
        }
    }
}

/// Query filters for `GET /admin/tokens`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenQuery {
    pub user_id: Option<u64>,
    pub service_id: Option<u64>,
}

impl TokenQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.user_id {
            pairs.push(("user_id", id.to_string()));
        }
        if let Some(id) = self.service_id {
            pairs.push(("service_id", id.to_string()));
        }
        pairs
    }
}

mod expiry_wire {
    use super::Expiry;
    use chrono::{DateTime, Datelike, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Expiry>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|e| e.to_wire(Utc::now())).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Expiry>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&raw) {
            // Go's zero time marks an unset column.
            Ok(t) if t.year() <= 1 => Ok(None),
            Ok(t) => Ok(Some(Expiry::from_wire(t.with_timezone(&Utc), Utc::now()))),
            Err(e) => {
                tracing::debug!(value = %raw, error = %e, "ignoring unparseable expires_at");
                Ok(None)
            }
        }
    }
}
