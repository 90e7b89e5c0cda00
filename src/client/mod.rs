//! Admin API client.
//!
//! Every call goes through [`AdminClient::send`], which:
//! - presents the session cookie from the client's cookie jar (never a bearer header)
//! - maps 401 to [`ClientError::AuthenticationExpired`] and fires the session handler once
//! - maps other non-2xx statuses to [`ClientError::RequestFailed`] with the server's
//!   `error` field, or the raw body when that is not JSON
//! - parses 2xx bodies as JSON when possible and falls back to raw text
//! - holds a [`LoadingGuard`] for the whole exchange

pub mod indicator;
pub mod resources;
pub mod session;
pub mod stats;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::ClientError;
use indicator::{ActivityIndicator, InFlight, LoadingGuard};
use session::{LoginRedirect, SessionHandler, LOGIN_PATH};

/// Prefix of every admin route.
pub const ADMIN_PREFIX: &str = "/admin";

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    fn from_body(body: String, json_content: bool) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(v) => Payload::Json(v),
            Err(e) => {
                if json_content {
                    tracing::warn!(error = %e, "response declared JSON but did not parse, keeping raw text");
                }
                Payload::Text(body)
            }
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    /// Deserialize into `T`. Raw text bodies only decode if `T` is a string.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let value = match self {
            Payload::Json(v) => v,
            Payload::Text(t) => Value::String(t),
        };
        serde_json::from_value(value).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": "..."}` (optionally with `details`) and
/// `{"error": {"message": "..."}}`; anything else is returned trimmed as-is.
pub fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        let details = v.get("details").and_then(Value::as_str);
        let message = match v.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(o)) => o.get("message").and_then(Value::as_str).map(String::from),
            _ => None,
        };
        if let Some(message) = message {
            return match details {
                Some(d) if !d.is_empty() => format!("{} ({})", message, d),
                _ => message,
            };
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

/// What a 401 means for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthGate {
    /// Session expired: clear it, fire the handler.
    Redirect,
    /// Bad credentials on the sign-in call itself.
    Report,
}

pub struct AdminClient {
    http: reqwest::Client,
    base: Url,
    jar: Arc<Jar>,
    cookie_name: String,
    session: Arc<dyn SessionHandler>,
    indicator: Arc<dyn ActivityIndicator>,
}

impl AdminClient {
    pub fn new(cfg: &Config) -> Result<Self, ClientError> {
        let base = Url::parse(&cfg.base_url)?;
        let jar = Arc::new(Jar::default());
        if let Some(value) = &cfg.session {
            jar.add_cookie_str(&format!("{}={}; Path=/", cfg.session_cookie, value), &base);
        }

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .cookie_provider(jar.clone())
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("infra-console/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base,
            jar,
            cookie_name: cfg.session_cookie.clone(),
            session: Arc::new(LoginRedirect),
            indicator: Arc::new(InFlight::new()),
        })
    }

    pub fn with_session_handler(mut self, handler: Arc<dyn SessionHandler>) -> Self {
        self.session = handler;
        self
    }

    pub fn with_indicator(mut self, indicator: Arc<dyn ActivityIndicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn login_url(&self) -> Url {
        self.url(LOGIN_PATH).unwrap_or_else(|_| self.base.clone())
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&joined)?)
    }

    /// Current value of the session cookie, if the jar holds one.
    pub fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .map(str::trim)
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    fn clear_session(&self) {
        self.jar.add_cookie_str(
            &format!("{}=; Path=/; Max-Age=0", self.cookie_name),
            &self.base,
        );
    }

    /// Request without a body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Payload, ClientError> {
        self.send(method, path, query, None::<&()>).await
    }

    /// Request with an optional JSON body.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Payload, ClientError> {
        self.dispatch(method, path, query, body, AuthGate::Redirect).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        self.request(Method::GET, path, query).await?.decode()
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        gate: AuthGate,
    ) -> Result<Payload, ClientError> {
        let url = self.url(path)?;
        let _loading = LoadingGuard::acquire(self.indicator.clone(), format!("{} {}", method, path));
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        let mut req = self
            .http
            .request(method.clone(), url)
            .header("x-request-id", &request_id);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        tracing::debug!(%method, path, request_id = %request_id, "admin request");

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, path, request_id = %request_id, error = %e, "admin request could not be sent");
            ClientError::from(e)
        })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED && gate == AuthGate::Redirect {
            tracing::warn!(%method, path, request_id = %request_id, "session rejected by server");
            self.clear_session();
            self.session.authentication_expired(&self.login_url());
            return Err(ClientError::AuthenticationExpired);
        }

        let json_content = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);
        let text = resp.text().await.map_err(|e| {
            tracing::warn!(%method, path, request_id = %request_id, error = %e, "failed to read response body");
            ClientError::from(e)
        })?;

        tracing::debug!(
            %method,
            path,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "admin response"
        );

        if !status.is_success() {
            let message = error_message(&text, status);
            tracing::warn!(%method, path, request_id = %request_id, status = status.as_u16(), message = %message, "admin request failed");
            return Err(ClientError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Payload::from_body(text, json_content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let msg = error_message(r#"{"error":"token not found"}"#, StatusCode::NOT_FOUND);
        assert_eq!(msg, "token not found");

        let msg = error_message(
            r#"{"error":"cannot load stats","details":"db locked"}"#,
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(msg, "cannot load stats (db locked)");

        let msg = error_message(r#"{"error":{"message":"nested"}}"#, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "nested");
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(error_message(" upstream down \n", StatusCode::BAD_GATEWAY), "upstream down");
        assert_eq!(error_message(r#"{"message":"x"}"#, StatusCode::BAD_REQUEST), r#"{"message":"x"}"#);
        assert_eq!(error_message("", StatusCode::SERVICE_UNAVAILABLE), "Service Unavailable");
    }

    #[test]
    fn test_payload_from_body() {
        assert_eq!(
            Payload::from_body("[1,2]".into(), false),
            Payload::Json(serde_json::json!([1, 2]))
        );
        assert_eq!(Payload::from_body("ok".into(), false), Payload::Text("ok".into()));
        assert_eq!(Payload::from_body("{oops".into(), true), Payload::Text("{oops".into()));
    }

    #[test]
    fn test_decode_text_only_into_string() {
        let text = Payload::Text("pong".into());
        assert_eq!(text.clone().decode::<String>().unwrap(), "pong");
        assert!(matches!(
            text.decode::<Vec<u32>>(),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_url_joins_under_base_path() {
        let client = AdminClient::new(&Config::for_url("http://console.local/infra/")).unwrap();
        assert_eq!(
            client.url("/admin/users").unwrap().as_str(),
            "http://console.local/infra/admin/users"
        );
        assert_eq!(client.login_url().as_str(), "http://console.local/infra/login");
    }

    #[test]
    fn test_seeded_session_cookie_is_readable() {
        let mut cfg = Config::for_url("http://127.0.0.1:8080");
        cfg.session = Some("abc123".into());
        let client = AdminClient::new(&cfg).unwrap();
        assert_eq!(client.session_cookie().as_deref(), Some("abc123"));
    }
}
