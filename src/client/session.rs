//! Cookie session: sign-in, sign-out and the expired-session hook.

use reqwest::Method;
use serde::Serialize;
use url::Url;

use super::{AdminClient, AuthGate, ADMIN_PREFIX};
use crate::errors::ClientError;
use crate::models::Ack;

/// Entry point the operator is sent to when the session is gone.
pub const LOGIN_PATH: &str = "/login";

/// Reacts to the server rejecting the session (HTTP 401).
///
/// Called once per rejected request, after the client has dropped its
/// session cookie. The request itself still fails with
/// [`ClientError::AuthenticationExpired`] and is not retried.
pub trait SessionHandler: Send + Sync {
    fn authentication_expired(&self, login_url: &Url);
}

/// Default handler: tells the operator where to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginRedirect;

impl SessionHandler for LoginRedirect {
    fn authentication_expired(&self, login_url: &Url) {
        tracing::warn!(login = %login_url, "session expired, sign in again (infra-console login)");
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    old_password: &'a str,
    new_password: &'a str,
    confirm_password: &'a str,
}

impl AdminClient {
    /// `POST /auth/login`. On success the server's session cookie is held by
    /// the client and its value returned.
    ///
    /// A 401 here means bad credentials and surfaces as
    /// [`ClientError::RequestFailed`]; the session handler is not involved.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<String>, ClientError> {
        let body = Credentials { username, password };
        self.dispatch(Method::POST, "/auth/login", &[], Some(&body), AuthGate::Report)
            .await?;
        let cookie = self.session_cookie();
        if cookie.is_none() {
            tracing::warn!("login succeeded but the server set no session cookie");
        } else {
            tracing::info!(username, "signed in");
        }
        Ok(cookie)
    }

    /// `GET /logout`, then forget the local session. Returns the login URL.
    pub async fn logout(&self) -> Result<Url, ClientError> {
        let result = self.request(Method::GET, "/logout", &[]).await;
        self.clear_session();
        match result {
            Ok(_) | Err(ClientError::AuthenticationExpired) => Ok(self.login_url()),
            Err(e) => Err(e),
        }
    }

    /// `POST /admin/change-password`.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Ack, ClientError> {
        let body = PasswordChange {
            old_password,
            new_password,
            confirm_password,
        };
        let path = format!("{}/change-password", ADMIN_PREFIX);
        let payload = self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(payload.decode().unwrap_or_default())
    }
}
