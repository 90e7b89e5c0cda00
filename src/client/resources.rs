//! CRUD endpoints for users, services and tokens.

use reqwest::Method;

use super::{AdminClient, ADMIN_PREFIX};
use crate::errors::ClientError;
use crate::models::service::{Service, ServiceInput};
use crate::models::token::{NewToken, Token, TokenQuery, TokenUpdate};
use crate::models::user::{User, UserInput};
use crate::models::{Ack, StatusChange};

fn status_query(active: bool) -> [(&'static str, String); 1] {
    [("status", active.to_string())]
}

impl AdminClient {
    async fn set_status(&self, kind: &str, id: u64, active: bool) -> Result<StatusChange, ClientError> {
        let path = format!("{}/{}/{}/status", ADMIN_PREFIX, kind, id);
        let payload = self.request(Method::PATCH, &path, &status_query(active)).await?;
        Ok(payload.decode().unwrap_or(StatusChange {
            message: None,
            is_active: active,
        }))
    }

    async fn delete(&self, kind: &str, id: u64) -> Result<Ack, ClientError> {
        let path = format!("{}/{}/{}", ADMIN_PREFIX, kind, id);
        let payload = self.request(Method::DELETE, &path, &[]).await?;
        Ok(payload.decode().unwrap_or_default())
    }

    // ── Users ─────────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get(&format!("{}/users", ADMIN_PREFIX), &[]).await
    }

    pub async fn get_user(&self, id: u64) -> Result<User, ClientError> {
        self.get(&format!("{}/users/{}", ADMIN_PREFIX, id), &[]).await
    }

    pub async fn create_user(&self, input: &UserInput) -> Result<User, ClientError> {
        let path = format!("{}/users", ADMIN_PREFIX);
        self.send(Method::POST, &path, &[], Some(input)).await?.decode()
    }

    pub async fn update_user(&self, id: u64, input: &UserInput) -> Result<User, ClientError> {
        let path = format!("{}/users/{}", ADMIN_PREFIX, id);
        self.send(Method::PUT, &path, &[], Some(input)).await?.decode()
    }

    pub async fn delete_user(&self, id: u64) -> Result<Ack, ClientError> {
        self.delete("users", id).await
    }

    pub async fn set_user_status(&self, id: u64, active: bool) -> Result<StatusChange, ClientError> {
        self.set_status("users", id, active).await
    }

    // ── Services ──────────────────────────────────────────────

    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.get(&format!("{}/services", ADMIN_PREFIX), &[]).await
    }

    pub async fn get_service(&self, id: u64) -> Result<Service, ClientError> {
        self.get(&format!("{}/services/{}", ADMIN_PREFIX, id), &[]).await
    }

    pub async fn create_service(&self, input: &ServiceInput) -> Result<Service, ClientError> {
        let path = format!("{}/services", ADMIN_PREFIX);
        self.send(Method::POST, &path, &[], Some(input)).await?.decode()
    }

    pub async fn update_service(&self, id: u64, input: &ServiceInput) -> Result<Service, ClientError> {
        let path = format!("{}/services/{}", ADMIN_PREFIX, id);
        self.send(Method::PUT, &path, &[], Some(input)).await?.decode()
    }

    pub async fn delete_service(&self, id: u64) -> Result<Ack, ClientError> {
        self.delete("services", id).await
    }

    pub async fn set_service_status(&self, id: u64, active: bool) -> Result<StatusChange, ClientError> {
        self.set_status("services", id, active).await
    }

    // ── Tokens ────────────────────────────────────────────────

    pub async fn list_tokens(&self, query: TokenQuery) -> Result<Vec<Token>, ClientError> {
        self.get(&format!("{}/tokens", ADMIN_PREFIX), &query.pairs()).await
    }

    /// `GET /admin/user-tokens/{user_id}`.
    pub async fn list_user_tokens(&self, user_id: u64) -> Result<Vec<Token>, ClientError> {
        self.get(&format!("{}/user-tokens/{}", ADMIN_PREFIX, user_id), &[]).await
    }

    /// `GET /admin/service-tokens/{service_id}`.
    pub async fn list_service_tokens(&self, service_id: u64) -> Result<Vec<Token>, ClientError> {
        self.get(&format!("{}/service-tokens/{}", ADMIN_PREFIX, service_id), &[]).await
    }

    pub async fn get_token(&self, id: u64) -> Result<Token, ClientError> {
        self.get(&format!("{}/tokens/{}", ADMIN_PREFIX, id), &[]).await
    }

    pub async fn create_token(&self, input: &NewToken) -> Result<Token, ClientError> {
        let path = format!("{}/tokens", ADMIN_PREFIX);
        self.send(Method::POST, &path, &[], Some(input)).await?.decode()
    }

    pub async fn update_token(&self, id: u64, input: &TokenUpdate) -> Result<Token, ClientError> {
        let path = format!("{}/tokens/{}", ADMIN_PREFIX, id);
        self.send(Method::PUT, &path, &[], Some(input)).await?.decode()
    }

    pub async fn delete_token(&self, id: u64) -> Result<Ack, ClientError> {
        self.delete("tokens", id).await
    }

    pub async fn set_token_status(&self, id: u64, active: bool) -> Result<StatusChange, ClientError> {
        self.set_status("tokens", id, active).await
    }
}
