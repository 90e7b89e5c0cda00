//! `/admin/stats/*` endpoints.

use super::{AdminClient, ADMIN_PREFIX};
use crate::analytics::date_range::clamp_window;
use crate::analytics::filter::EntityFilter;
use crate::errors::ClientError;
use crate::models::analytics::{
    DailyStat, ServiceUsage, TimePoint, UserServiceStat, UserServiceTimePoint, UserTokenStat,
    UserTokenTimePoint,
};

impl AdminClient {
    /// `GET /admin/stats/recent?days={n}`: one row per day, possibly sparse.
    pub async fn recent_stats(&self, days: u32) -> Result<Vec<DailyStat>, ClientError> {
        let path = format!("{}/stats/recent", ADMIN_PREFIX);
        self.get(&path, &[("days", clamp_window(days).to_string())]).await
    }

    pub async fn services_usage(&self) -> Result<Vec<ServiceUsage>, ClientError> {
        self.get(&format!("{}/stats/services", ADMIN_PREFIX), &[]).await
    }

    pub async fn service_time_series(&self, service_id: u64) -> Result<Vec<TimePoint>, ClientError> {
        self.get(&format!("{}/stats/services/{}/time", ADMIN_PREFIX, service_id), &[])
            .await
    }

    pub async fn token_time_series(&self, token_id: u64) -> Result<Vec<TimePoint>, ClientError> {
        self.get(&format!("{}/stats/tokens/{}/time", ADMIN_PREFIX, token_id), &[])
            .await
    }

    pub async fn user_service_stats(&self) -> Result<Vec<UserServiceStat>, ClientError> {
        self.get(&format!("{}/stats/users/services", ADMIN_PREFIX), &[]).await
    }

    pub async fn user_token_stats(&self) -> Result<Vec<UserTokenStat>, ClientError> {
        self.get(&format!("{}/stats/users/tokens", ADMIN_PREFIX), &[]).await
    }

    /// `GET /admin/stats/users/{id|all}/services/time`.
    pub async fn user_service_time_series(
        &self,
        user: EntityFilter,
    ) -> Result<Vec<UserServiceTimePoint>, ClientError> {
        let path = format!("{}/stats/users/{}/services/time", ADMIN_PREFIX, user);
        self.get(&path, &[]).await
    }

    /// `GET /admin/stats/users/{id|all}/tokens/time`.
    pub async fn user_token_time_series(
        &self,
        user: EntityFilter,
    ) -> Result<Vec<UserTokenTimePoint>, ClientError> {
        let path = format!("{}/stats/users/{}/tokens/time", ADMIN_PREFIX, user);
        self.get(&path, &[]).await
    }
}
