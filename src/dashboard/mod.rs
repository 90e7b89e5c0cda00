//! Dashboard view: the fetch → shape → commit sequence behind every chart.
//!
//! A [`Dashboard`] borrows the client and the view's [`ChartRegistry`]; it
//! holds no state of its own. Every chart update takes a ticket before
//! fetching and commits only if that ticket is still the newest for its
//! slot, so a slow response can never overwrite a fresher one.
//!
//! Statistics failures are not fatal: they are logged and charted as empty
//! (or, in a fan-out, as all-zero series). Only an expired session aborts.

pub mod chart;
pub mod registry;

use serde::Serialize;

use crate::analytics::date_range::{clamp_window, date_range};
use crate::analytics::filter::{filter_by_entity, group_series_by, group_totals_by, EntityFilter};
use crate::analytics::gather::{gather_series, EntityRef, GatherOutcome};
use crate::analytics::reconcile::{reconcile, UsageSeries};
use crate::analytics::rollup::{rollup, trailing_change, Rollup, TrailingChange};
use crate::client::AdminClient;
use crate::errors::{degrade, ClientError};
use crate::models::analytics::StatField;
use crate::models::service::Service;
use crate::models::token::TokenQuery;
use crate::models::user::User;

pub use chart::{Chart, ChartConfig, ChartKind, ChartSlot, Dataset};
pub use registry::{ChartRegistry, Ticket};

/// Summary cards above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub window_days: u32,
    pub cards: Rollup,
    /// `None` without two full windows of history or with an empty baseline.
    pub request_trend: Option<TrailingChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOption {
    pub value: EntityFilter,
    pub label: String,
}

/// Options for the user and service pickers. The first entry of each list
/// is "all", which is also the default selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selectors {
    pub users: Vec<SelectorOption>,
    pub services: Vec<SelectorOption>,
}

impl Selectors {
    fn build(users: &[User], services: &[Service]) -> Self {
        let all = || SelectorOption {
            value: EntityFilter::All,
            label: "All".to_string(),
        };
        let users = std::iter::once(all())
            .chain(users.iter().filter(|u| u.is_active).map(|u| SelectorOption {
                value: EntityFilter::Only(u.id),
                label: u.username.clone(),
            }))
            .collect();
        let services = std::iter::once(all())
            .chain(services.iter().filter(|s| s.is_active).map(|s| SelectorOption {
                value: EntityFilter::Only(s.id),
                label: s.display_name(),
            }))
            .collect();
        Self { users, services }
    }

    pub fn default_user(&self) -> EntityFilter {
        EntityFilter::default()
    }

    pub fn default_service(&self) -> EntityFilter {
        EntityFilter::default()
    }
}

/// Everything the initial page load produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardState {
    pub overview: Overview,
    pub service_usage: Option<Chart>,
    pub daily_requests: Option<Chart>,
    pub selectors: Selectors,
}

pub struct Dashboard<'a> {
    client: &'a AdminClient,
    charts: &'a ChartRegistry,
}

impl<'a> Dashboard<'a> {
    pub fn new(client: &'a AdminClient, charts: &'a ChartRegistry) -> Self {
        Self { client, charts }
    }

    pub fn charts(&self) -> &ChartRegistry {
        self.charts
    }

    /// Initial load, in order: cards, service usage, daily requests, then
    /// the selectors whose defaults the later chart updates depend on.
    pub async fn load(&self, window_days: u32) -> Result<DashboardState, ClientError> {
        let overview = self.overview(window_days).await?;
        let service_usage = self.service_usage().await?;
        let daily_requests = self.daily_requests(window_days).await?;
        let selectors = self.selectors().await?;
        tracing::info!(window_days, "dashboard loaded");
        Ok(DashboardState {
            overview,
            service_usage,
            daily_requests,
            selectors,
        })
    }

    /// Card figures over the last `window_days`, plus the request trend
    /// against the window before it.
    pub async fn overview(&self, window_days: u32) -> Result<Overview, ClientError> {
        let window = clamp_window(window_days);
        let days = degrade(
            self.client.recent_stats(window.saturating_mul(2)).await,
            "recent stats",
        )?;

        let recent_start = days.len().saturating_sub(window as usize);
        Ok(Overview {
            window_days: window,
            cards: rollup(&days[recent_start..]),
            request_trend: trailing_change(&days, StatField::Count, window as usize),
        })
    }

    /// Total requests per service, largest first.
    pub async fn service_usage(&self) -> Result<Option<Chart>, ClientError> {
        let ticket = self.charts.begin(ChartSlot::ServiceUsage);
        let rows = degrade(self.client.services_usage().await, "service usage")?;
        let totals = group_totals_by(
            &rows,
            |r| r.service_id,
            |r| r.service_name.clone(),
            |r| r.count.unwrap_or(0),
        );
        let chart = Chart::categorical(
            ChartSlot::ServiceUsage,
            self.charts.kind(ChartSlot::ServiceUsage),
            "Requests per service",
            "Requests",
            totals,
        );
        Ok(self.publish(ticket, chart))
    }

    pub async fn daily_requests(&self, window_days: u32) -> Result<Option<Chart>, ClientError> {
        let ticket = self.charts.begin(ChartSlot::DailyRequests);
        let range = date_range(window_days);
        let days = degrade(self.client.recent_stats(clamp_window(window_days)).await, "daily requests")?;
        let series = UsageSeries::from_counts("Requests", &range, reconcile(&days, &range));
        let chart = Chart::time_series(
            ChartSlot::DailyRequests,
            self.charts.kind(ChartSlot::DailyRequests),
            "Daily requests",
            &range,
            vec![series],
        );
        Ok(self.publish(ticket, chart))
    }

    /// One series per service (or just the selected one).
    pub async fn service_time(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::ServiceTime, cfg);
        let range = date_range(cfg.window_days);
        let services = degrade(self.client.list_services().await, "services")?;
        let entities: Vec<EntityRef> = services
            .iter()
            .filter(|s| cfg.entity.matches(s.id))
            .map(|s| EntityRef::new(s.id, s.name.clone()))
            .collect();

        let outcome = gather_series(&entities, &range, |id| self.client.service_time_series(id)).await;
        let series = settle(outcome)?;
        let chart = Chart::time_series(
            ChartSlot::ServiceTime,
            self.charts.kind(ChartSlot::ServiceTime),
            "Service usage over time",
            &range,
            series,
        );
        Ok(self.publish(ticket, chart))
    }

    /// One series per token, restricted to the selected user's tokens.
    pub async fn token_time(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::TokenTime, cfg);
        let range = date_range(cfg.window_days);
        let query = match cfg.entity {
            EntityFilter::All => TokenQuery::default(),
            EntityFilter::Only(user_id) => TokenQuery {
                user_id: Some(user_id),
                service_id: None,
            },
        };
        let tokens = degrade(self.client.list_tokens(query).await, "tokens")?;
        let entities: Vec<EntityRef> = tokens
            .iter()
            .filter(|t| cfg.entity.matches(t.user_id))
            .map(|t| EntityRef::new(t.id, t.label()))
            .collect();

        let outcome = gather_series(&entities, &range, |id| self.client.token_time_series(id)).await;
        let series = settle(outcome)?;
        let chart = Chart::time_series(
            ChartSlot::TokenTime,
            self.charts.kind(ChartSlot::TokenTime),
            "Token usage over time",
            &range,
            series,
        );
        Ok(self.publish(ticket, chart))
    }

    /// Requests per service for the selected user (or everyone), one series
    /// per service.
    pub async fn user_services(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::UserServices, cfg);
        let range = date_range(cfg.window_days);
        let rows = degrade(
            self.client.user_service_time_series(cfg.entity).await,
            "user service usage",
        )?;
        let rows = filter_by_entity(&rows, cfg.entity, |r| r.user_id);
        let series = group_series_by(&rows, &range, |r| r.service_id, |r| r.service_name.clone());
        let chart = Chart::time_series(
            ChartSlot::UserServices,
            self.charts.kind(ChartSlot::UserServices),
            "User requests by service",
            &range,
            series,
        );
        Ok(self.publish(ticket, chart))
    }

    /// Requests per token for the selected user (or everyone).
    pub async fn user_tokens(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::UserTokens, cfg);
        let range = date_range(cfg.window_days);
        let rows = degrade(
            self.client.user_token_time_series(cfg.entity).await,
            "user token usage",
        )?;
        let rows = filter_by_entity(&rows, cfg.entity, |r| r.user_id);
        let series = group_series_by(
            &rows,
            &range,
            |r| r.token_id,
            |r| crate::models::token::mask_secret(&r.token_value),
        );
        let chart = Chart::time_series(
            ChartSlot::UserTokens,
            self.charts.kind(ChartSlot::UserTokens),
            "User requests by token",
            &range,
            series,
        );
        Ok(self.publish(ticket, chart))
    }

    /// All-time requests per service for the selected user (or everyone),
    /// largest first.
    pub async fn user_service_totals(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::UserServices, cfg);
        let rows = degrade(self.client.user_service_stats().await, "user service totals")?;
        let rows = filter_by_entity(&rows, cfg.entity, |r| r.user_id);
        let totals = group_totals_by(
            &rows,
            |r| r.service_id,
            |r| r.service_name.clone(),
            |r| r.count.unwrap_or(0),
        );
        let chart = Chart::categorical(
            ChartSlot::UserServices,
            cfg.kind.unwrap_or(ChartKind::Bar),
            "User requests by service (total)",
            "Requests",
            totals,
        );
        Ok(self.publish(ticket, chart))
    }

    /// All-time requests per token for the selected user (or everyone).
    pub async fn user_token_totals(&self, cfg: ChartConfig) -> Result<Option<Chart>, ClientError> {
        let ticket = self.begin(ChartSlot::UserTokens, cfg);
        let rows = degrade(self.client.user_token_stats().await, "user token totals")?;
        let rows = filter_by_entity(&rows, cfg.entity, |r| r.user_id);
        let totals = group_totals_by(
            &rows,
            |r| r.token_id,
            |r| crate::models::token::mask_secret(&r.token_value),
            |r| r.count.unwrap_or(0),
        );
        let chart = Chart::categorical(
            ChartSlot::UserTokens,
            cfg.kind.unwrap_or(ChartKind::Bar),
            "User requests by token (total)",
            "Requests",
            totals,
        );
        Ok(self.publish(ticket, chart))
    }

    /// Active users and services for the pickers.
    pub async fn selectors(&self) -> Result<Selectors, ClientError> {
        let users = degrade(self.client.list_users().await, "users")?;
        let services = degrade(self.client.list_services().await, "services")?;
        Ok(Selectors::build(&users, &services))
    }

    fn begin(&self, slot: ChartSlot, cfg: ChartConfig) -> Ticket {
        if let Some(kind) = cfg.kind {
            self.charts.set_kind(slot, kind);
        }
        self.charts.begin(slot)
    }

    fn publish(&self, ticket: Ticket, chart: Chart) -> Option<Chart> {
        if self.charts.commit(ticket, chart.clone()) {
            Some(chart)
        } else {
            None
        }
    }
}

/// Series of a fan-out. An expired session in any branch aborts the whole
/// update; other branch failures were already charted as zeros.
fn settle(outcome: GatherOutcome) -> Result<Vec<UsageSeries>, ClientError> {
    if outcome.auth_expired() {
        return Err(ClientError::AuthenticationExpired);
    }
    if !outcome.is_complete() {
        tracing::warn!(failed = outcome.failures.len(), "chart drawn with missing series");
    }
    Ok(outcome.series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_only_list_active_entities() {
        let users = vec![
            User { id: 1, username: "ana".into(), is_active: true },
            User { id: 2, username: "bo".into(), is_active: false },
        ];
        let services = vec![Service {
            id: 5,
            name: "billing".into(),
            description: "invoices".into(),
            base_url: String::new(),
            is_active: true,
        }];
        let selectors = Selectors::build(&users, &services);
        assert_eq!(selectors.users.len(), 2);
        assert_eq!(selectors.users[0].value, EntityFilter::All);
        assert_eq!(selectors.users[1].label, "ana");
        assert_eq!(selectors.services[1].value, EntityFilter::Only(5));
        assert_eq!(selectors.services[1].label, "billing (invoices)");
        assert_eq!(selectors.default_user(), EntityFilter::All);
    }

    #[test]
    fn test_settle_propagates_auth_expiry() {
        let outcome = GatherOutcome {
            series: vec![],
            failures: vec![crate::analytics::gather::BranchFailure {
                entity_id: 1,
                label: "x".into(),
                error: ClientError::AuthenticationExpired,
            }],
        };
        assert_eq!(settle(outcome), Err(ClientError::AuthenticationExpired));
    }
}
