//! Infra Console: client library for the infrastructure admin API.
//!
//! `client` talks HTTP to `/admin/*`, `analytics` shapes raw statistics into
//! dense series and card figures, and `dashboard` ties both to chart slots.

pub mod analytics;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
