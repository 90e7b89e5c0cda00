//! Concurrent per-entity fetch with all-settle semantics.
//!
//! Every entity's fetch is started together and awaited to completion. A
//! failed branch becomes an all-zero series plus a [`BranchFailure`]; it
//! never cancels or hides its siblings.

use std::future::Future;

use chrono::NaiveDate;
use futures::future::join_all;

use super::reconcile::{reconcile, UsageSeries};
use crate::errors::ClientError;
use crate::models::analytics::DatedCount;

/// An entity to chart: its id for the fetch and its legend label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: u64,
    pub label: String,
}

impl EntityRef {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self { id, label: label.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchFailure {
    pub entity_id: u64,
    pub label: String,
    pub error: ClientError,
}

#[derive(Debug, Clone, Default)]
pub struct GatherOutcome {
    /// One series per requested entity, in request order.
    pub series: Vec<UsageSeries>,
    pub failures: Vec<BranchFailure>,
}

impl GatherOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// True if any branch was rejected for an expired session.
    pub fn auth_expired(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_auth_expired())
    }
}

pub async fn gather_series<P, F, Fut>(entities: &[EntityRef], range: &[NaiveDate], fetch: F) -> GatherOutcome
where
    P: DatedCount,
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<Vec<P>, ClientError>>,
{
    let settled = join_all(entities.iter().map(|e| fetch(e.id))).await;

    let mut outcome = GatherOutcome::default();
    for (entity, result) in entities.iter().zip(settled) {
        match result {
            Ok(points) => {
                let counts = reconcile(&points, range);
                outcome
                    .series
                    .push(UsageSeries::from_counts(entity.label.clone(), range, counts));
            }
            Err(error) => {
                tracing::warn!(
                    entity_id = entity.id,
                    label = %entity.label,
                    error = %error,
                    "usage fetch failed, charting zeros"
                );
                outcome.series.push(UsageSeries::zeros(entity.label.clone(), range));
                outcome.failures.push(BranchFailure {
                    entity_id: entity.id,
                    label: entity.label.clone(),
                    error,
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::date_range::date_range_ending;
    use crate::models::analytics::TimePoint;
    use std::time::Duration;

    fn range() -> Vec<NaiveDate> {
        date_range_ending(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), 3)
    }

    #[tokio::test]
    async fn test_failed_branch_does_not_abort_batch() {
        let entities = vec![
            EntityRef::new(1, "one"),
            EntityRef::new(2, "two"),
            EntityRef::new(3, "three"),
        ];
        let outcome = gather_series(&entities, &range(), |id| async move {
            if id == 2 {
                Err(ClientError::RequestFailed { status: 500, message: "boom".into() })
            } else {
                Ok(vec![TimePoint { date: "2024-05-10".into(), count: Some(id as i64), total_size: None }])
            }
        })
        .await;

        assert_eq!(outcome.series.len(), 3);
        assert_eq!(outcome.series[0].counts(), vec![0, 0, 1]);
        assert_eq!(outcome.series[1].counts(), vec![0, 0, 0]);
        assert_eq!(outcome.series[2].counts(), vec![0, 0, 3]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].entity_id, 2);
        assert!(!outcome.is_complete());
        assert!(!outcome.auth_expired());
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let entities: Vec<EntityRef> = (1..=5).map(|i| EntityRef::new(i, format!("e{}", i))).collect();
        let started = std::time::Instant::now();
        let outcome = gather_series(&entities, &range(), |_| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<Vec<TimePoint>, ClientError>(Vec::new())
        })
        .await;
        assert_eq!(outcome.series.len(), 5);
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_auth_failure_is_reported() {
        let entities = vec![EntityRef::new(7, "seven")];
        let outcome = gather_series(&entities, &range(), |_| async {
            Err::<Vec<TimePoint>, _>(ClientError::AuthenticationExpired)
        })
        .await;
        assert!(outcome.auth_expired());
        assert_eq!(outcome.series[0].counts(), vec![0, 0, 0]);
    }
}
