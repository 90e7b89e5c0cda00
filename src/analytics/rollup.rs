//! Summary figures for the dashboard cards.

use serde::Serialize;

use crate::models::analytics::{DailyStat, StatField};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rollup {
    pub total_count: i64,
    pub max_user_count: i64,
    pub max_service_count: i64,
    pub max_token_count: i64,
}

/// Sum of requests and peak distinct users/services/tokens across `days`.
/// Malformed or missing fields count as zero; empty input gives all zeros.
/// Sums saturate at `i64::MAX` instead of overflowing.
pub fn rollup(days: &[DailyStat]) -> Rollup {
    days.iter().fold(Rollup::default(), |acc, day| Rollup {
        total_count: acc.total_count.saturating_add(day.field(StatField::Count)),
        max_user_count: acc.max_user_count.max(day.field(StatField::UserCount)),
        max_service_count: acc.max_service_count.max(day.field(StatField::ServiceCount)),
        max_token_count: acc.max_token_count.max(day.field(StatField::TokenCount)),
    })
}

pub(crate) fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0i64, i64::saturating_add)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailingChange {
    /// Positive means growth.
    pub percent_change: f64,
    pub recent_sum: i64,
    pub prior_sum: i64,
}

/// Compare the last `window_days` entries with the `window_days` before them.
///
/// `None` when there are fewer than `2 * window_days` entries, or when the
/// earlier window sums to zero (no baseline to compare against).
pub fn trailing_change(days: &[DailyStat], field: StatField, window_days: usize) -> Option<TrailingChange> {
    if window_days == 0 || days.len() < window_days.saturating_mul(2) {
        return None;
    }

    let split = days.len() - window_days;
    let recent_sum = saturating_sum(days[split..].iter().map(|d| d.field(field)));
    let prior_sum = saturating_sum(days[split - window_days..split].iter().map(|d| d.field(field)));
    if prior_sum == 0 {
        return None;
    }

    Some(TrailingChange {
        percent_change: (recent_sum as f64 - prior_sum as f64) / prior_sum as f64 * 100.0,
        recent_sum,
        prior_sum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(date: &str, count: i64) -> DailyStat {
        DailyStat {
            date: date.into(),
            count: Some(count),
            user_count: Some(1),
            service_count: Some(1),
            token_count: Some(1),
        }
    }

    fn fortnight(first: i64, second: i64) -> Vec<DailyStat> {
        (1..=14)
            .map(|d| stat(&format!("2024-05-{:02}", d), if d <= 7 { first } else { second }))
            .collect()
    }

    #[test]
    fn test_empty_rollup_is_zero() {
        assert_eq!(rollup(&[]), Rollup::default());
    }

    #[test]
    fn test_rollup_sums_and_maxes() {
        let days = vec![
            DailyStat { date: "2024-05-01".into(), count: Some(3), user_count: Some(2), service_count: Some(5), token_count: Some(1) },
            DailyStat { date: "2024-05-02".into(), count: Some(4), user_count: Some(7), service_count: Some(1), token_count: Some(9) },
        ];
        assert_eq!(
            rollup(&days),
            Rollup { total_count: 7, max_user_count: 7, max_service_count: 5, max_token_count: 9 }
        );
    }

    #[test]
    fn test_rollup_skips_malformed_rows() {
        let days: Vec<DailyStat> = serde_json::from_str(
            r#"[{"date":"2024-05-01","count":"lots","user_count":{}},
                {"date":"2024-05-02","count":6,"user_count":2}]"#,
        )
        .unwrap();
        let r = rollup(&days);
        assert_eq!(r.total_count, 6);
        assert_eq!(r.max_user_count, 2);
        assert_eq!(r.max_token_count, 0);
    }

    #[test]
    fn test_rollup_saturates_on_huge_count() {
        let days: Vec<DailyStat> = serde_json::from_str(
            r#"[{"date":"2024-05-01","count":1e300},{"date":"2024-05-02","count":5}]"#,
        )
        .unwrap();
        assert_eq!(rollup(&days).total_count, i64::MAX);
    }

    #[test]
    fn test_trailing_change_saturates_on_huge_count() {
        let mut days = fortnight(10, 20);
        days[13].count = Some(i64::MAX);
        let change = trailing_change(&days, StatField::Count, 7).unwrap();
        assert_eq!(change.recent_sum, i64::MAX);
        assert!(change.percent_change > 0.0);
    }

    #[test]
    fn test_trailing_change_doubles() {
        let change = trailing_change(&fortnight(10, 20), StatField::Count, 7).unwrap();
        assert_eq!(change.recent_sum, 140);
        assert_eq!(change.prior_sum, 70);
        assert!((change.percent_change - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_change_decline_is_negative() {
        let change = trailing_change(&fortnight(20, 10), StatField::Count, 7).unwrap();
        assert!((change.percent_change + 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_change_needs_history() {
        let days = fortnight(10, 20);
        assert!(trailing_change(&days[..13], StatField::Count, 7).is_none());
        assert!(trailing_change(&days, StatField::Count, 0).is_none());
    }

    #[test]
    fn test_trailing_change_zero_baseline() {
        assert!(trailing_change(&fortnight(0, 20), StatField::Count, 7).is_none());
    }

    #[test]
    fn test_trailing_change_uses_latest_windows_only() {
        let mut days = vec![stat("2024-04-30", 1000)];
        days.extend(fortnight(10, 20));
        let change = trailing_change(&days, StatField::Count, 7).unwrap();
        assert_eq!(change.prior_sum, 70);
    }
}
