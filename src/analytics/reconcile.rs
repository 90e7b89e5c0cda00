//! Align sparse per-day observations with a dense date axis.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::rollup::saturating_sum;
use crate::models::analytics::DatedCount;

/// A labelled series of counts, one point per day of the shared axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, i64)>,
}

impl UsageSeries {
    pub fn from_counts(label: impl Into<String>, range: &[NaiveDate], counts: Vec<i64>) -> Self {
        Self {
            label: label.into(),
            points: range.iter().copied().zip(counts).collect(),
        }
    }

    /// All-zero series over `range`.
    pub fn zeros(label: impl Into<String>, range: &[NaiveDate]) -> Self {
        Self::from_counts(label, range, vec![0; range.len()])
    }

    pub fn counts(&self) -> Vec<i64> {
        self.points.iter().map(|(_, c)| *c).collect()
    }

    pub fn total(&self) -> i64 {
        saturating_sum(self.points.iter().map(|(_, c)| *c))
    }
}

/// Raw observations belonging to one entity (token, service, user).
#[derive(Debug, Clone)]
pub struct EntityPoints<P> {
    pub id: u64,
    pub label: String,
    pub points: Vec<P>,
}

/// Counts aligned 1:1 with `range`, zero where `points` has no entry.
///
/// Duplicate dates resolve to the last occurrence. Points whose date is
/// unparseable or outside `range` are ignored.
pub fn reconcile<P: DatedCount>(points: &[P], range: &[NaiveDate]) -> Vec<i64> {
    let mut by_day: HashMap<NaiveDate, i64> = HashMap::with_capacity(points.len());
    for p in points {
        match p.day() {
            Some(day) => {
                by_day.insert(day, p.count());
            }
            None => tracing::debug!("skipping usage row with unparseable date"),
        }
    }
    lookup(&by_day, range)
}

pub(crate) fn lookup(by_day: &HashMap<NaiveDate, i64>, range: &[NaiveDate]) -> Vec<i64> {
    range
        .iter()
        .map(|d| by_day.get(d).copied().unwrap_or(0))
        .collect()
}

/// One series per entity, every series on the same `range`.
pub fn reconcile_many<P: DatedCount>(entities: &[EntityPoints<P>], range: &[NaiveDate]) -> Vec<UsageSeries> {
    entities
        .iter()
        .map(|e| UsageSeries::from_counts(e.label.clone(), range, reconcile(&e.points, range)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::date_range::date_range_ending;
    use crate::models::analytics::TimePoint;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(date: &str, count: i64) -> TimePoint {
        TimePoint {
            date: date.into(),
            count: Some(count),
            total_size: None,
        }
    }

    #[test]
    fn test_empty_points_give_zeros() {
        let range = date_range_ending(day(2024, 5, 10), 7);
        let counts = reconcile::<TimePoint>(&[], &range);
        assert_eq!(counts, vec![0; 7]);
    }

    #[test]
    fn test_single_point_lands_on_its_day() {
        let range = date_range_ending(day(2024, 5, 10), 7);
        let counts = reconcile(&[point("2024-05-08", 5)], &range);
        assert_eq!(counts, vec![0, 0, 0, 0, 5, 0, 0]);
    }

    #[test]
    fn test_duplicates_last_write_wins_and_outsiders_ignored() {
        let range = date_range_ending(day(2024, 5, 10), 3);
        let points = vec![
            point("2024-05-09", 1),
            point("2024-05-09", 9),
            point("2024-04-01", 100),
            point("garbage", 7),
        ];
        assert_eq!(reconcile(&points, &range), vec![0, 9, 0]);
    }

    #[test]
    fn test_malformed_count_reads_as_zero() {
        let range = date_range_ending(day(2024, 5, 10), 2);
        let rows: Vec<TimePoint> =
            serde_json::from_str(r#"[{"date":"2024-05-10","count":"n/a"}]"#).unwrap();
        assert_eq!(reconcile(&rows, &range), vec![0, 0]);
    }

    #[test]
    fn test_reconcile_many_shares_axis() {
        let range = date_range_ending(day(2024, 5, 10), 3);
        let entities = vec![
            EntityPoints { id: 1, label: "billing".into(), points: vec![point("2024-05-08", 2)] },
            EntityPoints { id: 2, label: "search".into(), points: vec![point("2024-05-10", 4)] },
        ];
        let series = reconcile_many(&entities, &range);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].counts(), vec![2, 0, 0]);
        assert_eq!(series[1].counts(), vec![0, 0, 4]);
        for s in &series {
            let days: Vec<NaiveDate> = s.points.iter().map(|(d, _)| *d).collect();
            assert_eq!(days, range);
        }
        assert_eq!(series[1].total(), 4);
    }

    #[test]
    fn test_series_total_saturates() {
        let range = date_range_ending(day(2024, 5, 10), 2);
        let series = UsageSeries::from_counts("huge", &range, vec![i64::MAX, 1]);
        assert_eq!(series.total(), i64::MAX);
    }
}
