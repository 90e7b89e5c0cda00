//! Entity filtering and secondary-key grouping for flat usage rows.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::reconcile::{lookup, UsageSeries};
use crate::models::analytics::DatedCount;

/// Selector value: a single entity or the "all" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityFilter {
    #[default]
    All,
    Only(u64),
}

impl EntityFilter {
    pub fn matches(&self, id: u64) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Only(want) => *want == id,
        }
    }
}

impl fmt::Display for EntityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityFilter::All => f.write_str("all"),
            EntityFilter::Only(id) => write!(f, "{}", id),
        }
    }
}

impl Serialize for EntityFilter {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl FromStr for EntityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.is_empty() {
            return Ok(EntityFilter::All);
        }
        s.parse::<u64>()
            .map(EntityFilter::Only)
            .map_err(|_| format!("expected an id or 'all', got '{}'", s))
    }
}

/// Rows whose owner matches `filter`. `All` passes the input through untouched.
pub fn filter_by_entity<'a, T, K>(rows: &'a [T], filter: EntityFilter, owner: K) -> Cow<'a, [T]>
where
    T: Clone,
    K: Fn(&T) -> u64,
{
    match filter {
        EntityFilter::All => Cow::Borrowed(rows),
        EntityFilter::Only(_) => Cow::Owned(
            rows.iter()
                .filter(|r| filter.matches(owner(*r)))
                .cloned()
                .collect(),
        ),
    }
}

/// Group rows by a secondary key (e.g. service), summing counts that fall on
/// the same day, and reconcile each group against `range`.
///
/// Groups keep the order in which their key first appears; the label is
/// taken from that first row.
pub fn group_series_by<T, G, L>(rows: &[T], range: &[NaiveDate], key: G, label: L) -> Vec<UsageSeries>
where
    T: DatedCount,
    G: Fn(&T) -> u64,
    L: Fn(&T) -> String,
{
    let mut order: Vec<(u64, String)> = Vec::new();
    let mut sums: HashMap<u64, HashMap<NaiveDate, i64>> = HashMap::new();

    for row in rows {
        let k = key(row);
        let days = sums.entry(k).or_insert_with(|| {
            order.push((k, label(row)));
            HashMap::new()
        });
        if let Some(day) = row.day() {
            let sum = days.entry(day).or_insert(0);
            *sum = sum.saturating_add(row.count());
        }
    }

    order
        .into_iter()
        .map(|(k, label)| {
            let counts = sums.get(&k).map(|d| lookup(d, range)).unwrap_or_else(|| vec![0; range.len()]);
            UsageSeries::from_counts(label, range, counts)
        })
        .collect()
}

/// Total count per secondary key, largest first; ties keep first-seen order.
pub fn group_totals_by<T, G, L, C>(rows: &[T], key: G, label: L, count: C) -> Vec<(String, i64)>
where
    G: Fn(&T) -> u64,
    L: Fn(&T) -> String,
    C: Fn(&T) -> i64,
{
    let mut order: Vec<u64> = Vec::new();
    let mut totals: HashMap<u64, (String, i64)> = HashMap::new();
    for row in rows {
        let k = key(row);
        let entry = totals.entry(k).or_insert_with(|| {
            order.push(k);
            (label(row), 0)
        });
        entry.1 = entry.1.saturating_add(count(row));
    }

    let mut out: Vec<(String, i64)> = order.into_iter().filter_map(|k| totals.remove(&k)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::date_range::date_range_ending;
    use crate::models::analytics::UserServiceTimePoint;

    fn row(user_id: u64, service_id: u64, service: &str, date: &str, count: i64) -> UserServiceTimePoint {
        UserServiceTimePoint {
            user_id,
            username: format!("user{}", user_id),
            service_id,
            service_name: service.into(),
            date: date.into(),
            count: Some(count),
            total_size: None,
        }
    }

    fn rows() -> Vec<UserServiceTimePoint> {
        vec![
            row(1, 10, "billing", "2024-05-09", 3),
            row(2, 10, "billing", "2024-05-09", 4),
            row(1, 20, "search", "2024-05-10", 1),
            row(2, 10, "billing", "2024-05-10", 2),
        ]
    }

    #[test]
    fn test_parse_entity_filter() {
        assert_eq!("all".parse::<EntityFilter>().unwrap(), EntityFilter::All);
        assert_eq!("ALL".parse::<EntityFilter>().unwrap(), EntityFilter::All);
        assert_eq!("42".parse::<EntityFilter>().unwrap(), EntityFilter::Only(42));
        assert!("x1".parse::<EntityFilter>().is_err());
        assert_eq!(EntityFilter::Only(42).to_string(), "42");
        assert_eq!(EntityFilter::All.to_string(), "all");
    }

    #[test]
    fn test_all_passes_rows_through() {
        let rows = rows();
        let out = filter_by_entity(&rows, EntityFilter::All, |r| r.user_id);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert!(std::ptr::eq(out.as_ref(), rows.as_slice()));
        assert_eq!(out.as_ref(), rows.as_slice());
    }

    #[test]
    fn test_filter_keeps_matching_owner_in_order() {
        let rows = rows();
        let out = filter_by_entity(&rows, EntityFilter::Only(2), |r| r.user_id);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.user_id == 2));
        assert_eq!(out[0].date, "2024-05-09");
        assert_eq!(out[1].date, "2024-05-10");
    }

    #[test]
    fn test_group_series_sums_same_day() {
        let range = date_range_ending(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), 2);
        let series = group_series_by(&rows(), &range, |r| r.service_id, |r| r.service_name.clone());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "billing");
        assert_eq!(series[0].counts(), vec![7, 2]);
        assert_eq!(series[1].label, "search");
        assert_eq!(series[1].counts(), vec![0, 1]);
    }

    #[test]
    fn test_group_totals_sorted_desc() {
        let totals = group_totals_by(
            &rows(),
            |r| r.service_id,
            |r| r.service_name.clone(),
            |r| r.count.unwrap_or(0),
        );
        assert_eq!(totals, vec![("billing".to_string(), 9), ("search".to_string(), 1)]);
    }

    #[test]
    fn test_grouping_saturates_on_huge_counts() {
        let range = date_range_ending(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), 1);
        let rows = vec![
            row(1, 10, "billing", "2024-05-10", i64::MAX),
            row(2, 10, "billing", "2024-05-10", 5),
        ];
        let series = group_series_by(&rows, &range, |r| r.service_id, |r| r.service_name.clone());
        assert_eq!(series[0].counts(), vec![i64::MAX]);

        let totals = group_totals_by(&rows, |r| r.service_id, |r| r.service_name.clone(), |r| r.count.unwrap_or(0));
        assert_eq!(totals, vec![("billing".to_string(), i64::MAX)]);
    }
}
