//! Statistics rows returned by `/admin/stats/*`.
//!
//! Counts are read leniently: anything that is not a finite JSON number
//! (a string, `null`, an object) deserializes to `None` instead of failing
//! the whole response. Aggregation treats `None` as zero.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Calendar day of a row's `date` field. Accepts `YYYY-MM-DD` with or
/// without a trailing time component.
pub fn day_key(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        _ => None,
    })
}

/// A row that contributes a count to one calendar day.
pub trait DatedCount {
    fn day(&self) -> Option<NaiveDate>;
    fn count(&self) -> i64;
}

/// Which numeric column of a [`DailyStat`] to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Count,
    UserCount,
    ServiceCount,
    TokenCount,
}

/// One day of activity from `GET /admin/stats/recent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub user_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub service_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub token_count: Option<i64>,
}

impl DailyStat {
    /// Value of `field`, zero when missing or malformed.
    pub fn field(&self, field: StatField) -> i64 {
        let v = match field {
            StatField::Count => self.count,
            StatField::UserCount => self.user_count,
            StatField::ServiceCount => self.service_count,
            StatField::TokenCount => self.token_count,
        };
        v.unwrap_or(0)
    }
}

impl DatedCount for DailyStat {
    fn day(&self) -> Option<NaiveDate> {
        day_key(&self.date)
    }
    fn count(&self) -> i64 {
        self.count.unwrap_or(0)
    }
}

/// Per-service totals from `GET /admin/stats/services`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUsage {
    pub service_id: u64,
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

/// One day of a single service's or token's time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

impl DatedCount for TimePoint {
    fn day(&self) -> Option<NaiveDate> {
        day_key(&self.date)
    }
    fn count(&self) -> i64 {
        self.count.unwrap_or(0)
    }
}

/// Per-user, per-service totals from `GET /admin/stats/users/services`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserServiceStat {
    pub user_id: u64,
    pub username: String,
    pub service_id: u64,
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

/// Per-user, per-token totals from `GET /admin/stats/users/tokens`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTokenStat {
    pub user_id: u64,
    pub username: String,
    pub token_id: u64,
    #[serde(default)]
    pub token_value: String,
    pub service_id: u64,
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

/// Row of `GET /admin/stats/users/{id|all}/services/time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserServiceTimePoint {
    pub user_id: u64,
    pub username: String,
    pub service_id: u64,
    pub service_name: String,
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

impl DatedCount for UserServiceTimePoint {
    fn day(&self) -> Option<NaiveDate> {
        day_key(&self.date)
    }
    fn count(&self) -> i64 {
        self.count.unwrap_or(0)
    }
}

/// Row of `GET /admin/stats/users/{id|all}/tokens/time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserTokenTimePoint {
    pub user_id: u64,
    pub username: String,
    pub token_id: u64,
    #[serde(default)]
    pub token_value: String,
    pub service_id: u64,
    pub service_name: String,
    pub date: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_size: Option<i64>,
}

impl DatedCount for UserTokenTimePoint {
    fn day(&self) -> Option<NaiveDate> {
        day_key(&self.date)
    }
    fn count(&self) -> i64 {
        self.count.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_accepts_date_and_timestamp() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(day_key("2024-03-09"), Some(d));
        assert_eq!(day_key("2024-03-09T00:00:00Z"), Some(d));
        assert_eq!(day_key("2024-3-9"), None);
        assert_eq!(day_key(""), None);
    }

    #[test]
    fn test_lenient_counts() {
        let json = r#"[
            {"date":"2024-03-09","count":12,"user_count":2,"service_count":1,"token_count":3},
            {"date":"2024-03-10","count":"abc","user_count":null},
            {"date":"2024-03-11","count":4.0}
        ]"#;
        let rows: Vec<DailyStat> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].count, Some(12));
        assert_eq!(rows[0].field(StatField::TokenCount), 3);
        assert_eq!(rows[1].count, None);
        assert_eq!(rows[1].field(StatField::UserCount), 0);
        assert_eq!(rows[1].field(StatField::ServiceCount), 0);
        assert_eq!(rows[2].count, Some(4));
    }

    #[test]
    fn test_user_token_time_point_shape() {
        let json = r#"{"user_id":1,"username":"alice","token_id":7,"token_value":"abc",
            "service_id":2,"service_name":"billing","date":"2024-03-09","count":5,"total_size":900}"#;
        let row: UserTokenTimePoint = serde_json::from_str(json).unwrap();
        assert_eq!(row.token_id, 7);
        assert_eq!(DatedCount::count(&row), 5);
        assert_eq!(row.day(), NaiveDate::from_ymd_opt(2024, 3, 9));
    }
}
