//! Dense calendar-day axis shared by every time-series chart.

use chrono::{Days, Local, NaiveDate};

/// Longest lookback window accepted anywhere (about ten years).
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// `window_days` limited to `1..=MAX_WINDOW_DAYS`.
pub fn clamp_window(window_days: u32) -> u32 {
    window_days.clamp(1, MAX_WINDOW_DAYS)
}

/// Days from `today - (window_days - 1)` through `today`, ascending.
///
/// Works on calendar dates, so DST shifts and time of day cannot drop or
/// duplicate a day. The window is clamped with [`clamp_window`]. The last
/// element is always `today`.
pub fn date_range_ending(today: NaiveDate, window_days: u32) -> Vec<NaiveDate> {
    let back = u64::from(clamp_window(window_days) - 1);
    let start = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);

    let mut days: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= today).collect();
    if days.last() != Some(&today) {
        days.push(today);
    }
    days
}

/// [`date_range_ending`] for today in the local time zone.
pub fn date_range(window_days: u32) -> Vec<NaiveDate> {
    date_range_ending(Local::now().date_naive(), window_days)
}

/// `YYYY-MM-DD` labels for an axis.
pub fn labels(range: &[NaiveDate]) -> Vec<String> {
    range.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_ends_today_and_is_contiguous() {
        let today = day(2024, 3, 5);
        for window in 1..=60 {
            let range = date_range_ending(today, window);
            assert_eq!(range.len(), window as usize);
            assert_eq!(*range.last().unwrap(), today);
            for pair in range.windows(2) {
                assert_eq!(pair[0].succ_opt(), Some(pair[1]), "gap in window {}", window);
            }
        }
    }

    #[test]
    fn test_range_crosses_month_and_leap_day() {
        let range = date_range_ending(day(2024, 3, 2), 4);
        assert_eq!(
            range,
            vec![day(2024, 2, 28), day(2024, 2, 29), day(2024, 3, 1), day(2024, 3, 2)]
        );
    }

    #[test]
    fn test_zero_window_is_today_only() {
        assert_eq!(date_range_ending(day(2024, 1, 1), 0), vec![day(2024, 1, 1)]);
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let range = date_range_ending(day(2024, 1, 1), u32::MAX);
        assert_eq!(range.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(*range.last().unwrap(), day(2024, 1, 1));
        assert_eq!(clamp_window(0), 1);
        assert_eq!(clamp_window(30), 30);
    }

    #[test]
    fn test_local_range_ends_today() {
        let range = date_range(7);
        assert_eq!(range.len(), 7);
        assert_eq!(*range.last().unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_labels_are_iso() {
        assert_eq!(labels(&[day(2024, 1, 9)]), vec!["2024-01-09".to_string()]);
    }
}
