use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::analytics::date_range::{clamp_window, labels};
use crate::analytics::filter::EntityFilter;
use crate::analytics::reconcile::UsageSeries;

/// Fixed place on the dashboard a chart is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSlot {
    DailyRequests,
    ServiceUsage,
    ServiceTime,
    TokenTime,
    UserServices,
    UserTokens,
}

impl ChartSlot {
    pub fn default_kind(self) -> ChartKind {
        match self {
            ChartSlot::ServiceUsage => ChartKind::Bar,
            _ => ChartKind::Line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

/// Explicit inputs of a chart update: what the selectors on screen hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartConfig {
    pub entity: EntityFilter,
    pub window_days: u32,
    /// `None` keeps whatever kind the slot currently shows.
    pub kind: Option<ChartKind>,
}

impl ChartConfig {
    pub fn new(entity: EntityFilter, window_days: u32) -> Self {
        Self {
            entity,
            window_days: clamp_window(window_days),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ChartKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<i64>,
    pub color: String,
}

/// Chart-ready data: x-axis labels and one dataset per series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub slot: ChartSlot,
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl Chart {
    /// Multi-series chart over a shared day axis.
    pub fn time_series(
        slot: ChartSlot,
        kind: ChartKind,
        title: impl Into<String>,
        range: &[NaiveDate],
        series: Vec<UsageSeries>,
    ) -> Self {
        let colors = generate_colors(series.len());
        let datasets = series
            .into_iter()
            .zip(colors)
            .map(|(s, color)| Dataset {
                values: s.counts(),
                label: s.label,
                color,
            })
            .collect();
        Self {
            slot,
            kind,
            title: title.into(),
            labels: labels(range),
            datasets,
        }
    }

    /// Single-dataset chart with one bar/slice per category.
    pub fn categorical(
        slot: ChartSlot,
        kind: ChartKind,
        title: impl Into<String>,
        dataset_label: impl Into<String>,
        categories: Vec<(String, i64)>,
    ) -> Self {
        let color = generate_colors(1).remove(0);
        let (labels, values): (Vec<String>, Vec<i64>) = categories.into_iter().unzip();
        Self {
            slot,
            kind,
            title: title.into(),
            labels,
            datasets: vec![Dataset {
                label: dataset_label.into(),
                values,
                color,
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.datasets.iter().all(|d| d.values.is_empty())
    }
}

const BASE_COLORS: [&str; 6] = [
    "rgba(255, 99, 132, 0.5)",
    "rgba(54, 162, 235, 0.5)",
    "rgba(255, 206, 86, 0.5)",
    "rgba(75, 192, 192, 0.5)",
    "rgba(153, 102, 255, 0.5)",
    "rgba(255, 159, 64, 0.5)",
];

/// `count` fill colours: the fixed palette first, random colours after it.
pub fn generate_colors(count: usize) -> Vec<String> {
    let mut colors: Vec<String> = BASE_COLORS.iter().take(count).map(|c| c.to_string()).collect();
    let mut rng = rand::thread_rng();
    while colors.len() < count {
        let (r, g, b): (u8, u8, u8) = (rng.gen(), rng.gen(), rng.gen());
        colors.push(format!("rgba({}, {}, {}, 0.5)", r, g, b));
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::date_range::date_range_ending;

    #[test]
    fn test_generate_colors_prefers_palette() {
        assert_eq!(generate_colors(2), vec![BASE_COLORS[0].to_string(), BASE_COLORS[1].to_string()]);
        let many = generate_colors(9);
        assert_eq!(many.len(), 9);
        assert_eq!(many[5], BASE_COLORS[5]);
        assert!(many[8].starts_with("rgba(") && many[8].ends_with(", 0.5)"));
        assert!(generate_colors(0).is_empty());
    }

    #[test]
    fn test_time_series_chart_labels_match_axis() {
        let range = date_range_ending(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), 3);
        let series = vec![UsageSeries::from_counts("billing", &range, vec![1, 2, 3])];
        let chart = Chart::time_series(ChartSlot::ServiceTime, ChartKind::Line, "Service usage", &range, series);
        assert_eq!(chart.labels, vec!["2024-05-08", "2024-05-09", "2024-05-10"]);
        assert_eq!(chart.datasets[0].values, vec![1, 2, 3]);
        assert_eq!(chart.datasets[0].label, "billing");
        assert!(!chart.is_empty());
    }

    #[test]
    fn test_categorical_chart() {
        let chart = Chart::categorical(
            ChartSlot::ServiceUsage,
            ChartKind::Bar,
            "Requests per service",
            "requests",
            vec![("billing".into(), 9), ("search".into(), 1)],
        );
        assert_eq!(chart.labels, vec!["billing", "search"]);
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].values, vec![9, 1]);

        let empty = Chart::categorical(ChartSlot::ServiceUsage, ChartKind::Bar, "t", "requests", vec![]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_config_clamps_window() {
        let cfg = ChartConfig::new(EntityFilter::All, 0).with_kind(ChartKind::Bar);
        assert_eq!(cfg.window_days, 1);
        assert_eq!(cfg.kind, Some(ChartKind::Bar));
        assert_eq!(ChartConfig::new(EntityFilter::All, u32::MAX).window_days, 3650);
    }
}
