//! Turns a cached synthetic path plus the live price into chart data.

use crate::chart::range::RangeKey;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeStats {
    pub profit_absolute: f64,
    pub profit_percent: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub range: RangeKey,
    pub points: Vec<ChartPoint>,
    pub stats: RangeStats,
}

/// Assembles `path` for display, labeling points relative to the local clock.
pub fn assemble(path: &[f64], live_value: f64, range: RangeKey) -> Chart {
    assemble_at(path, live_value, range, Local::now().naive_local())
}

/// Same as [`assemble`] with an explicit reference time.
///
/// The stored history is never modified: its last value is replaced by
/// `live_value` in the output only.
pub fn assemble_at(path: &[f64], live_value: f64, range: RangeKey, now: NaiveDateTime) -> Chart {
    let history = path.split_last().map_or(&[][..], |(_, rest)| rest);
    let values: Vec<f64> = history
        .iter()
        .copied()
        .chain(std::iter::once(live_value))
        .collect();

    let label_rule = range.spec().label_rule;
    let last_index = values.len().saturating_sub(1);
    let points = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let ratio = if last_index == 0 {
                0.0
            } else {
                i as f64 / last_index as f64
            };
            ChartPoint {
                label: label_rule.label(ratio, now),
                value,
            }
        })
        .collect();

    let first_value = path.first().copied().unwrap_or(live_value);
    let profit_absolute = live_value - first_value;
    let profit_percent = if first_value == 0.0 {
        0.0
    } else {
        profit_absolute / first_value * 100.0
    };

    Chart {
        range,
        points,
        stats: RangeStats {
            profit_absolute,
            profit_percent,
            label: range.description().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_stats_from_first_value_and_live_value() {
        let chart = assemble_at(&[100.0, 110.0, 105.0], 130.0, RangeKey::Month, noon());

        assert_eq!(chart.stats.profit_absolute, 30.0);
        assert_eq!(chart.stats.profit_percent, 30.0);
        assert_eq!(chart.stats.label, "Past month");
    }

    #[test]
    fn test_live_value_replaces_tail() {
        let path = vec![100.0, 110.0, 105.0];
        let chart = assemble_at(&path, 130.0, RangeKey::Week, noon());

        let values: Vec<f64> = chart.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 110.0, 130.0]);
        assert_eq!(path, vec![100.0, 110.0, 105.0]);
    }

    #[test]
    fn test_only_final_point_moves_between_calls() {
        let path = vec![50.0, 52.0, 51.0, 53.0, 55.0];
        let first = assemble_at(&path, 56.0, RangeKey::Intraday, noon());
        let second = assemble_at(&path, 49.5, RangeKey::Intraday, noon());

        let n = first.points.len();
        assert_eq!(n, second.points.len());
        assert_eq!(first.points[..n - 1], second.points[..n - 1]);
        assert_eq!(first.points[n - 1].label, second.points[n - 1].label);
        assert_ne!(first.points[n - 1].value, second.points[n - 1].value);
    }

    #[test]
    fn test_labels_follow_range_rule() {
        let chart = assemble_at(&[1.0, 2.0, 3.0], 4.0, RangeKey::Intraday, noon());
        let labels: Vec<&str> = chart.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["09:30", "12:45", "16:00"]);
    }

    #[test]
    fn test_zero_start_reports_zero_percent() {
        let chart = assemble_at(&[0.0, 5.0], 10.0, RangeKey::Year, noon());
        assert_eq!(chart.stats.profit_absolute, 10.0);
        assert_eq!(chart.stats.profit_percent, 0.0);
    }

    #[test]
    fn test_empty_path_yields_single_live_point() {
        let chart = assemble_at(&[], 42.0, RangeKey::All, noon());
        assert_eq!(chart.points.len(), 1);
        assert_eq!(chart.points[0].value, 42.0);
        assert_eq!(chart.stats.profit_absolute, 0.0);
        assert_eq!(chart.stats.profit_percent, 0.0);
    }
}
