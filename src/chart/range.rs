//! Chart ranges and how each one is synthesized and labeled.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum RangeKey {
    Intraday,
    Week,
    Month,
    Quarter,
    YearToDate,
    Year,
    All,
}

impl RangeKey {
    pub const ALL: [RangeKey; 7] = [
        RangeKey::Intraday,
        RangeKey::Week,
        RangeKey::Month,
        RangeKey::Quarter,
        RangeKey::YearToDate,
        RangeKey::Year,
        RangeKey::All,
    ];

    /// Human description, used as the label of the range's statistics.
    pub fn description(&self) -> &'static str {
        match self {
            RangeKey::Intraday => "Today",
            RangeKey::Week => "Past week",
            RangeKey::Month => "Past month",
            RangeKey::Quarter => "Past 3 months",
            RangeKey::YearToDate => "Year to date",
            RangeKey::Year => "Past year",
            RangeKey::All => "All time",
        }
    }

    pub fn spec(&self) -> RangeSpec {
        match self {
            RangeKey::Intraday => RangeSpec {
                step_count: 78,
                volatility: 0.004,
                start_rule: StartRule::Ratio(0.995),
                label_rule: LabelRule::SessionClock {
                    open: (9, 30),
                    close: (16, 0),
                },
            },
            RangeKey::Week => RangeSpec {
                step_count: 7,
                volatility: 0.01,
                start_rule: StartRule::Ratio(0.97),
                label_rule: LabelRule::TrailingDays {
                    days: 7,
                    format: "%a %d",
                },
            },
            RangeKey::Month => RangeSpec {
                step_count: 30,
                volatility: 0.015,
                start_rule: StartRule::Ratio(0.94),
                label_rule: LabelRule::TrailingDays {
                    days: 30,
                    format: "%b %d",
                },
            },
            RangeKey::Quarter => RangeSpec {
                step_count: 45,
                volatility: 0.02,
                start_rule: StartRule::Ratio(0.90),
                label_rule: LabelRule::TrailingDays {
                    days: 90,
                    format: "%b %d",
                },
            },
            RangeKey::YearToDate => RangeSpec {
                step_count: 40,
                volatility: 0.025,
                start_rule: StartRule::Ratio(0.88),
                label_rule: LabelRule::YearToDate { format: "%b %d" },
            },
            RangeKey::Year => RangeSpec {
                step_count: 12,
                volatility: 0.03,
                start_rule: StartRule::Ratio(0.80),
                label_rule: LabelRule::MonthsOfYear,
            },
            RangeKey::All => RangeSpec {
                step_count: 24,
                volatility: 0.05,
                start_rule: StartRule::CostBasis { fallback: 0.35 },
                label_rule: LabelRule::TrailingYears {
                    years: 5,
                    format: "%b %Y",
                },
            },
        }
    }
}

impl Display for RangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RangeKey::Intraday => "1D",
                RangeKey::Week => "1W",
                RangeKey::Month => "1M",
                RangeKey::Quarter => "3M",
                RangeKey::YearToDate => "YTD",
                RangeKey::Year => "1Y",
                RangeKey::All => "ALL",
            }
        )
    }
}

impl FromStr for RangeKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(RangeKey::Intraday),
            "1W" => Ok(RangeKey::Week),
            "1M" => Ok(RangeKey::Month),
            "3M" => Ok(RangeKey::Quarter),
            "YTD" => Ok(RangeKey::YearToDate),
            "1Y" => Ok(RangeKey::Year),
            "ALL" => Ok(RangeKey::All),
            _ => Err(anyhow::anyhow!("Invalid chart range: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    pub step_count: usize,
    pub volatility: f64,
    pub start_rule: StartRule,
    pub label_rule: LabelRule,
}

/// Where a synthetic path starts, relative to the live value it ends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartRule {
    Ratio(f64),
    /// Start at what was paid; `fallback` ratio when nothing is known.
    CostBasis { fallback: f64 },
}

impl StartRule {
    pub fn start_value(&self, live_value: f64, cost_basis: Option<f64>) -> f64 {
        match self {
            StartRule::Ratio(ratio) => live_value * ratio,
            StartRule::CostBasis { fallback } => cost_basis
                .filter(|basis| basis.is_finite() && *basis >= 0.0)
                .unwrap_or(live_value * fallback),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelRule {
    /// Trading session between two (hour, minute) marks.
    SessionClock { open: (u32, u32), close: (u32, u32) },
    /// The last `days` calendar days, today included.
    TrailingDays { days: u32, format: &'static str },
    YearToDate { format: &'static str },
    MonthsOfYear,
    TrailingYears { years: u32, format: &'static str },
}

impl LabelRule {
    /// Labels the point at `ratio` (0 = oldest, 1 = now) of a series.
    pub fn label(&self, ratio: f64, now: NaiveDateTime) -> String {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let today = now.date();

        match *self {
            LabelRule::SessionClock { open, close } => {
                let open_time =
                    NaiveTime::from_hms_opt(open.0, open.1, 0).unwrap_or(NaiveTime::MIN);
                let close_time = NaiveTime::from_hms_opt(close.0, close.1, 0).unwrap_or(open_time);
                let session_minutes = (close_time - open_time).num_minutes().max(0) as f64;
                let offset = (ratio * session_minutes).round() as i64;
                (open_time + Duration::minutes(offset))
                    .format("%H:%M")
                    .to_string()
            }
            LabelRule::TrailingDays { days, format } => {
                let span = days.saturating_sub(1) as f64;
                let back = (span - (ratio * span).round()) as i64;
                (today - Duration::days(back)).format(format).to_string()
            }
            LabelRule::YearToDate { format } => {
                let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let elapsed = (today - jan_first).num_days() as f64;
                let offset = (ratio * elapsed).round() as i64;
                (jan_first + Duration::days(offset))
                    .format(format)
                    .to_string()
            }
            LabelRule::MonthsOfYear => {
                let month = (ratio * 11.0).round() as u32 + 1;
                NaiveDate::from_ymd_opt(today.year(), month, 1)
                    .unwrap_or(today)
                    .format("%b")
                    .to_string()
            }
            LabelRule::TrailingYears { years, format } => {
                let total_months = years * 12;
                let back = total_months - (ratio * total_months as f64).round() as u32;
                today
                    .checked_sub_months(Months::new(back))
                    .unwrap_or(today)
                    .format(format)
                    .to_string()
            }
        }
    }
}
