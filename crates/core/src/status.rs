//! Device health classification.
//!
//! [`classify`] maps a device's validity percentages and last-seen values
//! to a [`DeviceStatus`]. Rules are evaluated in order and the first match
//! wins:
//!
//! 1. no rows in the window: `No uploads.` (plus a battery hint when the
//!    device went silent before the window with a low battery)
//! 2. row coverage below the threshold: `Gaps in measurements.`
//! 3. any metric below the threshold: `Problems with: ...`
//! 4. otherwise `OK`

use std::fmt;

use crate::metric::Metric;
use crate::stats::ValidityPercentages;
use crate::types::Timestamp;

/// Coverage below this fraction marks a metric (or the row count) as a problem.
pub const DEFAULT_STATUS_THRESHOLD: f64 = 0.95;

/// Battery readings below this level suggest the device ran flat.
pub const EMPTY_BATTERY_LEVEL: f64 = 3600.0;

// ---------------------------------------------------------------------------
// DeviceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// No rows inside the window.
    NoUploads { empty_battery: bool },
    /// Row coverage below the threshold.
    Gaps,
    /// Every metric meets the threshold.
    Ok,
    /// Metrics below the threshold, in declaration order.
    Problems(Vec<Metric>),
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::NoUploads { empty_battery } => {
                f.write_str("No uploads.")?;
                if *empty_battery {
                    f.write_str(" Probably due to empty battery.")?;
                }
                Ok(())
            }
            DeviceStatus::Gaps => f.write_str("Gaps in measurements."),
            DeviceStatus::Ok => f.write_str("OK"),
            DeviceStatus::Problems(metrics) => {
                let names: Vec<&str> = metrics.iter().map(|m| m.display_name()).collect();
                write!(f, "Problems with: {}", names.join(", "))
            }
        }
    }
}

/// Inputs the classifier needs besides the percentages.
#[derive(Debug, Clone, Copy)]
pub struct LastSeen {
    pub timestamp: Option<Timestamp>,
    pub battery_level: Option<f64>,
}

/// Classify a device. Pure: identical inputs always give the same status.
pub fn classify(
    percentages: &ValidityPercentages,
    last_seen: LastSeen,
    window_start: Timestamp,
    threshold: f64,
) -> DeviceStatus {
    if percentages.measurements == 0.0 {
        let went_silent_before_window = last_seen.timestamp.is_some_and(|t| t < window_start);
        let battery_low = last_seen
            .battery_level
            .is_some_and(|level| level < EMPTY_BATTERY_LEVEL);
        return DeviceStatus::NoUploads {
            empty_battery: went_silent_before_window && battery_low,
        };
    }

    if percentages.measurements < threshold {
        return DeviceStatus::Gaps;
    }

    let problems: Vec<Metric> = percentages
        .iter()
        .filter(|(_, fraction)| *fraction < threshold)
        .map(|(metric, _)| metric)
        .collect();

    if problems.is_empty() {
        DeviceStatus::Ok
    } else {
        DeviceStatus::Problems(problems)
    }
}

// ---------------------------------------------------------------------------
// StatusSummary
// ---------------------------------------------------------------------------

/// Tally of statuses across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub ok: usize,
    pub problems: usize,
    pub gaps: usize,
    pub no_uploads: usize,
}

impl StatusSummary {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a DeviceStatus>) -> Self {
        let mut summary = StatusSummary::default();
        for status in statuses {
            summary.total += 1;
            match status {
                DeviceStatus::Ok => summary.ok += 1,
                DeviceStatus::Problems(_) => summary.problems += 1,
                DeviceStatus::Gaps => summary.gaps += 1,
                DeviceStatus::NoUploads { .. } => summary.no_uploads += 1,
            }
        }
        summary
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices: {} OK, {} with metric problems, {} with gaps, {} without uploads",
            self.total, self.ok, self.problems, self.gaps, self.no_uploads
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;

    fn window_start() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn seen(timestamp: Option<Timestamp>, battery_level: Option<f64>) -> LastSeen {
        LastSeen {
            timestamp,
            battery_level,
        }
    }

    fn status_of(p: &ValidityPercentages, last_seen: LastSeen) -> String {
        classify(p, last_seen, window_start(), DEFAULT_STATUS_THRESHOLD).to_string()
    }

    // -- rule 1: no uploads ---------------------------------------------------

    #[test]
    fn no_uploads_with_empty_battery() {
        let p = ValidityPercentages::uniform(0.0, 0.0);
        let before = window_start() - TimeDelta::days(2);
        assert_eq!(
            status_of(&p, seen(Some(before), Some(3000.0))),
            "No uploads. Probably due to empty battery."
        );
    }

    #[test]
    fn no_uploads_with_healthy_battery() {
        let p = ValidityPercentages::uniform(0.0, 0.0);
        let before = window_start() - TimeDelta::days(2);
        assert_eq!(
            status_of(&p, seen(Some(before), Some(4000.0))),
            "No uploads."
        );
    }

    #[test]
    fn no_uploads_without_any_rows() {
        let p = ValidityPercentages::uniform(0.0, 0.0);
        assert_eq!(status_of(&p, seen(None, None)), "No uploads.");
    }

    #[test]
    fn battery_hint_needs_last_seen_before_window() {
        let p = ValidityPercentages::uniform(0.0, 0.0);
        assert_eq!(
            status_of(&p, seen(Some(window_start()), Some(3000.0))),
            "No uploads."
        );
    }

    #[test]
    fn battery_hint_needs_a_battery_reading() {
        let p = ValidityPercentages::uniform(0.0, 0.0);
        let before = window_start() - TimeDelta::days(2);
        assert_eq!(status_of(&p, seen(Some(before), None)), "No uploads.");
    }

    // -- rule 2: gaps ---------------------------------------------------------

    #[test]
    fn gaps_regardless_of_other_metrics() {
        let p = ValidityPercentages::uniform(0.80, 0.10);
        assert_eq!(status_of(&p, seen(None, None)), "Gaps in measurements.");
    }

    // -- rule 3: metric problems ----------------------------------------------

    #[test]
    fn all_metrics_above_threshold_is_ok() {
        let p = ValidityPercentages::uniform(1.0, 0.95);
        assert_eq!(status_of(&p, seen(None, None)), "OK");
    }

    #[test]
    fn problems_listed_in_declaration_order() {
        let mut p = ValidityPercentages::uniform(1.0, 1.0);
        p.set(Metric::Pressure, 0.90);
        p.set(Metric::Temperature, 0.80);
        assert_eq!(
            status_of(&p, seen(None, None)),
            "Problems with: temperature, pressure"
        );
    }

    #[test]
    fn battery_problem_uses_display_name() {
        let mut p = ValidityPercentages::uniform(0.96, 1.0);
        p.set(Metric::Battery, 0.5);
        p.set(Metric::GustDirection, 0.2);
        assert_eq!(
            status_of(&p, seen(None, None)),
            "Problems with: gust direction, battery level"
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let p = ValidityPercentages::uniform(0.9, 0.9);
        let status = classify(&p, seen(None, None), window_start(), 0.85);
        assert_eq!(status, DeviceStatus::Ok);
    }

    #[test]
    fn classification_is_deterministic() {
        let mut p = ValidityPercentages::uniform(1.0, 1.0);
        p.set(Metric::Humidity, 0.5);
        let a = classify(&p, seen(None, Some(3500.0)), window_start(), 0.95);
        let b = classify(&p, seen(None, Some(3500.0)), window_start(), 0.95);
        assert_eq!(a, b);
    }

    // -- StatusSummary --------------------------------------------------------

    #[test]
    fn summary_counts_each_kind() {
        let statuses = vec![
            DeviceStatus::Ok,
            DeviceStatus::Ok,
            DeviceStatus::Gaps,
            DeviceStatus::Problems(vec![Metric::Rainfall]),
            DeviceStatus::NoUploads {
                empty_battery: true,
            },
        ];
        let summary = StatusSummary::from_statuses(&statuses);
        assert_eq!(
            summary,
            StatusSummary {
                total: 5,
                ok: 2,
                problems: 1,
                gaps: 1,
                no_uploads: 1,
            }
        );
        assert_eq!(
            summary.to_string(),
            "5 devices: 2 OK, 1 with metric problems, 1 with gaps, 1 without uploads"
        );
    }
}
