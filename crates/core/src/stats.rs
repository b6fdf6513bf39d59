//! Per-device statistics over a trailing window.
//!
//! [`WindowStats`] holds the raw counts for one device and run;
//! [`ValidityPercentages`] turns them into coverage fractions against the
//! number of readings the window should contain.

use chrono::TimeDelta;

use crate::metric::Metric;
use crate::types::Timestamp;

/// Trailing window length used when none is configured.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// A device is expected to report every five minutes.
pub const READINGS_PER_HOUR: u64 = 12;

/// Number of readings a window of `window_days` should contain.
pub fn expected_count(window_days: u32) -> u64 {
    u64::from(window_days) * 24 * READINGS_PER_HOUR
}

/// Start of the trailing window `[now - window_days, now]`.
///
/// Saturates at the earliest representable instant instead of overflowing.
pub fn window_start(now: Timestamp, window_days: u32) -> Timestamp {
    now.checked_sub_signed(TimeDelta::days(i64::from(window_days)))
        .unwrap_or(Timestamp::MIN_UTC)
}

/// Fraction of `expected` readings covered by `count`.
///
/// Rounded to three decimals before capping at 1.0, so a metric can read
/// exactly 1 but never more. An empty expectation yields 0.
pub fn valid_percentage(count: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    let rounded = (count as f64 * 1000.0 / expected as f64).round() / 1000.0;
    rounded.min(1.0)
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One row of a measurement stream. Missing readings are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSample {
    pub timestamp: Timestamp,
    pub values: [Option<f64>; Metric::COUNT],
}

impl MeasurementSample {
    /// A row with no readings at all.
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            values: [None; Metric::COUNT],
        }
    }

    /// Set one reading.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values[metric.index()] = Some(value);
        self
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }
}

// ---------------------------------------------------------------------------
// WindowStats
// ---------------------------------------------------------------------------

/// Raw counts for one device over one trailing window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowStats {
    /// Timestamp of the most recent row at or before `now`.
    pub last_timestamp: Option<Timestamp>,
    /// Battery reading of that same row.
    pub last_battery_level: Option<f64>,
    /// Rows with a timestamp inside the window.
    pub row_count: u64,
    /// Rows inside the window whose reading passes the metric's bound,
    /// indexed by [`Metric::index`].
    pub valid_counts: [u64; Metric::COUNT],
    /// Rows stamped after `now`.
    pub future_row_count: u64,
}

impl WindowStats {
    pub fn valid_count(&self, metric: Metric) -> u64 {
        self.valid_counts[metric.index()]
    }

    /// Compute statistics from an in-memory measurement stream.
    ///
    /// Rows inside `[window_start, now]` feed the counts; rows after `now`
    /// only feed `future_row_count`. The latest row at or before `now`
    /// supplies the last-seen values, even when it predates the window.
    pub fn from_samples(
        samples: &[MeasurementSample],
        window_start: Timestamp,
        now: Timestamp,
    ) -> Self {
        let mut stats = WindowStats::default();
        let mut latest: Option<&MeasurementSample> = None;

        for sample in samples {
            if sample.timestamp > now {
                stats.future_row_count += 1;
                continue;
            }

            if latest.map_or(true, |l| sample.timestamp > l.timestamp) {
                latest = Some(sample);
            }

            if sample.timestamp < window_start {
                continue;
            }

            stats.row_count += 1;
            for metric in Metric::ALL {
                if sample
                    .value(metric)
                    .is_some_and(|v| metric.bound().admits(v))
                {
                    stats.valid_counts[metric.index()] += 1;
                }
            }
        }

        if let Some(latest) = latest {
            stats.last_timestamp = Some(latest.timestamp);
            stats.last_battery_level = latest.value(Metric::Battery);
        }

        stats
    }
}

// ---------------------------------------------------------------------------
// ValidityPercentages
// ---------------------------------------------------------------------------

/// Coverage fractions in `[0, 1]` for row count and each metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityPercentages {
    /// Row-count coverage, the synthetic "measurements" metric.
    pub measurements: f64,
    metrics: [f64; Metric::COUNT],
}

impl ValidityPercentages {
    pub fn from_stats(stats: &WindowStats, expected: u64) -> Self {
        let mut metrics = [0.0; Metric::COUNT];
        for metric in Metric::ALL {
            metrics[metric.index()] = valid_percentage(stats.valid_count(metric), expected);
        }
        Self {
            measurements: valid_percentage(stats.row_count, expected),
            metrics,
        }
    }

    /// Same fraction for every metric.
    pub fn uniform(measurements: f64, metric_value: f64) -> Self {
        Self {
            measurements,
            metrics: [metric_value; Metric::COUNT],
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.metrics[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.metrics[metric.index()] = value;
    }

    /// Metrics with their fractions, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
    }

    // -- valid_percentage -----------------------------------------------------

    #[test]
    fn zero_count_is_zero() {
        assert_eq!(valid_percentage(0, 2016), 0.0);
    }

    #[test]
    fn full_count_is_one() {
        assert_eq!(valid_percentage(2016, 2016), 1.0);
    }

    #[test]
    fn excess_count_is_capped() {
        assert_eq!(valid_percentage(4032, 2016), 1.0);
    }

    #[test]
    fn rounds_to_three_decimals() {
        // 1915 / 2016 = 0.94990...
        assert_eq!(valid_percentage(1915, 2016), 0.95);
        assert_eq!(valid_percentage(1, 3), 0.333);
        assert_eq!(valid_percentage(2, 3), 0.667);
    }

    #[test]
    fn rounding_happens_before_the_cap() {
        // 2017 / 2016 rounds to 1.0 and stays there.
        assert_eq!(valid_percentage(2017, 2016), 1.0);
        // 2015 / 2016 = 0.99950.. rounds up to exactly 1.
        assert_eq!(valid_percentage(2015, 2016), 1.0);
    }

    #[test]
    fn always_within_unit_range() {
        for expected in [1u64, 7, 288, 2016] {
            for count in [0u64, 1, expected / 2, expected, expected * 3] {
                let p = valid_percentage(count, expected);
                assert!((0.0..=1.0).contains(&p), "{count}/{expected} gave {p}");
            }
        }
    }

    #[test]
    fn empty_expectation_is_zero() {
        assert_eq!(valid_percentage(10, 0), 0.0);
    }

    // -- window helpers -------------------------------------------------------

    #[test]
    fn seven_day_window_expects_2016_readings() {
        assert_eq!(expected_count(DEFAULT_WINDOW_DAYS), 2016);
    }

    #[test]
    fn window_start_is_n_days_back() {
        let start = window_start(now(), 7);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn huge_window_saturates_instead_of_panicking() {
        assert_eq!(window_start(now(), u32::MAX), Timestamp::MIN_UTC);
    }

    // -- WindowStats::from_samples -------------------------------------------

    #[test]
    fn empty_stream_has_no_last_seen() {
        let stats = WindowStats::from_samples(&[], window_start(now(), 7), now());
        assert_eq!(stats, WindowStats::default());
        assert!(stats.last_timestamp.is_none());
    }

    #[test]
    fn counts_rows_inside_window_inclusive() {
        let start = window_start(now(), 7);
        let samples = vec![
            MeasurementSample::empty(start),
            MeasurementSample::empty(now()),
            MeasurementSample::empty(start - TimeDelta::seconds(1)),
        ];
        let stats = WindowStats::from_samples(&samples, start, now());
        assert_eq!(stats.row_count, 2);
    }

    #[test]
    fn applies_metric_bounds_and_skips_missing_values() {
        let start = window_start(now(), 7);
        let t = now() - TimeDelta::hours(1);
        let samples = vec![
            MeasurementSample::empty(t)
                .with(Metric::Temperature, 21.5)
                .with(Metric::Humidity, 100.0)
                .with(Metric::WindDirection, 360.0),
            MeasurementSample::empty(t)
                .with(Metric::Temperature, 300.0)
                .with(Metric::Humidity, 100.5),
            MeasurementSample::empty(t),
        ];
        let stats = WindowStats::from_samples(&samples, start, now());
        assert_eq!(stats.row_count, 3);
        assert_eq!(stats.valid_count(Metric::Temperature), 1);
        assert_eq!(stats.valid_count(Metric::Humidity), 1);
        assert_eq!(stats.valid_count(Metric::WindDirection), 0);
        assert_eq!(stats.valid_count(Metric::Rainfall), 0);
    }

    #[test]
    fn future_rows_are_counted_separately() {
        let start = window_start(now(), 7);
        let samples = vec![
            MeasurementSample::empty(now() + TimeDelta::minutes(5)).with(Metric::Battery, 4100.0),
            MeasurementSample::empty(now() - TimeDelta::minutes(5)).with(Metric::Battery, 3900.0),
        ];
        let stats = WindowStats::from_samples(&samples, start, now());
        assert_eq!(stats.future_row_count, 1);
        assert_eq!(stats.row_count, 1);
        assert_eq!(stats.last_battery_level, Some(3900.0));
    }

    #[test]
    fn last_seen_may_predate_window() {
        let start = window_start(now(), 7);
        let old = start - TimeDelta::days(3);
        let samples = vec![
            MeasurementSample::empty(old - TimeDelta::days(1)).with(Metric::Battery, 3700.0),
            MeasurementSample::empty(old).with(Metric::Battery, 3400.0),
        ];
        let stats = WindowStats::from_samples(&samples, start, now());
        assert_eq!(stats.row_count, 0);
        assert_eq!(stats.last_timestamp, Some(old));
        assert_eq!(stats.last_battery_level, Some(3400.0));
    }

    // -- ValidityPercentages --------------------------------------------------

    #[test]
    fn percentages_use_row_count_for_measurements() {
        let mut stats = WindowStats {
            row_count: 2016,
            ..WindowStats::default()
        };
        stats.valid_counts[Metric::Pressure.index()] = 1008;
        let p = ValidityPercentages::from_stats(&stats, 2016);
        assert_eq!(p.measurements, 1.0);
        assert_eq!(p.get(Metric::Pressure), 0.5);
        assert_eq!(p.get(Metric::Temperature), 0.0);
    }

    #[test]
    fn iter_yields_declaration_order() {
        let p = ValidityPercentages::uniform(1.0, 1.0);
        let order: Vec<Metric> = p.iter().map(|(m, _)| m).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }
}
