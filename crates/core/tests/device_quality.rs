//! End-to-end checks of the statistics, classification and rendering
//! pipeline for a single device, without any I/O.

use chrono::{TimeDelta, TimeZone, Utc};
use devhealth_core::stats::{expected_count, window_start};
use devhealth_core::{
    classify, render_spreadsheet, Device, DeviceReport, LastSeen, MeasurementSample, Metric,
    ReportRow, Timestamp, ValidityPercentages, WindowStats,
};

const WINDOW_DAYS: u32 = 7;

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
}

/// Build the report for a stream of samples the way the orchestrator does.
fn report_for(samples: &[MeasurementSample]) -> DeviceReport {
    let start = window_start(now(), WINDOW_DAYS);
    let stats = WindowStats::from_samples(samples, start, now());
    let percentages = ValidityPercentages::from_stats(&stats, expected_count(WINDOW_DAYS));
    let status = classify(
        &percentages,
        LastSeen {
            timestamp: stats.last_timestamp,
            battery_level: stats.last_battery_level,
        },
        start,
        0.95,
    );
    DeviceReport {
        device: Device::new("Station", "st-1", "weather"),
        stats,
        percentages,
        status,
    }
}

fn every_five_minutes(n: i64) -> impl Iterator<Item = MeasurementSample> {
    (0..n).map(|i| MeasurementSample::empty(now() - TimeDelta::minutes(5 * i)))
}

#[test]
fn partially_valid_metrics_are_listed_in_declaration_order() {
    let samples: Vec<MeasurementSample> = every_five_minutes(2016)
        .enumerate()
        .map(|(i, s)| {
            let mut s = s;
            for metric in Metric::ALL {
                s = s.with(metric, 10.0);
            }
            // Every fifth pressure reading and every tenth temperature reading is garbage.
            if i % 5 == 0 {
                s = s.with(Metric::Pressure, 5000.0);
            }
            if i % 10 == 0 {
                s = s.with(Metric::Temperature, 1000.0);
            }
            s
        })
        .collect();

    let report = report_for(&samples);
    assert_eq!(report.percentages.measurements, 1.0);
    assert_eq!(report.percentages.get(Metric::Temperature), 0.9);
    assert_eq!(report.percentages.get(Metric::Pressure), 0.8);
    assert_eq!(
        report.status.to_string(),
        "Problems with: temperature, pressure"
    );
}

#[test]
fn duplicate_rows_never_push_coverage_above_one() {
    let samples: Vec<MeasurementSample> = every_five_minutes(2016)
        .chain(every_five_minutes(2016))
        .map(|s| s.with(Metric::Humidity, 100.0))
        .collect();

    let report = report_for(&samples);
    assert_eq!(report.stats.row_count, 4032);
    assert_eq!(report.percentages.measurements, 1.0);
    assert_eq!(report.percentages.get(Metric::Humidity), 1.0);
}

#[test]
fn silent_device_with_flat_battery() {
    let last = window_start(now(), WINDOW_DAYS) - TimeDelta::hours(6);
    let samples = vec![MeasurementSample::empty(last).with(Metric::Battery, 3300.0)];

    let report = report_for(&samples);
    assert_eq!(
        report.status.to_string(),
        "No uploads. Probably due to empty battery."
    );
}

#[test]
fn rows_from_different_devices_share_one_header() {
    let healthy = report_for(&every_five_minutes(2016).collect::<Vec<_>>());
    let extra = ReportRow::new().with("Device name", "Spare").with("Note", "in storage");

    let rows = vec![healthy.to_row(), extra];
    let rendered = render_spreadsheet(&rows, "\t");
    let lines: Vec<&str> = rendered.split('\n').collect();

    assert!(lines[0].ends_with("\tStatus\tNote"));
    let columns = lines[0].split('\t').count();
    assert!(lines.iter().all(|l| l.split('\t').count() == columns));
    assert!(lines[2].starts_with("Spare\t\t"));
    assert!(lines[2].ends_with("\tin storage"));
}
