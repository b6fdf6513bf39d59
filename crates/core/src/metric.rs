//! Tracked measurement metrics and their sanity bounds.
//!
//! A reading counts as valid when it is present and passes the metric's
//! [`Bound`]. The same table drives the in-memory calculator and the SQL
//! generated by the database layer.

use std::fmt;

// ---------------------------------------------------------------------------
// Bound
// ---------------------------------------------------------------------------

/// Upper sanity bound for a metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Valid when `value < limit`.
    Below(f64),
    /// Valid when `value <= limit`.
    AtMost(f64),
}

impl Bound {
    /// Whether `value` passes the bound.
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Bound::Below(limit) => value < limit,
            Bound::AtMost(limit) => value <= limit,
        }
    }

    /// SQL predicate applying the bound to `column`.
    ///
    /// `NULL` never satisfies a comparison, so missing readings drop out.
    pub fn sql_predicate(&self, column: &str) -> String {
        match *self {
            Bound::Below(limit) => format!("{column} < {limit}"),
            Bound::AtMost(limit) => format!("{column} <= {limit}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// One of the nine tracked measurement metrics, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Temperature,
    Humidity,
    Rainfall,
    WindDirection,
    WindSpeed,
    GustDirection,
    GustSpeed,
    Pressure,
    Battery,
}

impl Metric {
    pub const COUNT: usize = 9;

    /// Every metric in declaration order. Status messages list offending
    /// metrics in this order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Rainfall,
        Metric::WindDirection,
        Metric::WindSpeed,
        Metric::GustDirection,
        Metric::GustSpeed,
        Metric::Pressure,
        Metric::Battery,
    ];

    /// Position in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bound(self) -> Bound {
        match self {
            Metric::Temperature => Bound::Below(300.0),
            Metric::Humidity => Bound::AtMost(100.0),
            Metric::Rainfall => Bound::Below(300.0),
            Metric::WindDirection => Bound::Below(360.0),
            Metric::WindSpeed => Bound::Below(1000.0),
            Metric::GustDirection => Bound::Below(360.0),
            Metric::GustSpeed => Bound::Below(1000.0),
            Metric::Pressure => Bound::Below(2000.0),
            Metric::Battery => Bound::Below(5000.0),
        }
    }

    /// Column holding this metric in a measurement table.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Rainfall => "rainfall",
            Metric::WindDirection => "wind_direction",
            Metric::WindSpeed => "wind_speed",
            Metric::GustDirection => "gust_direction",
            Metric::GustSpeed => "gust_speed",
            Metric::Pressure => "pressure",
            Metric::Battery => "battery",
        }
    }

    /// Lower-case name used in status messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Rainfall => "rainfall",
            Metric::WindDirection => "wind direction",
            Metric::WindSpeed => "wind speed",
            Metric::GustDirection => "gust direction",
            Metric::GustSpeed => "gust speed",
            Metric::Pressure => "pressure",
            Metric::Battery => "battery level",
        }
    }

    /// Spreadsheet column header.
    pub fn column_header(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Rainfall => "Rainfall",
            Metric::WindDirection => "Wind direction",
            Metric::WindSpeed => "Wind speed",
            Metric::GustDirection => "Gust direction",
            Metric::GustSpeed => "Gust speed",
            Metric::Pressure => "Pressure",
            Metric::Battery => "Battery level",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
