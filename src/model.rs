/// Shared data types for the water-level service.
///
/// Entities mirror what the hydrology feed reports per measuring station.
/// Depth is in centimeters, speed (discharge) in m³/s, temperature in °C.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format of `HistoricalDataPoint::record_date`, e.g. `"04.05.2024 13:30"`.
pub const RECORD_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Latest report for one measuring station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterLevelReport {
    pub waterbody: String,
    pub water_type: String,
    pub station: String,
    pub station_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_string: String,
    pub speed: f64,
    pub depth: f64,
    pub temperature: f64,
    /// Flow characterization published with the report ("srednji pretok", …).
    pub flow: String,
}

/// One historical observation for a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub station_code: String,
    /// `dd.mm.yyyy HH:MM`, local time.
    pub record_date: String,
    pub depth: i64,
    pub speed: f64,
    pub temperature: f64,
}

impl HistoricalDataPoint {
    /// Parses `record_date`. Returns `None` for malformed dates.
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.record_date.trim(), RECORD_DATE_FORMAT).ok()
    }
}

/// Span of time a history request should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObservationSpan {
    /// Only the most recent observation.
    Latest,
    OneDay,
    SevenDays,
    #[default]
    ThirtyDays,
}

impl ObservationSpan {
    pub const ALL: [ObservationSpan; 4] = [
        ObservationSpan::Latest,
        ObservationSpan::OneDay,
        ObservationSpan::SevenDays,
        ObservationSpan::ThirtyDays,
    ];

    pub fn days(self) -> u64 {
        match self {
            ObservationSpan::Latest => 0,
            ObservationSpan::OneDay => 1,
            ObservationSpan::SevenDays => 7,
            ObservationSpan::ThirtyDays => 30,
        }
    }

    pub fn from_days(days: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|span| span.days() == days)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WaterLevelError {
    /// The snapshot or archive could not be decoded.
    #[error("failed to parse water level data: {0}")]
    Parse(String),

    /// The station exists in no report or history series.
    #[error("no data available for station {0}")]
    NoDataAvailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize favorites: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn point(record_date: &str) -> HistoricalDataPoint {
        HistoricalDataPoint {
            station_code: "1060".to_string(),
            record_date: record_date.to_string(),
            depth: 120,
            speed: 3.4,
            temperature: 11.2,
        }
    }

    #[test]
    fn test_recorded_at_parses_day_first_format() {
        let parsed = point("04.05.2024 13:30").recorded_at().expect("should parse");
        assert_eq!(parsed.day(), 4);
        assert_eq!(parsed.month(), 5);
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 13);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_recorded_at_rejects_malformed_date() {
        assert!(point("2024-05-04T13:30").recorded_at().is_none());
        assert!(point("").recorded_at().is_none());
    }

    #[test]
    fn test_span_days_round_trip() {
        for span in ObservationSpan::ALL {
            assert_eq!(ObservationSpan::from_days(span.days()), Some(span));
        }
        assert_eq!(ObservationSpan::from_days(3), None);
    }

    #[test]
    fn test_default_span_is_thirty_days() {
        assert_eq!(ObservationSpan::default(), ObservationSpan::ThirtyDays);
    }
}
