/// Remote data source served from a JSON snapshot of the hydrology feed.
///
/// Snapshot shape:
///   { "reports": [WaterLevelReport…], "history": [HistoricalDataPoint…] }
///
/// A snapshot ships with the crate (`data/snapshot.json`); deployments point
/// `snapshot_path` in the config at a fresher export.

use chrono::{Duration, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::WaterLevelRemoteDataSource;
use crate::model::{HistoricalDataPoint, ObservationSpan, WaterLevelError, WaterLevelReport};

const BUNDLED_SNAPSHOT: &str = include_str!("../../data/snapshot.json");

#[derive(Debug, Clone, Deserialize)]
struct Snapshot {
    reports: Vec<WaterLevelReport>,
    #[serde(default)]
    history: Vec<HistoricalDataPoint>,
}

#[derive(Debug, Clone)]
pub struct SnapshotRemoteDataSource {
    snapshot: Snapshot,
    /// Publisher the export was taken from, for logs and diagnostics.
    origin: Option<String>,
}

impl SnapshotRemoteDataSource {
    pub fn from_json(json: &str) -> Result<Self, WaterLevelError> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| WaterLevelError::Parse(e.to_string()))?;
        debug!(
            reports = snapshot.reports.len(),
            history = snapshot.history.len(),
            "loaded water level snapshot"
        );
        Ok(Self {
            snapshot,
            origin: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, WaterLevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The snapshot compiled into the crate.
    pub fn bundled() -> Result<Self, WaterLevelError> {
        Self::from_json(BUNDLED_SNAPSHOT)
    }

    pub fn with_origin(mut self, base_url: impl Into<String>) -> Self {
        self.origin = Some(base_url.into());
        self
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl WaterLevelRemoteDataSource for SnapshotRemoteDataSource {
    fn get_water_levels(&self) -> Result<Vec<WaterLevelReport>, WaterLevelError> {
        Ok(self.snapshot.reports.clone())
    }

    /// Points for one station, oldest first, covering `span` measured back
    /// from that station's newest point. Points with unreadable dates are
    /// skipped.
    fn get_historical_data(
        &self,
        station_code: &str,
        span: ObservationSpan,
    ) -> Result<Vec<HistoricalDataPoint>, WaterLevelError> {
        let mut dated: Vec<(NaiveDateTime, &HistoricalDataPoint)> = self
            .snapshot
            .history
            .iter()
            .filter(|p| p.station_code == station_code)
            .filter_map(|p| p.recorded_at().map(|at| (at, p)))
            .collect();

        dated.sort_by_key(|(at, _)| *at);

        let Some(&(newest, _)) = dated.last() else {
            return Err(WaterLevelError::NoDataAvailable(station_code.to_string()));
        };

        if span == ObservationSpan::Latest {
            return Ok(dated.last().map(|(_, p)| (*p).clone()).into_iter().collect());
        }

        let cutoff = newest - Duration::days(span.days() as i64);
        Ok(dated
            .into_iter()
            .filter(|(at, _)| *at >= cutoff)
            .map(|(_, p)| p.clone())
            .collect())
    }
}
