/// Water-level data layer: data source contracts, the repository that
/// composes them, and the use cases screens resolve from the registry.
///
/// Submodules:
/// - `snapshot`  - remote data source backed by a JSON snapshot of the feed
/// - `favorites` - local favorite-station store persisted as JSON
/// - `directory` - station code → name lookup built from the latest reports
/// - `use_cases` - one struct per user-facing operation

use std::sync::Arc;

pub mod directory;
pub mod favorites;
pub mod snapshot;
pub mod use_cases;

use crate::model::{HistoricalDataPoint, ObservationSpan, WaterLevelError, WaterLevelReport};

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Source of published measurements.
pub trait WaterLevelRemoteDataSource: Send + Sync {
    fn get_water_levels(&self) -> Result<Vec<WaterLevelReport>, WaterLevelError>;

    fn get_historical_data(
        &self,
        station_code: &str,
        span: ObservationSpan,
    ) -> Result<Vec<HistoricalDataPoint>, WaterLevelError>;
}

/// On-device favorite stations.
pub trait WaterLevelLocalDataSource: Send + Sync {
    /// Adds or removes a station. Returns whether it is a favorite afterwards.
    fn toggle_station_favorite(&self, station_code: &str) -> Result<bool, WaterLevelError>;

    fn get_favorite_status(&self, station_code: &str) -> bool;

    /// Favorite station codes, sorted.
    fn get_favorites(&self) -> Vec<String>;
}

pub trait WaterLevelRepository: Send + Sync {
    fn get_water_levels(&self) -> Result<Vec<WaterLevelReport>, WaterLevelError>;

    fn get_historical_data(
        &self,
        station_code: &str,
        span: ObservationSpan,
    ) -> Result<Vec<HistoricalDataPoint>, WaterLevelError>;

    fn toggle_station_favorite(&self, station_code: &str) -> Result<bool, WaterLevelError>;

    fn get_favorite_status(&self, station_code: &str) -> Result<bool, WaterLevelError>;

    fn get_favorites(&self) -> Result<Vec<String>, WaterLevelError>;
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

pub struct WaterLevelRepositoryImpl {
    remote: Arc<dyn WaterLevelRemoteDataSource>,
    local: Arc<dyn WaterLevelLocalDataSource>,
}

impl WaterLevelRepositoryImpl {
    pub fn new(
        remote: Arc<dyn WaterLevelRemoteDataSource>,
        local: Arc<dyn WaterLevelLocalDataSource>,
    ) -> Self {
        Self { remote, local }
    }
}

impl WaterLevelRepository for WaterLevelRepositoryImpl {
    fn get_water_levels(&self) -> Result<Vec<WaterLevelReport>, WaterLevelError> {
        self.remote.get_water_levels()
    }

    fn get_historical_data(
        &self,
        station_code: &str,
        span: ObservationSpan,
    ) -> Result<Vec<HistoricalDataPoint>, WaterLevelError> {
        self.remote.get_historical_data(station_code, span)
    }

    fn toggle_station_favorite(&self, station_code: &str) -> Result<bool, WaterLevelError> {
        self.local.toggle_station_favorite(station_code)
    }

    fn get_favorite_status(&self, station_code: &str) -> Result<bool, WaterLevelError> {
        Ok(self.local.get_favorite_status(station_code))
    }

    fn get_favorites(&self) -> Result<Vec<String>, WaterLevelError> {
        Ok(self.local.get_favorites())
    }
}
