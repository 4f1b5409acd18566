/// Use cases resolved by feature code. Each wraps the repository behind one
/// operation so callers never depend on the concrete data sources.

use std::sync::Arc;

use super::WaterLevelRepository;
use crate::model::{HistoricalDataPoint, ObservationSpan, WaterLevelError, WaterLevelReport};

#[derive(Clone)]
pub struct GetWaterLevelsUseCase {
    repo: Arc<dyn WaterLevelRepository>,
}

impl GetWaterLevelsUseCase {
    pub fn new(repo: Arc<dyn WaterLevelRepository>) -> Self {
        Self { repo }
    }

    pub fn execute(&self) -> Result<Vec<WaterLevelReport>, WaterLevelError> {
        self.repo.get_water_levels()
    }

    pub fn repository(&self) -> &Arc<dyn WaterLevelRepository> {
        &self.repo
    }
}

/// History for one station. The span defaults to `default_span` when the
/// caller does not pick one.
#[derive(Clone)]
pub struct GetHistoricalDataUseCase {
    repo: Arc<dyn WaterLevelRepository>,
    default_span: ObservationSpan,
}

impl GetHistoricalDataUseCase {
    pub fn with_default_span(repo: Arc<dyn WaterLevelRepository>, default_span: ObservationSpan) -> Self {
        Self { repo, default_span }
    }

    pub fn default_span(&self) -> ObservationSpan {
        self.default_span
    }

    pub fn execute(
        &self,
        span: Option<ObservationSpan>,
        station_code: &str,
    ) -> Result<Vec<HistoricalDataPoint>, WaterLevelError> {
        self.repo
            .get_historical_data(station_code, span.unwrap_or(self.default_span))
    }
}

#[derive(Clone)]
pub struct ToggleFavoriteStationUseCase {
    repo: Arc<dyn WaterLevelRepository>,
}

impl ToggleFavoriteStationUseCase {
    pub fn new(repo: Arc<dyn WaterLevelRepository>) -> Self {
        Self { repo }
    }

    /// Returns whether the station is a favorite after toggling.
    pub fn execute(&self, station_code: &str) -> Result<bool, WaterLevelError> {
        self.repo.toggle_station_favorite(station_code)
    }
}

#[derive(Clone)]
pub struct GetFavoriteStatusUseCase {
    repo: Arc<dyn WaterLevelRepository>,
}

impl GetFavoriteStatusUseCase {
    pub fn new(repo: Arc<dyn WaterLevelRepository>) -> Self {
        Self { repo }
    }

    pub fn execute(&self, station_code: &str) -> Result<bool, WaterLevelError> {
        self.repo.get_favorite_status(station_code)
    }

    pub fn favorites(&self) -> Result<Vec<String>, WaterLevelError> {
        self.repo.get_favorites()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water_levels::WaterLevelRepositoryImpl;
    use crate::water_levels::favorites::FavoritesStore;
    use crate::water_levels::snapshot::SnapshotRemoteDataSource;

    fn repo() -> Arc<dyn WaterLevelRepository> {
        Arc::new(WaterLevelRepositoryImpl::new(
            Arc::new(SnapshotRemoteDataSource::bundled().unwrap()),
            Arc::new(FavoritesStore::in_memory()),
        ))
    }

    #[test]
    fn test_historical_data_uses_default_span() {
        let use_case = GetHistoricalDataUseCase::with_default_span(repo(), ObservationSpan::Latest);
        let points = use_case.execute(None, "3250").unwrap();
        assert_eq!(points.len(), 1, "default Latest span should return one point");

        let points = use_case.execute(Some(ObservationSpan::ThirtyDays), "3250").unwrap();
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn test_toggle_and_status_share_repository() {
        let shared = repo();
        let toggle = ToggleFavoriteStationUseCase::new(Arc::clone(&shared));
        let status = GetFavoriteStatusUseCase::new(shared);

        assert!(toggle.execute("1060").unwrap());
        assert!(status.execute("1060").unwrap());
        assert_eq!(status.favorites().unwrap(), vec!["1060"]);
    }

    #[test]
    fn test_get_water_levels() {
        let reports = GetWaterLevelsUseCase::new(repo()).execute().unwrap();
        assert!(reports.iter().any(|r| r.waterbody == "Soča"));
    }
}
