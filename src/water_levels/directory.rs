/// Station directory: station code → display name, built once from the
/// latest reports. Registered as a lazy singleton.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::WaterLevelRepository;
use crate::model::WaterLevelReport;

#[derive(Debug, Clone, PartialEq)]
pub struct StationEntry {
    pub station: String,
    pub waterbody: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl StationEntry {
    /// "Sava (Litija)" style label, or just the station for unnamed waters.
    pub fn label(&self) -> String {
        if self.waterbody.is_empty() {
            self.station.clone()
        } else {
            format!("{} ({})", self.waterbody, self.station)
        }
    }
}

#[derive(Debug, Default)]
pub struct StationDirectory {
    stations: HashMap<String, StationEntry>,
}

impl StationDirectory {
    pub fn from_reports(reports: &[WaterLevelReport]) -> Self {
        let stations = reports
            .iter()
            .map(|r| {
                (
                    r.station_code.clone(),
                    StationEntry {
                        station: r.station.clone(),
                        waterbody: r.waterbody.clone(),
                        latitude: r.latitude,
                        longitude: r.longitude,
                    },
                )
            })
            .collect();
        Self { stations }
    }

    /// Builds from the repository. A failed fetch yields an empty directory;
    /// lookups then fall back to bare station codes.
    pub fn load(repo: &Arc<dyn WaterLevelRepository>) -> Self {
        match repo.get_water_levels() {
            Ok(reports) => Self::from_reports(&reports),
            Err(e) => {
                warn!(error = %e, "station directory unavailable");
                Self::default()
            }
        }
    }

    pub fn get(&self, station_code: &str) -> Option<&StationEntry> {
        self.stations.get(station_code)
    }

    /// Label for a code, or the code itself when unknown.
    pub fn label_for(&self, station_code: &str) -> String {
        self.get(station_code)
            .map(StationEntry::label)
            .unwrap_or_else(|| station_code.to_string())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
