/// Application bootstrap: wires data sources, the repository and use cases
/// into a `ServiceRegistry`.
///
/// Runs once at startup, before any feature code resolves anything:
/// 1. Loads the remote snapshot and favorites archive (eager)
/// 2. Builds the repository from them (eager)
/// 3. Defers the station directory until first use (lazy)
/// 4. Registers one factory per use case, each resolving the repository
///
/// Any registration error aborts the bootstrap; the registry is then only
/// partially populated and should be discarded.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::locator::{Parameters, Registration, RegistryError, ServiceRegistry};
use crate::model::{ObservationSpan, WaterLevelError};
use crate::water_levels::directory::StationDirectory;
use crate::water_levels::favorites::FavoritesStore;
use crate::water_levels::snapshot::SnapshotRemoteDataSource;
use crate::water_levels::use_cases::{
    GetFavoriteStatusUseCase, GetHistoricalDataUseCase, GetWaterLevelsUseCase,
    ToggleFavoriteStationUseCase,
};
use crate::water_levels::{
    WaterLevelLocalDataSource, WaterLevelRemoteDataSource, WaterLevelRepository,
    WaterLevelRepositoryImpl,
};

/// Parameter read by the `GetHistoricalDataUseCase` factory to override the
/// configured default span.
pub const PARAM_SPAN_DAYS: &str = "span_days";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to load water level snapshot: {0}")]
    Snapshot(#[from] WaterLevelError),

    #[error("default_span_days must be 0, 1, 7 or 30, got {0}")]
    InvalidSpan(u64),
}

// ---------------------------------------------------------------------------
// Dependency Injector
// ---------------------------------------------------------------------------

pub struct DependencyInjector {
    config: AppConfig,
}

impl DependencyInjector {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Registers every service the application resolves.
    pub fn bootstrap(&self, registry: &ServiceRegistry) -> Result<(), BootstrapError> {
        let default_span = ObservationSpan::from_days(self.config.default_span_days)
            .ok_or(BootstrapError::InvalidSpan(self.config.default_span_days))?;

        self.register_data(registry)?;
        register_use_cases(registry, default_span)?;

        info!(
            environment = ?self.config.environment,
            origin = %self.config.base_url,
            services = registry.len(),
            "service registry bootstrapped"
        );
        Ok(())
    }

    fn register_data(&self, registry: &ServiceRegistry) -> Result<(), BootstrapError> {
        let remote = match &self.config.snapshot_path {
            Some(path) => SnapshotRemoteDataSource::from_path(path)?,
            None => SnapshotRemoteDataSource::bundled()?,
        };
        let remote = Arc::new(remote.with_origin(self.config.base_url.as_str()));
        registry.register(
            Registration::instance(remote).provides(|r: &Arc<SnapshotRemoteDataSource>| {
                Arc::clone(r) as Arc<dyn WaterLevelRemoteDataSource>
            }),
        )?;

        let local = Arc::new(FavoritesStore::open_or_empty(
            self.config.favorites_path.as_deref(),
        ));
        registry.register(Registration::instance(local).provides(
            |l: &Arc<FavoritesStore>| Arc::clone(l) as Arc<dyn WaterLevelLocalDataSource>,
        ))?;

        let repo = Arc::new(WaterLevelRepositoryImpl::new(
            registry.resolve_type::<Arc<dyn WaterLevelRemoteDataSource>>()?,
            registry.resolve_type::<Arc<dyn WaterLevelLocalDataSource>>()?,
        ));
        registry.register(Registration::instance(repo).provides(
            |r: &Arc<WaterLevelRepositoryImpl>| Arc::clone(r) as Arc<dyn WaterLevelRepository>,
        ))?;

        let repo: Arc<dyn WaterLevelRepository> = registry.resolve_type()?;
        registry.register_lazy(move || Arc::new(StationDirectory::load(&repo)), None)?;

        Ok(())
    }
}

fn register_use_cases(
    registry: &ServiceRegistry,
    default_span: ObservationSpan,
) -> Result<(), RegistryError> {
    registry.register_factory(
        |registry, _| Ok(GetWaterLevelsUseCase::new(registry.resolve_type()?)),
        None,
    )?;

    registry.register_factory(
        move |registry, parameters| {
            let span = span_parameter(parameters)?.unwrap_or(default_span);
            Ok(GetHistoricalDataUseCase::with_default_span(
                registry.resolve_type()?,
                span,
            ))
        },
        None,
    )?;

    registry.register_factory(
        |registry, _| Ok(ToggleFavoriteStationUseCase::new(registry.resolve_type()?)),
        None,
    )?;

    registry.register_factory(
        |registry, _| Ok(GetFavoriteStatusUseCase::new(registry.resolve_type()?)),
        None,
    )?;

    Ok(())
}

/// Reads `span_days` when present. A present but unusable value is an error
/// rather than a silent fallback to the default.
fn span_parameter(parameters: Option<&Parameters>) -> Result<Option<ObservationSpan>, RegistryError> {
    let Some(value) = parameters.and_then(|p| p.get(PARAM_SPAN_DAYS)) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(ObservationSpan::from_days)
        .map(Some)
        .ok_or_else(|| RegistryError::InsufficientParameters {
            reason: format!("'{}' must be one of 0, 1, 7, 30; got {}", PARAM_SPAN_DAYS, value),
        })
}
