/// sublime_service: river water-level service core for the Sublime app.
///
/// # Module structure
///
/// ```text
/// sublime_service
/// ├── locator      — service registry (eager / lazy / factory registrations)
/// │   ├── registration — Registration builder, strategies, capability table
/// │   ├── parameters   — parameter bundle passed to factories
/// │   └── error        — RegistryError
/// ├── model        — shared data types (WaterLevelReport, HistoricalDataPoint, …)
/// ├── config       — application configuration loader (sublime.toml)
/// ├── bootstrap    — registers data sources, repository and use cases
/// └── water_levels — data source contracts, repository, use cases
///     ├── snapshot  — remote data source backed by a JSON feed export
///     ├── favorites — favorite-station archive
///     ├── directory — station code → name lookup
///     └── use_cases — GetWaterLevels, GetHistoricalData, ToggleFavorite, …
/// ```

/// Public modules
pub mod bootstrap;
pub mod config;
pub mod locator;
pub mod model;
pub mod water_levels;
