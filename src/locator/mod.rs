/// Service registry: binds implementations to identifiers or types once at
/// bootstrap, and hands them out to any number of call sites afterwards.
///
/// ## Keys
///
/// Every registration lives under one key: the caller's identifier if one
/// was given, otherwise `std::any::type_name` of the declared type. A key can
/// be registered once; a second attempt fails with `DuplicateRegistration`
/// and leaves the first registration untouched.
///
/// ## Resolution order
///
/// 1. An identifier that names a registration is authoritative.
/// 2. Otherwise the registration keyed by the requested type's name.
/// 3. Otherwise the capability table: every registration advertises its
///    declared type plus whatever it declared with `Registration::provides`.
///    One provider resolves; several are reported as `AmbiguousResolution`
///    instead of picking one arbitrarily.
///
/// ## Strategies
///
/// - eager: the stored value is cloned out.
/// - lazy: the constructor runs on first resolution, then the registration
///   becomes eager holding that value.
/// - factory: the constructor runs on every resolution with the caller's
///   parameters. Its errors propagate unchanged.
///
/// ## Locking
///
/// One mutex guards the key map. It is held only while looking up or
/// writing entries, never while a constructor runs, so factories may resolve
/// other services from inside their constructor.

use parking_lot::Mutex;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub mod error;
pub mod parameters;
pub mod registration;

pub use error::RegistryError;
pub use parameters::Parameters;
pub use registration::{Registration, StrategyKind};

use registration::{Capability, Entry, Instance, LazySlot, Strategy};

// ---------------------------------------------------------------------------
// Registry State
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, Entry>,
    /// Capability table: type → keys of registrations that can produce it.
    providers: HashMap<TypeId, Vec<String>>,
}

/// What a resolution needs once the lock has been released.
struct Target {
    key: String,
    declared: TypeId,
    strategy: Strategy,
    capabilities: Arc<HashMap<TypeId, Capability>>,
}

impl Target {
    fn can_produce<T: 'static>(&self) -> bool {
        let wanted = TypeId::of::<T>();
        self.declared == wanted || self.capabilities.contains_key(&wanted)
    }
}

impl RegistryState {
    fn target(&self, key: &str) -> Option<Target> {
        self.entries.get(key).map(|entry| Target {
            key: key.to_string(),
            declared: entry.declared,
            strategy: entry.strategy.clone(),
            capabilities: Arc::clone(&entry.capabilities),
        })
    }

    fn locate<T: 'static>(&self, identifier: Option<&str>) -> Result<Target, RegistryError> {
        if let Some(target) = identifier.and_then(|id| self.target(id)) {
            return Ok(target);
        }

        let wanted = TypeId::of::<T>();
        let by_type = type_name::<T>();
        if self.entries.get(by_type).is_some_and(|entry| entry.declared == wanted) {
            return self.target(by_type).ok_or_else(|| not_found::<T>(identifier));
        }

        match self.providers.get(&wanted).map(Vec::as_slice) {
            Some([key]) => self.target(key).ok_or_else(|| not_found::<T>(identifier)),
            Some(keys) if keys.len() > 1 => {
                let mut candidates = keys.to_vec();
                candidates.sort();
                Err(RegistryError::AmbiguousResolution {
                    type_name: type_name::<T>(),
                    candidates,
                })
            }
            _ => Err(not_found::<T>(identifier)),
        }
    }
}

fn not_found<T>(identifier: Option<&str>) -> RegistryError {
    RegistryError::NotFound {
        type_name: type_name::<T>(),
        identifier: identifier.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

/// Shared handle to a registry. Clones see the same registrations;
/// `ServiceRegistry::new()` always starts an independent, empty one.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    state: Arc<Mutex<RegistryState>>,
}

/// One row of `ServiceRegistry::describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub key: String,
    pub type_name: &'static str,
    pub strategy: StrategyKind,
    pub capabilities: Vec<&'static str>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a registration under its derived key.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        registration: Registration<T>,
    ) -> Result<(), RegistryError> {
        let (key, entry) = registration.into_entry();
        let mut state = self.state.lock();

        if state.entries.contains_key(&key) {
            warn!(key = %key, "rejected duplicate service registration");
            return Err(RegistryError::DuplicateRegistration { key });
        }

        let strategy = entry.strategy.kind();
        let provided = std::iter::once(entry.declared).chain(entry.capabilities.keys().copied());
        for type_id in provided {
            let keys = state.providers.entry(type_id).or_default();
            if !keys.contains(&key) {
                keys.push(key.clone());
            }
        }
        state.entries.insert(key.clone(), entry);

        debug!(key = %key, %strategy, "registered service");
        Ok(())
    }

    /// Registers an already constructed value.
    pub fn register_instance<T: Send + Sync + 'static>(
        &self,
        instance: T,
        identifier: Option<&str>,
    ) -> Result<(), RegistryError> {
        self.register(with_identifier(Registration::instance(instance), identifier))
    }

    /// Registers a singleton constructed on first resolution.
    pub fn register_lazy<T, F>(
        &self,
        constructor: F,
        identifier: Option<&str>,
    ) -> Result<(), RegistryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(with_identifier(Registration::lazy(constructor), identifier))
    }

    /// Registers a constructor invoked on every resolution.
    pub fn register_factory<T, F>(
        &self,
        constructor: F,
        identifier: Option<&str>,
    ) -> Result<(), RegistryError>
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceRegistry, Option<&Parameters>) -> Result<T, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.register(with_identifier(Registration::factory(constructor), identifier))
    }

    /// Resolves a `T`, by identifier first and by type second.
    pub fn resolve<T>(
        &self,
        identifier: Option<&str>,
        parameters: Option<&Parameters>,
    ) -> Result<T, RegistryError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let located = self.state.lock().locate::<T>(identifier);
        let target = located.inspect_err(|err| {
            warn!(type_name = type_name::<T>(), identifier, error = %err, "service resolution failed");
        })?;

        trace!(key = %target.key, strategy = %target.strategy.kind(), "resolving service");

        // No constructor runs for a type the entry cannot produce.
        if !target.can_produce::<T>() {
            let err = RegistryError::TypeMismatch {
                key: target.key.clone(),
                expected: type_name::<T>(),
            };
            warn!(key = %target.key, error = %err, "service resolution failed");
            return Err(err);
        }

        let instance = match &target.strategy {
            Strategy::Eager(instance) => Arc::clone(instance),
            Strategy::Lazy(slot) => {
                let instance = slot.force();
                self.collapse(&target.key, slot, &instance);
                instance
            }
            Strategy::Factory(factory) => factory(self, parameters)?,
        };

        produce::<T>(&target, &instance)
    }

    /// Resolves by type only, without parameters.
    pub fn resolve_type<T>(&self) -> Result<T, RegistryError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve(None, None)
    }

    /// Resolves by identifier, without parameters.
    pub fn resolve_named<T>(&self, identifier: &str) -> Result<T, RegistryError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.resolve(Some(identifier), None)
    }

    /// Replaces a lazy registration with the instance its slot produced.
    /// A no-op if another resolver already did it.
    fn collapse(&self, key: &str, slot: &Arc<LazySlot>, instance: &Instance) {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        if let Strategy::Lazy(current) = &entry.strategy {
            if Arc::ptr_eq(current, slot) {
                entry.strategy = Strategy::Eager(Arc::clone(instance));
                debug!(key = %key, "lazy singleton constructed");
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Current strategy of the registration under `key`.
    pub fn strategy_of(&self, key: &str) -> Option<StrategyKind> {
        self.state.lock().entries.get(key).map(|entry| entry.strategy.kind())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of every registration, sorted by key.
    pub fn describe(&self) -> Vec<RegistrationInfo> {
        let state = self.state.lock();
        let mut rows: Vec<RegistrationInfo> = state
            .entries
            .iter()
            .map(|(key, entry)| {
                let mut capabilities: Vec<&'static str> =
                    entry.capabilities.values().map(|c| c.type_name).collect();
                capabilities.sort();
                RegistrationInfo {
                    key: key.clone(),
                    type_name: entry.type_name,
                    strategy: entry.strategy.kind(),
                    capabilities,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}

fn with_identifier<T: Send + Sync + 'static>(
    registration: Registration<T>,
    identifier: Option<&str>,
) -> Registration<T> {
    match identifier {
        Some(id) => registration.named(id),
        None => registration,
    }
}

/// Turns a type-erased instance into the requested `T`, either directly or
/// through a declared capability.
fn produce<T: Clone + 'static>(target: &Target, instance: &Instance) -> Result<T, RegistryError> {
    let wanted = TypeId::of::<T>();

    if target.declared == wanted {
        if let Some(value) = instance.downcast_ref::<T>() {
            return Ok(value.clone());
        }
    }

    target
        .capabilities
        .get(&wanted)
        .and_then(|capability| capability.project::<T>(instance))
        .ok_or_else(|| RegistryError::TypeMismatch {
            key: target.key.clone(),
            expected: type_name::<T>(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Gauge: Send + Sync {
        fn stage_cm(&self) -> u32;
    }

    #[derive(Debug, PartialEq)]
    struct StaffGauge {
        stage_cm: u32,
    }

    impl Gauge for StaffGauge {
        fn stage_cm(&self) -> u32 {
            self.stage_cm
        }
    }

    #[test]
    fn test_register_and_resolve_instance() {
        let registry = ServiceRegistry::new();
        let gauge = Arc::new(StaffGauge { stage_cm: 183 });
        registry.register_instance(Arc::clone(&gauge), None).unwrap();

        let resolved: Arc<StaffGauge> = registry.resolve_type().unwrap();
        assert!(Arc::ptr_eq(&gauge, &resolved), "eager instance should be returned as-is");
    }

    #[test]
    fn test_duplicate_type_registration_is_rejected() {
        let registry = ServiceRegistry::new();
        registry.register_instance(1u32, None).unwrap();

        let result = registry.register_instance(2u32, None);
        assert!(
            matches!(result, Err(RegistryError::DuplicateRegistration { ref key }) if key == "u32"),
            "second registration of u32 should fail, got {:?}",
            result
        );
        assert_eq!(registry.resolve_type::<u32>().unwrap(), 1, "first value must survive");
    }

    #[test]
    fn test_duplicate_identifier_across_strategies_is_rejected() {
        let registry = ServiceRegistry::new();
        registry.register_instance(1u32, Some("level")).unwrap();

        let result = registry.register_factory(|_, _| Ok(2u64), Some("level"));
        assert!(matches!(result, Err(RegistryError::DuplicateRegistration { .. })));
        assert_eq!(registry.strategy_of("level"), Some(StrategyKind::Eager));
    }

    #[test]
    fn test_identifier_takes_precedence_over_type() {
        let registry = ServiceRegistry::new();
        registry.register_instance(String::from("named"), Some("A")).unwrap();
        registry.register_instance(String::from("plain"), None).unwrap();

        assert_eq!(registry.resolve_named::<String>("A").unwrap(), "named");
        assert_eq!(registry.resolve_type::<String>().unwrap(), "plain");
    }

    #[test]
    fn test_unknown_identifier_falls_back_to_type() {
        let registry = ServiceRegistry::new();
        registry.register_instance(7u8, None).unwrap();

        assert_eq!(registry.resolve_named::<u8>("missing").unwrap(), 7);
    }

    #[test]
    fn test_identifier_hit_with_wrong_type_is_type_mismatch() {
        let registry = ServiceRegistry::new();
        registry.register_instance(7u8, Some("seven")).unwrap();

        let result = registry.resolve_named::<String>("seven");
        assert!(
            matches!(result, Err(RegistryError::TypeMismatch { ref key, .. }) if key == "seven"),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_type_mismatch_does_not_force_lazy_constructor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ServiceRegistry::new();
        registry
            .register_lazy(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    7u8
                },
                Some("seven"),
            )
            .unwrap();

        let result = registry.resolve_named::<String>("seven");
        assert!(matches!(result, Err(RegistryError::TypeMismatch { .. })), "got {:?}", result);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "constructor must not run on a mismatch");
        assert_eq!(registry.strategy_of("seven"), Some(StrategyKind::Lazy));

        assert_eq!(registry.resolve_named::<u8>("seven").unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_type_mismatch_does_not_run_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ServiceRegistry::new();
        registry
            .register_factory(
                move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(7u8)
                },
                Some("seven"),
            )
            .unwrap();

        let result = registry.resolve_named::<String>("seven");
        assert!(matches!(result, Err(RegistryError::TypeMismatch { .. })), "got {:?}", result);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_identifier_registration_is_found_by_type() {
        let registry = ServiceRegistry::new();
        registry.register_instance(3.5f64, Some("depth")).unwrap();

        assert_eq!(registry.resolve_type::<f64>().unwrap(), 3.5);
    }

    #[test]
    fn test_resolve_through_capability() {
        let registry = ServiceRegistry::new();
        let gauge = Arc::new(StaffGauge { stage_cm: 90 });
        registry
            .register(
                Registration::instance(Arc::clone(&gauge))
                    .provides(|g: &Arc<StaffGauge>| Arc::clone(g) as Arc<dyn Gauge>),
            )
            .unwrap();

        let as_trait: Arc<dyn Gauge> = registry.resolve_type().unwrap();
        assert_eq!(as_trait.stage_cm(), 90);

        let concrete: Arc<StaffGauge> = registry.resolve_type().unwrap();
        assert!(Arc::ptr_eq(&gauge, &concrete));
    }

    #[test]
    fn test_multiple_capability_providers_are_ambiguous() {
        let registry = ServiceRegistry::new();
        for (id, stage_cm) in [("upstream", 10), ("downstream", 20)] {
            registry
                .register(
                    Registration::instance(Arc::new(StaffGauge { stage_cm }))
                        .named(id)
                        .provides(|g: &Arc<StaffGauge>| Arc::clone(g) as Arc<dyn Gauge>),
                )
                .unwrap();
        }

        let result = registry.resolve_type::<Arc<dyn Gauge>>();
        match result {
            Err(RegistryError::AmbiguousResolution { candidates, .. }) => {
                assert_eq!(candidates, vec!["downstream".to_string(), "upstream".to_string()]);
            }
            other => panic!("expected AmbiguousResolution, got {:?}", other.map(|g| g.stage_cm())),
        }

        let upstream: Arc<dyn Gauge> = registry.resolve_named("upstream").unwrap();
        assert_eq!(upstream.stage_cm(), 10);
    }

    #[test]
    fn test_lazy_constructs_once_and_collapses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ServiceRegistry::new();
        registry
            .register_lazy(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Arc::new(StaffGauge { stage_cm: 5 })
                },
                Some("gauge"),
            )
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0, "constructor must not run at registration");
        assert_eq!(registry.strategy_of("gauge"), Some(StrategyKind::Lazy));

        let first: Arc<StaffGauge> = registry.resolve_named("gauge").unwrap();
        let second: Arc<StaffGauge> = registry.resolve_named("gauge").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.strategy_of("gauge"), Some(StrategyKind::Eager));
    }

    #[test]
    fn test_factory_runs_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ServiceRegistry::new();
        registry
            .register_factory(
                move |_, _| Ok(counter.fetch_add(1, Ordering::SeqCst)),
                None,
            )
            .unwrap();

        let values: Vec<usize> = (0..3).map(|_| registry.resolve_type().unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            registry.strategy_of(type_name::<usize>()),
            Some(StrategyKind::Factory),
            "factories are never memoized"
        );
    }

    #[test]
    fn test_factory_receives_parameters() {
        let registry = ServiceRegistry::new();
        registry
            .register_factory(
                |_, params| {
                    let params = params.ok_or_else(|| RegistryError::InsufficientParameters {
                        reason: "parameters required".to_string(),
                    })?;
                    Ok(params.require_str("station_code")?.to_string())
                },
                Some("code"),
            )
            .unwrap();

        let params = Parameters::new().with("station_code", "1060");
        let code: String = registry.resolve(Some("code"), Some(&params)).unwrap();
        assert_eq!(code, "1060");

        let missing = registry.resolve_named::<String>("code");
        assert!(matches!(missing, Err(RegistryError::InsufficientParameters { .. })));
    }

    #[test]
    fn test_miss_is_not_found_and_leaves_registry_unchanged() {
        let registry = ServiceRegistry::new();
        registry.register_instance(1u32, None).unwrap();

        let result = registry.resolve_type::<String>();
        assert!(
            matches!(result, Err(RegistryError::NotFound { identifier: None, .. })),
            "got {:?}",
            result
        );
        assert_eq!(registry.keys(), vec!["u32".to_string()]);
    }

    #[test]
    fn test_describe_lists_capabilities() {
        let registry = ServiceRegistry::new();
        registry
            .register(
                Registration::lazy(|| Arc::new(StaffGauge { stage_cm: 1 }))
                    .named("gauge")
                    .provides(|g: &Arc<StaffGauge>| Arc::clone(g) as Arc<dyn Gauge>),
            )
            .unwrap();

        let rows = registry.describe();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "gauge");
        assert_eq!(rows[0].strategy, StrategyKind::Lazy);
        assert_eq!(rows[0].capabilities.len(), 1);
        assert!(rows[0].capabilities[0].contains("Gauge"));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ServiceRegistry::new();
        let handle = registry.clone();
        handle.register_instance(9i64, None).unwrap();

        assert!(registry.contains_key("i64"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
