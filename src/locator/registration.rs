/// Registration records: how a service is built and what it can be resolved as.
///
/// A `Registration<T>` is assembled by bootstrap code and handed to
/// `ServiceRegistry::register`. Inside the registry it is stored type-erased
/// as an `Entry`, whose `Strategy` is the only part allowed to change after
/// insertion (lazy → eager, once).

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use super::ServiceRegistry;
use super::error::RegistryError;
use super::parameters::Parameters;

// ---------------------------------------------------------------------------
// Type-erased building blocks
// ---------------------------------------------------------------------------

/// A constructed service value. Always holds exactly the declared type `T`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type LazyInit = Box<dyn Fn() -> Instance + Send + Sync>;

pub(crate) type FactoryFn = dyn Fn(&ServiceRegistry, Option<&Parameters>) -> Result<Instance, RegistryError>
    + Send
    + Sync;

type ProjectionFn = dyn Fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any>> + Send + Sync;

/// Deferred constructor for a lazy singleton.
///
/// `OnceLock` serializes concurrent first resolutions: the constructor runs
/// once and every racer receives the same instance. A constructor that
/// resolves its own key is a dependency cycle and blocks forever.
pub(crate) struct LazySlot {
    init: LazyInit,
    cell: OnceLock<Instance>,
}

impl LazySlot {
    pub(crate) fn force(&self) -> Instance {
        self.cell.get_or_init(|| (self.init)()).clone()
    }
}

/// Construction strategy of a stored registration.
#[derive(Clone)]
pub(crate) enum Strategy {
    Eager(Instance),
    Lazy(Arc<LazySlot>),
    Factory(Arc<FactoryFn>),
}

impl Strategy {
    pub(crate) fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Eager(_) => StrategyKind::Eager,
            Strategy::Lazy(_) => StrategyKind::Lazy,
            Strategy::Factory(_) => StrategyKind::Factory,
        }
    }
}

/// Public view of a registration's current strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Eager,
    Lazy,
    Factory,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Eager => "eager",
            StrategyKind::Lazy => "lazy",
            StrategyKind::Factory => "factory",
        };
        f.pad(label)
    }
}

/// Projection from the declared type to one capability type.
pub(crate) struct Capability {
    pub(crate) type_name: &'static str,
    project: Box<ProjectionFn>,
}

impl Capability {
    pub(crate) fn project<C: 'static>(&self, instance: &Instance) -> Option<C> {
        (self.project)(&**instance)
            .and_then(|boxed| boxed.downcast::<C>().ok())
            .map(|boxed| *boxed)
    }
}

/// A registration as stored in the registry.
pub(crate) struct Entry {
    pub(crate) declared: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) strategy: Strategy,
    pub(crate) capabilities: Arc<HashMap<TypeId, Capability>>,
}

// ---------------------------------------------------------------------------
// Registration builder
// ---------------------------------------------------------------------------

/// A service binding for declared type `T`, ready to be registered.
///
/// ```
/// use std::sync::Arc;
/// use sublime_service::locator::{Registration, ServiceRegistry};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
///
/// let registry = ServiceRegistry::new();
/// registry.register(
///     Registration::instance(Arc::new(English))
///         .provides(|g: &Arc<English>| g.clone() as Arc<dyn Greeter>),
/// ).unwrap();
///
/// let greeter: Arc<dyn Greeter> = registry.resolve_type().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub struct Registration<T> {
    identifier: Option<String>,
    strategy: Strategy,
    capabilities: HashMap<TypeId, Capability>,
    _declared: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Registration<T> {
    fn with_strategy(strategy: Strategy) -> Self {
        Self {
            identifier: None,
            strategy,
            capabilities: HashMap::new(),
            _declared: PhantomData,
        }
    }

    /// An already constructed value.
    pub fn instance(value: T) -> Self {
        Self::with_strategy(Strategy::Eager(Arc::new(value)))
    }

    /// A value built on first resolution and reused afterwards.
    pub fn lazy<F>(constructor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let init: LazyInit = Box::new(move || Arc::new(constructor()) as Instance);
        Self::with_strategy(Strategy::Lazy(Arc::new(LazySlot {
            init,
            cell: OnceLock::new(),
        })))
    }

    /// A value built on every resolution.
    ///
    /// The constructor receives the registry it is resolved from, so it can
    /// resolve its own dependencies without capturing a registry handle.
    pub fn factory<F>(constructor: F) -> Self
    where
        F: Fn(&ServiceRegistry, Option<&Parameters>) -> Result<T, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        let factory: Arc<FactoryFn> =
            Arc::new(move |registry: &ServiceRegistry, parameters: Option<&Parameters>| {
                constructor(registry, parameters).map(|value| Arc::new(value) as Instance)
            });
        Self::with_strategy(Strategy::Factory(factory))
    }

    /// Registers under an explicit identifier instead of the type name.
    pub fn named(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Declares that this registration can also be resolved as `C`.
    pub fn provides<C, F>(mut self, projection: F) -> Self
    where
        C: 'static,
        F: Fn(&T) -> C + Send + Sync + 'static,
    {
        let project: Box<ProjectionFn> = Box::new(move |instance: &(dyn Any + Send + Sync)| {
            instance
                .downcast_ref::<T>()
                .map(|value| Box::new(projection(value)) as Box<dyn Any>)
        });
        self.capabilities.insert(
            TypeId::of::<C>(),
            Capability {
                type_name: type_name::<C>(),
                project,
            },
        );
        self
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Key this registration will be stored under.
    pub fn key(&self) -> String {
        self.identifier
            .clone()
            .unwrap_or_else(|| type_name::<T>().to_string())
    }

    pub(crate) fn into_entry(self) -> (String, Entry) {
        let key = self.key();
        let entry = Entry {
            declared: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            strategy: self.strategy,
            capabilities: Arc::new(self.capabilities),
        };
        (key, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Gauge(u32);

    #[test]
    fn test_key_defaults_to_type_name() {
        let registration = Registration::instance(Gauge(1));
        assert_eq!(registration.key(), type_name::<Gauge>());
        assert!(registration.identifier().is_none());
    }

    #[test]
    fn test_identifier_overrides_type_name_key() {
        let registration = Registration::instance(Gauge(1)).named("kingston");
        assert_eq!(registration.key(), "kingston");
    }

    #[test]
    fn test_lazy_slot_constructs_once() {
        let registration = Registration::lazy(|| Gauge(7));
        let (_, entry) = registration.into_entry();
        let slot = match entry.strategy {
            Strategy::Lazy(slot) => slot,
            _ => panic!("expected lazy strategy"),
        };
        let first = slot.force();
        let second = slot.force();
        assert!(Arc::ptr_eq(&first, &second), "lazy slot should memoize its instance");
    }

    #[test]
    fn test_capability_projection() {
        let registration = Registration::instance(Gauge(42)).provides(|g: &Gauge| g.0);
        let (_, entry) = registration.into_entry();
        let instance = match &entry.strategy {
            Strategy::Eager(instance) => instance.clone(),
            _ => panic!("expected eager strategy"),
        };
        let capability = entry
            .capabilities
            .get(&TypeId::of::<u32>())
            .expect("u32 capability should be declared");
        assert_eq!(capability.project::<u32>(&instance), Some(42));
        assert_eq!(capability.project::<String>(&instance), None);
    }

    #[test]
    fn test_strategy_kind_labels() {
        assert_eq!(StrategyKind::Eager.to_string(), "eager");
        assert_eq!(StrategyKind::Lazy.to_string(), "lazy");
        assert_eq!(StrategyKind::Factory.to_string(), "factory");
    }
}
