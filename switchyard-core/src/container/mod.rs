//! Dependency injection container
//!
//! The container maps string keys to [`Concrete`] producers: a factory
//! closure, a constructible [`Injectable`] type, or a fixed instance. A
//! binding is either transient (built on every resolution) or a singleton
//! (built once and cached for the container's lifetime).
//!
//! # Examples
//!
//! ```
//! use switchyard_core::{Arguments, Concrete, Container, Error, Injectable, Parameter};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! impl Injectable for Database {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::primitive_or("url", "sqlite::memory:")]
//!     }
//!
//!     fn construct(args: &Arguments) -> Result<Self, Error> {
//!         Ok(Self { url: args.value("url")? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.singleton("db", Concrete::of::<Database>());
//!
//! let db = container.resolve::<Database>("db").unwrap();
//! assert_eq!(db.url, "sqlite::memory:");
//! ```
//!
//! The container is cheap to clone; clones share the same bindings. Bindings
//! are meant to be registered at boot, but the maps are guarded so that a
//! rebinding while requests are in flight is still safe.

mod binding;
mod callable;
mod provider;

pub use binding::{
    Argument, Arguments, Concrete, Constructor, Factory, Injectable, Instance, Parameter,
    ParameterKind, key_of,
};
pub use callable::{BoundMethod, Callable};
pub use provider::ServiceProvider;

use crate::Error;
use crate::logging::{debug, trace};
use binding::Binding;
use parking_lot::RwLock;
use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type BeforeHook = Arc<dyn Fn(&Resolver<'_>) + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Instance, &Resolver<'_>) + Send + Sync>;

#[derive(Default)]
struct Hooks {
    before: HashMap<String, Vec<BeforeHook>>,
    after: HashMap<String, Vec<AfterHook>>,
}

#[derive(Default)]
struct Inner {
    bindings: RwLock<HashMap<String, Binding>>,
    instances: RwLock<HashMap<String, Instance>>,
    hooks: RwLock<Hooks>,
    generation: AtomicU64,
}

/// The dependency injection container
#[derive(Clone, Default)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new DI container");
        Self::default()
    }

    /// Register or replace the binding for `key`.
    ///
    /// Any instance cached for `key` is dropped. A fixed instance is cached
    /// right away.
    pub fn bind(&self, key: impl Into<String>, concrete: Concrete, singleton: bool) {
        let key = key.into();
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let kind = concrete.describe();

        let mut bindings = self.inner.bindings.write();
        let mut instances = self.inner.instances.write();
        instances.remove(&key);
        if let Concrete::Instance(instance) = &concrete {
            instances.insert(key.clone(), instance.clone());
        }
        let replaced = bindings
            .insert(
                key.clone(),
                Binding {
                    concrete,
                    singleton,
                    generation,
                },
            )
            .is_some();

        debug!(key = %key, kind, singleton, replaced, "Binding registered");
    }

    /// Register a singleton binding
    pub fn singleton(&self, key: impl Into<String>, concrete: Concrete) {
        self.bind(key, concrete, true);
    }

    /// Register a fixed instance
    pub fn instance<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.bind(key, Concrete::instance(value), true);
    }

    /// Check whether a binding exists for `key`
    pub fn has(&self, key: &str) -> bool {
        self.inner.bindings.read().contains_key(key)
    }

    /// Check whether an instance is currently cached for `key`
    pub fn is_cached(&self, key: &str) -> bool {
        self.inner.instances.read().contains_key(key)
    }

    /// Remove the binding and cached instance for `key`
    pub fn forget(&self, key: &str) -> bool {
        let mut bindings = self.inner.bindings.write();
        let mut instances = self.inner.instances.write();
        instances.remove(key);
        let removed = bindings.remove(key).is_some();
        trace!(key, removed, "Binding forgotten");
        removed
    }

    /// Clear all bindings, cached instances and hooks
    pub fn clear(&self) {
        let mut bindings = self.inner.bindings.write();
        let mut instances = self.inner.instances.write();
        let count = bindings.len();
        bindings.clear();
        instances.clear();
        *self.inner.hooks.write() = Hooks::default();

        debug!(binding_count = count, "Cleared all bindings from container");
    }

    /// Register a callback fired before each fresh construction of `key`.
    ///
    /// The hook runs inside the active resolution, so anything it resolves
    /// through the resolver is subject to circular-dependency detection.
    pub fn resolving<F>(&self, key: impl Into<String>, hook: F)
    where
        F: Fn(&Resolver<'_>) + Send + Sync + 'static,
    {
        self.inner
            .hooks
            .write()
            .before
            .entry(key.into())
            .or_default()
            .push(Arc::new(hook));
    }

    /// Register a callback fired after each fresh construction of `key`
    pub fn after_resolving<F>(&self, key: impl Into<String>, hook: F)
    where
        F: Fn(&Instance, &Resolver<'_>) + Send + Sync + 'static,
    {
        self.inner
            .hooks
            .write()
            .after
            .entry(key.into())
            .or_default()
            .push(Arc::new(hook));
    }

    /// Register a service provider: `register` runs first, then `boot`.
    pub fn register_provider<P: ServiceProvider + ?Sized>(&self, provider: &P) -> Result<(), Error> {
        provider.register(self)?;
        provider.boot(self)?;
        debug!(provider = provider.name(), "Service provider registered");
        Ok(())
    }

    /// Register several providers; every `register` runs before any `boot`.
    pub fn register_providers(&self, providers: &[Box<dyn ServiceProvider>]) -> Result<(), Error> {
        for provider in providers {
            provider.register(self)?;
        }
        for provider in providers {
            provider.boot(self)?;
        }
        debug!(provider_count = providers.len(), "Service providers registered");
        Ok(())
    }

    /// Start a fresh resolution.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver {
            container: self,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Resolve `key` to a type-erased instance.
    pub fn resolve_instance(&self, key: &str, args: &Arguments) -> Result<Instance, Error> {
        self.resolver().resolve_with(key, None, args)
    }

    /// Resolve `key` and downcast it to `T`
    pub fn resolve<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, Error> {
        self.resolver().resolve(key)
    }

    /// Resolve `key` with explicit arguments and downcast it to `T`
    pub fn resolve_with_args<T: Any + Send + Sync>(
        &self,
        key: &str,
        args: &Arguments,
    ) -> Result<Arc<T>, Error> {
        let instance = self.resolver().resolve_with(key, None, args)?;
        downcast(key, instance)
    }

    /// Resolve an [`Injectable`] type by its type name, constructing it
    /// directly when nothing is bound under that key.
    pub fn make<T: Injectable>(&self) -> Result<Arc<T>, Error> {
        self.resolver().make()
    }

    /// Invoke a callable, filling its parameters from `args` first and the
    /// container second.
    pub fn call<R>(&self, callable: &Callable<R>, args: &Arguments) -> Result<R, Error> {
        self.resolver().call(callable, args)
    }

    fn lookup(&self, key: &str) -> Option<Binding> {
        self.inner.bindings.read().get(key).cloned()
    }

    fn cached(&self, key: &str) -> Option<Instance> {
        self.inner.instances.read().get(key).cloned()
    }

    /// Cache a freshly built singleton unless its binding changed meanwhile.
    /// The first stored instance wins.
    fn store(&self, key: &str, generation: u64, instance: Instance) -> Instance {
        let bindings = self.inner.bindings.read();
        let current = bindings.get(key).map(|binding| binding.generation);
        if current != Some(generation) {
            trace!(key, "Binding changed during resolution; instance not cached");
            return instance;
        }

        let mut instances = self.inner.instances.write();
        instances
            .entry(key.to_string())
            .or_insert(instance)
            .clone()
    }

    fn before_hooks(&self, key: &str) -> Vec<BeforeHook> {
        self.inner
            .hooks
            .read()
            .before
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn after_hooks(&self, key: &str) -> Vec<AfterHook> {
        self.inner
            .hooks
            .read()
            .after
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self.inner.bindings.read();
        let mut keys: Vec<&String> = bindings.keys().collect();
        keys.sort();
        f.debug_struct("Container").field("bindings", &keys).finish()
    }
}

/// A single resolution in progress.
///
/// Tracks the keys currently being built so that a binding which depends on
/// itself fails with [`Error::CircularDependency`]. Factories and hooks
/// receive the resolver, so nested resolutions they start are tracked as
/// well. A resolution started through a captured [`Container`] begins a new
/// stack.
pub struct Resolver<'c> {
    container: &'c Container,
    stack: RefCell<Vec<String>>,
}

impl<'c> Resolver<'c> {
    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Resolve `key` and downcast it to `T`
    pub fn resolve<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, Error> {
        let instance = self.resolve_with(key, None, &Arguments::new())?;
        downcast(key, instance)
    }

    /// Resolve `key` to a type-erased instance
    pub fn resolve_instance(&self, key: &str, args: &Arguments) -> Result<Instance, Error> {
        self.resolve_with(key, None, args)
    }

    /// Resolve an [`Injectable`] type by its type name
    pub fn make<T: Injectable>(&self) -> Result<Arc<T>, Error> {
        let key = key_of::<T>();
        let instance = self.resolve_with(key, Some(&Constructor::of::<T>()), &Arguments::new())?;
        downcast(key, instance)
    }

    /// Resolve `key`, building `fallback` if no binding exists.
    pub fn resolve_with(
        &self,
        key: &str,
        fallback: Option<&Constructor>,
        args: &Arguments,
    ) -> Result<Instance, Error> {
        if let Some(instance) = self.container.cached(key) {
            trace!(key, "Resolved cached instance");
            return Ok(instance);
        }

        if self.stack.borrow().iter().any(|entry| entry == key) {
            let mut chain = self.stack.borrow().clone();
            chain.push(key.to_string());
            debug!(chain = ?chain, "Circular dependency detected");
            return Err(Error::CircularDependency { chain });
        }

        self.stack.borrow_mut().push(key.to_string());
        let result = self.build(key, fallback, args);
        self.stack.borrow_mut().pop();
        result
    }

    fn build(
        &self,
        key: &str,
        fallback: Option<&Constructor>,
        args: &Arguments,
    ) -> Result<Instance, Error> {
        let (concrete, singleton, generation) = match self.container.lookup(key) {
            Some(binding) => (binding.concrete, binding.singleton, Some(binding.generation)),
            None => match fallback {
                Some(constructor) => (Concrete::Type(constructor.clone()), false, None),
                None => {
                    debug!(key, "No binding registered");
                    return Err(Error::unresolvable(key, "no binding registered"));
                }
            },
        };

        for hook in self.container.before_hooks(key) {
            hook(self);
        }

        trace!(key, kind = concrete.describe(), singleton, "Building instance");
        let instance = match concrete {
            Concrete::Instance(instance) => instance,
            Concrete::Factory(factory) => factory(self, args)?,
            Concrete::Type(constructor) => {
                let filled =
                    self.arguments_for(&constructor.parameters(), args, constructor.type_name())?;
                constructor.build(&filled)?
            }
        };

        let instance = match (singleton, generation) {
            (true, Some(generation)) => self.container.store(key, generation, instance),
            _ => instance,
        };

        for hook in self.container.after_hooks(key) {
            hook(&instance, self);
        }

        debug!(key, "Resolved instance");
        Ok(instance)
    }

    /// Fill declared parameters in order: an explicit argument with the same
    /// name wins, then a primitive default, then container resolution.
    pub fn arguments_for(
        &self,
        parameters: &[Parameter],
        explicit: &Arguments,
        owner: &str,
    ) -> Result<Arguments, Error> {
        let mut filled = Arguments::new();
        for parameter in parameters {
            if let Some(argument) = explicit.get(&parameter.name) {
                filled.insert(parameter.name.clone(), argument.clone());
                continue;
            }

            let argument = match &parameter.kind {
                ParameterKind::Primitive {
                    default: Some(default),
                } => Argument::Value(default.clone()),
                ParameterKind::Primitive { default: None } => {
                    return Err(Error::unresolvable(
                        owner,
                        format!(
                            "primitive parameter `{}` has no default and no argument was supplied",
                            parameter.name
                        ),
                    ));
                }
                ParameterKind::Service { key, fallback } => Argument::Service(self.resolve_with(
                    key,
                    fallback.as_ref(),
                    &Arguments::new(),
                )?),
            };
            filled.insert(parameter.name.clone(), argument);
        }
        Ok(filled)
    }

    /// Invoke a callable within this resolution
    pub fn call<R>(&self, callable: &Callable<R>, args: &Arguments) -> Result<R, Error> {
        match callable {
            Callable::Function { parameters, func } => {
                let mut filled = self.arguments_for(parameters, args, "function")?;
                filled.merge_missing(args);
                func(&filled)
            }
            Callable::Method(method) => {
                let instance =
                    self.resolve_with(method.type_key(), method.fallback(), &Arguments::new())?;
                let mut filled =
                    self.arguments_for(method.parameters(), args, method.qualified_name().as_str())?;
                filled.merge_missing(args);
                trace!(method = %method.qualified_name(), "Invoking bound method");
                method.invoke(&instance, &filled)
            }
        }
    }
}

fn downcast<T: Any + Send + Sync>(key: &str, instance: Instance) -> Result<Arc<T>, Error> {
    instance.downcast::<T>().map_err(|_| {
        Error::unresolvable(key, format!("bound instance is not a `{}`", type_name::<T>()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Config {
        name: String,
        retries: u32,
    }

    impl Injectable for Config {
        fn parameters() -> Vec<Parameter> {
            vec![
                Parameter::primitive_or("name", "default"),
                Parameter::primitive_or("retries", 3),
            ]
        }

        fn construct(args: &Arguments) -> Result<Self, Error> {
            Ok(Self {
                name: args.value("name")?,
                retries: args.value("retries")?,
            })
        }
    }

    #[derive(Debug)]
    struct Mailer {
        config: Arc<Config>,
    }

    impl Injectable for Mailer {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::service::<Config>("config")]
        }

        fn construct(args: &Arguments) -> Result<Self, Error> {
            Ok(Self {
                config: args.service("config")?,
            })
        }
    }

    #[derive(Debug)]
    struct Secret;

    impl Injectable for Secret {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::primitive("token")]
        }

        fn construct(_args: &Arguments) -> Result<Self, Error> {
            Ok(Secret)
        }
    }

    #[test]
    fn test_singleton_returns_identical_instance() {
        let container = Container::new();
        container.bind("config", Concrete::of::<Config>(), true);

        let first = container.resolve::<Config>("config").unwrap();
        let second = container.resolve::<Config>("config").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(container.is_cached("config"));
    }

    #[test]
    fn test_transient_returns_distinct_instances() {
        let container = Container::new();
        container.bind("config", Concrete::of::<Config>(), false);

        let first = container.resolve::<Config>("config").unwrap();
        let second = container.resolve::<Config>("config").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!container.is_cached("config"));
    }

    #[test]
    fn test_rebinding_invalidates_cached_singleton() {
        let container = Container::new();
        container.singleton("config", Concrete::of::<Config>());
        let first = container.resolve::<Config>("config").unwrap();

        container.singleton(
            "config",
            Concrete::factory(|_, _| {
                Ok(Config {
                    name: "rebound".to_string(),
                    retries: 0,
                })
            }),
        );
        let second = container.resolve::<Config>("config").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.name, "rebound");
    }

    #[test]
    fn test_explicit_args_override_defaults() {
        let container = Container::new();
        container.bind("config", Concrete::of::<Config>(), false);

        let config = container
            .resolve_with_args::<Config>("config", &Arguments::new().with("retries", 9))
            .unwrap();
        assert_eq!(config.name, "default");
        assert_eq!(config.retries, 9);
    }

    #[test]
    fn test_primitive_without_default_is_unresolvable() {
        let container = Container::new();
        container.bind("secret", Concrete::of::<Secret>(), false);

        let err = container.resolve::<Secret>("secret").unwrap_err();
        assert!(matches!(err, Error::UnresolvableDependency { .. }));

        let ok = container.resolve_with_args::<Secret>("secret", &Arguments::new().with("token", "t"));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_missing_binding_is_unresolvable() {
        let container = Container::new();
        let err = container.resolve::<Config>("nope").unwrap_err();
        match err {
            Error::UnresolvableDependency { key, .. } => assert_eq!(key, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_make_autowires_nested_types() {
        let container = Container::new();
        let mailer = container.make::<Mailer>().unwrap();
        assert_eq!(mailer.config.retries, 3);

        // A binding under the type key takes precedence over auto-wiring
        container.instance(
            key_of::<Config>(),
            Config {
                name: "bound".to_string(),
                retries: 1,
            },
        );
        let mailer = container.make::<Mailer>().unwrap();
        assert_eq!(mailer.config.name, "bound");
    }

    #[test]
    fn test_fixed_instance_is_shared() {
        let container = Container::new();
        container.instance("answer", 42u32);

        let a = container.resolve::<u32>("answer").unwrap();
        let b = container.resolve::<u32>("answer").unwrap();
        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_wrong_type_downcast_fails() {
        let container = Container::new();
        container.instance("answer", 42u32);
        assert!(container.resolve::<String>("answer").is_err());
    }

    #[test]
    fn test_circular_dependency_through_factories() {
        let container = Container::new();
        container.bind(
            "a",
            Concrete::factory(|r, _| Ok(r.resolve::<u8>("b")?.wrapping_add(1))),
            false,
        );
        container.bind(
            "b",
            Concrete::factory(|r, _| Ok(r.resolve::<u8>("a")?.wrapping_add(1))),
            false,
        );

        match container.resolve::<u8>("a").unwrap_err() {
            Error::CircularDependency { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_circular_dependency_through_constructors() {
        struct Left;
        struct Right;

        impl Injectable for Left {
            fn parameters() -> Vec<Parameter> {
                vec![Parameter::service::<Right>("right")]
            }
            fn construct(_: &Arguments) -> Result<Self, Error> {
                Ok(Left)
            }
        }

        impl Injectable for Right {
            fn parameters() -> Vec<Parameter> {
                vec![Parameter::service::<Left>("left")]
            }
            fn construct(_: &Arguments) -> Result<Self, Error> {
                Ok(Right)
            }
        }

        let container = Container::new();
        let err = container.make::<Left>().err().unwrap();
        assert!(matches!(err, Error::CircularDependency { ref chain } if chain.len() == 3));
    }

    #[test]
    fn test_resolver_stack_unwinds_after_error() {
        let container = Container::new();
        let resolver = container.resolver();
        assert!(resolver.resolve::<u8>("missing").is_err());

        container.instance("present", 1u8);
        assert_eq!(*resolver.resolve::<u8>("present").unwrap(), 1);
    }

    #[test]
    fn test_hooks_fire_on_fresh_construction_only() {
        let container = Container::new();
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));

        container.singleton("config", Concrete::of::<Config>());
        let counter = before.clone();
        container.resolving("config", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = after.clone();
        container.after_resolving("config", move |instance, _| {
            assert!(instance.downcast_ref::<Config>().is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        container.resolve::<Config>("config").unwrap();
        container.resolve::<Config>("config").unwrap();

        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_hook_is_circular() {
        let container = Container::new();
        container.bind("a", Concrete::factory(|_, _| Ok(1u8)), false);

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let slot = seen.clone();
        container.resolving("a", move |resolver| {
            *slot.lock() = resolver.resolve::<u8>("a").err();
        });

        assert_eq!(*container.resolve::<u8>("a").unwrap(), 1);
        match seen.lock().take() {
            Some(Error::CircularDependency { chain }) => assert_eq!(chain, vec!["a", "a"]),
            other => panic!("unexpected hook outcome: {other:?}"),
        }
    }

    #[test]
    fn test_after_hook_resolves_dependencies_on_same_stack() {
        let container = Container::new();
        container.bind("a", Concrete::factory(|_, _| Ok(1u8)), false);
        container.bind("b", Concrete::factory(|r, _| Ok(*r.resolve::<u8>("a")? + 1)), false);

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let slot = seen.clone();
        container.after_resolving("a", move |_, resolver| {
            *slot.lock() = resolver.resolve::<u8>("b").err();
        });

        assert_eq!(*container.resolve::<u8>("a").unwrap(), 1);
        match seen.lock().take() {
            Some(Error::CircularDependency { chain }) => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected hook outcome: {other:?}"),
        }
    }

    #[test]
    fn test_rebind_during_singleton_build_is_not_cached() {
        let container = Container::new();
        container.singleton(
            "config",
            Concrete::factory(|resolver, _| {
                resolver.container().singleton(
                    "config",
                    Concrete::factory(|_, _| {
                        Ok(Config {
                            name: "fresh".to_string(),
                            retries: 0,
                        })
                    }),
                );
                Ok(Config {
                    name: "stale".to_string(),
                    retries: 0,
                })
            }),
        );

        let first = container.resolve::<Config>("config").unwrap();
        assert_eq!(first.name, "stale");
        assert!(!container.is_cached("config"));

        let second = container.resolve::<Config>("config").unwrap();
        assert_eq!(second.name, "fresh");
        assert!(container.is_cached("config"));
    }

    #[test]
    fn test_forget_and_clear() {
        let container = Container::new();
        container.instance("a", 1u8);
        container.instance("b", 2u8);

        assert!(container.forget("a"));
        assert!(!container.has("a"));
        assert!(!container.is_cached("a"));
        assert!(!container.forget("a"));

        container.clear();
        assert!(!container.has("b"));
    }

    #[test]
    fn test_clones_share_bindings() {
        let container = Container::new();
        let clone = container.clone();
        clone.instance("shared", "yes".to_string());
        assert_eq!(*container.resolve::<String>("shared").unwrap(), "yes");
    }

    #[test]
    fn test_concurrent_singleton_resolution_yields_one_instance() {
        let container = Container::new();
        container.singleton("config", Concrete::of::<Config>());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.resolve::<Config>("config").unwrap())
            })
            .collect();

        let instances: Vec<Arc<Config>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let cached = container.resolve::<Config>("config").unwrap();
        assert!(instances.iter().all(|instance| Arc::ptr_eq(instance, &cached)));
    }
}
