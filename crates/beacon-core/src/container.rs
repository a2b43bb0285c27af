//! Service resolution container.
//!
//! The [`Container`] maps a service type to a way of producing it. Three
//! binding styles are supported:
//!
//! - **Transient** ([`bind`](Container::bind)): the factory runs on every
//!   resolution.
//! - **Singleton** ([`singleton`](Container::singleton)): the factory runs on
//!   first resolution; the instance is cached and every later resolution
//!   returns the identical `Arc`.
//! - **Instance** ([`register_instance`](Container::register_instance)): an
//!   already-built value is stored as a de-facto singleton.
//!
//! Services are keyed by `TypeId`, including the `TypeId` of trait objects, so
//! a concrete `Client` can be bound under `dyn MessagingApi` and resolved as
//! `Arc<dyn MessagingApi>`. Stored values are `Arc<dyn Any>` wrapping an
//! `Arc<T>`, which is downcast back on the way out.
//!
//! # Auto-wiring
//!
//! A type that is resolvable without an explicit binding implements
//! [`Injectable`]; its `construct` function names each dependency as an
//! ordinary `resolver.resolve::<Dep>()` call, so the dependency graph is
//! checked by the compiler rather than discovered through runtime reflection.
//! The [`injectable!`](crate::injectable) macro generates the common impls.
//!
//! Resolution order for `resolve::<T>()`:
//!
//! 1. a matching entry in the active [`Overrides`] set,
//! 2. the cached instance (singletons and registered instances),
//! 3. the registered binding (caching the result when marked singleton),
//! 4. `T::construct` as a last resort.
//!
//! The [`Resolver`] carries the resolution stack, so a binding cycle fails
//! fast with [`ResolveError::CircularDependency`] instead of recursing
//! without bound.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut container = Container::new();
//! container.singleton::<Client, _>(|r| {
//!     let config = r.resolve::<BotConfig>()?;
//!     Ok(Arc::new(Client::new(&config)))
//! });
//!
//! let a = container.resolve::<Client>()?;
//! let b = container.resolve::<Client>()?;
//! assert!(Arc::ptr_eq(&a, &b));
//! ```
//!
//! # Concurrency
//!
//! The container is built mutably during bootstrap and then shared behind an
//! `Arc` for the rest of the invocation. The instance cache uses an interior
//! lock only because lazy singleton resolution happens after sharing; one
//! invocation never resolves concurrently.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{ResolveError, ResolveResult};

/// Type-erased stored service: an `Arc<dyn Any>` whose concrete type is
/// `Arc<T>` for the keyed service type `T`.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

type FactoryFn = Arc<dyn Fn(&Resolver<'_>) -> ResolveResult<ServiceArc> + Send + Sync>;

struct Binding {
    factory: FactoryFn,
    singleton: bool,
    service: &'static str,
}

// =============================================================================
// Injectable
// =============================================================================

/// A service that can be constructed without an explicit binding.
///
/// `construct` is the statically-checked replacement for constructor
/// reflection: every dependency is an explicit [`Resolver::resolve`] call.
/// Types that must only ever come from a binding (trait objects, clients
/// built from external configuration) implement `construct` to return
/// [`ResolveError::NotInstantiable`]; the [`injectable!`](crate::injectable)
/// macro writes that impl as `injectable!(opaque Type)`.
pub trait Injectable: Send + Sync + 'static {
    /// Builds an instance, resolving dependencies through `resolver`.
    fn construct(resolver: &Resolver<'_>) -> ResolveResult<Arc<Self>>;
}

/// Generates [`Injectable`] impls.
///
/// Three forms:
///
/// ```rust,ignore
/// // Auto-wire a struct whose fields are `Arc<Dep>` services.
/// injectable!(PostService { storage: dyn Storage, api: dyn MessagingApi });
///
/// // A leaf service constructed via `Default`.
/// injectable!(default RateLimiter);
///
/// // Resolvable only through an explicit binding.
/// injectable!(opaque dyn MessagingApi);
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty { $($field:ident: $dep:ty),* $(,)? }) => {
        impl $crate::container::Injectable for $ty {
            fn construct(
                resolver: &$crate::container::Resolver<'_>,
            ) -> $crate::error::ResolveResult<::std::sync::Arc<Self>> {
                Ok(::std::sync::Arc::new(Self {
                    $($field: resolver.resolve::<$dep>()?,)*
                }))
            }
        }
    };
    (default $ty:ty) => {
        impl $crate::container::Injectable for $ty {
            fn construct(
                _resolver: &$crate::container::Resolver<'_>,
            ) -> $crate::error::ResolveResult<::std::sync::Arc<Self>> {
                Ok(::std::sync::Arc::new(<$ty as ::std::default::Default>::default()))
            }
        }
    };
    (opaque $ty:ty) => {
        impl $crate::container::Injectable for $ty {
            fn construct(
                _resolver: &$crate::container::Resolver<'_>,
            ) -> $crate::error::ResolveResult<::std::sync::Arc<Self>> {
                Err($crate::error::ResolveError::NotInstantiable(
                    ::std::any::type_name::<$ty>(),
                ))
            }
        }
    };
}

// =============================================================================
// Overrides
// =============================================================================

/// Per-call service substitutions consulted before the cache and bindings.
///
/// The Rust rendition of parameter overrides: keyed by service type rather
/// than by constructor parameter name.
#[derive(Default)]
pub struct Overrides {
    values: HashMap<TypeId, ServiceArc>,
}

impl Overrides {
    /// Creates an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override for `T` (builder style).
    pub fn with<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.values
            .insert(TypeId::of::<T>(), Arc::new(value) as ServiceArc);
        self
    }

    fn get<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<Arc<T>>().map(Arc::clone))
    }

    /// Returns `true` if no overrides are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Container
// =============================================================================

/// The dependency-resolution container.
///
/// One container is constructed per invocation, populated during bootstrap
/// (core services first, then each plugin's own bindings), and shared behind
/// an `Arc` with every listener for the rest of the invocation. Nothing
/// survives past the invocation.
#[derive(Default)]
pub struct Container {
    bindings: HashMap<TypeId, Binding>,
    /// Singleton and registered-instance cache. Once populated for a key,
    /// every later resolution returns the identical `Arc`.
    instances: RwLock<HashMap<TypeId, ServiceArc>>,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transient binding for `T`.
    ///
    /// The factory runs on every resolution. A later binding for the same
    /// service overwrites an earlier one.
    pub fn bind<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_with::<T, F>(factory, false);
    }

    /// Registers a singleton binding for `T`.
    ///
    /// The factory runs on first resolution only; the result is cached.
    pub fn singleton<T, F>(&mut self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_with::<T, F>(factory, true);
    }

    fn bind_with<T, F>(&mut self, factory: F, singleton: bool)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> ResolveResult<Arc<T>> + Send + Sync + 'static,
    {
        let erased: FactoryFn =
            Arc::new(move |resolver| factory(resolver).map(|arc| Arc::new(arc) as ServiceArc));
        self.bindings.insert(
            TypeId::of::<T>(),
            Binding {
                factory: erased,
                singleton,
                service: type_name::<T>(),
            },
        );
    }

    /// Registers an already-built value as a de-facto singleton.
    ///
    /// Every subsequent `resolve::<T>()` returns this exact `Arc`.
    pub fn register_instance<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.instances
            .write()
            .insert(TypeId::of::<T>(), Arc::new(value) as ServiceArc);
    }

    /// Returns `true` if a binding or a cached instance exists for `T`.
    ///
    /// Does not attempt auto-wiring.
    pub fn has<T: ?Sized + 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.bindings.contains_key(&id) || self.instances.read().contains_key(&id)
    }

    /// Resolves an instance of `T`.
    pub fn resolve<T: Injectable + ?Sized>(&self) -> ResolveResult<Arc<T>> {
        let overrides = Overrides::default();
        Resolver::new(self, &overrides).resolve::<T>()
    }

    /// Resolves an instance of `T`, consulting `overrides` first at every
    /// level of the dependency graph.
    pub fn resolve_with<T: Injectable + ?Sized>(
        &self,
        overrides: &Overrides,
    ) -> ResolveResult<Arc<T>> {
        Resolver::new(self, overrides).resolve::<T>()
    }

    /// Resolves a callable's arguments the same way constructor auto-wiring
    /// does, then calls it.
    ///
    /// `Args` is a single `Arc<Service>` or a tuple of them:
    ///
    /// ```rust,ignore
    /// let reply = container.invoke(|(api, storage): (Arc<dyn MessagingApi>, Arc<dyn Storage>)| {
    ///     // ...
    /// })?;
    /// ```
    pub fn invoke<Args, R>(&self, f: impl FnOnce(Args) -> R) -> ResolveResult<R>
    where
        Args: Inject,
    {
        let overrides = Overrides::default();
        self.invoke_with(&overrides, f)
    }

    /// [`invoke`](Self::invoke) with per-call overrides.
    pub fn invoke_with<Args, R>(
        &self,
        overrides: &Overrides,
        f: impl FnOnce(Args) -> R,
    ) -> ResolveResult<R>
    where
        Args: Inject,
    {
        let resolver = Resolver::new(self, overrides);
        let args = Args::inject(&resolver)?;
        Ok(f(args))
    }

    fn cached<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.instances
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<Arc<T>>().map(Arc::clone))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .field("instances", &self.instances.read().len())
            .finish()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A single resolution pass over the container.
///
/// Carries the override set and the resolution stack used for cycle
/// detection. `Injectable::construct` impls receive a `&Resolver` and call
/// [`resolve`](Self::resolve) for each dependency, which keeps nested
/// resolutions on the same stack.
pub struct Resolver<'c> {
    container: &'c Container,
    overrides: &'c Overrides,
    /// Services currently being constructed, outermost first.
    stack: RefCell<Vec<(TypeId, &'static str)>>,
}

impl<'c> Resolver<'c> {
    fn new(container: &'c Container, overrides: &'c Overrides) -> Self {
        Self {
            container,
            overrides,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Returns the container this resolver reads from.
    pub fn container(&self) -> &Container {
        self.container
    }

    /// Resolves an instance of `T` within the current pass.
    pub fn resolve<T: Injectable + ?Sized>(&self) -> ResolveResult<Arc<T>> {
        let id = TypeId::of::<T>();
        let service = type_name::<T>();

        if let Some(hit) = self.overrides.get::<T>() {
            return Ok(hit);
        }
        if let Some(hit) = self.container.cached::<T>() {
            return Ok(hit);
        }

        if self.stack.borrow().iter().any(|(tid, _)| *tid == id) {
            let mut cycle: Vec<&'static str> =
                self.stack.borrow().iter().map(|(_, name)| *name).collect();
            cycle.push(service);
            return Err(ResolveError::CircularDependency { cycle });
        }

        self.stack.borrow_mut().push((id, service));
        let result = self.resolve_uncached::<T>(id);
        self.stack.borrow_mut().pop();

        match result {
            // A leaf that cannot be produced surfaces as an unresolvable
            // dependency of whichever service demanded it.
            Err(ResolveError::NotInstantiable(dependency)) => {
                match self.stack.borrow().last() {
                    Some((_, requester)) => Err(ResolveError::UnresolvableDependency {
                        requester,
                        dependency,
                    }),
                    None => Err(ResolveError::NotInstantiable(dependency)),
                }
            }
            other => other,
        }
    }

    fn resolve_uncached<T: Injectable + ?Sized>(&self, id: TypeId) -> ResolveResult<Arc<T>> {
        if let Some(binding) = self.container.bindings.get(&id) {
            trace!(service = binding.service, "resolving bound service");
            let produced = (binding.factory)(self)?;
            let Some(instance) = produced.downcast_ref::<Arc<T>>().map(Arc::clone) else {
                // Unreachable when bindings are registered through the typed
                // `bind` surface; treated as an absent constructor path.
                return Err(ResolveError::NotInstantiable(binding.service));
            };
            if binding.singleton {
                self.container
                    .instances
                    .write()
                    .insert(id, Arc::new(Arc::clone(&instance)) as ServiceArc);
            }
            return Ok(instance);
        }

        trace!(service = type_name::<T>(), "auto-wiring unbound service");
        T::construct(self)
    }
}

// =============================================================================
// Inject
// =============================================================================

/// Argument sets resolvable by [`Container::invoke`].
///
/// Implemented for `Arc<T: Injectable>` and for tuples of such arguments.
pub trait Inject: Sized {
    /// Resolves this argument set from the container.
    fn inject(resolver: &Resolver<'_>) -> ResolveResult<Self>;
}

impl<T: Injectable + ?Sized> Inject for Arc<T> {
    fn inject(resolver: &Resolver<'_>) -> ResolveResult<Self> {
        resolver.resolve::<T>()
    }
}

macro_rules! impl_inject_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Inject),+> Inject for ($($name,)+) {
            fn inject(resolver: &Resolver<'_>) -> ResolveResult<Self> {
                Ok(($($name::inject(resolver)?,)+))
            }
        }
    };
}

impl_inject_for_tuple!(A);
impl_inject_for_tuple!(A, B);
impl_inject_for_tuple!(A, B, C);
impl_inject_for_tuple!(A, B, C, D);
impl_inject_for_tuple!(A, B, C, D, E);
impl_inject_for_tuple!(A, B, C, D, E, F);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injectable;

    #[derive(Default)]
    struct Leaf {
        value: u32,
    }
    injectable!(default Leaf);

    #[derive(Debug)]
    struct Counter;
    injectable!(opaque Counter);

    #[derive(Debug)]
    struct NeedsCounter {
        counter: Arc<Counter>,
    }
    injectable!(NeedsCounter { counter: Counter });

    struct NeedsLeaf {
        leaf: Arc<Leaf>,
    }
    injectable!(NeedsLeaf { leaf: Leaf });

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }
    injectable!(opaque dyn Greeter);

    struct EnglishGreeter;
    impl Greeter for EnglishGreeter {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn transient_binding_produces_distinct_instances() {
        let mut container = Container::new();
        container.bind::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 7 })));

        let a = container.resolve::<Leaf>().unwrap();
        let b = container.resolve::<Leaf>().unwrap();
        assert_eq!(a.value, 7);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn singleton_binding_caches_the_first_instance() {
        let mut container = Container::new();
        container.singleton::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 7 })));

        let a = container.resolve::<Leaf>().unwrap();
        let b = container.resolve::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn registered_instance_is_returned_verbatim() {
        let mut container = Container::new();
        let instance = Arc::new(Leaf { value: 42 });
        container.register_instance::<Leaf>(Arc::clone(&instance));

        let resolved = container.resolve::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&instance, &resolved));
    }

    #[test]
    fn unbound_default_type_auto_wires() {
        let container = Container::new();
        let leaf = container.resolve::<Leaf>().unwrap();
        assert_eq!(leaf.value, 0);
    }

    #[test]
    fn auto_wiring_pulls_dependencies_from_bindings() {
        let mut container = Container::new();
        container.singleton::<Counter, _>(|_| Ok(Arc::new(Counter)));

        let outer = container.resolve::<NeedsCounter>().unwrap();
        let counter = container.resolve::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&outer.counter, &counter));
    }

    #[test]
    fn missing_dependency_fails_with_unresolvable() {
        let container = Container::new();
        let err = container.resolve::<NeedsCounter>().unwrap_err();
        match err {
            ResolveError::UnresolvableDependency {
                requester,
                dependency,
            } => {
                assert!(requester.contains("NeedsCounter"));
                assert!(dependency.contains("Counter"));
            }
            other => panic!("expected UnresolvableDependency, got {other:?}"),
        }
    }

    #[test]
    fn unbound_opaque_type_is_not_instantiable() {
        let container = Container::new();
        let err = container.resolve::<Counter>().unwrap_err();
        assert!(matches!(err, ResolveError::NotInstantiable(_)));
    }

    #[test]
    fn trait_object_binding_resolves() {
        let mut container = Container::new();
        container.singleton::<dyn Greeter, _>(|_| Ok(Arc::new(EnglishGreeter) as Arc<dyn Greeter>));

        let greeter = container.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(container.has::<dyn Greeter>());
    }

    #[test]
    fn later_binding_overwrites_earlier() {
        let mut container = Container::new();
        container.bind::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 1 })));
        container.bind::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 2 })));

        assert_eq!(container.resolve::<Leaf>().unwrap().value, 2);
    }

    #[test]
    fn override_beats_binding_and_cache() {
        let mut container = Container::new();
        container.singleton::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 1 })));
        let _warm = container.resolve::<Leaf>().unwrap();

        let substituted = Arc::new(Leaf { value: 99 });
        let overrides = Overrides::new().with::<Leaf>(Arc::clone(&substituted));
        let resolved = container.resolve_with::<Leaf>(&overrides).unwrap();
        assert!(Arc::ptr_eq(&substituted, &resolved));
    }

    #[test]
    fn circular_binding_fails_fast() {
        #[derive(Debug)]
        struct A;
        struct B;
        impl Injectable for A {
            fn construct(resolver: &Resolver<'_>) -> ResolveResult<Arc<Self>> {
                let _b = resolver.resolve::<B>()?;
                Ok(Arc::new(A))
            }
        }
        impl Injectable for B {
            fn construct(resolver: &Resolver<'_>) -> ResolveResult<Arc<Self>> {
                let _a = resolver.resolve::<A>()?;
                Ok(Arc::new(B))
            }
        }

        let container = Container::new();
        let err = container.resolve::<A>().unwrap_err();
        match err {
            ResolveError::CircularDependency { cycle } => {
                assert_eq!(cycle.len(), 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[test]
    fn has_does_not_attempt_auto_wiring() {
        let container = Container::new();
        assert!(!container.has::<Leaf>());
        assert!(container.resolve::<Leaf>().is_ok());
        // Auto-wired transients are not cached either.
        assert!(!container.has::<Leaf>());
    }

    #[test]
    fn invoke_resolves_callable_arguments() {
        let mut container = Container::new();
        container.singleton::<Leaf, _>(|_| Ok(Arc::new(Leaf { value: 5 })));
        container.singleton::<Counter, _>(|_| Ok(Arc::new(Counter)));

        let sum = container
            .invoke(|(leaf, needs): (Arc<Leaf>, Arc<NeedsCounter>)| {
                let _ = needs;
                leaf.value + 1
            })
            .unwrap();
        assert_eq!(sum, 6);
    }
}
