//! Bindings: named slots with a pluggable resolution strategy.
//!
//! A [`Binding`] associates a key with *how* to produce a value, not with a
//! value directly. The `to_*` family swaps the strategy in place, so the same
//! binding can move from a constant to a factory to a class without being
//! re-registered. All configuration methods take `&self` and return `&Self`,
//! which keeps the fluent style usable on a binding already stored in a
//! context.

use crate::class::{ClassDefinition, ProviderClass};
use crate::context::Context;
use crate::error::{ContextError, ContextResult};
use crate::resolver::{self, ResolutionSession};
use crate::value::{BoundValue, ResolveFuture, SharedResolveFuture, ValueOrFuture, ValuesOrFuture};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::trace;

/// Lifetime of a binding's resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingScope {
	/// Every resolution runs the strategy again.
	#[default]
	Transient,
	/// The first resolution is cached; later resolutions reuse it, including
	/// while the first one is still in flight.
	Singleton,
}

type StrategyFn =
	dyn Fn(&Arc<Context>, &Arc<Binding>, &ResolutionSession) -> ContextResult<ValueOrFuture>
		+ Send
		+ Sync;

enum CachedValue {
	Ready(BoundValue),
	InFlight(SharedResolveFuture),
}

enum OptionsState {
	Ready(BoundValue),
	Deferred(SharedResolveFuture),
}

/// A key bound to a resolution strategy, with tags, scope, an optional
/// options payload, and a lock flag.
pub struct Binding {
	key: String,
	locked: AtomicBool,
	scope: RwLock<BindingScope>,
	tags: RwLock<HashSet<String>>,
	options: RwLock<Option<OptionsState>>,
	value_constructor: RwLock<Option<Arc<ClassDefinition>>>,
	strategy: RwLock<Option<Arc<StrategyFn>>>,
	cache: Mutex<Option<CachedValue>>,
}

impl Binding {
	pub fn new(key: impl Into<String>) -> Arc<Self> {
		Arc::new(Self {
			key: key.into(),
			locked: AtomicBool::new(false),
			scope: RwLock::new(BindingScope::default()),
			tags: RwLock::new(HashSet::new()),
			options: RwLock::new(None),
			value_constructor: RwLock::new(None),
			strategy: RwLock::new(None),
			cache: Mutex::new(None),
		})
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn is_locked(&self) -> bool {
		self.locked.load(Ordering::SeqCst)
	}

	/// Rejects later rebinds of this key until [`unlock`](Self::unlock).
	pub fn lock(&self) -> &Self {
		self.locked.store(true, Ordering::SeqCst);
		self
	}

	pub fn unlock(&self) -> &Self {
		self.locked.store(false, Ordering::SeqCst);
		self
	}

	pub fn scope(&self) -> BindingScope {
		*self
			.scope
			.read()
			.unwrap_or_else(PoisonError::into_inner)
	}

	pub fn in_scope(&self, scope: BindingScope) -> &Self {
		*self
			.scope
			.write()
			.unwrap_or_else(PoisonError::into_inner) = scope;
		self
	}

	pub fn tag(&self, tag: impl Into<String>) -> &Self {
		self.tags
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(tag.into());
		self
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains(tag)
	}

	pub fn tags(&self) -> Vec<String> {
		let mut tags: Vec<String> = self
			.tags
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.cloned()
			.collect();
		tags.sort();
		tags
	}

	/// The class definition installed by [`to_class`](Self::to_class) or
	/// [`to_provider`](Self::to_provider), if any.
	pub fn value_constructor(&self) -> Option<Arc<ClassDefinition>> {
		self.value_constructor
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Binds to a constant. Resolution is always synchronous.
	pub fn to(&self, value: BoundValue) -> &Self {
		self.set_strategy(Arc::new(move |_ctx, _binding, _session| {
			Ok(ValueOrFuture::of(value.clone()))
		}))
	}

	/// Binds to a factory over the values of `keys`, resolved in order
	/// against the resolving context. The factory runs synchronously when
	/// every dependency resolves synchronously.
	pub fn to_dynamic_value(
		&self,
		keys: &[&str],
		factory: impl Fn(Vec<BoundValue>) -> ContextResult<ValueOrFuture> + Send + Sync + 'static,
	) -> &Self {
		let keys: Vec<String> = keys.iter().map(|key| (*key).to_string()).collect();
		let factory = Arc::new(factory);
		self.set_strategy(Arc::new(move |ctx, _binding, session| {
			match resolver::resolve_values(ctx, &keys, session)? {
				ValuesOrFuture::Values(values) => factory(values),
				ValuesOrFuture::Future(fut) => {
					let factory = Arc::clone(&factory);
					Ok(ValueOrFuture::deferred(Box::pin(async move {
						factory(fut.await?)?.resolve().await
					})))
				}
			}
		}))
	}

	/// Binds to a class: resolution instantiates it with constructor and
	/// property injection.
	pub fn to_class(&self, def: Arc<ClassDefinition>) -> &Self {
		*self
			.value_constructor
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&def));
		self.set_strategy(Arc::new(move |ctx, binding, session| {
			resolver::instantiate_class_with(&def, ctx, Some(binding), session)
		}))
	}

	/// Binds to a provider class: resolution instantiates the provider, then
	/// calls its `value()` to produce the bound value.
	pub fn to_provider(&self, provider: ProviderClass) -> &Self {
		*self
			.value_constructor
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&provider.def));
		self.set_strategy(Arc::new(move |ctx, binding, session| {
			let call = Arc::clone(&provider.call);
			resolver::instantiate_class_with(&provider.def, ctx, Some(binding), session)?
				.and_then(move |instance| call(&instance))
		}))
	}

	/// Attaches an options payload for `inject_options` consumers.
	pub fn with_options(&self, options: BoundValue) -> &Self {
		*self
			.options
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(OptionsState::Ready(options));
		self
	}

	/// Attaches an options payload that is still being produced. Every
	/// consumer awaits the same future.
	pub fn with_async_options(&self, options: ResolveFuture) -> &Self {
		*self
			.options
			.write()
			.unwrap_or_else(PoisonError::into_inner) =
			Some(OptionsState::Deferred(options.shared()));
		self
	}

	/// The options payload, if configured.
	pub fn options_value(&self) -> Option<ValueOrFuture> {
		let options = self.options.read().unwrap_or_else(PoisonError::into_inner);
		match options.as_ref()? {
			OptionsState::Ready(value) => Some(ValueOrFuture::of(value.clone())),
			OptionsState::Deferred(shared) => {
				Some(ValueOrFuture::deferred(shared.clone()))
			}
		}
	}

	/// Resolves this binding against `ctx` with a fresh resolution session.
	pub fn get_value(self: &Arc<Self>, ctx: &Arc<Context>) -> ContextResult<ValueOrFuture> {
		self.get_value_with(ctx, &ResolutionSession::root())
	}

	pub(crate) fn get_value_with(
		self: &Arc<Self>,
		ctx: &Arc<Context>,
		session: &ResolutionSession,
	) -> ContextResult<ValueOrFuture> {
		let session = session.enter(&self.key)?;
		trace!(key = %self.key, depth = session.depth(), "resolving binding");
		match self.scope() {
			BindingScope::Transient => self.run_strategy(ctx, &session),
			BindingScope::Singleton => {
				// The cache lock is held across the synchronous part of the
				// strategy so concurrent resolvers cannot both start it.
				let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
				match &*cache {
					Some(CachedValue::Ready(value)) => Ok(ValueOrFuture::of(value.clone())),
					Some(CachedValue::InFlight(shared)) => {
						Ok(ValueOrFuture::deferred(shared.clone()))
					}
					None => match self.run_strategy(ctx, &session)? {
						ValueOrFuture::Value(value) => {
							*cache = Some(CachedValue::Ready(value.clone()));
							Ok(ValueOrFuture::of(value))
						}
						ValueOrFuture::Future(fut) => {
							let shared = fut.shared();
							*cache = Some(CachedValue::InFlight(shared.clone()));
							Ok(ValueOrFuture::deferred(shared))
						}
					},
				}
			}
		}
	}

	fn run_strategy(
		self: &Arc<Self>,
		ctx: &Arc<Context>,
		session: &ResolutionSession,
	) -> ContextResult<ValueOrFuture> {
		let strategy = self
			.strategy
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		match strategy {
			Some(strategy) => strategy(ctx, self, session),
			None => Err(ContextError::NoValueBound(self.key.clone())),
		}
	}

	fn set_strategy(&self, strategy: Arc<StrategyFn>) -> &Self {
		*self
			.strategy
			.write()
			.unwrap_or_else(PoisonError::into_inner) = Some(strategy);
		// A new strategy invalidates any value cached by the old one.
		*self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
		self
	}
}

impl std::fmt::Debug for Binding {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Binding")
			.field("key", &self.key)
			.field("scope", &self.scope())
			.field("tags", &self.tags())
			.field("locked", &self.is_locked())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::value::ValueOrFuture;

	#[test]
	fn constant_binding_resolves_synchronously() {
		let ctx = Context::new();
		let binding = Binding::new("greeting");
		binding.to(BoundValue::new("hello".to_string()));
		let resolved = binding.get_value(&ctx).unwrap();
		match resolved {
			ValueOrFuture::Value(value) => {
				assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
			}
			ValueOrFuture::Future(_) => panic!("constant must resolve synchronously"),
		}
	}

	#[test]
	fn unbound_strategy_reports_no_value() {
		let ctx = Context::new();
		let binding = Binding::new("empty");
		let err = binding.get_value(&ctx).unwrap_err();
		assert_eq!(err, ContextError::NoValueBound("empty".to_string()));
	}

	#[tokio::test]
	async fn singleton_scope_caches_first_result() {
		let ctx = Context::new();
		let counter = Arc::new(AtomicBool::new(false));
		let binding = Binding::new("once");
		let flag = Arc::clone(&counter);
		binding
			.to_dynamic_value(&[], move |_values| {
				assert!(!flag.swap(true, Ordering::SeqCst), "factory ran twice");
				Ok(ValueOrFuture::of(BoundValue::new(42_i64)))
			})
			.in_scope(BindingScope::Singleton);
		let first = binding.get_value(&ctx).unwrap().resolve().await.unwrap();
		let second = binding.get_value(&ctx).unwrap().resolve().await.unwrap();
		assert!(first.ptr_eq(&second));
	}

	#[tokio::test]
	async fn singleton_shares_in_flight_resolution() {
		let ctx = Context::new();
		let binding = Binding::new("slow");
		binding
			.to_dynamic_value(&[], |_values| {
				Ok(ValueOrFuture::deferred(Box::pin(async {
					tokio::task::yield_now().await;
					Ok(BoundValue::new("ready".to_string()))
				})))
			})
			.in_scope(BindingScope::Singleton);
		let first = binding.get_value(&ctx).unwrap();
		let second = binding.get_value(&ctx).unwrap();
		assert!(first.is_future());
		assert!(second.is_future());
		let a = first.resolve().await.unwrap();
		let b = second.resolve().await.unwrap();
		assert!(a.ptr_eq(&b));
	}

	#[test]
	fn rebinding_strategy_clears_singleton_cache() {
		let ctx = Context::new();
		let binding = Binding::new("mutable");
		binding
			.to(BoundValue::new(1_i64))
			.in_scope(BindingScope::Singleton);
		let first = match binding.get_value(&ctx).unwrap() {
			ValueOrFuture::Value(value) => value,
			ValueOrFuture::Future(_) => panic!("expected sync"),
		};
		assert_eq!(first.downcast_ref::<i64>(), Some(&1));
		binding.to(BoundValue::new(2_i64));
		let second = match binding.get_value(&ctx).unwrap() {
			ValueOrFuture::Value(value) => value,
			ValueOrFuture::Future(_) => panic!("expected sync"),
		};
		assert_eq!(second.downcast_ref::<i64>(), Some(&2));
	}

	#[test]
	fn tags_are_queryable() {
		let binding = Binding::new("tagged");
		binding.tag("controller").tag("rest");
		assert!(binding.has_tag("controller"));
		assert!(!binding.has_tag("grpc"));
		assert_eq!(binding.tags(), vec!["controller", "rest"]);
	}
}
