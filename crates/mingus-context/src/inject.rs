//! Injection descriptors.
//!
//! Rust has no runtime decorators, so the `@inject(...)` annotations of
//! decorator-based containers become plain [`Injection`] values registered on
//! a class's metadata table (see [`crate::ClassBuilder`]). A descriptor names
//! the binding key it needs and optionally overrides how that key is turned
//! into a value; the specialized constructors ([`inject_getter`],
//! [`inject_setter`], [`inject_options`]) are just descriptors with a custom
//! resolve function.

use crate::binding::Binding;
use crate::context::Context;
use crate::error::ContextResult;
use crate::resolver::ResolutionSession;
use crate::value::{BoundValue, ValueOrFuture};
use std::fmt;
use std::sync::Arc;

/// Custom resolution function carried by an injection descriptor.
///
/// When present, it replaces the default "fetch `binding_key` from the
/// context" behavior.
pub type ResolverFn = Arc<
	dyn Fn(&Arc<Context>, &Injection, &ResolutionSession) -> ContextResult<ValueOrFuture>
		+ Send
		+ Sync,
>;

/// Descriptor for one injection point: a constructor parameter or a property.
#[derive(Clone)]
pub struct Injection {
	binding_key: String,
	metadata: Option<serde_json::Value>,
	resolve: Option<ResolverFn>,
	/// The binding whose class declared this injection point. Populated by
	/// the resolver during class-based resolution only; options injection
	/// needs it to reach the owning binding's options payload.
	binding: Option<Arc<Binding>>,
}

impl Injection {
	/// Plain injection: resolve `binding_key` against the current context.
	///
	/// The key may carry a nested path after `#`, e.g. `config#rest.port`.
	pub fn new(binding_key: impl Into<String>) -> Self {
		Self {
			binding_key: binding_key.into(),
			metadata: None,
			resolve: None,
			binding: None,
		}
	}

	/// Attaches opaque metadata for consumption by a custom resolve function.
	pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = Some(metadata);
		self
	}

	/// Replaces the default resolution with a custom function.
	pub fn with_resolver(mut self, resolve: ResolverFn) -> Self {
		self.resolve = Some(resolve);
		self
	}

	pub fn binding_key(&self) -> &str {
		&self.binding_key
	}

	pub fn metadata(&self) -> Option<&serde_json::Value> {
		self.metadata.as_ref()
	}

	/// The binding that owns the class declaring this injection point, when
	/// resolution happens through a binding (as opposed to a bare
	/// `instantiate_class` call).
	pub fn binding(&self) -> Option<&Arc<Binding>> {
		self.binding.as_ref()
	}

	pub(crate) fn resolver(&self) -> Option<&ResolverFn> {
		self.resolve.as_ref()
	}

	pub(crate) fn for_binding(&self, binding: Option<&Arc<Binding>>) -> Injection {
		let mut injection = self.clone();
		injection.binding = binding.cloned();
		injection
	}
}

impl fmt::Debug for Injection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Injection")
			.field("binding_key", &self.binding_key)
			.field("metadata", &self.metadata)
			.field("custom_resolve", &self.resolve.is_some())
			.finish()
	}
}

/// Shorthand for [`Injection::new`].
pub fn inject(binding_key: impl Into<String>) -> Injection {
	Injection::new(binding_key)
}

/// Injects a [`Getter`] for the key instead of the key's current value.
///
/// The getter re-queries the context on every call, so a dependency rebound
/// after instantiation is observed fresh.
pub fn inject_getter(binding_key: impl Into<String>) -> Injection {
	Injection::new(binding_key).with_resolver(Arc::new(resolve_as_getter))
}

/// Injects a [`Setter`] that binds the key to a constant on demand.
pub fn inject_setter(binding_key: impl Into<String>) -> Injection {
	Injection::new(binding_key).with_resolver(Arc::new(resolve_as_setter))
}

/// Injects a value from the owning binding's options payload.
///
/// The path uses `#` as its separator (`x#y` reads `options.x.y`); an empty
/// path injects the whole payload. When the owning binding has no options, or
/// the path is absent, the injected value is [`BoundValue::undefined`] rather
/// than an error. Outside of binding-based resolution (a bare
/// `instantiate_class` call) there is no owning binding and the result is
/// also `undefined`.
pub fn inject_options(path: impl Into<String>) -> Injection {
	Injection::new(path).with_resolver(Arc::new(resolve_as_options))
}

/// A late-bound read handle injected by [`inject_getter`].
#[derive(Clone)]
pub struct Getter {
	key: String,
	context: Arc<Context>,
}

impl Getter {
	/// Resolves the key against the context as it is *now*.
	pub async fn get(&self) -> ContextResult<BoundValue> {
		self.context.get(&self.key).await
	}

	pub fn key(&self) -> &str {
		&self.key
	}
}

impl fmt::Debug for Getter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Getter").field("key", &self.key).finish()
	}
}

/// A write handle injected by [`inject_setter`].
#[derive(Clone)]
pub struct Setter {
	key: String,
	context: Arc<Context>,
}

impl Setter {
	/// Binds the key to a constant value in the originating context.
	pub fn set(&self, value: BoundValue) -> ContextResult<()> {
		self.context.bind(self.key.as_str())?.to(value);
		Ok(())
	}

	pub fn key(&self) -> &str {
		&self.key
	}
}

impl fmt::Debug for Setter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Setter").field("key", &self.key).finish()
	}
}

fn resolve_as_getter(
	ctx: &Arc<Context>,
	injection: &Injection,
	_session: &ResolutionSession,
) -> ContextResult<ValueOrFuture> {
	Ok(ValueOrFuture::of(BoundValue::new(Getter {
		key: injection.binding_key.clone(),
		context: Arc::clone(ctx),
	})))
}

fn resolve_as_setter(
	ctx: &Arc<Context>,
	injection: &Injection,
	_session: &ResolutionSession,
) -> ContextResult<ValueOrFuture> {
	Ok(ValueOrFuture::of(BoundValue::new(Setter {
		key: injection.binding_key.clone(),
		context: Arc::clone(ctx),
	})))
}

fn resolve_as_options(
	_ctx: &Arc<Context>,
	injection: &Injection,
	_session: &ResolutionSession,
) -> ContextResult<ValueOrFuture> {
	let Some(binding) = injection.binding() else {
		// Instantiation did not happen through a binding; there is no
		// options payload to read from.
		return Ok(ValueOrFuture::of(BoundValue::undefined()));
	};
	let path = injection
		.binding_key
		.strip_prefix('#')
		.unwrap_or(&injection.binding_key)
		.replace('#', ".");
	match binding.options_value() {
		None => Ok(ValueOrFuture::of(BoundValue::undefined())),
		Some(options) => options.and_then(move |value| {
			Ok(ValueOrFuture::of(value.deep_property(&path)))
		}),
	}
}
