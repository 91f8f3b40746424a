//! Class instantiation and dependency resolution.
//!
//! Resolution is synchronicity-preserving: when every dependency of a class
//! resolves synchronously, the instance is produced synchronously; a single
//! deferred dependency defers the whole instantiation. Each resolution chain
//! carries a [`ResolutionSession`] that records the keys currently being
//! resolved, so a dependency cycle is reported with its full path instead of
//! recursing forever.

use crate::binding::Binding;
use crate::class::{ClassDefinition, ConstructorArgs};
use crate::context::Context;
use crate::error::{ContextError, ContextResult};
use crate::inject::Injection;
use crate::value::{join_values, BoundValue, ValueOrFuture, ValuesOrFuture};
use std::sync::Arc;
use tracing::trace;

/// The stack of binding keys currently being resolved on one chain.
///
/// Sessions are immutable; entering a key produces an extended copy, so
/// sibling dependencies resolved from the same parent do not see each other
/// on the stack.
#[derive(Clone, Debug, Default)]
pub struct ResolutionSession {
	stack: Vec<String>,
}

impl ResolutionSession {
	/// An empty session for the start of a resolution chain.
	pub fn root() -> Self {
		Self::default()
	}

	/// Extends the session with `key`, or fails if `key` is already being
	/// resolved on this chain.
	pub fn enter(&self, key: &str) -> ContextResult<ResolutionSession> {
		if self.stack.iter().any(|entry| entry == key) {
			let mut path: Vec<&str> = self.stack.iter().map(String::as_str).collect();
			path.push(key);
			return Err(ContextError::CircularDependency {
				path: path.join(" -> "),
			});
		}
		let mut stack = self.stack.clone();
		stack.push(key.to_string());
		Ok(Self { stack })
	}

	pub fn depth(&self) -> usize {
		self.stack.len()
	}
}

/// Instantiates `def` against `ctx` with a fresh resolution session.
///
/// Constructor arguments are resolved in declaration order, the instance is
/// constructed, and injectable properties are assigned afterwards. The result
/// is synchronous exactly when every injection resolved synchronously.
pub fn instantiate_class(
	def: &Arc<ClassDefinition>,
	ctx: &Arc<Context>,
) -> ContextResult<ValueOrFuture> {
	instantiate_class_with(def, ctx, None, &ResolutionSession::root())
}

pub(crate) fn instantiate_class_with(
	def: &Arc<ClassDefinition>,
	ctx: &Arc<Context>,
	binding: Option<&Arc<Binding>>,
	session: &ResolutionSession,
) -> ContextResult<ValueOrFuture> {
	trace!(class = def.name(), "instantiating class");
	let args = resolve_injected_arguments(def, ctx, binding, session)?;
	let properties = def.merged_properties();
	let mut resolved_properties = Vec::with_capacity(properties.len());
	for property in &properties {
		let value = resolve_injection(ctx, property.injection().for_binding(binding), session)?;
		resolved_properties.push(value);
	}
	let property_values = join_values(resolved_properties);

	match (args, property_values) {
		(ValuesOrFuture::Values(values), ValuesOrFuture::Values(property_values)) => {
			let mut instance = def.construct(ConstructorArgs::new(def.name(), values))?;
			for (property, value) in properties.iter().zip(property_values) {
				def.assign_property(&mut *instance, property.name(), value)?;
			}
			Ok(ValueOrFuture::of(BoundValue::from_boxed(instance)))
		}
		(args, property_values) => {
			let def = Arc::clone(def);
			Ok(ValueOrFuture::deferred(Box::pin(async move {
				let values = match args {
					ValuesOrFuture::Values(values) => values,
					ValuesOrFuture::Future(fut) => fut.await?,
				};
				let mut instance = def.construct(ConstructorArgs::new(def.name(), values))?;
				let property_values = match property_values {
					ValuesOrFuture::Values(values) => values,
					ValuesOrFuture::Future(fut) => fut.await?,
				};
				for (property, value) in properties.iter().zip(property_values) {
					def.assign_property(&mut *instance, property.name(), value)?;
				}
				Ok(BoundValue::from_boxed(instance))
			})))
		}
	}
}

fn resolve_injected_arguments(
	def: &Arc<ClassDefinition>,
	ctx: &Arc<Context>,
	binding: Option<&Arc<Binding>>,
	session: &ResolutionSession,
) -> ContextResult<ValuesOrFuture> {
	let mut resolved = Vec::with_capacity(def.parameters().len());
	for (index, parameter) in def.parameters().iter().enumerate() {
		let injection = parameter.as_ref().ok_or_else(|| {
			ContextError::InjectionMissing {
				class_name: def.name().to_string(),
				method: "constructor".to_string(),
				index: index + 1,
			}
		})?;
		resolved.push(resolve_injection(
			ctx,
			injection.for_binding(binding),
			session,
		)?);
	}
	Ok(join_values(resolved))
}

/// Resolves one injection: through its custom resolve function when present,
/// otherwise by fetching its binding key from the context.
fn resolve_injection(
	ctx: &Arc<Context>,
	injection: Injection,
	session: &ResolutionSession,
) -> ContextResult<ValueOrFuture> {
	match injection.resolver() {
		Some(resolve) => {
			let resolve = Arc::clone(resolve);
			resolve(ctx, &injection, session)
		}
		None => ctx.get_with(injection.binding_key(), session),
	}
}

/// Resolves `keys` in order against `ctx`, folding the per-key synchronicity:
/// all-sync yields values directly, any deferred key defers the whole list.
pub(crate) fn resolve_values(
	ctx: &Arc<Context>,
	keys: &[String],
	session: &ResolutionSession,
) -> ContextResult<ValuesOrFuture> {
	let mut resolved = Vec::with_capacity(keys.len());
	for key in keys {
		resolved.push(ctx.get_with(key, session)?);
	}
	Ok(join_values(resolved))
}
