//! Hierarchical binding registry.
//!
//! A [`Context`] owns its bindings in registration order and optionally links
//! to a parent. Lookups that miss locally delegate upward, so a request
//! context layered over an application context sees both sets of bindings,
//! with its own taking precedence.
//!
//! # Examples
//!
//! ```
//! use mingus_context::{BoundValue, Context};
//!
//! let app = Context::new();
//! app.bind("greeting").unwrap().to(BoundValue::new("hello".to_string()));
//! let request = app.new_child();
//! let value = request.get_sync("greeting").unwrap();
//! assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
//! ```

use crate::binding::Binding;
use crate::error::{ContextError, ContextResult};
use crate::resolver::ResolutionSession;
use crate::value::{BoundValue, ValueOrFuture};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Default)]
struct Registry {
	by_key: HashMap<String, usize>,
	entries: Vec<Arc<Binding>>,
}

/// A registry of bindings with an optional parent to delegate misses to.
pub struct Context {
	registry: RwLock<Registry>,
	parent: Option<Arc<Context>>,
}

impl Context {
	/// A root context with no parent.
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			registry: RwLock::new(Registry::default()),
			parent: None,
		})
	}

	/// A child context delegating unresolved lookups to `self`.
	pub fn new_child(self: &Arc<Self>) -> Arc<Self> {
		Arc::new(Self {
			registry: RwLock::new(Registry::default()),
			parent: Some(Arc::clone(self)),
		})
	}

	pub fn parent(&self) -> Option<&Arc<Context>> {
		self.parent.as_ref()
	}

	/// Registers a fresh binding for `key`, replacing an existing one in
	/// place so registration order is preserved across rebinds.
	pub fn bind(&self, key: impl Into<String>) -> ContextResult<Arc<Binding>> {
		let key = key.into();
		let binding = Binding::new(key.clone());
		let mut registry = self
			.registry
			.write()
			.unwrap_or_else(PoisonError::into_inner);
		match registry.by_key.get(&key) {
			Some(&index) => {
				if registry.entries[index].is_locked() {
					return Err(ContextError::BindingLocked(key));
				}
				debug!(%key, "replacing binding");
				registry.entries[index] = Arc::clone(&binding);
			}
			None => {
				debug!(%key, "registering binding");
				let index = registry.entries.len();
				registry.entries.push(Arc::clone(&binding));
				registry.by_key.insert(key, index);
			}
		}
		Ok(binding)
	}

	/// Whether `key` is bound in this context, ignoring ancestors.
	pub fn contains(&self, key: &str) -> bool {
		self.registry
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.by_key
			.contains_key(key)
	}

	/// Whether `key` is bound anywhere on the context chain.
	pub fn is_bound(&self, key: &str) -> bool {
		if self.contains(key) {
			return true;
		}
		match &self.parent {
			Some(parent) => parent.is_bound(key),
			None => false,
		}
	}

	/// The binding for `key`, searching up the chain.
	pub fn get_binding(&self, key: &str) -> ContextResult<Arc<Binding>> {
		let local = {
			let registry = self
				.registry
				.read()
				.unwrap_or_else(PoisonError::into_inner);
			registry
				.by_key
				.get(key)
				.map(|&index| Arc::clone(&registry.entries[index]))
		};
		if let Some(binding) = local {
			return Ok(binding);
		}
		match &self.parent {
			Some(parent) => parent.get_binding(key),
			None => Err(ContextError::BindingNotFound(key.to_string())),
		}
	}

	/// Bindings whose key matches `pattern`, where `*` matches exactly one
	/// dot-delimited segment. Results keep registration order; a child
	/// binding shadows an ancestor's binding with the same key.
	pub fn find(&self, pattern: &str) -> Vec<Arc<Binding>> {
		let Ok(matcher) = segment_glob(pattern) else {
			return Vec::new();
		};
		self.collect(&|binding| matcher.is_match(binding.key()))
	}

	/// Bindings carrying a tag matching `pattern` (same `*` semantics as
	/// [`find`](Self::find)).
	pub fn find_by_tag(&self, pattern: &str) -> Vec<Arc<Binding>> {
		let Ok(matcher) = segment_glob(pattern) else {
			return Vec::new();
		};
		self.collect(&|binding| binding.tags().iter().any(|tag| matcher.is_match(tag)))
	}

	fn collect(&self, matches: &dyn Fn(&Arc<Binding>) -> bool) -> Vec<Arc<Binding>> {
		let mut seen: HashSet<String> = HashSet::new();
		let mut found = Vec::new();
		let mut current = Some(self);
		while let Some(ctx) = current {
			let registry = ctx
				.registry
				.read()
				.unwrap_or_else(PoisonError::into_inner);
			for binding in &registry.entries {
				if !seen.contains(binding.key()) && matches(binding) {
					seen.insert(binding.key().to_string());
					found.push(Arc::clone(binding));
				}
			}
			// Shadowed-but-unmatched keys must not resurface from ancestors.
			for key in registry.by_key.keys() {
				seen.insert(key.clone());
			}
			current = ctx.parent.as_deref();
		}
		found
	}

	/// Resolves `key` without forcing the result: a synchronous binding
	/// yields a value, an asynchronous one yields a future. The key may
	/// carry a nested path after `#`, e.g. `config#rest.port`.
	pub fn get_value_or_future(self: &Arc<Self>, key: &str) -> ContextResult<ValueOrFuture> {
		self.get_with(key, &ResolutionSession::root())
	}

	pub(crate) fn get_with(
		self: &Arc<Self>,
		key: &str,
		session: &ResolutionSession,
	) -> ContextResult<ValueOrFuture> {
		let (binding_key, path) = match key.split_once('#') {
			Some((binding_key, path)) => (binding_key, Some(path.to_string())),
			None => (key, None),
		};
		let binding = self.get_binding(binding_key)?;
		let resolved = binding.get_value_with(self, session)?;
		match path {
			None => Ok(resolved),
			Some(path) => {
				resolved.and_then(move |value| Ok(ValueOrFuture::of(value.deep_property(&path))))
			}
		}
	}

	/// Resolves `key`, awaiting an asynchronous binding.
	pub async fn get(self: &Arc<Self>, key: &str) -> ContextResult<BoundValue> {
		self.get_value_or_future(key)?.resolve().await
	}

	/// Resolves `key` synchronously, failing when the binding requires
	/// awaiting.
	pub fn get_sync(self: &Arc<Self>, key: &str) -> ContextResult<BoundValue> {
		match self.get_value_or_future(key)? {
			ValueOrFuture::Value(value) => Ok(value),
			ValueOrFuture::Future(_) => {
				Err(ContextError::ResolutionMustBeSync(key.to_string()))
			}
		}
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let registry = self
			.registry
			.read()
			.unwrap_or_else(PoisonError::into_inner);
		f.debug_struct("Context")
			.field("bindings", &registry.entries.len())
			.field("has_parent", &self.parent.is_some())
			.finish()
	}
}

/// Compiles a key pattern where `*` stands for one dot-delimited segment.
fn segment_glob(pattern: &str) -> Result<Regex, regex::Error> {
	let mut expr = String::from("^");
	for (index, literal) in pattern.split('*').enumerate() {
		if index > 0 {
			expr.push_str("[^.]+");
		}
		expr.push_str(&regex::escape(literal));
	}
	expr.push('$');
	Regex::new(&expr)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn child_delegates_to_parent() {
		let app = Context::new();
		app.bind("greeting")
			.unwrap()
			.to(BoundValue::new("hello".to_string()));
		let request = app.new_child();
		let value = request.get_sync("greeting").unwrap();
		assert_eq!(value.downcast_ref::<String>().unwrap(), "hello");
	}

	#[test]
	fn child_binding_shadows_parent() {
		let app = Context::new();
		app.bind("greeting")
			.unwrap()
			.to(BoundValue::new("hello".to_string()));
		let request = app.new_child();
		request
			.bind("greeting")
			.unwrap()
			.to(BoundValue::new("hola".to_string()));
		let value = request.get_sync("greeting").unwrap();
		assert_eq!(value.downcast_ref::<String>().unwrap(), "hola");
		let from_app = app.get_sync("greeting").unwrap();
		assert_eq!(from_app.downcast_ref::<String>().unwrap(), "hello");
	}

	#[test]
	fn missing_key_is_reported() {
		let ctx = Context::new();
		let err = ctx.get_sync("nope").unwrap_err();
		assert_eq!(err, ContextError::BindingNotFound("nope".to_string()));
	}

	#[test]
	fn rebind_of_locked_binding_is_rejected() {
		let ctx = Context::new();
		ctx.bind("sealed")
			.unwrap()
			.to(BoundValue::new(1_i64))
			.lock();
		let err = ctx.bind("sealed").unwrap_err();
		assert_eq!(err, ContextError::BindingLocked("sealed".to_string()));
	}

	#[test]
	fn find_matches_one_segment_per_star() {
		let ctx = Context::new();
		ctx.bind("controllers.info").unwrap();
		ctx.bind("controllers.rest.info").unwrap();
		ctx.bind("repositories.info").unwrap();
		let keys: Vec<String> = ctx
			.find("controllers.*")
			.iter()
			.map(|b| b.key().to_string())
			.collect();
		assert_eq!(keys, vec!["controllers.info"]);
	}

	#[test]
	fn find_dedupes_shadowed_keys() {
		let app = Context::new();
		app.bind("services.a").unwrap();
		app.bind("services.b").unwrap();
		let request = app.new_child();
		request.bind("services.a").unwrap();
		let found = request.find("services.*");
		let keys: Vec<&str> = found.iter().map(|b| b.key()).collect();
		assert_eq!(keys, vec!["services.a", "services.b"]);
	}

	#[test]
	fn find_by_tag_queries_the_chain() {
		let app = Context::new();
		app.bind("controllers.info").unwrap().tag("controller");
		let request = app.new_child();
		request.bind("controllers.order").unwrap().tag("controller");
		let found = request.find_by_tag("controller");
		assert_eq!(found.len(), 2);
	}

	#[test]
	fn nested_path_projects_into_json() {
		let ctx = Context::new();
		ctx.bind("config").unwrap().to(BoundValue::from(
			serde_json::json!({"rest": {"port": 3000}}),
		));
		let port = ctx.get_sync("config#rest.port").unwrap();
		assert_eq!(port.as_json(), Some(&serde_json::json!(3000)));
	}

	#[tokio::test]
	async fn async_binding_fails_sync_get() {
		let ctx = Context::new();
		ctx.bind("slow").unwrap().to_dynamic_value(&[], |_| {
			Ok(ValueOrFuture::deferred(Box::pin(async {
				Ok(BoundValue::new(1_i64))
			})))
		});
		let err = ctx.get_sync("slow").unwrap_err();
		assert_eq!(err, ContextError::ResolutionMustBeSync("slow".to_string()));
		let value = ctx.get("slow").await.unwrap();
		assert_eq!(value.downcast_ref::<i64>(), Some(&1));
	}
}
