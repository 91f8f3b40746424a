//! Bound values and the sync-or-deferred resolution result.
//!
//! The container stores values of arbitrary types, so the universal currency
//! is [`BoundValue`], a cheaply cloneable handle around
//! `Arc<dyn Any + Send + Sync>`. Resolution entry points return
//! [`ValueOrFuture`]: a value that could be produced synchronously stays
//! synchronous, anything touching an async path becomes a boxed future. The
//! folding rule is uniform across the crate: all-sync inputs produce a sync
//! output, any pending input makes the whole result pending, and the first
//! rejection aborts the chain.

use crate::error::{ContextError, ContextResult};
use futures::future;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future producing a resolved value.
pub type ResolveFuture = Pin<Box<dyn Future<Output = ContextResult<BoundValue>> + Send>>;

/// Shared (cloneable) resolution future, used for in-flight singleton caching.
pub(crate) type SharedResolveFuture = future::Shared<ResolveFuture>;

/// Marker stored when an injection deliberately resolves to "no value",
/// e.g. an options lookup for a key the owning binding never configured.
struct Undefined;

/// A type-erased, shared value held by the container.
///
/// `BoundValue` is an `Arc` to an arbitrary `Send + Sync` payload. Cloning is
/// a reference-count bump, and identity (`ptr_eq`) is preserved across
/// clones, which is what makes singleton-identity guarantees testable.
///
/// # Examples
///
/// ```
/// use mingus_context::BoundValue;
///
/// let value = BoundValue::new("app".to_string());
/// assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("app"));
/// assert!(value.ptr_eq(&value.clone()));
/// ```
#[derive(Clone)]
pub struct BoundValue {
	inner: Arc<dyn Any + Send + Sync>,
}

impl BoundValue {
	/// Wraps an owned value.
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self {
			inner: Arc::new(value),
		}
	}

	/// Wraps an already shared value without another allocation.
	pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
		Self { inner: value }
	}

	pub(crate) fn from_boxed(value: Box<dyn Any + Send + Sync>) -> Self {
		Self {
			inner: Arc::from(value),
		}
	}

	/// The "no value" marker, distinct from every user-supplied value.
	pub fn undefined() -> Self {
		Self::new(Undefined)
	}

	/// Whether this is the [`BoundValue::undefined`] marker.
	pub fn is_undefined(&self) -> bool {
		self.inner.is::<Undefined>()
	}

	/// Borrows the payload as `T`, if that is what was stored.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.inner.downcast_ref::<T>()
	}

	/// Clones the shared handle as `Arc<T>`, if that is what was stored.
	pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.inner).downcast::<T>().ok()
	}

	/// Identity comparison: do both handles point at the same allocation?
	pub fn ptr_eq(&self, other: &BoundValue) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Borrows the payload as a JSON value, if the binding stored one.
	pub fn as_json(&self) -> Option<&serde_json::Value> {
		self.downcast_ref::<serde_json::Value>()
	}

	/// Projects a dot-separated path into a JSON payload.
	///
	/// An all-digit segment indexes into an array. An empty path returns the
	/// value itself. A missing path segment, or a non-JSON payload queried
	/// with a non-empty path, yields [`BoundValue::undefined`] rather than
	/// an error.
	///
	/// # Examples
	///
	/// ```
	/// use mingus_context::BoundValue;
	/// use serde_json::json;
	///
	/// let value = BoundValue::new(json!({"rest": {"port": 3000}}));
	/// let port = value.deep_property("rest.port");
	/// assert_eq!(port.as_json(), Some(&json!(3000)));
	/// assert!(value.deep_property("rest.host").is_undefined());
	/// ```
	pub fn deep_property(&self, path: &str) -> BoundValue {
		if path.is_empty() {
			return self.clone();
		}
		let Some(json) = self.as_json() else {
			return BoundValue::undefined();
		};
		let mut current = json;
		for segment in path.split('.') {
			let next = match current {
				serde_json::Value::Array(items) => {
					segment.parse::<usize>().ok().and_then(|index| items.get(index))
				}
				_ => current.get(segment),
			};
			match next {
				Some(next) => current = next,
				None => return BoundValue::undefined(),
			}
		}
		BoundValue::new(current.clone())
	}
}

impl fmt::Debug for BoundValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_undefined() {
			write!(f, "BoundValue(undefined)")
		} else if let Some(json) = self.as_json() {
			write!(f, "BoundValue({json})")
		} else {
			write!(f, "BoundValue(<opaque>)")
		}
	}
}

impl From<serde_json::Value> for BoundValue {
	fn from(value: serde_json::Value) -> Self {
		BoundValue::new(value)
	}
}

/// Result of a resolution: either available now or pending.
pub enum ValueOrFuture {
	/// The value resolved synchronously.
	Value(BoundValue),
	/// The value requires awaiting.
	Future(ResolveFuture),
}

impl ValueOrFuture {
	/// A synchronously available value.
	pub fn of(value: BoundValue) -> Self {
		ValueOrFuture::Value(value)
	}

	/// A deferred value.
	pub fn deferred<F>(future: F) -> Self
	where
		F: Future<Output = ContextResult<BoundValue>> + Send + 'static,
	{
		ValueOrFuture::Future(Box::pin(future))
	}

	/// Whether awaiting is required to observe the value.
	pub fn is_future(&self) -> bool {
		matches!(self, ValueOrFuture::Future(_))
	}

	/// Awaits the value regardless of which arm it is in.
	pub async fn resolve(self) -> ContextResult<BoundValue> {
		match self {
			ValueOrFuture::Value(value) => Ok(value),
			ValueOrFuture::Future(future) => future.await,
		}
	}

	/// Chains a continuation, preserving synchronicity.
	///
	/// A sync value is transformed immediately; a pending value applies the
	/// continuation after the future settles, flattening any future the
	/// continuation itself produces.
	pub fn and_then<F>(self, f: F) -> ContextResult<ValueOrFuture>
	where
		F: FnOnce(BoundValue) -> ContextResult<ValueOrFuture> + Send + 'static,
	{
		match self {
			ValueOrFuture::Value(value) => f(value),
			ValueOrFuture::Future(future) => Ok(ValueOrFuture::deferred(async move {
				match f(future.await?)? {
					ValueOrFuture::Value(value) => Ok(value),
					ValueOrFuture::Future(next) => next.await,
				}
			})),
		}
	}
}

impl fmt::Debug for ValueOrFuture {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValueOrFuture::Value(value) => f.debug_tuple("Value").field(value).finish(),
			ValueOrFuture::Future(_) => f.debug_tuple("Future").field(&"<pending>").finish(),
		}
	}
}

/// Result of resolving a list of dependencies, order-preserving.
pub enum ValuesOrFuture {
	/// Every entry resolved synchronously.
	Values(Vec<BoundValue>),
	/// At least one entry is pending; the future yields all entries in
	/// their original order and fails with the first rejection.
	Future(Pin<Box<dyn Future<Output = ContextResult<Vec<BoundValue>>> + Send>>),
}

/// Folds a list of individual resolutions into one.
///
/// Sibling entries have no resolution-order dependency on each other, so the
/// pending case awaits them jointly; the output order always matches the
/// input order.
pub fn join_values(items: Vec<ValueOrFuture>) -> ValuesOrFuture {
	let mut values = Vec::with_capacity(items.len());
	let mut items = items.into_iter();
	while let Some(item) = items.next() {
		match item {
			ValueOrFuture::Value(value) => values.push(value),
			ValueOrFuture::Future(fut) => {
				// First pending entry: lift the values gathered so far and
				// the remainder into one joint future.
				let mut futures: Vec<ResolveFuture> = values
					.into_iter()
					.map(|value| Box::pin(future::ready(Ok(value))) as ResolveFuture)
					.collect();
				futures.push(fut);
				futures.extend(items.map(|item| match item {
					ValueOrFuture::Value(value) => {
						Box::pin(future::ready(Ok(value))) as ResolveFuture
					}
					ValueOrFuture::Future(fut) => fut,
				}));
				return ValuesOrFuture::Future(Box::pin(future::try_join_all(futures)));
			}
		}
	}
	ValuesOrFuture::Values(values)
}
