//! Error types for binding registration and resolution.
//!
//! Every error carries its diagnostics as owned strings so the whole enum is
//! `Clone`. Cloneability matters: an in-flight singleton resolution is cached
//! as a shared future, and every caller awaiting it receives its own copy of
//! the outcome, error included.

use thiserror::Error;

/// Errors raised by the context registry and the resolution machinery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
	/// The requested key has no owning binding in the context chain.
	#[error("The key {0} was not bound to any value")]
	BindingNotFound(String),

	/// A binding exists but no resolution strategy was configured for it.
	#[error("No value was configured for binding {0}")]
	NoValueBound(String),

	/// A rebind was attempted on a locked binding.
	#[error("Cannot rebind key {0}; the existing binding is locked")]
	BindingLocked(String),

	/// A sync-only call site hit a resolution path that requires awaiting.
	#[error("Cannot get {0} synchronously: the value requires asynchronous resolution")]
	ResolutionMustBeSync(String),

	/// A constructor parameter has no injection descriptor.
	#[error(
		"Cannot resolve injected arguments for {class_name}.{method}: argument {index} is not decorated for dependency injection"
	)]
	InjectionMissing {
		/// Name of the class being instantiated.
		class_name: String,
		/// Method owning the parameter list, `constructor` for constructors.
		method: String,
		/// 1-based index of the undecorated parameter.
		index: usize,
	},

	/// A resolved value could not be converted to the requested Rust type.
	#[error("Cannot convert the value of {subject} to the requested type {expected}")]
	TypeMismatch {
		/// What was being converted, e.g. `argument 2 of InfoController`.
		subject: String,
		/// The Rust type the caller asked for.
		expected: String,
	},

	/// A resolution chain re-entered a key that is already being resolved.
	#[error("Circular dependency detected: {path}")]
	CircularDependency {
		/// The offending chain, e.g. `a -> b -> a`.
		path: String,
	},
}

/// Result type alias for context operations.
pub type ContextResult<T> = Result<T, ContextError>;
