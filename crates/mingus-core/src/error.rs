//! Application-level errors.

use mingus_context::ContextError;
use thiserror::Error;

/// Errors raised by the application container and extension points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
	/// A context lookup or resolution failed.
	#[error(transparent)]
	Context(#[from] ContextError),

	/// An extension was registered against an extension point that is not
	/// bound.
	#[error("Extension point {name} does not exist")]
	ExtensionPointMissing {
		/// The extension point key that was looked up.
		name: String,
	},

	/// A named extension was requested from an extension point that does not
	/// have it.
	#[error("Extension {name} does not exist for extension point {extension_point}")]
	ExtensionNotFound {
		/// The requested extension name.
		name: String,
		/// The extension point that was queried.
		extension_point: String,
	},
}

/// Result type alias for application operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn context_errors_convert() {
		let err: CoreError = ContextError::BindingNotFound("x".to_string()).into();
		assert_eq!(
			err,
			CoreError::Context(ContextError::BindingNotFound("x".to_string()))
		);
	}

	#[test]
	fn extension_errors_name_their_subjects() {
		let err = CoreError::ExtensionNotFound {
			name: "greeter".to_string(),
			extension_point: "greeters".to_string(),
		};
		assert_eq!(
			err.to_string(),
			"Extension greeter does not exist for extension point greeters"
		);
	}
}
