//! # Mingus
//!
//! An inversion-of-control container for Rust: hierarchical contexts,
//! pluggable binding strategies, explicit injection metadata for classes, and
//! tag-based extension points.
//!
//! This facade crate re-exports the two building blocks:
//!
//! - [`context`]: the container itself: [`Context`], [`Binding`],
//!   [`ClassBuilder`] and the injection descriptors.
//! - [`core`]: application-level conventions, namely [`Application`] and
//!   [`ExtensionPoint`].
//!
//! ## Example
//!
//! ```
//! use mingus::{inject, Application, ClassBuilder, ConstructorArgs};
//! use serde_json::json;
//!
//! struct InfoController {
//! 	app_name: String,
//! }
//!
//! let app = Application::with_config(json!({"name": "CodeHub"})).unwrap();
//! let def = ClassBuilder::new("InfoController", |args: ConstructorArgs| {
//! 	let name = args.json(0)?;
//! 	Ok(InfoController {
//! 		app_name: name.as_str().unwrap_or_default().to_string(),
//! 	})
//! })
//! .inject_argument(inject("application.config#name"))
//! .build();
//! app.controller(def, Some("info")).unwrap();
//!
//! let instance = app.context().get_sync("controllers.info").unwrap();
//! assert_eq!(
//! 	instance.downcast_ref::<InfoController>().unwrap().app_name,
//! 	"CodeHub"
//! );
//! ```

pub use mingus_context as context;
pub use mingus_core as core;

pub use mingus_context::{
	inject, inject_getter, inject_options, inject_setter, instantiate_class, Binding,
	BindingScope, BoundValue, ClassBuilder, ClassDefinition, ConstructorArgs, Context,
	ContextError, ContextResult, Getter, Injection, Provider, ProviderClass, ResolutionSession,
	Setter, ValueOrFuture,
};
pub use mingus_core::{Application, CoreError, CoreResult, ExtensionPoint};
