//! An inversion-of-control container built on hierarchical contexts.
//!
//! The crate revolves around three pieces:
//!
//! - [`Context`]: a registry of named [`Binding`]s with an optional parent,
//!   so request-scoped registries can layer over an application registry.
//! - [`Binding`]: a key bound to a resolution strategy. Constants, dynamic
//!   factories, classes and providers are all strategies, swappable in place.
//! - [`ClassBuilder`] / [`instantiate_class`]: explicit injection metadata
//!   for a class, driving constructor and property injection.
//!
//! Resolution is synchronicity-preserving throughout: values that can be
//! produced without awaiting are handed back synchronously as
//! [`ValueOrFuture::Value`], and a single asynchronous dependency anywhere in
//! the graph defers the whole resolution.
//!
//! # Examples
//!
//! ```
//! use mingus_context::{
//! 	inject, BoundValue, ClassBuilder, ConstructorArgs, Context, ContextResult,
//! };
//!
//! struct InfoController {
//! 	app_name: String,
//! }
//!
//! let ctx = Context::new();
//! ctx.bind("application.name")
//! 	.unwrap()
//! 	.to(BoundValue::new("CodeHub".to_string()));
//!
//! let def = ClassBuilder::new("InfoController", |args: ConstructorArgs| {
//! 	Ok(InfoController { app_name: args.get::<String>(0)? })
//! })
//! .inject_argument(inject("application.name"))
//! .build();
//! ctx.bind("controllers.info").unwrap().to_class(def);
//!
//! let controller = ctx.get_sync("controllers.info").unwrap();
//! assert_eq!(
//! 	controller.downcast_ref::<InfoController>().unwrap().app_name,
//! 	"CodeHub"
//! );
//! ```

pub mod binding;
pub mod class;
pub mod context;
pub mod error;
pub mod inject;
pub mod resolver;
pub mod value;

pub use binding::{Binding, BindingScope};
pub use class::{
	ClassBuilder, ClassDefinition, ConstructorArgs, PropertyInjection, Provider, ProviderClass,
};
pub use context::Context;
pub use error::{ContextError, ContextResult};
pub use inject::{
	inject, inject_getter, inject_options, inject_setter, Getter, Injection, Setter,
};
pub use resolver::{instantiate_class, ResolutionSession};
pub use value::{join_values, BoundValue, ResolveFuture, ValueOrFuture, ValuesOrFuture};
