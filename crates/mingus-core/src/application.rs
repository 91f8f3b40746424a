//! The application container.
//!
//! An [`Application`] is a root [`Context`] plus registration conventions:
//! controllers go under `controllers.<name>` tagged `controller`, extension
//! points are singletons tagged `extensionPoint`, and extensions are bound
//! under their extension point's key prefix. The context itself is bound at
//! [`keys::CONTEXT`] so resolved artifacts can inject it.

use crate::error::{CoreError, CoreResult};
use crate::keys;
use mingus_context::{Binding, BindingScope, BoundValue, ClassDefinition, Context};
use std::sync::Arc;
use tracing::debug;

/// Container for an application's artifacts.
///
/// # Examples
///
/// ```
/// use mingus_core::Application;
/// use serde_json::json;
///
/// let app = Application::with_config(json!({"name": "CodeHub"})).unwrap();
/// let name = app.context().get_sync("application.config#name").unwrap();
/// assert_eq!(name.as_json(), Some(&json!("CodeHub")));
/// ```
pub struct Application {
	context: Arc<Context>,
}

impl Application {
	/// An application with an empty configuration.
	pub fn new() -> CoreResult<Self> {
		Self::with_config(serde_json::json!({}))
	}

	/// An application with its configuration object, bound at
	/// [`keys::APPLICATION_CONFIG`].
	pub fn with_config(config: serde_json::Value) -> CoreResult<Self> {
		let context = Context::new();
		context
			.bind(keys::CONTEXT)?
			.to(BoundValue::from_arc(Arc::clone(&context)));
		context
			.bind(keys::APPLICATION_CONFIG)?
			.to(BoundValue::from(config));
		Ok(Self { context })
	}

	/// The application's root context.
	pub fn context(&self) -> &Arc<Context> {
		&self.context
	}

	/// Registers a controller class under `controllers.<name>`, defaulting
	/// the name to the class name.
	pub fn controller(
		&self,
		def: Arc<ClassDefinition>,
		name: Option<&str>,
	) -> CoreResult<Arc<Binding>> {
		let name = name.unwrap_or_else(|| def.name());
		let key = format!("{}.{name}", keys::CONTROLLERS);
		debug!(%key, "registering controller");
		let binding = self.context.bind(key)?;
		binding.to_class(def).tag(keys::CONTROLLER_TAG);
		Ok(binding)
	}

	/// Registers an extension point class, defaulting its key to
	/// `extensionPoints.<class name>`. Extension points are singletons.
	pub fn extension_point(
		&self,
		def: Arc<ClassDefinition>,
		name: Option<&str>,
	) -> CoreResult<Arc<Binding>> {
		let key = match name {
			Some(name) => name.to_string(),
			None => format!("{}.{}", keys::EXTENSION_POINTS, def.name()),
		};
		debug!(%key, "registering extension point");
		let binding = self.context.bind(&key)?;
		binding
			.to_class(def)
			.in_scope(BindingScope::Singleton)
			.tag(keys::EXTENSION_POINT_TAG)
			.tag(keys::name_tag(&key));
		Ok(binding)
	}

	/// Registers an extension class for a bound extension point, defaulting
	/// the extension name to the class name.
	pub fn extension(
		&self,
		extension_point_name: &str,
		def: Arc<ClassDefinition>,
		name: Option<&str>,
	) -> CoreResult<Arc<Binding>> {
		if !self.context.is_bound(extension_point_name) {
			return Err(CoreError::ExtensionPointMissing {
				name: extension_point_name.to_string(),
			});
		}
		let name = name.map(str::to_string).unwrap_or_else(|| def.name().to_string());
		let key = keys::extension_key(extension_point_name, &name);
		debug!(%key, "registering extension");
		let binding = self.context.bind(key)?;
		binding
			.to_class(def)
			.tag(keys::extension_point_tag(extension_point_name))
			.tag(keys::name_tag(&name));
		Ok(binding)
	}

	/// Binds the configuration object of an extension point.
	pub fn extension_point_config(
		&self,
		extension_point_name: &str,
		config: serde_json::Value,
	) -> CoreResult<&Self> {
		self.context
			.bind(keys::extension_point_config(extension_point_name))?
			.to(BoundValue::from(config));
		Ok(self)
	}

	/// Binds the configuration object of one extension.
	pub fn extension_config(
		&self,
		extension_point_name: &str,
		extension_name: &str,
		config: serde_json::Value,
	) -> CoreResult<&Self> {
		self.context
			.bind(keys::extension_config(extension_point_name, extension_name))?
			.to(BoundValue::from(config));
		Ok(self)
	}

	/// Resolves an extension point instance.
	///
	/// Resolution happens in a child context where `config` is bound to the
	/// extension point's configuration object (`{}` when none was set), so
	/// the extension point class can inject its settings.
	pub async fn get_extension_point(
		&self,
		extension_point_name: &str,
	) -> CoreResult<BoundValue> {
		let config_key = keys::extension_point_config(extension_point_name);
		let config = if self.context.is_bound(&config_key) {
			self.context.get(&config_key).await?
		} else {
			BoundValue::from(serde_json::json!({}))
		};
		let child = self.context.new_child();
		child.bind("config")?.to(config);
		Ok(child.get(extension_point_name).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mingus_context::{inject, ClassBuilder, ConstructorArgs};

	struct NoopController;

	fn noop_def() -> Arc<ClassDefinition> {
		ClassBuilder::new("NoopController", |_args: ConstructorArgs| {
			Ok(NoopController)
		})
		.build()
	}

	#[test]
	fn controllers_are_bound_by_convention() {
		let app = Application::new().unwrap();
		app.controller(noop_def(), None).unwrap();
		assert!(app.context().contains("controllers.NoopController"));
		let tagged = app.context().find_by_tag("controller");
		assert_eq!(tagged.len(), 1);
	}

	#[test]
	fn extension_requires_a_bound_extension_point() {
		let app = Application::new().unwrap();
		let err = app.extension("greeters", noop_def(), None).unwrap_err();
		assert_eq!(
			err,
			CoreError::ExtensionPointMissing {
				name: "greeters".to_string()
			}
		);
	}

	#[test]
	fn application_context_is_self_bound() {
		let app = Application::new().unwrap();
		let ctx = app.context().get_sync(keys::CONTEXT).unwrap();
		assert!(ctx.downcast_ref::<Arc<Context>>().is_none());
		assert!(ctx.downcast_arc::<Context>().is_some());
	}

	#[test]
	fn injected_config_reaches_controllers() {
		struct InfoController {
			app_name: String,
		}
		let app = Application::with_config(serde_json::json!({"name": "demo"})).unwrap();
		let def = ClassBuilder::new("InfoController", |args: ConstructorArgs| {
			let name = args.json(0)?;
			Ok(InfoController {
				app_name: name.as_str().unwrap_or_default().to_string(),
			})
		})
		.inject_argument(inject("application.config#name"))
		.build();
		app.controller(def, Some("info")).unwrap();
		let controller = app.context().get_sync("controllers.info").unwrap();
		assert_eq!(
			controller.downcast_ref::<InfoController>().unwrap().app_name,
			"demo"
		);
	}
}
