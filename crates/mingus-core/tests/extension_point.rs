//! End-to-end extension point scenarios: registration through the
//! application, discovery via tags, and per-extension configuration.

use mingus_context::{inject, ClassBuilder, ClassDefinition, ConstructorArgs, Context};
use mingus_core::{Application, CoreError, ExtensionPoint};
use serde_json::json;
use std::sync::Arc;

const GREETERS: &str = "extensionPoints.GreeterExtensionPoint";

/// A greeter extension point that resolves its extensions on demand.
struct GreeterExtensionPoint {
	point: ExtensionPoint,
}

impl GreeterExtensionPoint {
	async fn greet(&self, language: &str, name: &str) -> String {
		let extension = self.point.extension(language).await.unwrap();
		let greeter = extension.downcast_ref::<Greeter>().unwrap();
		greeter.greet(name)
	}
}

/// One greeter, parameterized by its injected `config` binding.
struct Greeter {
	template: String,
}

impl Greeter {
	fn greet(&self, name: &str) -> String {
		self.template.replace("{name}", name)
	}
}

fn greeter_def(class_name: &str, default_template: &str) -> Arc<ClassDefinition> {
	let default_template = default_template.to_string();
	ClassBuilder::new(class_name, move |args: ConstructorArgs| {
		let config = args.json(0)?;
		let template = config
			.get("template")
			.and_then(|t| t.as_str())
			.unwrap_or(&default_template)
			.to_string();
		Ok(Greeter { template })
	})
	.inject_argument(inject("config"))
	.build()
}

fn extension_point_def() -> Arc<ClassDefinition> {
	ClassBuilder::new("GreeterExtensionPoint", |args: ConstructorArgs| {
		let context = args.get_arc::<Context>(0)?;
		let config = args.raw(1)?.clone();
		Ok(GreeterExtensionPoint {
			point: ExtensionPoint::with_config(GREETERS, context, config),
		})
	})
	.inject_argument(inject("$context"))
	.inject_argument(inject("config"))
	.build()
}

fn greeter_app() -> Application {
	let app = Application::new().unwrap();
	app.extension_point(extension_point_def(), None).unwrap();
	app.extension(GREETERS, greeter_def("EnglishGreeter", "Hello, {name}"), Some("en"))
		.unwrap();
	app.extension(GREETERS, greeter_def("SpanishGreeter", "Hola, {name}"), Some("es"))
		.unwrap();
	app
}

#[test]
fn extensions_are_discovered_by_tag() {
	let app = greeter_app();
	let point = ExtensionPoint::new(GREETERS, Arc::clone(app.context()));
	let bindings = point.all_extension_bindings();
	assert_eq!(bindings.len(), 2);
	let map = point.extension_binding_map();
	assert!(map.contains_key(&format!("{GREETERS}.en")));
	assert!(map.contains_key(&format!("{GREETERS}.es")));
}

#[test]
fn extension_lookup_by_name_uses_the_name_tag() {
	let app = greeter_app();
	let point = ExtensionPoint::new(GREETERS, Arc::clone(app.context()));
	let binding = point.extension_binding("es").unwrap();
	assert_eq!(binding.key(), format!("{GREETERS}.es"));
	let err = point.extension_binding("fr").unwrap_err();
	assert_eq!(
		err,
		CoreError::ExtensionNotFound {
			name: "fr".to_string(),
			extension_point: GREETERS.to_string(),
		}
	);
}

#[tokio::test]
async fn extensions_instantiate_with_their_own_config() {
	let app = greeter_app();
	app.extension_config(GREETERS, "en", json!({"template": "Good day, {name}"}))
		.unwrap();
	let point = ExtensionPoint::new(GREETERS, Arc::clone(app.context()));

	let en = point.extension("en").await.unwrap();
	assert_eq!(
		en.downcast_ref::<Greeter>().unwrap().greet("Ana"),
		"Good day, Ana"
	);

	// No config bound for `es`, so the class falls back to its default.
	let es = point.extension("es").await.unwrap();
	assert_eq!(es.downcast_ref::<Greeter>().unwrap().greet("Ana"), "Hola, Ana");
}

#[tokio::test]
async fn extension_point_resolves_through_the_application() {
	let app = greeter_app();
	app.extension_point_config(GREETERS, json!({"defaultLanguage": "en"}))
		.unwrap();
	let resolved = app.get_extension_point(GREETERS).await.unwrap();
	let point = resolved.downcast_ref::<GreeterExtensionPoint>().unwrap();
	assert_eq!(
		point.point.config().as_json(),
		Some(&json!({"defaultLanguage": "en"}))
	);
	assert_eq!(point.greet("es", "Ana").await, "Hola, Ana");
}

#[tokio::test]
async fn unconfigured_extension_point_defaults_to_empty_config() {
	let app = greeter_app();
	let resolved = app.get_extension_point(GREETERS).await.unwrap();
	let point = resolved.downcast_ref::<GreeterExtensionPoint>().unwrap();
	assert_eq!(point.point.config().as_json(), Some(&json!({})));
}

#[tokio::test]
async fn extension_point_is_a_singleton() {
	let app = greeter_app();
	let first = app.get_extension_point(GREETERS).await.unwrap();
	let second = app.get_extension_point(GREETERS).await.unwrap();
	assert!(first.ptr_eq(&second));
}

#[test]
fn registering_an_extension_without_its_point_fails() {
	let app = Application::new().unwrap();
	let err = app
		.extension("extensionPoints.Unknown", greeter_def("EnglishGreeter", "Hello"), None)
		.unwrap_err();
	assert_eq!(
		err,
		CoreError::ExtensionPointMissing {
			name: "extensionPoints.Unknown".to_string()
		}
	);
}
