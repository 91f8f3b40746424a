//! Well-known binding keys and tags used by the application container.

/// The application's own context, bound into itself so resolved artifacts
/// can inject it.
pub const CONTEXT: &str = "$context";

/// The application configuration object.
pub const APPLICATION_CONFIG: &str = "application.config";

/// Key prefix for controller bindings.
pub const CONTROLLERS: &str = "controllers";

/// Default key prefix for extension point bindings.
pub const EXTENSION_POINTS: &str = "extensionPoints";

/// Tag carried by every controller binding.
pub const CONTROLLER_TAG: &str = "controller";

/// Tag carried by every extension point binding.
pub const EXTENSION_POINT_TAG: &str = "extensionPoint";

/// Tag linking an extension to its extension point.
pub fn extension_point_tag(extension_point: &str) -> String {
	format!("extensionPoint:{extension_point}")
}

/// Tag carrying an artifact's registered name.
pub fn name_tag(name: &str) -> String {
	format!("name:{name}")
}

/// Configuration key for an extension point.
pub fn extension_point_config(extension_point: &str) -> String {
	format!("{extension_point}.config")
}

/// Binding key for an extension of an extension point.
pub fn extension_key(extension_point: &str, extension: &str) -> String {
	format!("{extension_point}.{extension}")
}

/// Configuration key for an extension of an extension point.
pub fn extension_config(extension_point: &str, extension: &str) -> String {
	format!("{extension_point}.{extension}.config")
}
