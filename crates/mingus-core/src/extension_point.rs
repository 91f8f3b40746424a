//! Extension points: named plugin slots discovered through binding tags.
//!
//! An extension point does not keep its own list of extensions. Extensions
//! are ordinary bindings tagged `extensionPoint:<name>` in the same context
//! chain, so registering one is just a `bind` and discovery is a tag query.
//! Embed [`ExtensionPoint`] in a concrete extension point type to get the
//! discovery and configuration plumbing.

use crate::error::{CoreError, CoreResult};
use crate::keys;
use mingus_context::{Binding, BoundValue, Context};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Discovery and configuration handle for one named extension point.
#[derive(Clone, Debug)]
pub struct ExtensionPoint {
	name: String,
	context: Arc<Context>,
	config: BoundValue,
}

impl ExtensionPoint {
	/// An extension point with an empty configuration.
	pub fn new(name: impl Into<String>, context: Arc<Context>) -> Self {
		Self::with_config(name, context, BoundValue::from(serde_json::json!({})))
	}

	/// An extension point with its injected configuration.
	pub fn with_config(
		name: impl Into<String>,
		context: Arc<Context>,
		config: BoundValue,
	) -> Self {
		Self {
			name: name.into(),
			context,
			config,
		}
	}

	/// The unique name, also the key prefix for extensions bound under it.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn context(&self) -> &Arc<Context> {
		&self.context
	}

	/// The configuration injected at instantiation time.
	pub fn config(&self) -> &BoundValue {
		&self.config
	}

	/// All bindings registered as extensions of this extension point.
	pub fn all_extension_bindings(&self) -> Vec<Arc<Binding>> {
		self.context
			.find_by_tag(&keys::extension_point_tag(&self.name))
	}

	/// Extension bindings keyed by their binding key.
	pub fn extension_binding_map(&self) -> HashMap<String, Arc<Binding>> {
		self.all_extension_bindings()
			.into_iter()
			.map(|binding| (binding.key().to_string(), binding))
			.collect()
	}

	/// The binding of the extension registered under `extension_name`.
	pub fn extension_binding(&self, extension_name: &str) -> CoreResult<Arc<Binding>> {
		self.all_extension_bindings()
			.into_iter()
			.find(|binding| binding.has_tag(&keys::name_tag(extension_name)))
			.ok_or_else(|| CoreError::ExtensionNotFound {
				name: extension_name.to_string(),
				extension_point: self.name.clone(),
			})
	}

	/// This extension point's configuration object, `{}` when none was
	/// bound.
	pub async fn configuration(&self) -> CoreResult<BoundValue> {
		let key = keys::extension_point_config(&self.name);
		if !self.context.is_bound(&key) {
			return Ok(BoundValue::from(serde_json::json!({})));
		}
		Ok(self.context.get(&key).await?)
	}

	/// The configuration object of one extension, `{}` when none was bound.
	pub async fn extension_configuration(
		&self,
		extension_name: &str,
	) -> CoreResult<BoundValue> {
		let key = keys::extension_config(&self.name, extension_name);
		if !self.context.is_bound(&key) {
			return Ok(BoundValue::from(serde_json::json!({})));
		}
		Ok(self.context.get(&key).await?)
	}

	/// Instantiates the named extension.
	///
	/// The extension resolves in a child context where `config` is bound to
	/// the extension's configuration, so the extension can inject its own
	/// settings without knowing where they live.
	pub async fn extension(&self, extension_name: &str) -> CoreResult<BoundValue> {
		let binding = self.extension_binding(extension_name)?;
		let config = self.extension_configuration(extension_name).await?;
		debug!(
			extension_point = %self.name,
			extension = extension_name,
			"instantiating extension"
		);
		let extension_context = self.context.new_child();
		extension_context.bind("config")?.to(config);
		Ok(binding.get_value(&extension_context)?.resolve().await?)
	}
}
