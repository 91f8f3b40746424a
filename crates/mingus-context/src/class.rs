//! Class metadata tables.
//!
//! The injection points of a class are declared explicitly on a
//! [`ClassBuilder`] rather than discovered by reflection: every constructor
//! parameter is registered in order, every injectable property is registered
//! with a typed assignment closure, and a base class is linked with a
//! projection from the derived struct to the embedded base struct. The result
//! is an immutable [`ClassDefinition`] that the resolver walks at
//! instantiation time.
//!
//! # Examples
//!
//! ```
//! use mingus_context::{inject, ClassBuilder, ConstructorArgs};
//!
//! struct Greeter {
//! 	greeting: String,
//! }
//!
//! let def = ClassBuilder::new("Greeter", |args: ConstructorArgs| {
//! 	Ok(Greeter { greeting: args.get::<String>(0)? })
//! })
//! .inject_argument(inject("greeting"))
//! .build();
//! assert_eq!(def.name(), "Greeter");
//! ```

use crate::error::{ContextError, ContextResult};
use crate::inject::Injection;
use crate::value::{BoundValue, ValueOrFuture};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type AnyInstance = dyn Any + Send + Sync;

type ConstructFn = Arc<dyn Fn(ConstructorArgs) -> ContextResult<Box<AnyInstance>> + Send + Sync>;
type AssignFn = Arc<dyn Fn(&mut AnyInstance, BoundValue) -> ContextResult<()> + Send + Sync>;
type ProjectFn =
	Arc<dyn for<'a> Fn(&'a mut AnyInstance) -> ContextResult<&'a mut AnyInstance> + Send + Sync>;

/// The resolved constructor arguments handed to a construct closure, in
/// declaration order.
pub struct ConstructorArgs {
	class_name: String,
	values: Vec<BoundValue>,
}

impl ConstructorArgs {
	pub(crate) fn new(class_name: impl Into<String>, values: Vec<BoundValue>) -> Self {
		Self {
			class_name: class_name.into(),
			values,
		}
	}

	/// Takes argument `index` as a cloned `T`.
	pub fn get<T: Any + Clone>(&self, index: usize) -> ContextResult<T> {
		self.raw(index)?
			.downcast_ref::<T>()
			.cloned()
			.ok_or_else(|| self.mismatch::<T>(index))
	}

	/// Takes argument `index` as a shared `Arc<T>` without cloning `T`.
	pub fn get_arc<T: Any + Send + Sync>(&self, index: usize) -> ContextResult<Arc<T>> {
		self.raw(index)?
			.downcast_arc::<T>()
			.ok_or_else(|| self.mismatch::<T>(index))
	}

	/// Takes argument `index` as JSON, mapping an undefined value to `Null`.
	pub fn json(&self, index: usize) -> ContextResult<serde_json::Value> {
		let value = self.raw(index)?;
		if value.is_undefined() {
			return Ok(serde_json::Value::Null);
		}
		value
			.as_json()
			.cloned()
			.ok_or_else(|| self.mismatch::<serde_json::Value>(index))
	}

	/// Takes argument `index` untyped.
	pub fn raw(&self, index: usize) -> ContextResult<&BoundValue> {
		self.values.get(index).ok_or_else(|| {
			ContextError::TypeMismatch {
				subject: format!("argument {} of {}", index + 1, self.class_name),
				expected: "a resolved value".to_string(),
			}
		})
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	fn mismatch<T>(&self, index: usize) -> ContextError {
		ContextError::TypeMismatch {
			subject: format!("argument {} of {}", index + 1, self.class_name),
			expected: std::any::type_name::<T>().to_string(),
		}
	}
}

/// One injectable property: its field name and the injection that feeds it.
#[derive(Clone, Debug)]
pub struct PropertyInjection {
	pub(crate) name: String,
	pub(crate) injection: Injection,
}

impl PropertyInjection {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn injection(&self) -> &Injection {
		&self.injection
	}
}

struct BaseClass {
	def: Arc<ClassDefinition>,
	project: ProjectFn,
}

/// Immutable description of how to instantiate a class: ordered constructor
/// injections, property injections, and the base-class chain.
pub struct ClassDefinition {
	name: String,
	/// One slot per constructor parameter; `None` marks a parameter that was
	/// registered without an injection and fails resolution with a
	/// diagnostic naming its position.
	parameters: Vec<Option<Injection>>,
	properties: Vec<PropertyInjection>,
	assigners: HashMap<String, AssignFn>,
	base: Option<BaseClass>,
	construct: ConstructFn,
}

impl ClassDefinition {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn parameters(&self) -> &[Option<Injection>] {
		&self.parameters
	}

	/// Property injections of this class and its base chain, own properties
	/// first; a property redeclared on a derived class shadows the base
	/// class's declaration.
	pub(crate) fn merged_properties(&self) -> Vec<PropertyInjection> {
		let mut seen: Vec<&str> = Vec::new();
		let mut merged = Vec::new();
		let mut current = Some(self);
		while let Some(def) = current {
			for property in &def.properties {
				if seen.iter().any(|name| *name == property.name) {
					continue;
				}
				seen.push(&property.name);
				merged.push(property.clone());
			}
			current = def.base.as_ref().map(|base| base.def.as_ref());
		}
		merged
	}

	/// Assigns `value` to the named property, projecting down the base-class
	/// chain until the declaring class is found.
	pub(crate) fn assign_property(
		&self,
		instance: &mut AnyInstance,
		name: &str,
		value: BoundValue,
	) -> ContextResult<()> {
		if let Some(assign) = self.assigners.get(name) {
			return assign(instance, value);
		}
		match &self.base {
			Some(base) => {
				let projected = (base.project)(instance)?;
				base.def.assign_property(projected, name, value)
			}
			None => Err(ContextError::TypeMismatch {
				subject: format!("property {} of {}", name, self.name),
				expected: "a registered property assigner".to_string(),
			}),
		}
	}

	pub(crate) fn construct(&self, args: ConstructorArgs) -> ContextResult<Box<AnyInstance>> {
		(self.construct)(args)
	}
}

impl std::fmt::Debug for ClassDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClassDefinition")
			.field("name", &self.name)
			.field("parameters", &self.parameters.len())
			.field("properties", &self.properties.len())
			.field("has_base", &self.base.is_some())
			.finish()
	}
}

/// Builder for a [`ClassDefinition`] of the concrete type `T`.
///
/// Constructor parameters are registered in declaration order with
/// [`inject_argument`](Self::inject_argument); a parameter deliberately left
/// without an injection is still registered with
/// [`skip_argument`](Self::skip_argument) so its position is known when
/// resolution reports it.
pub struct ClassBuilder<T> {
	name: String,
	parameters: Vec<Option<Injection>>,
	properties: Vec<PropertyInjection>,
	assigners: HashMap<String, AssignFn>,
	base: Option<BaseClass>,
	construct: ConstructFn,
	_marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
	/// Starts a definition for `T` with its construct closure.
	pub fn new(
		name: impl Into<String>,
		ctor: impl Fn(ConstructorArgs) -> ContextResult<T> + Send + Sync + 'static,
	) -> Self {
		Self {
			name: name.into(),
			parameters: Vec::new(),
			properties: Vec::new(),
			assigners: HashMap::new(),
			base: None,
			construct: Arc::new(move |args| Ok(Box::new(ctor(args)?) as Box<AnyInstance>)),
			_marker: std::marker::PhantomData,
		}
	}

	/// Registers the next constructor parameter with its injection.
	pub fn inject_argument(mut self, injection: Injection) -> Self {
		self.parameters.push(Some(injection));
		self
	}

	/// Registers the next constructor parameter as not injectable. Resolving
	/// the class then fails with a diagnostic naming this position.
	pub fn skip_argument(mut self) -> Self {
		self.parameters.push(None);
		self
	}

	/// Registers an injectable property with a typed assignment closure.
	pub fn inject_property(
		mut self,
		name: impl Into<String>,
		injection: Injection,
		assign: impl Fn(&mut T, BoundValue) -> ContextResult<()> + Send + Sync + 'static,
	) -> Self {
		let name = name.into();
		let class_name = self.name.clone();
		let property_name = name.clone();
		self.properties.push(PropertyInjection {
			name: name.clone(),
			injection,
		});
		self.assigners.insert(
			name,
			Arc::new(move |instance, value| {
				let typed = instance.downcast_mut::<T>().ok_or_else(|| {
					ContextError::TypeMismatch {
						subject: format!("property {} of {}", property_name, class_name),
						expected: std::any::type_name::<T>().to_string(),
					}
				})?;
				assign(typed, value)
			}),
		);
		self
	}

	/// Links a base class whose injections also apply to `T`, with a
	/// projection from `T` to the embedded base struct.
	pub fn extends<B: Any + Send + Sync>(
		mut self,
		base: Arc<ClassDefinition>,
		project: impl for<'a> Fn(&'a mut T) -> &'a mut B + Send + Sync + 'static,
	) -> Self {
		let class_name = self.name.clone();
		self.base = Some(BaseClass {
			def: base,
			project: Arc::new(move |instance| {
				let typed = instance.downcast_mut::<T>().ok_or_else(|| {
					ContextError::TypeMismatch {
						subject: format!("instance of {class_name}"),
						expected: std::any::type_name::<T>().to_string(),
					}
				})?;
				Ok(project(typed) as &mut AnyInstance)
			}),
		});
		self
	}

	/// Finishes the definition.
	pub fn build(self) -> Arc<ClassDefinition> {
		Arc::new(ClassDefinition {
			name: self.name,
			parameters: self.parameters,
			properties: self.properties,
			assigners: self.assigners,
			base: self.base,
			construct: self.construct,
		})
	}
}

/// A value factory whose own dependencies are injected.
///
/// Binding a provider class resolves and instantiates the provider, then
/// calls [`value`](Provider::value) to produce the bound value.
pub trait Provider: Any + Send + Sync {
	fn value(&self) -> ContextResult<ValueOrFuture>;
}

/// A [`ClassDefinition`] for a provider, paired with a type-erased call to
/// its [`Provider::value`] method.
#[derive(Clone)]
pub struct ProviderClass {
	pub(crate) def: Arc<ClassDefinition>,
	pub(crate) call: Arc<dyn Fn(&BoundValue) -> ContextResult<ValueOrFuture> + Send + Sync>,
}

impl std::fmt::Debug for ProviderClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProviderClass")
			.field("def", &self.def)
			.finish()
	}
}

impl<T: Provider> ClassBuilder<T> {
	/// Finishes the definition as a provider class.
	pub fn build_provider(self) -> ProviderClass {
		let class_name = self.name.clone();
		let def = self.build();
		ProviderClass {
			def,
			call: Arc::new(move |instance| {
				let provider = instance.downcast_ref::<T>().ok_or_else(|| {
					ContextError::TypeMismatch {
						subject: format!("provider instance of {class_name}"),
						expected: std::any::type_name::<T>().to_string(),
					}
				})?;
				provider.value()
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::inject::inject;

	struct Base {
		power: i64,
	}

	struct Derived {
		base: Base,
		label: String,
	}

	fn base_def() -> Arc<ClassDefinition> {
		ClassBuilder::new("Base", |_args| Ok(Base { power: 0 }))
			.inject_property("power", inject("power"), |base: &mut Base, value| {
				base.power = *value.downcast_ref::<i64>().ok_or_else(|| {
					ContextError::TypeMismatch {
						subject: "power".to_string(),
						expected: "i64".to_string(),
					}
				})?;
				Ok(())
			})
			.build()
	}

	fn derived_def() -> Arc<ClassDefinition> {
		ClassBuilder::new("Derived", |args: ConstructorArgs| {
			Ok(Derived {
				base: Base { power: 0 },
				label: args.get::<String>(0)?,
			})
		})
		.inject_argument(inject("label"))
		.inject_property("label", inject("label"), |derived: &mut Derived, value| {
			derived.label = value
				.downcast_ref::<String>()
				.cloned()
				.unwrap_or_default();
			Ok(())
		})
		.extends(base_def(), |derived: &mut Derived| &mut derived.base)
		.build()
	}

	#[test]
	fn merged_properties_put_own_class_first() {
		let def = derived_def();
		let merged = def.merged_properties();
		let names: Vec<&str> = merged.iter().map(|p| p.name()).collect();
		assert_eq!(names, vec!["label", "power"]);
	}

	#[test]
	fn base_property_is_assigned_through_projection() {
		let def = derived_def();
		let mut instance: Box<AnyInstance> = Box::new(Derived {
			base: Base { power: 0 },
			label: String::new(),
		});
		def.assign_property(&mut *instance, "power", BoundValue::new(9_i64))
			.unwrap();
		let derived = instance.downcast_ref::<Derived>().unwrap();
		assert_eq!(derived.base.power, 9);
	}

	#[test]
	fn constructor_args_report_position_on_type_mismatch() {
		let args = ConstructorArgs::new("Derived", vec![BoundValue::new(1_i64)]);
		let err = args.get::<String>(0).unwrap_err();
		assert!(err.to_string().contains("argument 1 of Derived"));
	}

	#[test]
	fn constructor_args_map_undefined_to_json_null() {
		let args = ConstructorArgs::new("Derived", vec![BoundValue::undefined()]);
		assert_eq!(args.json(0).unwrap(), serde_json::Value::Null);
	}
}
