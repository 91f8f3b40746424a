//! Application container and extension point conventions on top of
//! `mingus-context`.
//!
//! [`Application`] wraps a root context with registration conventions for
//! controllers, extension points and extensions; [`ExtensionPoint`] turns
//! the tag conventions into a discovery and configuration API.

pub mod application;
pub mod error;
pub mod extension_point;
pub mod keys;

pub use application::Application;
pub use error::{CoreError, CoreResult};
pub use extension_point::ExtensionPoint;
