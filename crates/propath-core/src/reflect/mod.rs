//! Host reflection surface
//!
//! Rust has no runtime reflection, so host classes describe themselves:
//! either by implementing [`Reflect`] or by registering a hand-built
//! [`ClassInfo`] with a [`ClassRegistry`].
//!
//! ## Usage
//!
//! ```ignore
//! struct Person { name: String }
//!
//! impl Reflect for Person {
//!     fn class() -> ClassRef { ClassRef::new("Person") }
//!
//!     fn class_info() -> ClassInfo {
//!         ClassInfo::builder(Self::class())
//!             .constructor(|| Person { name: String::new() })
//!             .getter("get_name", Type::string(), |p: &Person| p.name.clone())
//!             .setter("set_name", Type::string(), |p: &mut Person, v: String| p.name = v)
//!             .build()
//!     }
//! }
//! ```

mod class_info;
mod registry;

use std::any::Any;

use propath_types::ClassRef;

use crate::value::ObjectRef;

pub use class_info::{
    ClassBuilder, ClassInfo, ClassKind, Factory, Getter, Invoker, MethodInfo, Setter, Visibility,
};
pub use registry::ClassRegistry;

/// A Rust type exposed as a host class
pub trait Reflect: Any + Send + Sync + Sized {
    /// Runtime class of every value of this type
    fn class() -> ClassRef;

    /// Descriptor to register with a [`ClassRegistry`]
    fn class_info() -> ClassInfo;

    /// Wrap the value as a host object
    fn into_object(self) -> ObjectRef {
        ObjectRef::new(Self::class(), self)
    }
}
