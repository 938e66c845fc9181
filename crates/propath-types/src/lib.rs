//! Propath Type Descriptors
//!
//! Nominal class references, type descriptors able to carry generic
//! arguments, and resolution of type variables against a parameterized type.

#![warn(missing_docs)]

pub mod error;
pub mod generics;
pub mod ty;

pub use error::TypeError;
pub use generics::{resolve_type, substitute};
pub use ty::{ClassRef, PrimitiveType, Type, TypeVar};
