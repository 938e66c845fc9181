//! Propath Core
//!
//! Object property introspection and dotted-path argument resolution:
//! - **Reflection**: host classes described as typed accessor closures (`reflect`)
//! - **Properties**: strategy-selected property models behind an expiring cache (`properties`)
//! - **Arguments**: path expressions, value finders and positional binding (`argument`)
//! - **Mapping**: column, row, composite and `Entry<K, V>` mappers (`mapper`)
//!
//! # Example
//!
//! ```rust,ignore
//! use propath_core::{resolve, ConfigRegistry, Reflect, Settings};
//!
//! let ctx = ConfigRegistry::new(Settings::default())?;
//! ctx.classes().register_type::<Order>();
//! ctx.classes().register_type::<Customer>();
//!
//! let order = Order::sample().into_object();
//! let city = resolve(&order, "customer?.city", &ctx)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Modules
// ============================================================================

/// Annotations attached to classes and members
pub mod annotation;

/// Named argument resolution and binding
pub mod argument;

/// Settings and the per-handle configuration container
pub mod config;

/// Error types
pub mod error;

/// Result row mapping
pub mod mapper;

/// Property models and introspection strategies
pub mod properties;

/// Host reflection surface
pub mod reflect;

/// Runtime values
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use annotation::{Annotation, Annotations};
pub use argument::{
    resolve, Argument, Arguments, BeanPropertyArguments, NamedArgumentFinder,
    ObjectMethodArguments, PathError, PathExpr, SqlType, StatementBinder, ValueFinder,
};
pub use config::{properties_of, ConfigRegistry, Settings};
pub use error::{Error, ErrorKind, Fault, Result};
pub use mapper::{
    build_entry_mapper, Entry, MapEntryMapper, MapEntryMapperFactory, MapEntryMappers, MapRow,
    PojoMapper, ResultShape, Row, RowMapper, SingleColumnMapper,
};
pub use properties::{
    BeanTaster, ImmutablesTaster, PropertiesFactory, PropertyBuilder, PropertyDescriptor,
    PropertyModel, Taster,
};
pub use reflect::{ClassInfo, ClassRegistry, MethodInfo, Reflect};
pub use value::{ObjectRef, TypedValue, Value};

pub use propath_types::{ClassRef, PrimitiveType, Type, TypeVar};
