//! Named argument resolution
//!
//! Resolves names such as `id`, `addr.city` or `addr?.city` against an
//! object graph and turns the result into a bindable [`Argument`].
//!
//! ## Resolution
//!
//! - a prefix that does not match, or a segment naming nothing, is a soft
//!   miss (`Ok(None)`) so the caller can try another finder
//! - a malformed path fails before any property is read
//! - a null met mid-path fails unless that segment is marked `?`, in which
//!   case the whole path resolves to a null typed as the last segment
//! - a non-object value met mid-path is a soft miss

mod bean;
mod binding;
mod finder;
mod object;
mod path;

pub use bean::BeanPropertyArguments;
pub use binding::{
    Argument, ArgumentFactory, Arguments, BindCall, BuiltInArgumentFactory, NullArgument,
    ObjectArgument, RecordingBinder, SqlType, StatementBinder, ValueArgument,
};
pub use finder::{NamedArgumentFinder, ValueFinder};
pub use object::ObjectMethodArguments;
pub use path::{PathError, PathExpr, Segment};

use crate::config::ConfigRegistry;
use crate::error::Result;
use crate::value::{ObjectRef, TypedValue};

/// Resolve `path` against the properties of `root`
pub fn resolve(root: &ObjectRef, path: &str, ctx: &ConfigRegistry) -> Result<Option<TypedValue>> {
    BeanPropertyArguments::new(None, root.clone()).resolve(path, ctx)
}
