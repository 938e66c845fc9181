//! Named value lookup over object graphs

use propath_types::Type;
use tracing::debug;

use super::binding::Argument;
use super::path::{PathExpr, Segment};
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::value::{ObjectRef, TypedValue, Value};

/// Source of named, typed values rooted at one object
///
/// Implementors supply single-property lookups; [`ValueFinder::resolve`]
/// walks dotted paths on top of them.
pub trait ValueFinder: Send + Sync {
    /// Direct property `name` of the root object, `None` if it has none
    fn value(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<TypedValue>>;

    /// Finder of the same kind rooted at `object`, without a prefix
    fn nested(&self, object: ObjectRef) -> Box<dyn ValueFinder>;

    /// Declared type of property `name` on values of `ty`, without reading
    fn declared_type_of(&self, ty: &Type, name: &str, ctx: &ConfigRegistry) -> Result<Option<Type>>;

    /// Prefix every name must carry, followed by `.`
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Resolve a possibly dotted, possibly prefixed name
    ///
    /// `Ok(None)` is a soft miss: the prefix does not match, or some
    /// segment names a property that does not exist or is not an object.
    fn resolve(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<TypedValue>> {
        // malformed names fail whether or not the prefix matches
        let full = PathExpr::parse(name)?;
        let name = match self.prefix() {
            Some(prefix) => {
                let stripped = name
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('.'));
                match stripped {
                    Some(rest) => rest,
                    None => return Ok(None),
                }
            }
            None => return self.resolve_path(&full, 0, ctx),
        };
        let path = PathExpr::parse(name)?;
        self.resolve_path(&path, 0, ctx)
    }

    /// Resolve `path` from segment `from` onwards against the root object
    fn resolve_path(&self, path: &PathExpr, from: usize, ctx: &ConfigRegistry) -> Result<Option<TypedValue>> {
        let segments = path.segments();
        let Some(segment) = segments.get(from) else {
            return Ok(None);
        };
        let Some(found) = self.value(&segment.name, ctx)? else {
            debug!(path = %path, segment = %segment.name, "no such property");
            return Ok(None);
        };

        let rest = &segments[from + 1..];
        if rest.is_empty() {
            return Ok(Some(found));
        }

        match found.value {
            Value::Object(object) => self.nested(object).resolve_path(path, from + 1, ctx),
            Value::Null if segment.null_safe => {
                let ty = self.trailing_type(found.ty, rest, ctx)?;
                Ok(Some(TypedValue::null(ty)))
            }
            Value::Null => Err(Error::NullTraversal {
                path: path.to_string(),
                segment: segment.name.clone(),
            }),
            other => {
                debug!(path = %path, segment = %segment.name, kind = other.kind_name(), "cannot traverse into a non-object");
                Ok(None)
            }
        }
    }

    /// Declared type at the end of `rest`, starting from `ty`
    fn trailing_type(&self, ty: Type, rest: &[Segment], ctx: &ConfigRegistry) -> Result<Type> {
        let mut current = ty;
        for segment in rest {
            match self.declared_type_of(&current, &segment.name, ctx)? {
                Some(next) => current = next,
                None => return Ok(Type::Any),
            }
        }
        Ok(current)
    }
}

/// Name to bindable argument lookup
pub trait NamedArgumentFinder {
    /// Argument for `name`, `None` when this finder has no such value
    fn find(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<Box<dyn Argument>>>;
}

impl<T: ValueFinder + ?Sized> NamedArgumentFinder for T {
    fn find(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<Box<dyn Argument>>> {
        match self.resolve(name, ctx)? {
            Some(value) => ctx.arguments().build(&value, ctx).map(Some),
            None => Ok(None),
        }
    }
}
