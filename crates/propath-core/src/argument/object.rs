//! Zero-argument method backed value lookup

use propath_types::Type;

use super::finder::ValueFinder;
use crate::config::ConfigRegistry;
use crate::error::Result;
use crate::properties::AccessStyle;
use crate::value::{ObjectRef, TypedValue};

/// Resolves names to public zero-argument methods of the same name
///
/// Unlike [`BeanPropertyArguments`](super::BeanPropertyArguments) there is
/// no accessor naming convention: `name` calls `name()`.
#[derive(Debug, Clone)]
pub struct ObjectMethodArguments {
    prefix: Option<String>,
    object: ObjectRef,
}

impl ObjectMethodArguments {
    /// Finder over `object`, with an optional name prefix
    pub fn new(prefix: Option<&str>, object: ObjectRef) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            object,
        }
    }
}

impl ValueFinder for ObjectMethodArguments {
    fn value(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<TypedValue>> {
        let Some(method) = ctx.classes().find_getter(self.object.class(), name) else {
            return Ok(None);
        };
        let ty = ctx.classes().resolve_member_type(
            &method.return_type,
            &method.declaring,
            &self.object.runtime_type(),
        );
        let value = method
            .get(self.object.as_any())
            .map_err(|fault| AccessStyle::Bean.error(name, "getter", &method.name, fault))?;
        Ok(Some(TypedValue { ty, value }))
    }

    fn nested(&self, object: ObjectRef) -> Box<dyn ValueFinder> {
        Box::new(ObjectMethodArguments::new(None, object))
    }

    fn declared_type_of(&self, ty: &Type, name: &str, ctx: &ConfigRegistry) -> Result<Option<Type>> {
        let Some(class) = ty.erased() else {
            return Ok(None);
        };
        Ok(ctx
            .classes()
            .find_getter(&class, name)
            .map(|m| ctx.classes().resolve_member_type(&m.return_type, &m.declaring, ty)))
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}
