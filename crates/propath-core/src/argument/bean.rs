//! Property-model backed value lookup

use std::sync::Arc;

use once_cell::sync::OnceCell;
use propath_types::Type;

use super::finder::ValueFinder;
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::properties::PropertyModel;
use crate::value::{ObjectRef, TypedValue};

/// Resolves names against the properties of an object
///
/// The object's property model is fetched from the metadata cache on first
/// use and kept for the finder's lifetime.
#[derive(Debug)]
pub struct BeanPropertyArguments {
    prefix: Option<String>,
    object: ObjectRef,
    model: OnceCell<Arc<PropertyModel>>,
}

impl BeanPropertyArguments {
    /// Finder over `object`; names must start with `prefix.` when a
    /// non-empty prefix is given
    pub fn new(prefix: Option<&str>, object: ObjectRef) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            object,
            model: OnceCell::new(),
        }
    }

    /// Root object
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    fn model(&self, ctx: &ConfigRegistry) -> Result<&Arc<PropertyModel>> {
        self.model
            .get_or_try_init(|| ctx.properties().properties_of(&self.object.runtime_type()))
    }
}

impl ValueFinder for BeanPropertyArguments {
    fn value(&self, name: &str, ctx: &ConfigRegistry) -> Result<Option<TypedValue>> {
        let model = self.model(ctx)?;
        match model.property(name) {
            Some(property) => property.get_typed(&self.object).map(Some),
            None => Ok(None),
        }
    }

    fn nested(&self, object: ObjectRef) -> Box<dyn ValueFinder> {
        Box::new(BeanPropertyArguments::new(None, object))
    }

    fn declared_type_of(&self, ty: &Type, name: &str, ctx: &ConfigRegistry) -> Result<Option<Type>> {
        match ctx.properties().properties_of(ty) {
            Ok(model) => Ok(model.property(name).map(|p| p.ty().clone())),
            Err(Error::NoProperties { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}
