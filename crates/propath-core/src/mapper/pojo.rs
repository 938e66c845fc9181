//! Property-model backed row mapper

use std::any::Any;
use std::sync::Arc;

use propath_types::{ClassRef, Type};
use tracing::debug;

use super::{ColumnMapper, ResultShape, Row, RowMapper, RowMapperFactory};
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::properties::PropertyModel;
use crate::value::Value;

/// Column to property assignment for one result shape
#[derive(Debug, Clone)]
struct ColumnBinding {
    index: usize,
    property: String,
    mapper: Arc<dyn ColumnMapper>,
}

/// Builds one object per row through the target type's property model
///
/// Columns match writable properties by name, ignoring case and `_`.
#[derive(Debug, Clone)]
pub struct PojoMapper {
    ty: Type,
    bindings: Option<Arc<[ColumnBinding]>>,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl PojoMapper {
    /// Mapper producing values of `ty`
    pub fn new(ty: Type) -> Self {
        Self { ty, bindings: None }
    }

    /// Produced type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Whether column positions are already resolved
    pub fn is_specialized(&self) -> bool {
        self.bindings.is_some()
    }

    fn bind(&self, model: &PropertyModel, shape: &ResultShape, ctx: &ConfigRegistry) -> Result<Arc<[ColumnBinding]>> {
        let columns: Vec<String> = shape.columns().iter().map(|c| normalize(c)).collect();
        let mut bindings = Vec::new();
        for property in model.properties().iter().filter(|p| p.is_writable()) {
            let wanted = normalize(property.name());
            let Some(index) = columns.iter().position(|c| *c == wanted) else {
                continue;
            };
            let mapper = ctx.column_mappers().find_for(property.ty(), ctx).ok_or_else(|| {
                Error::NoPropertyMapper {
                    property: property.name().to_string(),
                    ty: property.ty().clone(),
                }
            })?;
            bindings.push(ColumnBinding {
                index,
                property: property.name().to_string(),
                mapper,
            });
        }
        if bindings.is_empty() {
            return Err(Error::NoMatchingColumns { ty: self.ty.clone() });
        }
        debug!(ty = %self.ty, columns = bindings.len(), "columns bound to properties");
        Ok(bindings.into())
    }
}

impl RowMapper for PojoMapper {
    fn map(&self, row: &dyn Row, ctx: &ConfigRegistry) -> Result<Value> {
        let model = ctx.properties().properties_of(&self.ty)?;
        let bindings = match &self.bindings {
            Some(bindings) => Arc::clone(bindings),
            None => self.bind(&model, &ResultShape::of(row), ctx)?,
        };

        let mut builder = model.create()?;
        for binding in bindings.iter() {
            let value = binding.mapper.map(row, binding.index, ctx)?;
            builder.set(&binding.property, value)?;
        }
        builder.build().map(Value::Object)
    }

    fn specialize(&self, shape: &ResultShape, ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        let model = ctx.properties().properties_of(&self.ty)?;
        let bindings = self.bind(&model, shape, ctx)?;
        Ok(Some(Arc::new(PojoMapper {
            ty: self.ty.clone(),
            bindings: Some(bindings),
        })))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Maps any of a set of classes through a [`PojoMapper`] over one target
#[derive(Debug, Clone)]
pub struct PojoMapperFactory {
    target: Type,
    classes: Vec<ClassRef>,
}

impl PojoMapperFactory {
    /// Factory answering for `classes`, producing values of `target`
    pub fn new(target: Type, classes: Vec<ClassRef>) -> Self {
        Self { target, classes }
    }

    /// Factory for one class, producing that class
    pub fn of(class: ClassRef) -> Self {
        Self::new(Type::Class(class.clone()), vec![class])
    }
}

impl RowMapperFactory for PojoMapperFactory {
    fn build(&self, ty: &Type, _ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        let Some(class) = ty.erased() else {
            return Ok(None);
        };
        if !self.classes.contains(&class) {
            return Ok(None);
        }
        Ok(Some(Arc::new(PojoMapper::new(self.target.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Owner_Name"), "ownername");
        assert_eq!(normalize("ownerName"), "ownername");
    }
}
