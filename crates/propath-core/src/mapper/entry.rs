//! Two-slot row mapping for `Entry<K, V>`
//!
//! Each slot maps either through a full row mapper for its type or, when a
//! column is configured for it in [`MapEntryMappers`], through a single
//! column mapper reading that column.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use propath_types::{resolve_type, ClassRef, Type, TypeVar};
use tracing::debug;

use super::single::SingleColumnMapper;
use super::{specialize, ResultShape, Row, RowMapper, RowMapperFactory};
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::reflect::{ClassInfo, Reflect};
use crate::value::Value;

const ENTRY_CLASS: &str = "Entry";

/// Key/value pair produced by entry mappers
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Key slot
    pub key: Value,
    /// Value slot
    pub value: Value,
}

impl Entry {
    /// Pair of two values
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `Entry<key, value>`
    pub fn of_types(key: Type, value: Type) -> Result<Type> {
        Ok(Type::parameterized(Self::class(), vec![key, value])?)
    }

    fn param(name: &str) -> Type {
        Type::Var(TypeVar {
            name: Arc::from(name),
            owner: Self::class(),
        })
    }
}

impl Reflect for Entry {
    fn class() -> ClassRef {
        ClassRef::generic(ENTRY_CLASS, &["K", "V"])
    }

    fn class_info() -> ClassInfo {
        ClassInfo::builder(Self::class())
            .getter("get_key", Self::param("K"), |e: &Entry| e.key.clone())
            .getter("get_value", Self::param("V"), |e: &Entry| e.value.clone())
            .build()
    }
}

// ============================================================================
// Column configuration
// ============================================================================

/// Columns the entry slots read from, when set
#[derive(Debug, Default)]
pub struct MapEntryMappers {
    key_column: RwLock<Option<String>>,
    value_column: RwLock<Option<String>>,
}

impl MapEntryMappers {
    /// Configuration with both slots mapped by row mappers
    pub fn new() -> Self {
        Self::default()
    }

    /// Column of the key slot
    pub fn key_column(&self) -> Option<String> {
        self.key_column.read().clone()
    }

    /// Column of the value slot
    pub fn value_column(&self) -> Option<String> {
        self.value_column.read().clone()
    }

    /// Read keys from `column`, or through a row mapper when `None`
    pub fn set_key_column(&self, column: Option<String>) {
        *self.key_column.write() = column;
    }

    /// Read values from `column`, or through a row mapper when `None`
    pub fn set_value_column(&self, column: Option<String>) {
        *self.value_column.write() = column;
    }

    /// Independent copy
    pub fn create_copy(&self) -> Self {
        Self {
            key_column: RwLock::new(self.key_column()),
            value_column: RwLock::new(self.value_column()),
        }
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Maps a row to an [`Entry`] through one mapper per slot
#[derive(Debug, Clone)]
pub struct MapEntryMapper {
    key: Arc<dyn RowMapper>,
    value: Arc<dyn RowMapper>,
}

impl MapEntryMapper {
    /// Mapper over two slot mappers
    pub fn new(key: Arc<dyn RowMapper>, value: Arc<dyn RowMapper>) -> Self {
        Self { key, value }
    }

    /// Key slot mapper
    pub fn key_mapper(&self) -> &Arc<dyn RowMapper> {
        &self.key
    }

    /// Value slot mapper
    pub fn value_mapper(&self) -> &Arc<dyn RowMapper> {
        &self.value
    }
}

impl RowMapper for MapEntryMapper {
    fn map(&self, row: &dyn Row, ctx: &ConfigRegistry) -> Result<Value> {
        let key = self.key.map(row, ctx)?;
        let value = self.value.map(row, ctx)?;
        Ok(Value::Object(Entry { key, value }.into_object()))
    }

    fn specialize(&self, shape: &ResultShape, ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        Ok(Some(Arc::new(MapEntryMapper {
            key: specialize(&self.key, shape, ctx)?,
            value: specialize(&self.value, shape, ctx)?,
        })))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Row mapper factory recognizing `Entry<K, V>`
#[derive(Debug, Default, Clone, Copy)]
pub struct MapEntryMapperFactory;

impl MapEntryMapperFactory {
    fn slot_type(ty: &Type, name: &str) -> Type {
        let var = TypeVar {
            name: Arc::from(name),
            owner: Entry::class(),
        };
        resolve_type(&var, ty).unwrap_or(Type::Var(var))
    }

    fn slot_mapper(
        slot: &'static str,
        ty: Type,
        column: Option<String>,
        ctx: &ConfigRegistry,
    ) -> Result<Arc<dyn RowMapper>> {
        match column {
            Some(column) => match ctx.column_mappers().find_for(&ty, ctx) {
                Some(mapper) => Ok(Arc::new(SingleColumnMapper::named(mapper, column))),
                None => Err(Error::NoColumnMapper { slot, ty, column }),
            },
            None => ctx
                .row_mappers()
                .find_for(&ty, ctx)?
                .ok_or(Error::NoRowMapper { slot, ty }),
        }
    }
}

impl RowMapperFactory for MapEntryMapperFactory {
    fn build(&self, ty: &Type, ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        if ty.erased() != Some(Entry::class()) {
            return Ok(None);
        }
        let key_ty = Self::slot_type(ty, "K");
        let value_ty = Self::slot_type(ty, "V");
        debug!(ty = %ty, key = %key_ty, value = %value_ty, "building entry mapper");

        let columns = ctx.map_entry();
        let key = Self::slot_mapper("key", key_ty, columns.key_column(), ctx)?;
        let value = Self::slot_mapper("value", value_ty, columns.value_column(), ctx)?;
        Ok(Some(Arc::new(MapEntryMapper::new(key, value))))
    }
}

/// Entry mapper for `ty`, which must be an `Entry<K, V>`
pub fn build_entry_mapper(ty: &Type, ctx: &ConfigRegistry) -> Result<Arc<dyn RowMapper>> {
    MapEntryMapperFactory
        .build(ty, ctx)?
        .ok_or_else(|| Error::NoMapper { ty: ty.clone() })
}
