//! Result row mapping
//!
//! Column mappers convert one column value; row mappers convert a whole row.
//! Both are found through registries keyed by the requested [`Type`], latest
//! registration first. A row mapper may be specialized for a result shape
//! before the first row arrives, so per-row work skips column lookups.

pub mod entry;
pub mod pojo;
pub mod single;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use propath_types::{PrimitiveType, Type};
use tracing::debug;

use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::value::Value;

pub use entry::{build_entry_mapper, Entry, MapEntryMapper, MapEntryMapperFactory, MapEntryMappers};
pub use pojo::{PojoMapper, PojoMapperFactory};
pub use single::{ColumnRef, SingleColumnMapper};

// ============================================================================
// Rows
// ============================================================================

/// One result row
pub trait Row {
    /// Column labels, in result order
    fn columns(&self) -> &[String];

    /// Value of the column at a 0-based index
    fn value(&self, index: usize) -> Option<&Value>;

    /// 0-based index of a column, matched case-insensitively
    fn index_of(&self, label: &str) -> Option<usize> {
        self.columns()
            .iter()
            .position(|c| c.eq_ignore_ascii_case(label))
    }
}

/// In-memory row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl MapRow {
    /// Empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column in place
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }
}

impl Row for MapRow {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Column labels of a result, known before any row is read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultShape {
    columns: Vec<String>,
}

impl ResultShape {
    /// Shape from column labels
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Shape of an existing row
    pub fn of(row: &dyn Row) -> Self {
        Self::new(row.columns().iter().cloned())
    }

    /// Column labels
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 0-based index of a column, matched case-insensitively
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(label))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the result has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// Column mappers
// ============================================================================

/// Converts one column of a row
pub trait ColumnMapper: fmt::Debug + Send + Sync {
    /// Map the column at 0-based `index`
    fn map(&self, row: &dyn Row, index: usize, ctx: &ConfigRegistry) -> Result<Value>;
}

fn column_value<'r>(row: &'r dyn Row, index: usize) -> Result<&'r Value> {
    row.value(index).ok_or_else(|| Error::NoSuchColumn {
        column: (index + 1).to_string(),
    })
}

fn column_label(row: &dyn Row, index: usize) -> String {
    row.columns()
        .get(index)
        .cloned()
        .unwrap_or_else(|| (index + 1).to_string())
}

/// Built-in mapper for a primitive type
///
/// A NULL column maps to the type's zero value for booleans and numbers;
/// text and bytes keep the NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveColumnMapper {
    ty: PrimitiveType,
}

impl PrimitiveColumnMapper {
    /// Mapper producing `ty`
    pub fn new(ty: PrimitiveType) -> Self {
        Self { ty }
    }
}

impl ColumnMapper for PrimitiveColumnMapper {
    fn map(&self, row: &dyn Row, index: usize, _ctx: &ConfigRegistry) -> Result<Value> {
        let value = column_value(row, index)?;
        match (value, self.ty) {
            (Value::Null, PrimitiveType::Boolean) => Ok(Value::Bool(false)),
            (Value::Null, PrimitiveType::Int) => Ok(Value::Int(0)),
            (Value::Null, PrimitiveType::Long) => Ok(Value::Long(0)),
            (Value::Null, PrimitiveType::Double) => Ok(Value::Double(0.0)),
            (Value::Int(v), PrimitiveType::Long) => Ok(Value::Long(i64::from(*v))),
            (v, ty) if v.fits(ty) => Ok(v.clone()),
            (v, ty) => Err(Error::ColumnType {
                column: column_label(row, index),
                ty: Type::Primitive(ty),
                found: v.kind_name(),
            }),
        }
    }
}

/// Returns the column value unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassThroughColumnMapper;

impl ColumnMapper for PassThroughColumnMapper {
    fn map(&self, row: &dyn Row, index: usize, _ctx: &ConfigRegistry) -> Result<Value> {
        column_value(row, index).cloned()
    }
}

/// Produces column mappers for the types it supports
pub trait ColumnMapperFactory: Send + Sync {
    /// Mapper for `ty`, or `None` to let the next factory try
    fn build(&self, ty: &Type, ctx: &ConfigRegistry) -> Option<Arc<dyn ColumnMapper>>;
}

/// Primitive and `Any` column mappers
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltInColumnMapperFactory;

impl ColumnMapperFactory for BuiltInColumnMapperFactory {
    fn build(&self, ty: &Type, _ctx: &ConfigRegistry) -> Option<Arc<dyn ColumnMapper>> {
        match ty {
            Type::Any => Some(Arc::new(PassThroughColumnMapper)),
            Type::Primitive(PrimitiveType::Void) => None,
            Type::Primitive(p) => Some(Arc::new(PrimitiveColumnMapper::new(*p))),
            _ => None,
        }
    }
}

/// Column mapper registry, latest registration first
pub struct ColumnMappers {
    factories: RwLock<Vec<Arc<dyn ColumnMapperFactory>>>,
}

impl ColumnMappers {
    /// Registry with the built-in mappers
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(vec![Arc::new(BuiltInColumnMapperFactory)]),
        }
    }

    /// Add a factory ahead of every existing one
    pub fn register(&self, factory: Arc<dyn ColumnMapperFactory>) {
        self.factories.write().insert(0, factory);
    }

    /// Copy with the same factories
    pub fn create_copy(&self) -> Self {
        Self {
            factories: RwLock::new(self.factories.read().clone()),
        }
    }

    /// Column mapper for `ty`
    pub fn find_for(&self, ty: &Type, ctx: &ConfigRegistry) -> Option<Arc<dyn ColumnMapper>> {
        let factories = self.factories.read().clone();
        factories.iter().find_map(|f| f.build(ty, ctx))
    }
}

impl Default for ColumnMappers {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Row mappers
// ============================================================================

/// Converts a whole row into a value
pub trait RowMapper: fmt::Debug + Send + Sync {
    /// Map one row
    fn map(&self, row: &dyn Row, ctx: &ConfigRegistry) -> Result<Value>;

    /// Mapper tuned for results of `shape`, or `None` when this one is
    /// already as good as it gets. Never modifies `self`.
    fn specialize(&self, _shape: &ResultShape, _ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        Ok(None)
    }

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

/// Specialize `mapper` for `shape`, keeping it when it has nothing to tune
pub fn specialize(
    mapper: &Arc<dyn RowMapper>,
    shape: &ResultShape,
    ctx: &ConfigRegistry,
) -> Result<Arc<dyn RowMapper>> {
    Ok(mapper
        .specialize(shape, ctx)?
        .unwrap_or_else(|| Arc::clone(mapper)))
}

/// Produces row mappers for the types it supports
pub trait RowMapperFactory: Send + Sync {
    /// Mapper for `ty`, or `None` to let the next factory try
    fn build(&self, ty: &Type, ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>>;
}

/// Row mapper registry, latest registration first
pub struct RowMappers {
    factories: RwLock<Vec<Arc<dyn RowMapperFactory>>>,
}

impl RowMappers {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
        }
    }

    /// Add a factory ahead of every existing one
    pub fn register(&self, factory: Arc<dyn RowMapperFactory>) {
        self.factories.write().insert(0, factory);
    }

    /// Copy with the same factories
    pub fn create_copy(&self) -> Self {
        Self {
            factories: RwLock::new(self.factories.read().clone()),
        }
    }

    /// Row mapper for `ty`
    ///
    /// Without a row mapper factory for `ty`, a column mapper for it is
    /// applied to the first column.
    pub fn find_for(&self, ty: &Type, ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        let factories = self.factories.read().clone();
        for factory in factories {
            if let Some(mapper) = factory.build(ty, ctx)? {
                return Ok(Some(mapper));
            }
        }
        let fallback = ctx.column_mappers().find_for(ty, ctx).map(|column| {
            debug!(ty = %ty, "mapping first column");
            Arc::new(SingleColumnMapper::first(column)) as Arc<dyn RowMapper>
        });
        Ok(fallback)
    }
}

impl Default for RowMappers {
    fn default() -> Self {
        Self::new()
    }
}
