//! Row mapper reading a single column

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{ColumnMapper, ResultShape, Row, RowMapper};
use crate::config::ConfigRegistry;
use crate::error::{Error, Result};
use crate::value::Value;

/// Column a [`SingleColumnMapper`] reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// 1-based position
    Index(usize),
    /// Label, matched case-insensitively
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{}", i),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

/// Applies a column mapper to one column of every row
#[derive(Debug, Clone)]
pub struct SingleColumnMapper {
    mapper: Arc<dyn ColumnMapper>,
    column: ColumnRef,
}

impl SingleColumnMapper {
    /// Map the first column
    pub fn first(mapper: Arc<dyn ColumnMapper>) -> Self {
        Self::at(mapper, 1)
    }

    /// Map the column at a 1-based position
    pub fn at(mapper: Arc<dyn ColumnMapper>, position: usize) -> Self {
        Self {
            mapper,
            column: ColumnRef::Index(position),
        }
    }

    /// Map the column with the given label
    pub fn named(mapper: Arc<dyn ColumnMapper>, name: impl Into<String>) -> Self {
        Self {
            mapper,
            column: ColumnRef::Name(name.into()),
        }
    }

    /// Column read
    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    fn missing(&self) -> Error {
        Error::NoSuchColumn {
            column: self.column.to_string(),
        }
    }
}

impl RowMapper for SingleColumnMapper {
    fn map(&self, row: &dyn Row, ctx: &ConfigRegistry) -> Result<Value> {
        let index = match &self.column {
            ColumnRef::Index(position) => position.checked_sub(1).ok_or_else(|| self.missing())?,
            ColumnRef::Name(name) => row.index_of(name).ok_or_else(|| self.missing())?,
        };
        self.mapper.map(row, index, ctx)
    }

    fn specialize(&self, shape: &ResultShape, _ctx: &ConfigRegistry) -> Result<Option<Arc<dyn RowMapper>>> {
        let ColumnRef::Name(name) = &self.column else {
            return Ok(None);
        };
        let index = shape.index_of(name).ok_or_else(|| self.missing())?;
        Ok(Some(Arc::new(SingleColumnMapper::at(
            Arc::clone(&self.mapper),
            index + 1,
        ))))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
