//! Positional argument binding
//!
//! A resolved [`TypedValue`] becomes an [`Argument`] through the first
//! [`ArgumentFactory`] that accepts it. Arguments write themselves into a
//! [`StatementBinder`], the statement layer's 1-based parameter slots.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use propath_types::{PrimitiveType, Type};

use crate::config::ConfigRegistry;
use crate::error::{Error, Fault, Result};
use crate::value::{ObjectRef, TypedValue, Value};

// ============================================================================
// SQL types
// ============================================================================

/// Parameter type reported alongside a null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// Boolean
    Boolean,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    /// Double
    Double,
    /// Text
    Varchar,
    /// Bytes
    VarBinary,
    /// Unknown or object type
    Other,
}

impl SqlType {
    /// Parameter type for a declared type
    pub fn of(ty: &Type) -> Self {
        match ty.as_primitive() {
            Some(PrimitiveType::Boolean) => SqlType::Boolean,
            Some(PrimitiveType::Int) => SqlType::Integer,
            Some(PrimitiveType::Long) => SqlType::BigInt,
            Some(PrimitiveType::Double) => SqlType::Double,
            Some(PrimitiveType::String) => SqlType::Varchar,
            Some(PrimitiveType::Bytes) => SqlType::VarBinary,
            Some(PrimitiveType::Void) | None => SqlType::Other,
        }
    }
}

// ============================================================================
// Binder
// ============================================================================

/// Positional parameter sink; positions are 1-based
pub trait StatementBinder {
    /// Bind a boolean
    fn bind_bool(&mut self, position: usize, value: bool) -> std::result::Result<(), Fault>;
    /// Bind a 32-bit integer
    fn bind_int(&mut self, position: usize, value: i32) -> std::result::Result<(), Fault>;
    /// Bind a 64-bit integer
    fn bind_long(&mut self, position: usize, value: i64) -> std::result::Result<(), Fault>;
    /// Bind a double
    fn bind_double(&mut self, position: usize, value: f64) -> std::result::Result<(), Fault>;
    /// Bind text
    fn bind_string(&mut self, position: usize, value: &str) -> std::result::Result<(), Fault>;
    /// Bind bytes
    fn bind_bytes(&mut self, position: usize, value: &[u8]) -> std::result::Result<(), Fault>;
    /// Bind a host object
    fn bind_object(&mut self, position: usize, value: &ObjectRef) -> std::result::Result<(), Fault>;
    /// Bind a null of the given type
    fn bind_null(&mut self, position: usize, sql_type: SqlType) -> std::result::Result<(), Fault>;
}

/// One recorded binder call
#[derive(Debug, Clone, PartialEq)]
pub enum BindCall {
    /// `bind_bool`
    Bool(usize, bool),
    /// `bind_int`
    Int(usize, i32),
    /// `bind_long`
    Long(usize, i64),
    /// `bind_double`
    Double(usize, f64),
    /// `bind_string`
    String(usize, String),
    /// `bind_bytes`
    Bytes(usize, Vec<u8>),
    /// `bind_object`
    Object(usize, ObjectRef),
    /// `bind_null`
    Null(usize, SqlType),
}

/// Binder that records every call
#[derive(Debug, Default)]
pub struct RecordingBinder {
    calls: Vec<BindCall>,
}

impl RecordingBinder {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls in order
    pub fn calls(&self) -> &[BindCall] {
        &self.calls
    }

    /// Drain the recorded calls
    pub fn take(&mut self) -> Vec<BindCall> {
        std::mem::take(&mut self.calls)
    }

    fn record(&mut self, call: BindCall) -> std::result::Result<(), Fault> {
        self.calls.push(call);
        Ok(())
    }
}

impl StatementBinder for RecordingBinder {
    fn bind_bool(&mut self, position: usize, value: bool) -> std::result::Result<(), Fault> {
        self.record(BindCall::Bool(position, value))
    }

    fn bind_int(&mut self, position: usize, value: i32) -> std::result::Result<(), Fault> {
        self.record(BindCall::Int(position, value))
    }

    fn bind_long(&mut self, position: usize, value: i64) -> std::result::Result<(), Fault> {
        self.record(BindCall::Long(position, value))
    }

    fn bind_double(&mut self, position: usize, value: f64) -> std::result::Result<(), Fault> {
        self.record(BindCall::Double(position, value))
    }

    fn bind_string(&mut self, position: usize, value: &str) -> std::result::Result<(), Fault> {
        self.record(BindCall::String(position, value.to_string()))
    }

    fn bind_bytes(&mut self, position: usize, value: &[u8]) -> std::result::Result<(), Fault> {
        self.record(BindCall::Bytes(position, value.to_vec()))
    }

    fn bind_object(&mut self, position: usize, value: &ObjectRef) -> std::result::Result<(), Fault> {
        self.record(BindCall::Object(position, value.clone()))
    }

    fn bind_null(&mut self, position: usize, sql_type: SqlType) -> std::result::Result<(), Fault> {
        self.record(BindCall::Null(position, sql_type))
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// A value ready to be bound
pub trait Argument: fmt::Debug + Send + Sync {
    /// Write the value into slot `position`
    fn apply(&self, position: usize, binder: &mut dyn StatementBinder) -> Result<()>;
}

/// Non-null primitive value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArgument {
    value: Value,
}

impl ValueArgument {
    /// Argument over a value
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Bound value
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Argument for ValueArgument {
    fn apply(&self, position: usize, binder: &mut dyn StatementBinder) -> Result<()> {
        let bound = match &self.value {
            Value::Null => binder.bind_null(position, SqlType::Other),
            Value::Bool(v) => binder.bind_bool(position, *v),
            Value::Int(v) => binder.bind_int(position, *v),
            Value::Long(v) => binder.bind_long(position, *v),
            Value::Double(v) => binder.bind_double(position, *v),
            Value::Text(v) => binder.bind_string(position, v),
            Value::Bytes(v) => binder.bind_bytes(position, v),
            Value::Object(v) => binder.bind_object(position, v),
        };
        bound.map_err(|source| Error::Binding { position, source })
    }
}

/// Typed null
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullArgument {
    sql_type: SqlType,
}

impl NullArgument {
    /// Null of the given parameter type
    pub fn new(sql_type: SqlType) -> Self {
        Self { sql_type }
    }

    /// Null of a declared type
    pub fn of(ty: &Type) -> Self {
        Self::new(SqlType::of(ty))
    }

    /// Reported parameter type
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }
}

impl Argument for NullArgument {
    fn apply(&self, position: usize, binder: &mut dyn StatementBinder) -> Result<()> {
        binder
            .bind_null(position, self.sql_type)
            .map_err(|source| Error::Binding { position, source })
    }
}

/// Host object handed to the binder as-is
#[derive(Debug, Clone)]
pub struct ObjectArgument {
    object: ObjectRef,
    ty: Type,
}

impl ObjectArgument {
    /// Object with its declared type
    pub fn new(object: ObjectRef, ty: Type) -> Self {
        Self { object, ty }
    }

    /// Declared type
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

impl Argument for ObjectArgument {
    fn apply(&self, position: usize, binder: &mut dyn StatementBinder) -> Result<()> {
        binder
            .bind_object(position, &self.object)
            .map_err(|source| Error::Binding { position, source })
    }
}

// ============================================================================
// Factories
// ============================================================================

/// Turns typed values into arguments
pub trait ArgumentFactory: Send + Sync {
    /// Argument for `value`, or `None` to let the next factory try
    fn build(&self, value: &TypedValue, ctx: &ConfigRegistry) -> Result<Option<Box<dyn Argument>>>;
}

/// Catch-all factory for every value shape
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltInArgumentFactory;

impl ArgumentFactory for BuiltInArgumentFactory {
    fn build(&self, value: &TypedValue, _ctx: &ConfigRegistry) -> Result<Option<Box<dyn Argument>>> {
        let argument: Box<dyn Argument> = match &value.value {
            Value::Null => Box::new(NullArgument::of(&value.ty)),
            Value::Object(object) => Box::new(ObjectArgument::new(object.clone(), value.ty.clone())),
            other => Box::new(ValueArgument::new(other.clone())),
        };
        Ok(Some(argument))
    }
}

/// Argument factory registry, latest registration first
pub struct Arguments {
    factories: RwLock<Vec<Arc<dyn ArgumentFactory>>>,
}

impl Arguments {
    /// Registry with the built-in factory
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(vec![Arc::new(BuiltInArgumentFactory)]),
        }
    }

    /// Registry with no factories at all
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
        }
    }

    /// Add a factory ahead of every existing one
    pub fn register(&self, factory: Arc<dyn ArgumentFactory>) {
        self.factories.write().insert(0, factory);
    }

    /// Copy with the same factories
    pub fn create_copy(&self) -> Self {
        Self {
            factories: RwLock::new(self.factories.read().clone()),
        }
    }

    /// Argument for a typed value
    pub fn build(&self, value: &TypedValue, ctx: &ConfigRegistry) -> Result<Box<dyn Argument>> {
        let factories = self.factories.read().clone();
        for factory in factories {
            if let Some(argument) = factory.build(value, ctx)? {
                return Ok(argument);
            }
        }
        Err(Error::NoArgumentFactory {
            ty: value.ty.clone(),
        })
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::new()
    }
}
