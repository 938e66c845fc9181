//! Runtime values
//!
//! `Value` is what accessors return and setters accept. Host objects travel
//! as `ObjectRef`, a shared handle tagged with the object's runtime class so
//! nested path segments can find the next property model.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use propath_types::{ClassRef, PrimitiveType, Type};

use crate::error::Fault;

/// Exclusively owned object under construction
pub type Instance = Box<dyn Any + Send + Sync>;

/// Shared handle to a host object
#[derive(Clone)]
pub struct ObjectRef {
    class: ClassRef,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a host value as an instance of `class`
    pub fn new<T: Any + Send + Sync>(class: ClassRef, value: T) -> Self {
        Self {
            class,
            inner: Arc::new(value),
        }
    }

    /// Freeze an instance produced by a constructor or builder
    pub fn from_instance(class: ClassRef, instance: Instance) -> Self {
        Self {
            class,
            inner: Arc::from(instance),
        }
    }

    /// Runtime class
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Runtime type, as seen by the metadata cache
    pub fn runtime_type(&self) -> Type {
        Type::Class(self.class.clone())
    }

    /// Borrow the host object
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.inner
    }

    /// Borrow the host object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class, Arc::as_ptr(&self.inner))
    }
}

/// Dynamic value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Double precision float
    Double(f64),
    /// Text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Host object
    Object(ObjectRef),
}

impl Value {
    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Text(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
        }
    }

    /// Runtime type of the value (`Any` for null)
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Null => Type::Any,
            Value::Bool(_) => Type::boolean(),
            Value::Int(_) => Type::int(),
            Value::Long(_) => Type::long(),
            Value::Double(_) => Type::double(),
            Value::Text(_) => Type::string(),
            Value::Bytes(_) => Type::bytes(),
            Value::Object(obj) => obj.runtime_type(),
        }
    }

    /// Whether this value may be stored in a slot of `primitive` type
    pub fn fits(&self, primitive: PrimitiveType) -> bool {
        matches!(
            (self, primitive),
            (Value::Null, _)
                | (Value::Bool(_), PrimitiveType::Boolean)
                | (Value::Int(_), PrimitiveType::Int)
                | (Value::Int(_), PrimitiveType::Long)
                | (Value::Long(_), PrimitiveType::Long)
                | (Value::Double(_), PrimitiveType::Double)
                | (Value::Text(_), PrimitiveType::String)
                | (Value::Bytes(_), PrimitiveType::Bytes)
        )
    }

    /// Host object, if this is one
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Text, if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a Rust value
    pub fn extract<T: FromValue>(self) -> Result<T, Fault> {
        T::from_value(self)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion out of a [`Value`], used by typed setters
pub trait FromValue: Sized {
    /// Convert, failing with [`Fault::Mismatch`] on the wrong shape
    fn from_value(value: Value) -> Result<Self, Fault>;
}

fn mismatch(expected: &str, value: &Value) -> Fault {
    Fault::Mismatch(format!(
        "expected {} argument, got {}",
        expected,
        value.kind_name()
    ))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, Fault> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Int(i) => Ok(i64::from(i)),
            Value::Long(l) => Ok(l),
            other => Err(mismatch("long", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Double(d) => Ok(d),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, Fault> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Value carrying its declared type, even when null
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    /// Declared type of the slot the value came from
    pub ty: Type,
    /// The value itself
    pub value: Value,
}

impl TypedValue {
    /// Typed value
    pub fn new(ty: Type, value: impl Into<Value>) -> Self {
        Self {
            ty,
            value: value.into(),
        }
    }

    /// Typed null
    pub fn null(ty: Type) -> Self {
        Self {
            ty,
            value: Value::Null,
        }
    }

    /// Whether the value is absent
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}
