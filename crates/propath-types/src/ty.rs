//! Core type descriptors

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::TypeError;

/// Name of the universal base class every class implicitly extends
pub const OBJECT_CLASS: &str = "object";

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// IEEE 754 double precision
    Double,
    /// UTF-8 text
    String,
    /// Raw bytes
    Bytes,
    /// No value (return type of setters)
    Void,
}

impl PrimitiveType {
    /// Lowercase name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Double => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::Void => "void",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Nominal reference to a class or contract
///
/// Identity is the name alone; the declared type parameters travel with the
/// reference so generic slots can be resolved without a registry lookup.
#[derive(Clone)]
pub struct ClassRef {
    name: Arc<str>,
    type_params: Arc<[Arc<str>]>,
}

impl ClassRef {
    /// Reference to a non-generic class
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            type_params: Arc::from(Vec::new()),
        }
    }

    /// Reference to a generic class declaring the given parameters in order
    pub fn generic(name: &str, params: &[&str]) -> Self {
        Self {
            name: Arc::from(name),
            type_params: params.iter().map(|p| Arc::from(*p)).collect(),
        }
    }

    /// The universal base class
    pub fn object() -> Self {
        Self::new(OBJECT_CLASS)
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type parameter names
    pub fn type_params(&self) -> &[Arc<str>] {
        &self.type_params
    }

    /// Whether this class declares type parameters
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Whether this is the universal base class
    pub fn is_object(&self) -> bool {
        &*self.name == OBJECT_CLASS
    }

    /// Position of a declared type parameter
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.type_params.iter().position(|p| &**p == name)
    }

    /// Type variable for one of this class's declared parameters
    pub fn type_var(&self, name: &str) -> Result<Type, TypeError> {
        if self.param_index(name).is_none() {
            return Err(TypeError::UndeclaredParameter {
                name: name.to_string(),
                class: self.name.to_string(),
            });
        }
        Ok(Type::Var(TypeVar {
            name: Arc::from(name),
            owner: self.clone(),
        }))
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.name)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Type variable declared by a generic class: T, K, V
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVar {
    /// Parameter name
    pub name: Arc<str>,
    /// Declaring class
    pub owner: ClassRef,
}

/// Type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Top type: any value, including objects of unknown class
    Any,

    /// Primitive value type
    Primitive(PrimitiveType),

    /// Raw (or non-generic) class
    Class(ClassRef),

    /// Generic class instantiation: Entry<string, long>
    Parameterized {
        /// Generic class
        raw: ClassRef,
        /// Arguments in declaration order
        args: Vec<Type>,
    },

    /// Unbound type variable
    Var(TypeVar),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Primitive(p) => write!(f, "{}", p),
            Type::Class(c) => write!(f, "{}", c),
            Type::Parameterized { raw, args } => {
                write!(f, "{}<", raw)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Type::Var(v) => write!(f, "{}", v.name),
        }
    }
}

impl From<PrimitiveType> for Type {
    fn from(p: PrimitiveType) -> Self {
        Type::Primitive(p)
    }
}

impl From<ClassRef> for Type {
    fn from(c: ClassRef) -> Self {
        Type::Class(c)
    }
}

impl Type {
    /// `boolean`
    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveType::Boolean)
    }

    /// `int`
    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    /// `long`
    pub fn long() -> Self {
        Type::Primitive(PrimitiveType::Long)
    }

    /// `double`
    pub fn double() -> Self {
        Type::Primitive(PrimitiveType::Double)
    }

    /// `string`
    pub fn string() -> Self {
        Type::Primitive(PrimitiveType::String)
    }

    /// `bytes`
    pub fn bytes() -> Self {
        Type::Primitive(PrimitiveType::Bytes)
    }

    /// `void`
    pub fn void() -> Self {
        Type::Primitive(PrimitiveType::Void)
    }

    /// Instantiate a generic class, checking the argument count
    pub fn parameterized(raw: ClassRef, args: Vec<Type>) -> Result<Self, TypeError> {
        if raw.type_params().len() != args.len() {
            return Err(TypeError::InvalidTypeArgCount {
                class: raw.name().to_string(),
                expected: raw.type_params().len(),
                actual: args.len(),
            });
        }
        Ok(Type::Parameterized { raw, args })
    }

    /// Check if this type is a primitive type
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Check if this is the top type
    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Get the primitive type if this is a primitive
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Raw class behind this type
    ///
    /// `Any` erases to the universal base class; primitives and unbound
    /// variables have no class.
    pub fn erased(&self) -> Option<ClassRef> {
        match self {
            Type::Any => Some(ClassRef::object()),
            Type::Class(c) => Some(c.clone()),
            Type::Parameterized { raw, .. } => Some(raw.clone()),
            Type::Primitive(_) | Type::Var(_) => None,
        }
    }

    /// Type with generic information removed
    pub fn erasure(&self) -> Type {
        match self {
            Type::Parameterized { raw, .. } => Type::Class(raw.clone()),
            Type::Var(_) => Type::Any,
            other => other.clone(),
        }
    }

    /// Type arguments if this is a parameterized type
    pub fn type_args(&self) -> &[Type] {
        match self {
            Type::Parameterized { args, .. } => args,
            _ => &[],
        }
    }
}
