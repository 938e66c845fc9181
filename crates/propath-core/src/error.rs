//! Error types
//!
//! Soft misses (a property or path segment that does not exist) are never
//! errors: lookups return `Ok(None)` so callers can fall back to another
//! source. Everything here is a hard failure that aborts the current
//! argument resolution or statement preparation.

use std::fmt;

use propath_types::{Type, TypeError};
use thiserror::Error;

use crate::argument::PathError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by host code
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by an invoker closure or a statement binder
#[derive(Debug, Error)]
pub enum Fault {
    /// The host refused access to the member
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The member ran and raised an error of its own
    #[error("{0}")]
    Raised(#[source] BoxError),

    /// Receiver or argument was not of the shape the member expects
    #[error("{0}")]
    Mismatch(String),

    /// An already-classified error, re-raised unchanged
    #[error(transparent)]
    Runtime(Box<Error>),
}

impl Fault {
    /// Wrap an error raised by host code
    pub fn raised(err: impl Into<BoxError>) -> Self {
        Fault::Raised(err.into())
    }

    /// Receiver downcast failure
    pub fn receiver(expected: &str) -> Self {
        Fault::Mismatch(format!("receiver is not an instance of {}", expected))
    }
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Fault::Runtime(Box::new(err))
    }
}

/// Errors surfaced by introspection, resolution, binding and mapping
#[derive(Debug, Error)]
pub enum Error {
    /// No strategy in the chain produced a property model
    #[error("Couldn't find properties for {ty}")]
    NoProperties {
        /// Requested type
        ty: Type,
    },

    /// An optional introspection strategy cannot be loaded
    #[error("Introspection strategy {strategy} unavailable: {reason}")]
    StrategyUnavailable {
        /// Strategy name
        strategy: &'static str,
        /// Why it cannot be loaded
        reason: String,
    },

    /// The target class has no usable zero-argument constructor
    #[error("A bean, {class}, was mapped which was not instantiable")]
    NotInstantiable {
        /// Class name
        class: String,
        /// Constructor failure, if the constructor ran
        #[source]
        source: Option<Fault>,
    },

    /// A class lacks entry points its strategy requires
    #[error("Failed to inspect {strategy} {class}: {reason}")]
    Inspection {
        /// Strategy name
        strategy: &'static str,
        /// Class under inspection
        class: String,
        /// What is missing
        reason: String,
    },

    /// A property descriptor was declared with neither reader nor writer
    #[error("Property {property} has neither a read nor a write accessor")]
    InaccessibleProperty {
        /// Property name
        property: String,
    },

    /// `set` on a property without a writer
    #[error("No appropriate method to write property {property}")]
    MissingWriter {
        /// Property name
        property: String,
    },

    /// `get` on a property without a reader
    #[error("No appropriate method to read property {property}")]
    MissingReader {
        /// Property name
        property: String,
    },

    /// Builder `set` by a name the model does not have
    #[error("No property {property} on {ty}")]
    UnknownProperty {
        /// Property name
        property: String,
        /// Model type
        ty: Type,
    },

    /// The host refused to invoke an accessor
    #[error("Unable to access {accessor} for property, {property}")]
    AccessDenied {
        /// Property name
        property: String,
        /// `getter` or `setter`
        accessor: &'static str,
        /// Underlying fault
        #[source]
        source: Fault,
    },

    /// An accessor raised while being invoked
    #[error("Invocation target exception trying to invoke {accessor} for the {property} property")]
    InvocationTarget {
        /// Property name
        property: String,
        /// `getter` or `setter`
        accessor: &'static str,
        /// Underlying fault
        #[source]
        source: Fault,
    },

    /// A builder-strategy binding failed at read, write or build time
    #[error("Couldn't execute {method} on {class}")]
    Execution {
        /// Class owning the binding
        class: String,
        /// Bound method
        method: String,
        /// Underlying fault
        #[source]
        source: Fault,
    },

    /// Syntactically malformed path expression
    #[error(transparent)]
    MalformedPath(#[from] PathError),

    /// Null met mid-path on a segment that is not null-safe
    #[error("Trying to bind nested argument {path}, but found null at {segment}")]
    NullTraversal {
        /// Full path expression
        path: String,
        /// Segment that produced null
        segment: String,
    },

    /// Entry slot without a registered row mapper
    #[error("No row mapper registered for map {slot} {ty}")]
    NoRowMapper {
        /// `key` or `value`
        slot: &'static str,
        /// Slot type
        ty: Type,
    },

    /// Entry slot without a column mapper for its configured column
    #[error("No column mapper registered for map {slot} {ty} in column {column}")]
    NoColumnMapper {
        /// `key` or `value`
        slot: &'static str,
        /// Slot type
        ty: Type,
        /// Configured column
        column: String,
    },

    /// No mapper of any kind for a type
    #[error("No mapper registered for type {ty}")]
    NoMapper {
        /// Requested type
        ty: Type,
    },

    /// A composite mapper found a column but cannot convert it
    #[error("No column mapper for property {property} of type {ty}")]
    NoPropertyMapper {
        /// Property name
        property: String,
        /// Property type
        ty: Type,
    },

    /// No argument factory accepted a value
    #[error("No argument factory registered for {ty}")]
    NoArgumentFactory {
        /// Declared type
        ty: Type,
    },

    /// Result does not contain a requested column
    #[error("Column {column} not found in result")]
    NoSuchColumn {
        /// Column label or 1-based index
        column: String,
    },

    /// Composite mapper matched none of the result columns
    #[error("Mapping {ty} didn't find any matching columns in result")]
    NoMatchingColumns {
        /// Target type
        ty: Type,
    },

    /// Column value of the wrong shape for its mapper
    #[error("Column {column} cannot be mapped to {ty}: found {found}")]
    ColumnType {
        /// Column label
        column: String,
        /// Expected type
        ty: Type,
        /// Value kind found
        found: &'static str,
    },

    /// The statement binder rejected a value
    #[error("Unable to bind argument at position {position}")]
    Binding {
        /// 1-based slot
        position: usize,
        /// Binder failure
        #[source]
        source: Fault,
    },

    /// Type descriptor failure
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Configuration file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing registration or invalid settings
    Configuration,
    /// Target type not instantiable or missing entry points
    Construction,
    /// Accessor missing, denied or raising
    Access,
    /// Builder-strategy binding failed while running
    Execution,
    /// Malformed path or null traversal
    IllegalTraversal,
    /// Result row does not fit the mapper
    Mapping,
    /// Binder rejected a value
    Binding,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Construction => "construction",
            ErrorKind::Access => "access",
            ErrorKind::Execution => "execution",
            ErrorKind::IllegalTraversal => "illegal_traversal",
            ErrorKind::Mapping => "mapping",
            ErrorKind::Binding => "binding",
        };
        write!(f, "{}", label)
    }
}

impl Error {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoProperties { .. }
            | Error::StrategyUnavailable { .. }
            | Error::NoRowMapper { .. }
            | Error::NoColumnMapper { .. }
            | Error::NoMapper { .. }
            | Error::NoPropertyMapper { .. }
            | Error::NoArgumentFactory { .. }
            | Error::Type(_)
            | Error::Config(_)
            | Error::Io(_) => ErrorKind::Configuration,
            Error::NotInstantiable { .. }
            | Error::Inspection { .. }
            | Error::InaccessibleProperty { .. } => ErrorKind::Construction,
            Error::MissingWriter { .. }
            | Error::MissingReader { .. }
            | Error::UnknownProperty { .. }
            | Error::AccessDenied { .. }
            | Error::InvocationTarget { .. } => ErrorKind::Access,
            Error::Execution { .. } => ErrorKind::Execution,
            Error::MalformedPath(_) | Error::NullTraversal { .. } => ErrorKind::IllegalTraversal,
            Error::NoSuchColumn { .. }
            | Error::NoMatchingColumns { .. }
            | Error::ColumnType { .. } => ErrorKind::Mapping,
            Error::Binding { .. } => ErrorKind::Binding,
        }
    }

    /// Message prefixed with its classification
    pub fn display_with_kind(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
