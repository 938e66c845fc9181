//! Class and method descriptors
//!
//! Every host class is described by a `ClassInfo` holding its hierarchy and
//! its methods. Each method carries an `Invoker`: a typed closure that
//! downcasts the receiver and calls into the host type, standing in for
//! reflective invocation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use propath_types::{ClassRef, Type};
use rustc_hash::FxHashMap;

use crate::annotation::{Annotation, Annotations};
use crate::error::Fault;
use crate::value::{FromValue, Instance, Value};

/// Zero-argument instance method
pub type Getter = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<Value, Fault> + Send + Sync>;

/// Single-argument instance method mutating its receiver
pub type Setter =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<(), Fault> + Send + Sync>;

/// Static method or constructor producing a fresh instance
pub type Factory = Arc<dyn Fn() -> Result<Instance, Fault> + Send + Sync>;

/// Callable body of a method
#[derive(Clone)]
pub enum Invoker {
    /// Static factory or constructor
    Factory(Factory),
    /// Zero-argument reader
    Getter(Getter),
    /// One-argument writer or fluent mutator
    Setter(Setter),
    /// Declared on a contract, no body
    Abstract,
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Invoker::Factory(_) => "Factory",
            Invoker::Getter(_) => "Getter",
            Invoker::Setter(_) => "Setter",
            Invoker::Abstract => "Abstract",
        };
        write!(f, "Invoker::{}", kind)
    }
}

/// Method visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable from anywhere
    Public,
    /// Hidden from introspection and refused on invocation
    Restricted,
}

/// Whether a class can be instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Concrete class
    Concrete,
    /// Contract (interface) implemented by other classes
    Contract,
}

/// Method descriptor
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Class declaring the method
    pub declaring: ClassRef,
    /// Declared return type, may mention the declaring class's type variables
    pub return_type: Type,
    /// Declared parameter types
    pub params: Vec<Type>,
    /// Static method
    pub is_static: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Compiler-generated bridge; never a property
    pub synthetic: bool,
    /// Method annotations
    pub annotations: Annotations,
    /// Body
    pub invoker: Invoker,
}

impl MethodInfo {
    /// Public instance method returning `void` with no parameters
    pub fn new(name: impl Into<String>, declaring: ClassRef, invoker: Invoker) -> Self {
        Self {
            name: name.into(),
            declaring,
            return_type: Type::void(),
            params: Vec::new(),
            is_static: false,
            visibility: Visibility::Public,
            synthetic: false,
            annotations: Annotations::new(),
            invoker,
        }
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check if the method is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Check if the method has a body
    pub fn is_abstract(&self) -> bool {
        matches!(self.invoker, Invoker::Abstract)
    }

    fn check_access(&self) -> Result<(), Fault> {
        match self.visibility {
            Visibility::Public => Ok(()),
            Visibility::Restricted => Err(Fault::AccessDenied(format!(
                "{}.{} is not public",
                self.declaring, self.name
            ))),
        }
    }

    fn wrong_kind(&self, expected: &str) -> Fault {
        Fault::Mismatch(format!(
            "{}.{} is not {} ({:?})",
            self.declaring, self.name, expected, self.invoker
        ))
    }

    /// Invoke a zero-argument reader
    pub fn get(&self, receiver: &(dyn Any + Send + Sync)) -> Result<Value, Fault> {
        self.check_access()?;
        match &self.invoker {
            Invoker::Getter(getter) => getter(receiver),
            _ => Err(self.wrong_kind("a reader")),
        }
    }

    /// Invoke a one-argument writer
    pub fn set(&self, receiver: &mut (dyn Any + Send + Sync), value: Value) -> Result<(), Fault> {
        self.check_access()?;
        match &self.invoker {
            Invoker::Setter(setter) => setter(receiver, value),
            _ => Err(self.wrong_kind("a writer")),
        }
    }

    /// Invoke a static factory or constructor
    pub fn call_static(&self) -> Result<Instance, Fault> {
        self.check_access()?;
        match &self.invoker {
            Invoker::Factory(factory) => factory(),
            _ => Err(self.wrong_kind("a factory")),
        }
    }
}

/// Class descriptor
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Described class
    pub class: ClassRef,
    /// Concrete class or contract
    pub kind: ClassKind,
    /// Superclass, parameterized when the class extends a generic class
    pub superclass: Option<Type>,
    /// Implemented (or, for contracts, extended) contracts
    pub interfaces: Vec<Type>,
    /// Class annotations
    pub annotations: Annotations,
    methods: Vec<MethodInfo>,
    method_indices: FxHashMap<String, Vec<usize>>,
    constructor: Option<MethodInfo>,
}

impl ClassInfo {
    /// Start describing a concrete class
    pub fn builder(class: ClassRef) -> ClassBuilder {
        ClassBuilder::new(class, ClassKind::Concrete)
    }

    /// Start describing a contract
    pub fn contract(class: ClassRef) -> ClassBuilder {
        ClassBuilder::new(class, ClassKind::Contract)
    }

    /// Check if this is a contract
    pub fn is_contract(&self) -> bool {
        self.kind == ClassKind::Contract
    }

    /// Methods declared by this class, in declaration order
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Declared methods with the given name
    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.method_indices
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.methods[i])
    }

    /// Declared method by name and parameter count
    pub fn method(&self, name: &str, arity: usize) -> Option<&MethodInfo> {
        self.methods_named(name).find(|m| m.arity() == arity)
    }

    /// Zero-argument constructor
    pub fn constructor(&self) -> Option<&MethodInfo> {
        self.constructor.as_ref()
    }

    /// Supertypes as declared: superclass first, then contracts
    pub fn declared_supertypes(&self) -> impl Iterator<Item = &Type> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}

/// Fluent `ClassInfo` constructor
///
/// The typed helpers downcast the receiver to `T`; a receiver of another
/// type fails with [`Fault::Mismatch`].
pub struct ClassBuilder {
    info: ClassInfo,
}

impl ClassBuilder {
    fn new(class: ClassRef, kind: ClassKind) -> Self {
        Self {
            info: ClassInfo {
                class,
                kind,
                superclass: None,
                interfaces: Vec::new(),
                annotations: Annotations::new(),
                methods: Vec::new(),
                method_indices: FxHashMap::default(),
                constructor: None,
            },
        }
    }

    fn class_name(&self) -> String {
        self.info.class.name().to_string()
    }

    /// Declare the superclass
    pub fn extends(mut self, superclass: impl Into<Type>) -> Self {
        self.info.superclass = Some(superclass.into());
        self
    }

    /// Declare an implemented contract
    pub fn implements(mut self, contract: impl Into<Type>) -> Self {
        self.info.interfaces.push(contract.into());
        self
    }

    /// Annotate the class
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.info.annotations.push(annotation);
        self
    }

    /// Annotate the most recently declared method
    pub fn annotate_method(mut self, annotation: Annotation) -> Self {
        if let Some(method) = self.info.methods.last_mut() {
            method.annotations.push(annotation);
        }
        self
    }

    /// Mark the most recently declared method as synthetic
    pub fn mark_synthetic(mut self) -> Self {
        if let Some(method) = self.info.methods.last_mut() {
            method.synthetic = true;
        }
        self
    }

    /// Declare a fully described method
    pub fn method(mut self, method: MethodInfo) -> Self {
        let index = self.info.methods.len();
        self.info
            .method_indices
            .entry(method.name.clone())
            .or_default()
            .push(index);
        self.info.methods.push(method);
        self
    }

    fn reader(self, name: &str, ty: Type, visibility: Visibility, getter: Getter) -> Self {
        let mut method = MethodInfo::new(name, self.info.class.clone(), Invoker::Getter(getter));
        method.return_type = ty;
        method.visibility = visibility;
        self.method(method)
    }

    fn writer(self, name: &str, param: Type, returns: Type, setter: Setter) -> Self {
        let mut method = MethodInfo::new(name, self.info.class.clone(), Invoker::Setter(setter));
        method.params = vec![param];
        method.return_type = returns;
        self.method(method)
    }

    fn typed_getter<T, F, R>(&self, f: F) -> Getter
    where
        T: Any,
        F: Fn(&T) -> Result<R, Fault> + Send + Sync + 'static,
        R: Into<Value> + 'static,
    {
        let class = self.class_name();
        Arc::new(move |receiver: &(dyn Any + Send + Sync)| -> Result<Value, Fault> {
            let this = receiver
                .downcast_ref::<T>()
                .ok_or_else(|| Fault::receiver(&class))?;
            f(this).map(Into::into)
        })
    }

    fn typed_setter<T, F, A>(&self, f: F) -> Setter
    where
        T: Any,
        F: Fn(&mut T, A) -> Result<(), Fault> + Send + Sync + 'static,
        A: FromValue + 'static,
    {
        let class = self.class_name();
        Arc::new(move |receiver: &mut (dyn Any + Send + Sync), value: Value| -> Result<(), Fault> {
            let this = receiver
                .downcast_mut::<T>()
                .ok_or_else(|| Fault::receiver(&class))?;
            f(this, A::from_value(value)?)
        })
    }

    /// Public zero-argument reader
    pub fn getter<T, F, R>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<Value> + 'static,
    {
        let getter = self.typed_getter(move |this: &T| Ok::<R, Fault>(f(this)));
        self.reader(name, ty, Visibility::Public, getter)
    }

    /// Public zero-argument reader that may fail
    pub fn try_getter<T, F, R>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<R, Fault> + Send + Sync + 'static,
        R: Into<Value> + 'static,
    {
        let getter = self.typed_getter(f);
        self.reader(name, ty, Visibility::Public, getter)
    }

    /// Non-public zero-argument reader
    pub fn restricted_getter<T, F, R>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<Value> + 'static,
    {
        let getter = self.typed_getter(move |this: &T| Ok::<R, Fault>(f(this)));
        self.reader(name, ty, Visibility::Restricted, getter)
    }

    /// Public one-argument writer returning `void`
    pub fn setter<T, F, A>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, A) + Send + Sync + 'static,
        A: FromValue + 'static,
    {
        let setter = self.typed_setter(move |this: &mut T, arg: A| {
            f(this, arg);
            Ok(())
        });
        self.writer(name, ty, Type::void(), setter)
    }

    /// Public one-argument writer that may fail
    pub fn try_setter<T, F, A>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, A) -> Result<(), Fault> + Send + Sync + 'static,
        A: FromValue + 'static,
    {
        let setter = self.typed_setter(f);
        self.writer(name, ty, Type::void(), setter)
    }

    /// Fluent builder method: one argument, returns the builder itself
    pub fn mutator<T, F, A>(self, name: &str, ty: Type, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut T, A) + Send + Sync + 'static,
        A: FromValue + 'static,
    {
        let setter = self.typed_setter(move |this: &mut T, arg: A| {
            f(this, arg);
            Ok(())
        });
        let returns = Type::Class(self.info.class.clone());
        self.writer(name, ty, returns, setter)
    }

    /// Zero-argument constructor
    pub fn constructor<T, F>(self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_constructor(move || Ok(f()))
    }

    /// Zero-argument constructor that may fail
    pub fn try_constructor<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, Fault> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move || -> Result<Instance, Fault> { f().map(|t| Box::new(t) as Instance) });
        let mut method = MethodInfo::new("new", self.info.class.clone(), Invoker::Factory(factory));
        method.is_static = true;
        method.return_type = Type::Class(self.info.class.clone());
        self.info.constructor = Some(method);
        self
    }

    /// Public static zero-argument factory
    pub fn static_factory<T, F>(self, name: &str, returns: Type, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || -> Result<Instance, Fault> { Ok(Box::new(f())) });
        let mut method = MethodInfo::new(name, self.info.class.clone(), Invoker::Factory(factory));
        method.is_static = true;
        method.return_type = returns;
        self.method(method)
    }

    /// Zero-argument method without a body
    pub fn abstract_method(self, name: &str, returns: Type) -> Self {
        let mut method = MethodInfo::new(name, self.info.class.clone(), Invoker::Abstract);
        method.return_type = returns;
        self.method(method)
    }

    /// Finish the description
    pub fn build(self) -> ClassInfo {
        self.info
    }
}
