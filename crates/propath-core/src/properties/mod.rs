//! Property models
//!
//! A `PropertyModel` is the immutable, strategy-selected description of a
//! type's named and typed properties, together with the recipe that builds
//! new instances of it. Models are produced by a [`Taster`] and shared as
//! `Arc<PropertyModel>` through the [`PropertiesFactory`] cache.

pub mod bean;
pub mod cache;
pub mod factory;
pub mod immutables;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use propath_types::{ClassRef, Type};
use rustc_hash::FxHashMap;

use crate::annotation::Annotations;
use crate::error::{Error, Fault, Result};
use crate::reflect::MethodInfo;
use crate::value::{Instance, ObjectRef, TypedValue, Value};

pub use bean::BeanTaster;
pub use cache::{Clock, ExpiringCache, ManualClock, SystemClock};
pub use factory::PropertiesFactory;
pub use immutables::ImmutablesTaster;

/// Introspection strategy
///
/// Declines with `Ok(None)`; fails only when the type matches but cannot be
/// described.
pub trait Taster: Send + Sync {
    /// Strategy name, for diagnostics
    fn name(&self) -> &'static str;

    /// Describe `ty`, if this strategy applies to it
    fn taste(&self, ty: &Type) -> Result<Option<PropertyModel>>;

    /// Whether this strategy would describe `ty` with some property
    ///
    /// Answers the ambiguity check. The default tastes; strategies override
    /// it to answer without building a model.
    fn applies(&self, ty: &Type) -> Result<bool> {
        Ok(self.taste(ty)?.is_some_and(|model| !model.is_empty()))
    }
}

// ============================================================================
// Access style
// ============================================================================

/// How accessor faults are reported
#[derive(Debug, Clone)]
pub enum AccessStyle {
    /// Mutable accessors: denied access and raising targets are told apart
    Bean,
    /// Builder bindings: every fault is an execution failure of `class`
    Immutables {
        /// Contract the bindings were resolved for
        class: ClassRef,
    },
}

impl AccessStyle {
    pub(crate) fn error(&self, property: &str, accessor: &'static str, method: &str, fault: Fault) -> Error {
        match (self, fault) {
            (_, Fault::Runtime(err)) => *err,
            (AccessStyle::Bean, source @ Fault::AccessDenied(_)) => Error::AccessDenied {
                property: property.to_string(),
                accessor,
                source,
            },
            (AccessStyle::Bean, source) => Error::InvocationTarget {
                property: property.to_string(),
                accessor,
                source,
            },
            (AccessStyle::Immutables { class }, source) => Error::Execution {
                class: class.to_string(),
                method: method.to_string(),
                source,
            },
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// One named, typed property
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    ty: Type,
    annotations: Annotations,
    reader: Option<MethodInfo>,
    writer: Option<MethodInfo>,
    style: AccessStyle,
}

impl PropertyDescriptor {
    /// Describe a property; at least one accessor is required
    pub fn new(
        name: impl Into<String>,
        ty: Type,
        annotations: Annotations,
        reader: Option<MethodInfo>,
        writer: Option<MethodInfo>,
        style: AccessStyle,
    ) -> Result<Self> {
        let name = name.into();
        if reader.is_none() && writer.is_none() {
            return Err(Error::InaccessibleProperty { property: name });
        }
        Ok(Self {
            name,
            ty,
            annotations,
            reader,
            writer,
            style,
        })
    }

    /// Effective name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Annotations of the accessors
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Read accessor
    pub fn reader(&self) -> Option<&MethodInfo> {
        self.reader.as_ref()
    }

    /// Write accessor
    pub fn writer(&self) -> Option<&MethodInfo> {
        self.writer.as_ref()
    }

    /// Check if the property can be read
    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    /// Check if the property can be written
    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Read the property from a host object
    pub fn get(&self, receiver: &(dyn Any + Send + Sync)) -> Result<Value> {
        let reader = self.reader.as_ref().ok_or_else(|| Error::MissingReader {
            property: self.name.clone(),
        })?;
        reader
            .get(receiver)
            .map_err(|fault| self.style.error(&self.name, "getter", &reader.name, fault))
    }

    /// Read the property, tagged with its declared type
    pub fn get_typed(&self, object: &ObjectRef) -> Result<TypedValue> {
        let value = self.get(object.as_any())?;
        Ok(TypedValue {
            ty: self.ty.clone(),
            value,
        })
    }

    /// Write the property into a builder
    pub fn set(&self, builder: &mut PropertyBuilder, value: Value) -> Result<()> {
        let writer = self.writer.as_ref().ok_or_else(|| Error::MissingWriter {
            property: self.name.clone(),
        })?;
        writer
            .set(builder.target_mut(), value)
            .map_err(|fault| self.style.error(&self.name, "setter", &writer.name, fault))
    }
}

// ============================================================================
// Model
// ============================================================================

/// How a model produces new instances
#[derive(Debug, Clone)]
pub enum Recipe {
    /// Zero-argument constructor; `build` returns the mutated instance
    Constructor {
        /// Class to instantiate
        class: ClassRef,
        /// Its constructor, if it has one
        constructor: Option<MethodInfo>,
    },
    /// Static builder factory; `build` runs the builder's terminal method
    Builder {
        /// Contract the properties come from
        contract: ClassRef,
        /// Implementation produced by the builder
        implementation: ClassRef,
        /// Static `builder()` on the implementation
        factory: MethodInfo,
        /// `build()` on the builder class
        build: MethodInfo,
    },
}

/// Immutable description of a type's properties
pub struct PropertyModel {
    ty: Type,
    strategy: &'static str,
    properties: Vec<PropertyDescriptor>,
    index: FxHashMap<String, usize>,
    recipe: Recipe,
}

impl PropertyModel {
    /// Assemble a model; a later property replaces an earlier one of the
    /// same name in place
    pub fn new(
        ty: Type,
        strategy: &'static str,
        descriptors: Vec<PropertyDescriptor>,
        recipe: Recipe,
    ) -> Self {
        let mut properties: Vec<PropertyDescriptor> = Vec::with_capacity(descriptors.len());
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for descriptor in descriptors {
            match index.get(descriptor.name()) {
                Some(&i) => properties[i] = descriptor,
                None => {
                    index.insert(descriptor.name().to_string(), properties.len());
                    properties.push(descriptor);
                }
            }
        }
        Self {
            ty,
            strategy,
            properties,
            index,
            recipe,
        }
    }

    /// Described type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Name of the strategy that produced the model
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    /// Properties in model order
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Property by effective name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    /// Property names in model order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name())
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the model has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Construction recipe
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Start a construction
    pub fn create(self: &Arc<Self>) -> Result<PropertyBuilder> {
        let target = match &self.recipe {
            Recipe::Constructor { class, constructor } => {
                let constructor = constructor.as_ref().ok_or_else(|| Error::NotInstantiable {
                    class: class.to_string(),
                    source: None,
                })?;
                let instance = constructor
                    .call_static()
                    .map_err(|fault| Error::NotInstantiable {
                        class: class.to_string(),
                        source: Some(fault),
                    })?;
                BuildTarget::Direct(instance)
            }
            Recipe::Builder {
                contract, factory, ..
            } => {
                let handle = factory
                    .call_static()
                    .map_err(|fault| execution_error(contract, &factory.name, fault))?;
                BuildTarget::Accumulating(handle)
            }
        };
        Ok(PropertyBuilder {
            model: Arc::clone(self),
            target,
        })
    }
}

impl fmt::Debug for PropertyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyModel")
            .field("ty", &self.ty)
            .field("strategy", &self.strategy)
            .field("properties", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn execution_error(class: &ClassRef, method: &str, fault: Fault) -> Error {
    AccessStyle::Immutables {
        class: class.clone(),
    }
    .error("", "", method, fault)
}

// ============================================================================
// Builder
// ============================================================================

/// Object under construction
pub enum BuildTarget {
    /// Pre-instantiated object, mutated in place and returned by `build`
    Direct(Instance),
    /// Builder handle accumulating values until `build`
    Accumulating(Instance),
}

/// Exclusively owned construction of one value
pub struct PropertyBuilder {
    model: Arc<PropertyModel>,
    target: BuildTarget,
}

impl PropertyBuilder {
    /// Model being constructed
    pub fn model(&self) -> &Arc<PropertyModel> {
        &self.model
    }

    /// Construction shape
    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    fn target_mut(&mut self) -> &mut (dyn Any + Send + Sync) {
        match &mut self.target {
            BuildTarget::Direct(instance) => &mut **instance,
            BuildTarget::Accumulating(handle) => &mut **handle,
        }
    }

    /// Write a property by effective name
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let model = Arc::clone(&self.model);
        let property = model.property(name).ok_or_else(|| Error::UnknownProperty {
            property: name.to_string(),
            ty: model.ty().clone(),
        })?;
        property.set(self, value.into())
    }

    /// Finish the construction
    pub fn build(self) -> Result<ObjectRef> {
        match (self.target, self.model.recipe()) {
            (BuildTarget::Direct(instance), Recipe::Constructor { class, .. }) => {
                Ok(ObjectRef::from_instance(class.clone(), instance))
            }
            (
                BuildTarget::Accumulating(handle),
                Recipe::Builder {
                    contract, build, ..
                },
            ) => match build.get(&*handle) {
                Ok(Value::Object(object)) => Ok(object),
                Ok(other) => Err(execution_error(
                    contract,
                    &build.name,
                    Fault::Mismatch(format!("build returned {}", other.kind_name())),
                )),
                Err(fault) => Err(execution_error(contract, &build.name, fault)),
            },
            (_, recipe) => Err(Error::Config(format!(
                "builder shape does not match recipe {:?}",
                recipe
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ClassInfo, Invoker};

    #[derive(Default)]
    struct Point {
        x: i64,
    }

    fn point_info() -> ClassInfo {
        ClassInfo::builder(ClassRef::new("Point"))
            .constructor(Point::default)
            .getter("get_x", Type::long(), |p: &Point| p.x)
            .setter("set_x", Type::long(), |p: &mut Point, v: i64| p.x = v)
            .try_setter("set_y", Type::long(), |_: &mut Point, _: i64| {
                Err(Fault::raised("y is fixed"))
            })
            .build()
    }

    fn point_model() -> Arc<PropertyModel> {
        let info = point_info();
        let x = PropertyDescriptor::new(
            "x",
            Type::long(),
            Annotations::new(),
            info.method("get_x", 0).cloned(),
            info.method("set_x", 1).cloned(),
            AccessStyle::Bean,
        )
        .unwrap();
        let y = PropertyDescriptor::new(
            "y",
            Type::long(),
            Annotations::new(),
            None,
            info.method("set_y", 1).cloned(),
            AccessStyle::Bean,
        )
        .unwrap();
        Arc::new(PropertyModel::new(
            Type::Class(info.class.clone()),
            "bean",
            vec![x, y],
            Recipe::Constructor {
                class: info.class.clone(),
                constructor: info.constructor().cloned(),
            },
        ))
    }

    #[test]
    fn test_descriptor_requires_accessor() {
        let err = PropertyDescriptor::new(
            "ghost",
            Type::Any,
            Annotations::new(),
            None,
            None,
            AccessStyle::Bean,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InaccessibleProperty { .. }));
    }

    #[test]
    fn test_direct_builder() {
        let model = point_model();
        let mut builder = model.create().unwrap();
        assert!(matches!(builder.target(), BuildTarget::Direct(_)));
        builder.set("x", 4i64).unwrap();
        let point = builder.build().unwrap();

        assert_eq!(point.downcast_ref::<Point>().unwrap().x, 4);
        let x = model.property("x").unwrap();
        assert_eq!(x.get(point.as_any()).unwrap(), Value::Long(4));
    }

    #[test]
    fn test_write_only_read_fails() {
        let model = point_model();
        let point = ObjectRef::new(ClassRef::new("Point"), Point::default());
        let err = model.property("y").unwrap().get(point.as_any()).unwrap_err();
        assert_eq!(err.to_string(), "No appropriate method to read property y");
    }

    #[test]
    fn test_raising_setter_is_invocation_target() {
        let model = point_model();
        let mut builder = model.create().unwrap();
        let err = builder.set("y", 1i64).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invocation target exception trying to invoke setter for the y property"
        );
    }

    #[test]
    fn test_unknown_property() {
        let model = point_model();
        let mut builder = model.create().unwrap();
        assert!(matches!(
            builder.set("z", 1i64),
            Err(Error::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_not_instantiable() {
        let model = Arc::new(PropertyModel::new(
            Type::Class(ClassRef::new("Abstract")),
            "bean",
            Vec::new(),
            Recipe::Constructor {
                class: ClassRef::new("Abstract"),
                constructor: None,
            },
        ));
        let err = model.create().err().unwrap();
        assert_eq!(
            err.to_string(),
            "A bean, Abstract, was mapped which was not instantiable"
        );
    }

    #[test]
    fn test_duplicate_names_replace_in_place() {
        let reader = MethodInfo::new(
            "a",
            ClassRef::new("Dup"),
            Invoker::Getter(Arc::new(|_: &(dyn Any + Send + Sync)| {
                Ok::<Value, Fault>(Value::Null)
            })),
        );
        let make = |name: &str, ty: Type| {
            PropertyDescriptor::new(
                name,
                ty,
                Annotations::new(),
                Some(reader.clone()),
                None,
                AccessStyle::Bean,
            )
            .unwrap()
        };
        let model = PropertyModel::new(
            Type::Class(ClassRef::new("Dup")),
            "bean",
            vec![make("a", Type::int()), make("b", Type::int()), make("a", Type::long())],
            Recipe::Constructor {
                class: ClassRef::new("Dup"),
                constructor: None,
            },
        );
        assert_eq!(model.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(model.property("a").unwrap().ty(), &Type::long());
    }

    #[test]
    fn test_runtime_fault_reraised() {
        let style = AccessStyle::Immutables {
            class: ClassRef::new("Value"),
        };
        let inner = Error::MissingReader {
            property: "p".to_string(),
        };
        let err = style.error("p", "getter", "p", Fault::from(inner));
        assert!(matches!(err, Error::MissingReader { .. }));

        let err = style.error("p", "getter", "p", Fault::raised("boom"));
        assert_eq!(err.to_string(), "Couldn't execute p on Value");
    }
}
