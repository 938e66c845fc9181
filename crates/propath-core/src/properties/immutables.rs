//! Builder-based immutable value strategy
//!
//! Applies to classes implementing a contract tagged `immutable` or
//! `modifiable`, or a contract registered through
//! [`ImmutablesTaster::register`]. Properties are the contract's zero-argument
//! methods; values are read through the implementation's getters and built
//! through its static `builder()`.

use std::sync::Arc;

use parking_lot::RwLock;
use propath_types::{ClassRef, Type};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{AccessStyle, PropertyDescriptor, PropertyModel, Recipe, Taster};
use crate::annotation::{IMMUTABLE, MODIFIABLE};
use crate::error::{Error, Result};
use crate::reflect::{ClassInfo, ClassRegistry, MethodInfo};

const STRATEGY: &str = "Immutables";

/// Builder-based introspection
pub struct ImmutablesTaster {
    classes: Arc<ClassRegistry>,
    /// contract -> implementation
    registered: RwLock<FxHashMap<ClassRef, ClassRef>>,
}

impl ImmutablesTaster {
    /// Load the strategy
    ///
    /// Fails when the crate is built without the `immutables` feature; the
    /// caller is expected to continue without it.
    pub fn load(classes: Arc<ClassRegistry>) -> Result<Self> {
        #[cfg(feature = "immutables")]
        {
            Ok(Self::new(classes))
        }
        #[cfg(not(feature = "immutables"))]
        {
            let _ = classes;
            Err(Error::StrategyUnavailable {
                strategy: STRATEGY,
                reason: "built without the `immutables` feature".to_string(),
            })
        }
    }

    #[cfg_attr(not(feature = "immutables"), allow(dead_code))]
    fn new(classes: Arc<ClassRegistry>) -> Self {
        Self {
            classes,
            registered: RwLock::new(FxHashMap::default()),
        }
    }

    /// Copy sharing the class registry, with its own registrations
    pub fn create_copy(&self) -> Self {
        Self {
            classes: self.classes.clone(),
            registered: RwLock::new(self.registered.read().clone()),
        }
    }

    /// Treat `contract` as builder-producing, implemented by `implementation`
    pub fn register(&self, contract: ClassRef, implementation: ClassRef) {
        self.registered.write().insert(contract, implementation);
    }

    /// Implementation registered for a contract
    pub fn implementation_for(&self, contract: &ClassRef) -> Option<ClassRef> {
        self.registered.read().get(contract).cloned()
    }

    fn is_tagged(&self, contract: &ClassRef) -> bool {
        self.classes.get(contract).is_some_and(|info| {
            info.annotations.has(IMMUTABLE) || info.annotations.has(MODIFIABLE)
        })
    }

    /// Contract and implementation behind a requested class
    fn definition(&self, info: &ClassInfo) -> Option<(ClassRef, ClassRef)> {
        if info.is_contract() {
            let implementation = self.implementation_for(&info.class)?;
            return Some((info.class.clone(), implementation));
        }
        let contracts: Vec<ClassRef> = info.interfaces.iter().filter_map(Type::erased).collect();
        let registered = self.registered.read();
        if let Some(own) = contracts
            .iter()
            .find(|contract| registered.get(*contract) == Some(&info.class))
        {
            return Some((own.clone(), info.class.clone()));
        }
        // a contract registered to another implementation never binds here
        contracts
            .into_iter()
            .filter(|contract| !registered.contains_key(contract))
            .find(|contract| self.is_tagged(contract))
            .map(|contract| (contract, info.class.clone()))
    }

    fn is_property(method: &MethodInfo) -> bool {
        method.arity() == 0 && !method.synthetic && !method.is_static && !method.declaring.is_object()
    }

    fn bind(&self, ty: &Type, contract: &ClassRef, implementation: &ClassRef) -> Result<PropertyModel> {
        let fail = |reason: String| Error::Inspection {
            strategy: STRATEGY,
            class: contract.to_string(),
            reason,
        };

        let impl_info = self
            .classes
            .get(implementation)
            .ok_or_else(|| fail(format!("implementation {} is not registered", implementation)))?;

        let factory = impl_info
            .methods()
            .iter()
            .find(|m| m.name == "builder" && m.is_static && m.arity() == 0 && m.is_public())
            .cloned()
            .ok_or_else(|| fail(format!("{} has no static builder()", implementation)))?;

        let builder_class = factory
            .return_type
            .erased()
            .filter(|class| self.classes.contains(class))
            .ok_or_else(|| fail(format!("builder type {} is not registered", factory.return_type)))?;
        let builder_methods = self.classes.all_methods(&builder_class);

        let build = builder_methods
            .iter()
            .find(|m| {
                m.name == "build"
                    && m.arity() == 0
                    && !m.is_static
                    && m.return_type.erased().as_ref() == Some(implementation)
            })
            .cloned()
            .ok_or_else(|| {
                fail(format!("{} has no build() returning {}", builder_class, implementation))
            })?;

        let mut descriptors = Vec::new();
        for method in self.classes.all_methods(contract) {
            if !Self::is_property(&method) {
                continue;
            }
            let getter = self
                .classes
                .find_getter(implementation, &method.name)
                .ok_or_else(|| fail(format!("{} has no getter {}()", implementation, method.name)))?;

            let erased = method.return_type.erasure();
            let mutator = builder_methods
                .iter()
                .find(|m| {
                    m.name == method.name
                        && m.arity() == 1
                        && !m.is_static
                        && m.params[0].erasure() == erased
                        && m.return_type.erased().as_ref() == Some(&builder_class)
                })
                .cloned()
                .ok_or_else(|| {
                    fail(format!(
                        "{} has no {}({}) returning the builder",
                        builder_class, method.name, erased
                    ))
                })?;

            let declared = self
                .classes
                .resolve_member_type(&method.return_type, &method.declaring, ty);
            descriptors.push(PropertyDescriptor::new(
                method.name.clone(),
                declared,
                method.annotations.clone(),
                Some(getter),
                Some(mutator),
                AccessStyle::Immutables {
                    class: contract.clone(),
                },
            )?);
        }

        debug!(
            ty = %ty,
            contract = %contract,
            implementation = %implementation,
            properties = descriptors.len(),
            "immutable bindings resolved"
        );

        let recipe = Recipe::Builder {
            contract: contract.clone(),
            implementation: implementation.clone(),
            factory,
            build,
        };
        Ok(PropertyModel::new(ty.clone(), STRATEGY, descriptors, recipe))
    }
}

impl Taster for ImmutablesTaster {
    fn name(&self) -> &'static str {
        STRATEGY
    }

    fn taste(&self, ty: &Type) -> Result<Option<PropertyModel>> {
        let Some(info) = self.classes.lookup(ty) else {
            return Ok(None);
        };
        let Some((contract, implementation)) = self.definition(&info) else {
            return Ok(None);
        };
        self.bind(ty, &contract, &implementation).map(Some)
    }

    fn applies(&self, ty: &Type) -> Result<bool> {
        Ok(self
            .classes
            .lookup(ty)
            .is_some_and(|info| self.definition(&info).is_some()))
    }
}
