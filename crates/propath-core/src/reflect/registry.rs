//! Class registry
//!
//! Concurrent map from class to its descriptor, plus the hierarchy queries
//! the introspection strategies need: inherited methods, supertype walks and
//! generic member type resolution.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use propath_types::{substitute, ClassRef, Type};
use rustc_hash::FxHashSet;

use super::class_info::{ClassInfo, Getter, Invoker, MethodInfo};
use super::Reflect;
use crate::error::Fault;
use crate::mapper::entry::Entry;
use crate::value::Value;

static GLOBAL: Lazy<Arc<ClassRegistry>> = Lazy::new(|| Arc::new(ClassRegistry::new()));

/// Registry of host class descriptors
pub struct ClassRegistry {
    classes: DashMap<ClassRef, Arc<ClassInfo>>,
}

impl ClassRegistry {
    /// Registry holding the universal base class and `Entry<K, V>`
    pub fn new() -> Self {
        let registry = Self {
            classes: DashMap::new(),
        };
        registry.register(object_class_info());
        registry.register_type::<Entry>();
        registry
    }

    /// Process-wide registry
    pub fn global() -> Arc<ClassRegistry> {
        GLOBAL.clone()
    }

    /// Register (or replace) a class descriptor
    pub fn register(&self, info: ClassInfo) -> Arc<ClassInfo> {
        let info = Arc::new(info);
        self.classes.insert(info.class.clone(), info.clone());
        info
    }

    /// Register a type's own descriptor
    pub fn register_type<T: Reflect>(&self) -> Arc<ClassInfo> {
        self.register(T::class_info())
    }

    /// Descriptor of a class
    pub fn get(&self, class: &ClassRef) -> Option<Arc<ClassInfo>> {
        self.classes.get(class).map(|entry| entry.clone())
    }

    /// Descriptor of a type's erased class
    pub fn lookup(&self, ty: &Type) -> Option<Arc<ClassInfo>> {
        ty.erased().and_then(|class| self.get(&class))
    }

    /// Check if a class is registered
    pub fn contains(&self, class: &ClassRef) -> bool {
        self.classes.contains_key(class)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Every class above `class`, breadth first, the universal base last
    ///
    /// Unregistered supertypes are listed but not walked.
    pub fn supertypes(&self, class: &ClassRef) -> Vec<ClassRef> {
        let mut seen = FxHashSet::default();
        seen.insert(class.clone());
        let mut out = Vec::new();
        let mut queue = VecDeque::from([class.clone()]);

        while let Some(current) = queue.pop_front() {
            let Some(info) = self.get(&current) else {
                continue;
            };
            for sup in info.declared_supertypes() {
                let Some(raw) = sup.erased() else {
                    continue;
                };
                if raw.is_object() || !seen.insert(raw.clone()) {
                    continue;
                }
                out.push(raw.clone());
                queue.push_back(raw);
            }
        }

        if !class.is_object() {
            out.push(ClassRef::object());
        }
        out
    }

    /// Every method visible on `class`
    ///
    /// Own methods first, then supertypes in [`supertypes`](Self::supertypes)
    /// order. A method is hidden when one with the same name and erased
    /// parameter types was already seen lower in the hierarchy.
    pub fn all_methods(&self, class: &ClassRef) -> Vec<MethodInfo> {
        let mut seen: FxHashSet<(String, Vec<Type>)> = FxHashSet::default();
        let mut out = Vec::new();

        let chain = std::iter::once(class.clone()).chain(self.supertypes(class));
        for current in chain {
            let Some(info) = self.get(&current) else {
                continue;
            };
            for method in info.methods() {
                if method.is_static {
                    if current == *class {
                        out.push(method.clone());
                    }
                    continue;
                }
                let params = method.params.iter().map(Type::erasure).collect();
                if seen.insert((method.name.clone(), params)) {
                    out.push(method.clone());
                }
            }
        }
        out
    }

    /// Public zero-argument instance method with a body, by exact name
    pub fn find_getter(&self, class: &ClassRef, name: &str) -> Option<MethodInfo> {
        self.all_methods(class).into_iter().find(|m| {
            m.name == name
                && m.is_public()
                && !m.is_static
                && m.arity() == 0
                && matches!(m.invoker, Invoker::Getter(_))
        })
    }

    /// View `ty` as an instantiation of `target`
    ///
    /// Walks the declared supertypes, substituting type arguments on the
    /// way up: with `SubValue<X, T> extends BaseValue<T>`, viewing
    /// `SubValue<string, int>` as `BaseValue` yields `BaseValue<int>`.
    pub fn as_super(&self, ty: &Type, target: &ClassRef) -> Option<Type> {
        let mut seen = FxHashSet::default();
        self.as_super_inner(ty, target, &mut seen)
    }

    fn as_super_inner(
        &self,
        ty: &Type,
        target: &ClassRef,
        seen: &mut FxHashSet<ClassRef>,
    ) -> Option<Type> {
        let raw = ty.erased()?;
        if raw == *target {
            return Some(ty.clone());
        }
        if !seen.insert(raw.clone()) {
            return None;
        }
        let info = self.get(&raw)?;
        let found = info
            .declared_supertypes()
            .map(|sup| substitute(sup, ty))
            .find_map(|bound| self.as_super_inner(&bound, target, seen));
        found
    }

    /// Declared type of a member of `declaring`, as seen from `within`
    ///
    /// Type variables that `within` does not bind erase to `Any`.
    pub fn resolve_member_type(&self, member: &Type, declaring: &ClassRef, within: &Type) -> Type {
        let resolved = match self.as_super(within, declaring) {
            Some(view) => substitute(member, &view),
            None => member.clone(),
        };
        match resolved {
            Type::Var(_) => Type::Any,
            other => other,
        }
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn object_class_info() -> ClassInfo {
    let object = ClassRef::object();

    let to_string: Getter = Arc::new(|receiver: &(dyn Any + Send + Sync)| -> Result<Value, Fault> {
        Ok(Value::Text(format!(
            "object@{:p}",
            receiver as *const (dyn Any + Send + Sync)
        )))
    });
    let hash_code: Getter = Arc::new(|receiver: &(dyn Any + Send + Sync)| -> Result<Value, Fault> {
        let addr = receiver as *const (dyn Any + Send + Sync) as *const () as usize;
        Ok(Value::Long(addr as i64))
    });

    let mut to_string = MethodInfo::new("to_string", object.clone(), Invoker::Getter(to_string));
    to_string.return_type = Type::string();
    let mut hash_code = MethodInfo::new("hash_code", object.clone(), Invoker::Getter(hash_code));
    hash_code.return_type = Type::long();

    ClassInfo::builder(object)
        .method(to_string)
        .method(hash_code)
        .build()
}
