//! Mutable-accessor strategy
//!
//! Pairs `get_<p>` / `is_<p>` readers with `set_<p>` writers. New instances
//! come from the zero-argument constructor and are mutated in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use propath_types::{PrimitiveType, Type};
use tracing::debug;

use super::{AccessStyle, PropertyDescriptor, PropertyModel, Recipe, Taster};
use crate::annotation::{Annotations, COLUMN_NAME};
use crate::error::Result;
use crate::reflect::{ClassRegistry, MethodInfo};

/// Accessor-pair introspection, the fallback strategy of the chain
pub struct BeanTaster {
    classes: Arc<ClassRegistry>,
}

#[derive(Default)]
struct Accessors {
    reader: Option<MethodInfo>,
    writer: Option<MethodInfo>,
    writers: Vec<MethodInfo>,
}

impl BeanTaster {
    /// Taster over the given registry
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self { classes }
    }

    fn reader_name(method: &MethodInfo) -> Option<&str> {
        if method.arity() != 0 {
            return None;
        }
        if let Some(name) = method.name.strip_prefix("get_") {
            if method.return_type != Type::void() {
                return Some(name);
            }
        }
        if let Some(name) = method.name.strip_prefix("is_") {
            if method.return_type.as_primitive() == Some(PrimitiveType::Boolean) {
                return Some(name);
            }
        }
        None
    }

    fn writer_name(method: &MethodInfo) -> Option<&str> {
        if method.arity() != 1 {
            return None;
        }
        method.name.strip_prefix("set_")
    }

    fn collect(&self, methods: Vec<MethodInfo>) -> BTreeMap<String, Accessors> {
        let mut found: BTreeMap<String, Accessors> = BTreeMap::new();
        for method in methods {
            if !method.is_public() || method.is_static || method.declaring.is_object() {
                continue;
            }
            if let Some(name) = Self::reader_name(&method).filter(|n| !n.is_empty()) {
                let slot = found.entry(name.to_string()).or_default();
                // `is_` wins over `get_` for the same property
                if slot.reader.is_none() || method.name.starts_with("is_") {
                    slot.reader = Some(method);
                }
            } else if let Some(name) = Self::writer_name(&method).filter(|n| !n.is_empty()) {
                found.entry(name.to_string()).or_default().writers.push(method);
            }
        }

        for accessors in found.values_mut() {
            let writers = std::mem::take(&mut accessors.writers);
            // a writer pairs with a reader only when their types agree
            let matching = match accessors.reader.as_ref() {
                Some(reader) => {
                    let wanted = reader.return_type.erasure();
                    writers.iter().position(|w| w.params[0].erasure() == wanted)
                }
                None => Some(0),
            };
            accessors.writer = matching.and_then(|i| writers.into_iter().nth(i));
        }
        found
    }

    fn describe(&self, ty: &Type, structural: String, accessors: Accessors) -> Result<PropertyDescriptor> {
        let Accessors { reader, writer, .. } = accessors;

        let name = [reader.as_ref(), writer.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|m| m.annotations.value_of(COLUMN_NAME))
            .map(str::to_string)
            .unwrap_or(structural);

        let declared = match (&reader, &writer) {
            (Some(r), _) => self
                .classes
                .resolve_member_type(&r.return_type, &r.declaring, ty),
            (None, Some(w)) => self
                .classes
                .resolve_member_type(&w.params[0], &w.declaring, ty),
            (None, None) => Type::Any,
        };

        let mut annotations = Annotations::new();
        for method in [reader.as_ref(), writer.as_ref()].into_iter().flatten() {
            annotations.extend(&method.annotations);
        }

        PropertyDescriptor::new(name, declared, annotations, reader, writer, AccessStyle::Bean)
    }
}

impl Taster for BeanTaster {
    fn name(&self) -> &'static str {
        "bean"
    }

    fn taste(&self, ty: &Type) -> Result<Option<PropertyModel>> {
        let Some(info) = self.classes.lookup(ty) else {
            return Ok(None);
        };

        let found = self.collect(self.classes.all_methods(&info.class));
        let mut descriptors = Vec::with_capacity(found.len());
        for (structural, accessors) in found {
            descriptors.push(self.describe(ty, structural, accessors)?);
        }
        debug!(ty = %ty, properties = descriptors.len(), "bean properties discovered");

        let recipe = Recipe::Constructor {
            class: info.class.clone(),
            constructor: info.constructor().cloned(),
        };
        Ok(Some(PropertyModel::new(ty.clone(), self.name(), descriptors, recipe)))
    }

    fn applies(&self, ty: &Type) -> Result<bool> {
        let Some(info) = self.classes.lookup(ty) else {
            return Ok(false);
        };
        Ok(self.classes.all_methods(&info.class).iter().any(|method| {
            method.is_public()
                && !method.is_static
                && !method.declaring.is_object()
                && Self::reader_name(method)
                    .or_else(|| Self::writer_name(method))
                    .is_some_and(|name| !name.is_empty())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::error::{Error, Fault};
    use crate::reflect::ClassInfo;
    use crate::value::{ObjectRef, Value};
    use propath_types::ClassRef;

    #[derive(Default)]
    struct Account {
        owner: String,
        active: bool,
        balance: i64,
    }

    fn account() -> ClassRef {
        ClassRef::new("Account")
    }

    fn taster() -> BeanTaster {
        let classes = Arc::new(ClassRegistry::new());
        classes.register(
            ClassInfo::builder(account())
                .constructor(Account::default)
                .getter("get_owner", Type::string(), |a: &Account| a.owner.clone())
                .annotate_method(Annotation::column_name("owner_name"))
                .setter("set_owner", Type::string(), |a: &mut Account, v: String| a.owner = v)
                .annotate_method(Annotation::column_name("ignored"))
                .getter("is_active", Type::boolean(), |a: &Account| a.active)
                .setter("set_active", Type::boolean(), |a: &mut Account, v: bool| a.active = v)
                .getter("is_balance", Type::long(), |a: &Account| a.balance)
                .restricted_getter("get_secret", Type::string(), |_: &Account| "s")
                .try_setter("set_secret", Type::string(), |_: &mut Account, _: String| {
                    Err(Fault::AccessDenied("secret is sealed".to_string()))
                })
                .build(),
        );
        BeanTaster::new(classes)
    }

    fn model() -> Arc<PropertyModel> {
        Arc::new(taster().taste(&Type::Class(account())).unwrap().unwrap())
    }

    #[test]
    fn test_properties_sorted_by_structural_name() {
        let model = model();
        let names: Vec<&str> = model.names().collect();
        assert_eq!(names, vec!["active", "owner_name", "secret"]);
    }

    #[test]
    fn test_reader_column_name_wins() {
        let model = model();
        let owner = model.property("owner_name").unwrap();
        assert_eq!(owner.ty(), &Type::string());
        assert!(owner.is_readable() && owner.is_writable());
    }

    #[test]
    fn test_is_prefix_requires_boolean() {
        let model = model();
        assert!(model.property("active").is_some());
        assert!(model.property("balance").is_none());
    }

    #[test]
    fn test_restricted_reader_is_write_only() {
        let model = model();
        let secret = model.property("secret").unwrap();
        assert!(!secret.is_readable());

        let object = ObjectRef::new(account(), Account::default());
        let err = secret.get(object.as_any()).unwrap_err();
        assert_eq!(err.to_string(), "No appropriate method to read property secret");
    }

    #[test]
    fn test_round_trip_through_builder() {
        let model = model();
        let mut builder = model.create().unwrap();
        builder.set("owner_name", "ada").unwrap();
        builder.set("active", true).unwrap();
        let object = builder.build().unwrap();

        let account = object.downcast_ref::<Account>().unwrap();
        assert_eq!(account.owner, "ada");
        assert!(account.active);
        assert_eq!(
            model.property("owner_name").unwrap().get(object.as_any()).unwrap(),
            Value::Text("ada".to_string())
        );
    }

    #[test]
    fn test_denied_setter() {
        let model = model();
        let mut builder = model.create().unwrap();
        let err = builder.set("secret", "x").unwrap_err();
        assert!(matches!(err, Error::AccessDenied { accessor: "setter", .. }));
        assert_eq!(err.to_string(), "Unable to access setter for property, secret");
    }

    #[derive(Default)]
    struct Mismatched {
        x: i64,
    }

    #[test]
    fn test_writer_of_other_type_not_paired() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register(
            ClassInfo::builder(ClassRef::new("Mismatched"))
                .constructor(Mismatched::default)
                .getter("get_x", Type::long(), |m: &Mismatched| m.x)
                .setter("set_x", Type::string(), |_: &mut Mismatched, _: String| {})
                .build(),
        );
        let taster = BeanTaster::new(classes);
        let model = taster
            .taste(&Type::Class(ClassRef::new("Mismatched")))
            .unwrap()
            .unwrap();

        let x = model.property("x").unwrap();
        assert_eq!(x.ty(), &Type::long());
        assert!(x.is_readable());
        assert!(!x.is_writable());
    }

    #[test]
    fn test_matching_writer_chosen_among_overloads() {
        let classes = Arc::new(ClassRegistry::new());
        classes.register(
            ClassInfo::builder(ClassRef::new("Mismatched"))
                .constructor(Mismatched::default)
                .getter("get_x", Type::long(), |m: &Mismatched| m.x)
                .setter("set_x", Type::string(), |_: &mut Mismatched, _: String| {})
                .setter("set_x", Type::long(), |m: &mut Mismatched, v: i64| m.x = v)
                .build(),
        );
        let model = BeanTaster::new(classes)
            .taste(&Type::Class(ClassRef::new("Mismatched")))
            .unwrap()
            .unwrap();
        let writer = model.property("x").unwrap().writer().unwrap();
        assert_eq!(writer.params, vec![Type::long()]);
    }

    #[test]
    fn test_unregistered_type_declines() {
        let taster = taster();
        assert!(taster.taste(&Type::Class(ClassRef::new("Nope"))).unwrap().is_none());
        assert!(taster.taste(&Type::long()).unwrap().is_none());
    }

    #[test]
    fn test_generic_reader_type_resolved() {
        let boxed = ClassRef::generic("Box", &["T"]);
        let classes = Arc::new(ClassRegistry::new());
        classes.register(
            ClassInfo::builder(boxed.clone())
                .getter("get_item", boxed.type_var("T").unwrap(), |_: &Account| Value::Null)
                .build(),
        );
        let taster = BeanTaster::new(classes);

        let concrete = Type::parameterized(boxed.clone(), vec![Type::double()]).unwrap();
        let model = taster.taste(&concrete).unwrap().unwrap();
        assert_eq!(model.property("item").unwrap().ty(), &Type::double());

        let raw = taster.taste(&Type::Class(boxed)).unwrap().unwrap();
        assert_eq!(raw.property("item").unwrap().ty(), &Type::Any);
    }
}
