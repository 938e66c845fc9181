//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use propath_core::annotation::Annotation;
use propath_core::reflect::{ClassInfo, ClassRegistry};
use propath_core::{ClassRef, ConfigRegistry, Fault, ObjectRef, Settings, Type, Value};

// ============================================================================
// Bean argument fixtures
// ============================================================================

/// Reader returning a number
pub struct BindBare;

/// Reader returning a null number
pub struct BindNull;

/// Reader returning text
pub struct BindPrefix;

/// Reader whose invocation is refused
pub struct BindIllegalAccess;

/// Writer without reader
#[derive(Default)]
pub struct BindNoGetter {
    pub bar: String,
}

/// Non-public reader plus public writer
#[derive(Default)]
pub struct BindNonPublicGetter {
    pub bar: String,
}

/// Reader of an untyped object that is null
pub struct NullFoo;

/// Reader of an untyped object that is present
pub struct NestedFoo;

/// Object reached through `NestedFoo`
pub struct NestedObject;

pub fn class(name: &str) -> ClassRef {
    ClassRef::new(name)
}

fn register_bean_fixtures(classes: &ClassRegistry) {
    classes.register(
        ClassInfo::builder(class("BindBare"))
            .getter("get_foo", Type::double(), |_: &BindBare| 1.0f64)
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("BindNull"))
            .getter("get_foo", Type::double(), |_: &BindNull| Option::<f64>::None)
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("BindPrefix"))
            .getter("get_bar", Type::string(), |_: &BindPrefix| "baz")
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("BindIllegalAccess"))
            .try_getter("get_bar", Type::string(), |_: &BindIllegalAccess| {
                Err::<String, Fault>(Fault::AccessDenied(
                    "normally the host refuses this, just for testing".to_string(),
                ))
            })
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("BindNoGetter"))
            .constructor(BindNoGetter::default)
            .setter("set_bar", Type::string(), |b: &mut BindNoGetter, v: String| b.bar = v)
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("BindNonPublicGetter"))
            .constructor(BindNonPublicGetter::default)
            .restricted_getter("get_bar", Type::string(), |b: &BindNonPublicGetter| b.bar.clone())
            .setter("set_bar", Type::string(), |b: &mut BindNonPublicGetter, v: String| b.bar = v)
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("NullFoo"))
            .getter("get_foo", Type::Any, |_: &NullFoo| Value::Null)
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("NestedFoo"))
            .getter("get_foo", Type::Any, |_: &NestedFoo| {
                ObjectRef::new(class("NestedObject"), NestedObject)
            })
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("NestedObject"))
            .getter("get_id", Type::long(), |_: &NestedObject| 69i64)
            .build(),
    );
}

pub fn object<T: std::any::Any + Send + Sync>(name: &str, value: T) -> ObjectRef {
    ObjectRef::new(class(name), value)
}

// ============================================================================
// Typed graph: Order -> Customer -> Address
// ============================================================================

/// Order with an optional customer
#[derive(Clone, Default)]
pub struct Order {
    pub id: i64,
    pub customer: Option<ObjectRef>,
}

/// Customer with an optional address
#[derive(Clone, Default)]
pub struct Customer {
    pub name: String,
    pub address: Option<ObjectRef>,
}

/// Address
#[derive(Clone, Default)]
pub struct Address {
    pub city: String,
    pub zip: i32,
}

fn register_order_fixtures(classes: &ClassRegistry) {
    classes.register(
        ClassInfo::builder(class("Order"))
            .constructor(Order::default)
            .getter("get_id", Type::long(), |o: &Order| o.id)
            .setter("set_id", Type::long(), |o: &mut Order, v: i64| o.id = v)
            .getter("get_customer", Type::Class(class("Customer")), |o: &Order| {
                o.customer.clone()
            })
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("Customer"))
            .constructor(Customer::default)
            .getter("get_name", Type::string(), |c: &Customer| c.name.clone())
            .setter("set_name", Type::string(), |c: &mut Customer, v: String| c.name = v)
            .getter("get_address", Type::Class(class("Address")), |c: &Customer| {
                c.address.clone()
            })
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("Address"))
            .constructor(Address::default)
            .getter("get_city", Type::string(), |a: &Address| a.city.clone())
            .setter("set_city", Type::string(), |a: &mut Address, v: String| a.city = v)
            .getter("get_zip", Type::int(), |a: &Address| a.zip)
            .build(),
    );
}

pub fn address(city: &str) -> ObjectRef {
    object(
        "Address",
        Address {
            city: city.to_string(),
            zip: 10115,
        },
    )
}

pub fn customer(name: &str, address: Option<ObjectRef>) -> ObjectRef {
    object(
        "Customer",
        Customer {
            name: name.to_string(),
            address,
        },
    )
}

pub fn order(id: i64, customer: Option<ObjectRef>) -> ObjectRef {
    object("Order", Order { id, customer })
}

// ============================================================================
// Plain method fixtures: abstract class and contract implementations
// ============================================================================

/// Implementation hidden behind the `Person` abstract class
pub struct PersonImpl {
    pub name: String,
}

/// Implementation of the `Car` contract
pub struct CarImpl {
    pub name: String,
}

fn register_method_fixtures(classes: &ClassRegistry) {
    classes.register(
        ClassInfo::contract(class("Person"))
            .abstract_method("name", Type::string())
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("PersonImpl"))
            .extends(class("Person"))
            .getter("name", Type::string(), |p: &PersonImpl| p.name.clone())
            .build(),
    );
    classes.register(
        ClassInfo::contract(class("Car"))
            .abstract_method("name", Type::string())
            .build(),
    );
    classes.register(
        ClassInfo::builder(class("CarImpl"))
            .implements(class("Car"))
            .getter("name", Type::string(), |c: &CarImpl| c.name.clone())
            .build(),
    );
}

// ============================================================================
// Immutable values: SubValue<X, T> extends BaseValue<T>
// ============================================================================

/// Builder-produced implementation of `SubValue`
#[derive(Debug, Clone, PartialEq)]
pub struct ImmutableSubValue {
    pub t: Value,
    pub x: Value,
}

/// Builder of [`ImmutableSubValue`]
#[derive(Debug, Default)]
pub struct SubValueBuilder {
    pub t: Option<Value>,
    pub x: Option<Value>,
}

pub fn base_value() -> ClassRef {
    ClassRef::generic("BaseValue", &["T"])
}

pub fn sub_value() -> ClassRef {
    ClassRef::generic("SubValue", &["X", "T"])
}

pub fn immutable_sub_value() -> ClassRef {
    ClassRef::generic("ImmutableSubValue", &["X", "T"])
}

pub fn sub_value_builder() -> ClassRef {
    ClassRef::new("ImmutableSubValue.Builder")
}

fn var(owner: &ClassRef, name: &str) -> Type {
    owner.type_var(name).expect("declared type parameter")
}

pub fn register_immutable_fixtures(classes: &ClassRegistry) {
    classes.register(
        ClassInfo::contract(base_value())
            .abstract_method("t", var(&base_value(), "T"))
            .build(),
    );
    classes.register(
        ClassInfo::contract(sub_value())
            .annotate(Annotation::immutable())
            .implements(
                Type::parameterized(base_value(), vec![var(&sub_value(), "T")])
                    .expect("one argument"),
            )
            .abstract_method("x", var(&sub_value(), "X"))
            .build(),
    );
    classes.register(
        ClassInfo::builder(immutable_sub_value())
            .implements(
                Type::parameterized(
                    sub_value(),
                    vec![
                        var(&immutable_sub_value(), "X"),
                        var(&immutable_sub_value(), "T"),
                    ],
                )
                .expect("two arguments"),
            )
            .getter("t", var(&immutable_sub_value(), "T"), |v: &ImmutableSubValue| v.t.clone())
            .getter("x", var(&immutable_sub_value(), "X"), |v: &ImmutableSubValue| v.x.clone())
            .static_factory("builder", Type::Class(sub_value_builder()), SubValueBuilder::default)
            .build(),
    );
    classes.register(
        ClassInfo::builder(sub_value_builder())
            .mutator("t", Type::Any, |b: &mut SubValueBuilder, v: Value| b.t = Some(v))
            .mutator("x", Type::Any, |b: &mut SubValueBuilder, v: Value| b.x = Some(v))
            .try_getter("build", Type::Class(immutable_sub_value()), |b: &SubValueBuilder| {
                let missing = |name: &str| Fault::Mismatch(format!("{} was never set", name));
                let t = b.t.clone().ok_or_else(|| missing("t"))?;
                let x = b.x.clone().ok_or_else(|| missing("x"))?;
                Ok(ObjectRef::new(immutable_sub_value(), ImmutableSubValue { t, x }))
            })
            .build(),
    );
}

pub fn sub_value_of(t: impl Into<Value>, x: impl Into<Value>) -> ObjectRef {
    ObjectRef::new(
        immutable_sub_value(),
        ImmutableSubValue {
            t: t.into(),
            x: x.into(),
        },
    )
}

// ============================================================================
// Contexts
// ============================================================================

/// Class registry holding every fixture
pub fn classes() -> Arc<ClassRegistry> {
    let classes = Arc::new(ClassRegistry::new());
    register_bean_fixtures(&classes);
    register_order_fixtures(&classes);
    register_method_fixtures(&classes);
    register_immutable_fixtures(&classes);
    classes
}

/// Configuration over the fixture classes with default settings
pub fn ctx() -> ConfigRegistry {
    ConfigRegistry::with_classes(classes(), Settings::default()).expect("default settings are valid")
}

/// Configuration with entry columns set
pub fn ctx_with_columns(key: Option<&str>, value: Option<&str>) -> ConfigRegistry {
    let ctx = ctx();
    ctx.map_entry().set_key_column(key.map(str::to_string));
    ctx.map_entry().set_value_column(value.map(str::to_string));
    ctx
}
