//! Integration tests for builder-produced immutable values
//!
//! `SubValue<X, T> extends BaseValue<T>` is implemented by
//! `ImmutableSubValue`, built through `ImmutableSubValue.Builder`.

#![cfg(feature = "immutables")]

mod common;

use common::*;
use propath_core::argument::{BindCall, RecordingBinder};
use propath_core::mapper::specialize;
use propath_core::{
    BeanPropertyArguments, Error, MapRow, NamedArgumentFinder, ResultShape, Type, Value,
};

fn concrete_sub_value() -> Type {
    Type::parameterized(sub_value(), vec![Type::string(), Type::int()]).unwrap()
}

#[test]
fn test_register_rejects_contract() {
    let ctx = ctx();
    let err = ctx.register_immutable(&sub_value()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Configuration error: Register the implemented immutable type, not the specifying contract"
    );
}

#[test]
fn test_register_records_implementation() {
    let ctx = ctx();
    ctx.register_immutable(&immutable_sub_value()).unwrap();
    assert_eq!(ctx.implementation_for(&sub_value()), Some(immutable_sub_value()));
    assert_eq!(
        ctx.immutables().unwrap().implementation_for(&sub_value()),
        Some(immutable_sub_value())
    );
}

#[test]
fn test_generic_property_types_resolved() {
    let ctx = ctx();
    ctx.register_immutable(&immutable_sub_value()).unwrap();

    let model = ctx.properties().properties_of(&concrete_sub_value()).unwrap();
    assert_eq!(model.strategy(), "Immutables");
    assert_eq!(model.property("x").unwrap().ty(), &Type::string());
    // declared on BaseValue<T>, bound through SubValue<string, int>
    assert_eq!(model.property("t").unwrap().ty(), &Type::int());
}

#[test]
fn test_bind_bean() {
    let ctx = ctx();
    ctx.register_immutable(&immutable_sub_value()).unwrap();

    let finder = BeanPropertyArguments::new(None, sub_value_of(42, "foo"));
    let mut binder = RecordingBinder::new();
    finder.find("t", &ctx).unwrap().unwrap().apply(1, &mut binder).unwrap();
    finder.find("x", &ctx).unwrap().unwrap().apply(2, &mut binder).unwrap();

    assert_eq!(
        binder.calls(),
        &[BindCall::Int(1, 42), BindCall::String(2, "foo".to_string())]
    );
}

#[test]
fn test_tagged_contract_needs_no_registration_for_binding() {
    let ctx = ctx();
    let model = ctx
        .properties()
        .properties_of(&Type::Class(immutable_sub_value()))
        .unwrap();
    assert_eq!(model.strategy(), "Immutables");
}

#[test]
fn test_row_mapping_round_trip() {
    let ctx = ctx();
    ctx.register_immutable(&immutable_sub_value()).unwrap();

    let row = MapRow::new().with("t", 42).with("x", "foo");
    let mapper = ctx
        .row_mappers()
        .find_for(&concrete_sub_value(), &ctx)
        .unwrap()
        .unwrap();
    let mapper = specialize(&mapper, &ResultShape::of(&row), &ctx).unwrap();

    let mapped = mapper.map(&row, &ctx).unwrap();
    let object = match mapped {
        Value::Object(object) => object,
        other => panic!("expected an object, got {:?}", other),
    };
    assert_eq!(object.class(), &immutable_sub_value());
    let value = object.downcast_ref::<ImmutableSubValue>().unwrap();
    assert_eq!(value.t, Value::Int(42));
    assert_eq!(value.x, Value::Text("foo".to_string()));
}

#[test]
fn test_build_failure_is_execution_error() {
    let ctx = ctx();
    ctx.register_immutable(&immutable_sub_value()).unwrap();

    // only `t` matches a column, so `build` runs without `x`
    let row = MapRow::new().with("t", 42);
    let mapper = ctx
        .row_mappers()
        .find_for(&Type::Class(immutable_sub_value()), &ctx)
        .unwrap()
        .unwrap();
    let err = mapper.map(&row, &ctx).unwrap_err();
    assert!(matches!(err, Error::Execution { ref method, .. } if method == "build"));
    assert_eq!(err.to_string(), "Couldn't execute build on SubValue");
}

#[test]
fn test_copy_keeps_registrations_apart() {
    let ctx = ctx();
    let copy = ctx.create_copy();
    copy.register_immutable(&immutable_sub_value()).unwrap();

    assert!(copy.implementation_for(&sub_value()).is_some());
    assert!(ctx.implementation_for(&sub_value()).is_none());
    assert!(ctx.immutables().unwrap().implementation_for(&sub_value()).is_none());
}
