//! Generic parameter resolution
//!
//! Binds type variables against a concrete parameterization of their
//! declaring class: resolving `K` of `Entry<K, V>` within
//! `Entry<string, long>` yields `string`.

use crate::ty::{Type, TypeVar};

/// Resolve a type variable within a parameterized type
///
/// Returns `None` when `within` is not a parameterization of the variable's
/// owner, or when the owner does not declare the variable.
pub fn resolve_type(var: &TypeVar, within: &Type) -> Option<Type> {
    match within {
        Type::Parameterized { raw, args } if *raw == var.owner => {
            let index = raw.param_index(&var.name)?;
            args.get(index).cloned()
        }
        _ => None,
    }
}

/// Replace every variable bound by `within`, recursively
///
/// Variables `within` does not bind are left in place.
pub fn substitute(ty: &Type, within: &Type) -> Type {
    match ty {
        Type::Var(var) => resolve_type(var, within).unwrap_or_else(|| ty.clone()),
        Type::Parameterized { raw, args } => Type::Parameterized {
            raw: raw.clone(),
            args: args.iter().map(|arg| substitute(arg, within)).collect(),
        },
        other => other.clone(),
    }
}
