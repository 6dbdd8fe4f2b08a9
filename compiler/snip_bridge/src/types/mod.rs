//! Type describer: picks the type named in a synthesized declaration.
//!
//! A projected host value is declared in the session as
//! `T name = (T) __channel.get("name");`, so `T` must be a type the
//! fragment can legally name and cast to. [`describe`] walks the value's
//! runtime type, its directly implemented interfaces (in declaration order)
//! and then its parent, returning the first accessible type. It falls back
//! to the backend's top type.

/// Declared visibility of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    /// No modifier; nameable from the default package.
    Package,
    Protected,
    Private,
}

/// Type-description facility provided by a backend.
pub trait TypeIntrospect {
    type Value;
    /// Opaque handle to one type.
    type Type: Copy + Eq;

    /// Runtime type of `value`, or `None` for null.
    fn runtime_type(&self, value: &Self::Value) -> Option<Self::Type>;

    /// Stable name usable in source text; `None` for anonymous/local types.
    fn canonical_name(&self, ty: Self::Type) -> Option<&str>;

    fn visibility(&self, ty: Self::Type) -> Visibility;

    /// Directly implemented interfaces, in declaration order.
    fn interfaces(&self, ty: Self::Type) -> &[Self::Type];

    fn parent(&self, ty: Self::Type) -> Option<Self::Type>;

    /// Name of the universal top type.
    fn top_type_name(&self) -> &str;
}

/// Whether `ty` can be named in a synthesized fragment.
pub fn is_accessible<T: TypeIntrospect + ?Sized>(types: &T, ty: T::Type) -> bool {
    types.canonical_name(ty).is_some()
        && !matches!(
            types.visibility(ty),
            Visibility::Private | Visibility::Protected
        )
}

/// Name of the most specific accessible type for `value`.
///
/// When a type and one of its interfaces are both accessible, the type
/// itself wins; among interfaces the first declared wins.
pub fn describe<'t, T: TypeIntrospect + ?Sized>(types: &'t T, value: &T::Value) -> &'t str {
    let mut current = types.runtime_type(value);
    while let Some(ty) = current {
        if let Some(name) = accessible_name(types, ty) {
            return name;
        }
        for &interface in types.interfaces(ty) {
            if let Some(name) = accessible_name(types, interface) {
                return name;
            }
        }
        current = types.parent(ty);
    }
    types.top_type_name()
}

fn accessible_name<T: TypeIntrospect + ?Sized>(types: &T, ty: T::Type) -> Option<&str> {
    if is_accessible(types, ty) {
        types.canonical_name(ty)
    } else {
        None
    }
}
