//! Traits implemented by `#[derive(Record)]`.
//!
//! A record describes its members statically ([`Record::members`]) and gives
//! positional access to them at runtime ([`Reflect`]). Member indices are the
//! field positions in the struct declaration, ignored fields included.

use super::column::{ScanTarget, ToValue};
use crate::models::ValueKind;

/// A struct that maps onto table columns.
pub trait Record: Reflect + 'static {
    /// Members in declaration order.
    fn members() -> Vec<Member>;
}

/// Positional access to the members of a record instance.
pub trait Reflect {
    fn slot(&self, index: usize) -> Option<Slot<'_>>;

    fn slot_mut(&mut self, index: usize) -> Option<SlotMut<'_>>;
}

/// Read access to one member.
pub enum Slot<'a> {
    Leaf(&'a dyn ToValue),
    /// `None` for an embedded pointer that is not set
    Branch(Option<&'a dyn Reflect>),
}

/// Write access to one member. Embedded pointers are allocated on demand.
pub enum SlotMut<'a> {
    Leaf(&'a mut dyn ScanTarget),
    Branch(&'a mut dyn Reflect),
}

/// Static description of one struct member.
#[derive(Debug, Clone)]
pub struct Member {
    /// Field name as declared
    pub ident: &'static str,
    /// Raw tag text
    pub tag: Option<&'static str>,
    pub shape: MemberShape,
}

#[derive(Debug, Clone, Copy)]
pub enum MemberShape {
    Leaf(ValueKind),
    Embedded {
        type_name: &'static str,
        members: fn() -> Vec<Member>,
    },
    Ignored,
}

impl Member {
    pub fn leaf(ident: &'static str, tag: Option<&'static str>, kind: ValueKind) -> Self {
        Self {
            ident,
            tag,
            shape: MemberShape::Leaf(kind),
        }
    }

    pub fn embedded(
        ident: &'static str,
        tag: Option<&'static str>,
        type_name: &'static str,
        members: fn() -> Vec<Member>,
    ) -> Self {
        Self {
            ident,
            tag,
            shape: MemberShape::Embedded { type_name, members },
        }
    }

    pub fn ignored(ident: &'static str, tag: Option<&'static str>) -> Self {
        Self {
            ident,
            tag,
            shape: MemberShape::Ignored,
        }
    }
}

/// A record that can be embedded in another one, directly or behind a pointer.
pub trait Embedded {
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn members() -> Vec<Member>
    where
        Self: Sized;

    /// `None` when the pointer is not set.
    fn as_reflect(&self) -> Option<&dyn Reflect>;

    /// Allocates a default value for an unset pointer.
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect;
}

impl<T: Embedded> Embedded for Box<T> {
    fn type_name() -> &'static str {
        T::type_name()
    }

    fn members() -> Vec<Member> {
        T::members()
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        (**self).as_reflect()
    }

    fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        (**self).as_reflect_mut()
    }
}

impl<T: Embedded + Default> Embedded for Option<T> {
    fn type_name() -> &'static str {
        T::type_name()
    }

    fn members() -> Vec<Member> {
        T::members()
    }

    fn as_reflect(&self) -> Option<&dyn Reflect> {
        self.as_ref().and_then(Embedded::as_reflect)
    }

    fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        self.get_or_insert_with(T::default).as_reflect_mut()
    }
}

/// Element type of a destination collection: the value itself or a pointer to it.
///
/// Derived records get impls for `T` and `Box<T>` (and `Arc<T>` through the
/// blanket impl below); scalar column types get them through [`impl_element!`].
pub trait Element: Sized {
    type Inner;

    fn wrap(inner: Self::Inner) -> Self;
}

impl<T: Record> Element for std::sync::Arc<T> {
    type Inner = T;

    fn wrap(inner: T) -> Self {
        std::sync::Arc::new(inner)
    }
}

/// Implement [`Element`] for a scalar column type and its boxed form.
///
/// ```ignore
/// impl_element!(UserId);
/// let ids: Vec<Box<UserId>> = query_elems(&db, "SELECT id FROM users", &[]).await?;
/// ```
#[macro_export]
macro_rules! impl_element {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Element for $ty {
                type Inner = $ty;

                fn wrap(inner: $ty) -> Self {
                    inner
                }
            }

            impl $crate::Element for ::std::boxed::Box<$ty> {
                type Inner = $ty;

                fn wrap(inner: $ty) -> Self {
                    ::std::boxed::Box::new(inner)
                }
            }
        )+
    };
}
