//! Equality strategies used by a binder to decide whether a freshly
//! selected value differs from the one it already holds.
//!
//! Two strategies are built in:
//!
//! + [ref_equality()], the default. Behaves like a strict identity
//!   check (`StrictEq`): shared pointers compare by address, scalars
//!   by `==`. No deep comparison ever happens, so selectors that
//!   build a new `Rc` every time will always be reported as changed.
//! + [shallow_equal()]. Two containers are equal if they are the same
//!   allocation, or hold the same keys (or the same number of
//!   elements) with pairwise identical values according to
//!   [SameValue].
//!
//! [SameValue] and [StrictEq] disagree on purpose for floating point
//! numbers: `SameValue` treats `NaN` as equal to itself and `0.0` as
//! different from `-0.0`, while `StrictEq` follows `==`.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
    rc::Rc,
    sync::Arc,
};

/// A pure comparison between the previously selected value and the
/// next one. Returns `true` when the two should be considered equal,
/// which suppresses the update.
pub trait EqualityFn<T>: Fn(&T, &T) -> bool {}

impl<T, F> EqualityFn<T> for F where F: Fn(&T, &T) -> bool {}

/// Identity comparison in the manner of `===`.
pub trait StrictEq {
    fn strict_eq(&self, other: &Self) -> bool;
}

/// Identity comparison with the special cases for `NaN` and signed
/// zero used by [shallow_equal()].
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

/// One level deep comparison, see [shallow_equal()].
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// The default [EqualityFn].
pub fn ref_equality<T: StrictEq + ?Sized>(previous: &T, next: &T) -> bool {
    previous.strict_eq(next)
}

/// An [EqualityFn] comparing one level deep.
pub fn shallow_equal<T: ShallowEq + ?Sized>(previous: &T, next: &T) -> bool {
    previous.shallow_eq(next)
}

macro_rules! impl_by_value {
    ($($t:ty),*) => {
        $(
            impl StrictEq for $t {
                fn strict_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl ShallowEq for $t {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_by_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, (), str, String
);

macro_rules! impl_float {
    ($($t:ty),*) => {
        $(
            impl StrictEq for $t {
                fn strict_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    if self.is_nan() && other.is_nan() {
                        return true;
                    }
                    self.to_bits() == other.to_bits()
                }
            }

            impl ShallowEq for $t {
                fn shallow_eq(&self, other: &Self) -> bool {
                    self.same_value(other)
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl<T: ?Sized> StrictEq for Rc<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> SameValue for Rc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).shallow_eq(&**other)
    }
}

impl<T: ?Sized> StrictEq for Arc<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> SameValue for Arc<T> {
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).shallow_eq(&**other)
    }
}

impl<T: StrictEq + ?Sized> StrictEq for &T {
    fn strict_eq(&self, other: &Self) -> bool {
        (**self).strict_eq(*other)
    }
}

impl<T: SameValue + ?Sized> SameValue for &T {
    fn same_value(&self, other: &Self) -> bool {
        (**self).same_value(*other)
    }
}

impl<T: StrictEq> StrictEq for Option<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.strict_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<A: StrictEq, B: StrictEq> StrictEq for (A, B) {
    fn strict_eq(&self, other: &Self) -> bool {
        self.0.strict_eq(&other.0) && self.1.strict_eq(&other.1)
    }
}

impl<A: SameValue, B: SameValue> ShallowEq for (A, B) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.same_value(&other.0) && self.1.same_value(&other.1)
    }
}

impl<T: SameValue> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

impl<T: SameValue> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

impl<T: SameValue> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl<K, V, S> ShallowEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: SameValue,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| match other.get(key) {
                Some(other_value) => value.same_value(other_value),
                None => false,
            })
    }
}

impl<K: Ord, V: SameValue> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((ka, va), (kb, vb))| ka == kb && va.same_value(vb))
    }
}

/// Implements [ShallowEq] for a struct by comparing each listed field
/// with [SameValue].
///
/// ```
/// use reactive_state_bridge::impl_shallow_eq;
/// use std::rc::Rc;
///
/// struct Selected {
///     count: i32,
///     items: Rc<Vec<String>>,
/// }
///
/// impl_shallow_eq!(Selected { count, items });
/// ```
#[macro_export]
macro_rules! impl_shallow_eq {
    ($t:ident { $($field:ident),* $(,)? }) => {
        impl $crate::ShallowEq for $t {
            fn shallow_eq(&self, other: &Self) -> bool {
                true $(&& $crate::SameValue::same_value(&self.$field, &other.$field))*
            }
        }
    };
}
