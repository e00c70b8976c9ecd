//! Casting runtime values into host types.
//!
//! The runtime stores integers as `i64` and floats as `f64`. Narrower integer
//! targets are checked: a value that does not fit is
//! [`CoercionError::Overflow`], never a silent truncation. `f32` follows
//! IEEE rounding. Integers widen to floats; floats never narrow to integers.

use core::any::type_name;

use bia_runtime::sys;

use super::Member;
use crate::api::{CoercionError, Result};

/// Host types a [`Member`] can be cast into.
pub trait FromMember: Sized {
    fn from_member(member: &Member) -> Result<Self>;
}

impl FromMember for i64 {
    fn from_member(member: &Member) -> Result<Self> {
        member.read(sys::member_cast_llong)
    }
}

macro_rules! impl_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromMember for $ty {
                fn from_member(member: &Member) -> Result<Self> {
                    let value = i64::from_member(member)?;
                    <$ty>::try_from(value).map_err(|_| {
                        CoercionError::Overflow {
                            value,
                            target: type_name::<$ty>(),
                        }
                        .into()
                    })
                }
            }
        )*
    };
}

impl_narrow_int!(i8, i16, i32, isize);

impl FromMember for f64 {
    fn from_member(member: &Member) -> Result<Self> {
        member.read(sys::member_cast_double)
    }
}

impl FromMember for f32 {
    fn from_member(member: &Member) -> Result<Self> {
        f64::from_member(member).map(|v| v as f32)
    }
}

/// Strings are copied into host memory.
impl FromMember for String {
    fn from_member(member: &Member) -> Result<Self> {
        let text = member.read(sys::member_cast_cstring)?;
        text.into_string()
            .map_err(|_| CoercionError::InvalidUtf8.into())
    }
}

/// `nil` reads as `None`.
impl<T: FromMember> FromMember for Option<T> {
    fn from_member(member: &Member) -> Result<Self> {
        if member.is_null()? {
            Ok(None)
        } else {
            T::from_member(member).map(Some)
        }
    }
}
