//! Host values accepted by the runtime.

use core::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};

use crate::api::CoercionError;

/// The closed set of host values that can be created in the runtime.
///
/// Every supported integer width widens to [`HostValue::Int`], both float
/// widths to [`HostValue::Float`]. Mappings keep their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Int(i64),
    Float(f64),
    Str(String),
    Map(Vec<(String, HostValue)>),
}

impl HostValue {
    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "string",
            HostValue::Map(_) => "map",
        }
    }

    /// Convert a value whose type is only known at runtime.
    ///
    /// Accepts the scalar types of the `From` impls. Mappings must have
    /// `String` keys and `HostValue`, `i64`, `f64` or `String` values, as a
    /// `BTreeMap`, a `HashMap` or a `Vec` of pairs. Anything else, including
    /// other value types a static `From` would widen, is
    /// [`CoercionError::Unsupported`].
    pub fn from_any<T: Any>(value: &T) -> Result<Self, CoercionError> {
        let any = value as &dyn Any;

        macro_rules! try_downcast {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(v) = any.downcast_ref::<$ty>() {
                        return Ok(HostValue::from(v.clone()));
                    }
                )*
            };
        }

        try_downcast!(
            HostValue,
            i8,
            i16,
            i32,
            i64,
            isize,
            f32,
            f64,
            String,
            &'static str,
            BTreeMap<String, HostValue>,
            BTreeMap<String, i64>,
            BTreeMap<String, f64>,
            BTreeMap<String, String>,
            HashMap<String, HostValue>,
            HashMap<String, i64>,
            HashMap<String, f64>,
            HashMap<String, String>,
            Vec<(String, HostValue)>,
            Vec<(String, i64)>,
            Vec<(String, f64)>,
            Vec<(String, String)>,
        );

        Err(CoercionError::Unsupported {
            type_name: type_name::<T>(),
        })
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for HostValue {
                fn from(value: $ty) -> Self {
                    HostValue::Int(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize);

impl From<f32> for HostValue {
    fn from(value: f32) -> Self {
        HostValue::Float(value as f64)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<&String> for HostValue {
    fn from(value: &String) -> Self {
        HostValue::Str(value.clone())
    }
}

impl<K: Into<String>, V: Into<HostValue>> From<Vec<(K, V)>> for HostValue {
    fn from(entries: Vec<(K, V)>) -> Self {
        HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<HostValue>> From<BTreeMap<K, V>> for HostValue {
    fn from(entries: BTreeMap<K, V>) -> Self {
        HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<HostValue>, S> From<HashMap<K, V, S>> for HostValue {
    fn from(entries: HashMap<K, V, S>) -> Self {
        HostValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
