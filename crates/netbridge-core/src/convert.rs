//! Conversion traits between script values and Rust values.
//!
//! - [`FromDynamic`]: Extract a Rust value from a [`Dynamic`]
//! - [`IntoDynamic`]: Convert a Rust value into a [`Dynamic`]
//!
//! Library bindings use [`arg`] to read their arguments, which reports
//! failures as the script-visible [`BridgeError::ArgumentTypeMismatch`].
//!
//! ## Example
//!
//! ```
//! use netbridge_core::{Dynamic, convert::arg};
//!
//! let args = [Dynamic::Int(7), Dynamic::String("lamp".into())];
//! let count: u32 = arg(&args, 0).unwrap();
//! let name: String = arg(&args, 1).unwrap();
//! let missing: Option<i64> = arg(&args, 2).unwrap();
//! assert_eq!((count, name.as_str(), missing), (7, "lamp", None));
//! ```

use crate::error::{BridgeError, ConversionError};
use crate::handle::ScriptHandle;
use crate::Dynamic;

/// Extract a value from a script value.
pub trait FromDynamic: Sized {
    /// Extract a value from the given script value.
    ///
    /// Returns a `ConversionError` if the value has an incompatible type.
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError>;
}

/// Convert a value into a script value.
pub trait IntoDynamic {
    fn into_dynamic(self) -> Dynamic;
}

fn mismatch(expected: &'static str, actual: &Dynamic) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: actual.type_name().to_string(),
    }
}

/// Read argument `index` (0-based) from a script argument list.
///
/// Missing arguments read as nil. Failures are reported with the 1-based
/// argument position the script author sees.
pub fn arg<T: FromDynamic>(args: &[Dynamic], index: usize) -> Result<T, BridgeError> {
    let value = args.get(index).unwrap_or(&Dynamic::Nil);
    T::from_dynamic(value).map_err(|err| {
        let expected = match err {
            ConversionError::TypeMismatch { expected, .. } => expected,
            ConversionError::IntegerOverflow { target_type, .. } => target_type,
        };
        BridgeError::ArgumentTypeMismatch {
            index: index + 1,
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
        }
    })
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_dynamic_int {
    ($($ty:ty),*) => {
        $(
            impl FromDynamic for $ty {
                fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
                    match value {
                        Dynamic::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        _ => Err(mismatch("int", value)),
                    }
                }
            }

            impl IntoDynamic for $ty {
                fn into_dynamic(self) -> Dynamic {
                    Dynamic::Int(self as i64)
                }
            }
        )*
    };
}

impl_dynamic_int!(i8, i16, i32, i64, u8, u16, u32);

// ============================================================================
// Float implementations
// ============================================================================

macro_rules! impl_dynamic_float {
    ($($ty:ty),*) => {
        $(
            impl FromDynamic for $ty {
                fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
                    match value {
                        Dynamic::Float(v) => Ok(*v as $ty),
                        Dynamic::Int(v) => Ok(*v as $ty),
                        _ => Err(mismatch("float", value)),
                    }
                }
            }

            impl IntoDynamic for $ty {
                fn into_dynamic(self) -> Dynamic {
                    Dynamic::Float(self as f64)
                }
            }
        )*
    };
}

impl_dynamic_float!(f32, f64);

// ============================================================================
// Other implementations
// ============================================================================

impl FromDynamic for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl IntoDynamic for bool {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Bool(self)
    }
}

impl FromDynamic for String {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(mismatch("string", value)),
        }
    }
}

impl IntoDynamic for String {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self)
    }
}

impl IntoDynamic for &str {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self.to_string())
    }
}

impl IntoDynamic for () {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Nil
    }
}

impl FromDynamic for ScriptHandle {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Handle(handle) => Ok(handle.clone()),
            _ => Err(mismatch("handle", value)),
        }
    }
}

impl IntoDynamic for ScriptHandle {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Handle(self)
    }
}

impl FromDynamic for Dynamic {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoDynamic for Dynamic {
    fn into_dynamic(self) -> Dynamic {
        self
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Nil => Ok(None),
            other => T::from_dynamic(other).map(Some),
        }
    }
}

impl<T: IntoDynamic> IntoDynamic for Option<T> {
    fn into_dynamic(self) -> Dynamic {
        match self {
            Some(v) => v.into_dynamic(),
            None => Dynamic::Nil,
        }
    }
}

impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Array(items) => items.iter().map(T::from_dynamic).collect(),
            _ => Err(mismatch("array", value)),
        }
    }
}

impl<T: IntoDynamic> IntoDynamic for Vec<T> {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Array(self.into_iter().map(IntoDynamic::into_dynamic).collect())
    }
}
