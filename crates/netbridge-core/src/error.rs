//! Error types for the object bridge.
//!
//! Each phase of the bridge has its own error enum so callers can match on
//! exactly what went wrong:
//!
//! ```text
//! RegistrationError - building the type and member registries
//! BridgeError       - script-visible failures while dispatching on handles
//! ├── NativeError      - a native body or its parameter block failed
//! ConversionError   - a script value could not become a Rust value
//! PersistError      - decoding persisted handles failed
//! ```
//!
//! `BridgeError` is what a script sees. Everything raised while resolving,
//! marshaling, or invoking a member is reported through it.

use thiserror::Error;

use crate::TypeHash;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors that occur while populating the registries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The exposed name is already owned by a different native class.
    #[error("exposed type name '{name}' is already bound to another class")]
    DuplicateType { name: String },

    /// A native class with this hash was registered twice.
    #[error("native class '{name}' is already registered")]
    DuplicateClass { name: String },

    /// The native class was never registered with the class catalog.
    #[error("native class {0:?} is not registered")]
    UnknownClass(TypeHash),

    /// A member was registered against a class that has no binding.
    #[error("class {class:?} has no {kind} binding")]
    UnboundType { class: TypeHash, kind: &'static str },

    /// A member of one binding kind was registered on the other kind.
    #[error("cannot register {member} '{name}' on {kind} binding")]
    WrongBindingKind {
        name: String,
        member: &'static str,
        kind: &'static str,
    },
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors converting a script value into a Rust value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The value has a different type than the one requested.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// The integer does not fit the requested integer type.
    #[error("integer overflow: {value} does not fit in {target_type}")]
    IntegerOverflow {
        value: i64,
        target_type: &'static str,
    },
}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors raised by native function bodies and their parameter blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// Parameter index is past the end of the declared parameters.
    #[error("parameter index {index} out of bounds (count: {count})")]
    ParamIndexOutOfBounds { index: usize, count: usize },

    /// The parameter was declared with a different native type.
    #[error("parameter {index} is {actual}, not {expected}")]
    ParamType {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// The function declares no return parameter.
    #[error("function has no return parameter")]
    NoReturnParam,

    /// The native body reported a failure.
    #[error("{0}")]
    Failed(String),
}

// ============================================================================
// Bridge Errors
// ============================================================================

/// Errors visible to scripts when operating on bridged handles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// A script argument could not be converted to the declared parameter type.
    #[error("bad argument #{index}: expected {expected}, got {actual}")]
    ArgumentTypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    /// No member with this name exists on the handle.
    #[error("{exposed} doesn't have member '{name}'")]
    MemberNotFound { exposed: String, name: String },

    /// `id`/`nick` was requested on an object without the network capability.
    #[error("Instance is not a network component")]
    NotANetworkComponent,

    /// The addressed object no longer exists.
    #[error("Instance is invalid")]
    InstanceInvalid,

    /// The property has no setter.
    #[error("property '{name}' is read only")]
    ReadOnlyProperty { name: String },

    /// A bound member could no longer find its implementation.
    #[error("Unable to call function '{name}'")]
    UnableToCallFunction { name: String },

    /// The receiver's type may not call this member.
    #[error("Instance type is not allowed to call function '{name}'")]
    NotAllowedTypeForFunction { name: String },

    /// The receiver is not the kind of value the member operates on.
    #[error("expected {expected} as receiver, got {actual}")]
    InvalidReceiver {
        expected: &'static str,
        actual: String,
    },

    /// A native body failed.
    #[error(transparent)]
    Native(#[from] NativeError),
}

// ============================================================================
// Persistence Errors
// ============================================================================

/// Errors decoding persisted handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// The trace id is not present in the storage of this pass.
    #[error("unknown trace id {0}")]
    UnknownTrace(usize),

    /// The reference id is not present in the storage of this pass.
    #[error("unknown reference id {0}")]
    UnknownReference(usize),

    /// The token was found where a token of another kind is expected.
    #[error("token {id} is not a {expected} reference")]
    WrongReferenceKind { id: usize, expected: &'static str },

    /// The exposed type name is not registered.
    #[error("unknown exposed type '{0}'")]
    UnknownType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_mismatch_display() {
        let err = BridgeError::ArgumentTypeMismatch {
            index: 2,
            expected: "int".to_string(),
            actual: "string".to_string(),
        };
        assert_eq!(format!("{err}"), "bad argument #2: expected int, got string");
    }

    #[test]
    fn member_not_found_display() {
        let err = BridgeError::MemberNotFound {
            exposed: "Computer".to_string(),
            name: "launch".to_string(),
        };
        assert_eq!(format!("{err}"), "Computer doesn't have member 'launch'");
    }

    #[test]
    fn read_only_display() {
        let err = BridgeError::ReadOnlyProperty {
            name: "voltage".to_string(),
        };
        assert_eq!(format!("{err}"), "property 'voltage' is read only");
    }

    #[test]
    fn native_error_is_transparent() {
        let err: BridgeError = NativeError::Failed("no power".to_string()).into();
        assert_eq!(format!("{err}"), "no power");
    }

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::DuplicateType {
            name: "Computer".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "exposed type name 'Computer' is already bound to another class"
        );

        let err = RegistrationError::WrongBindingKind {
            name: "spawn".to_string(),
            member: "class function",
            kind: "instance",
        };
        assert_eq!(
            format!("{err}"),
            "cannot register class function 'spawn' on instance binding"
        );
    }

    #[test]
    fn persist_error_display() {
        assert_eq!(format!("{}", PersistError::UnknownTrace(3)), "unknown trace id 3");
        assert_eq!(
            format!("{}", PersistError::UnknownType("Gone".to_string())),
            "unknown exposed type 'Gone'"
        );
    }
}
