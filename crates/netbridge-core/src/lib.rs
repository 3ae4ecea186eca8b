//! Core types for the script-to-native object bridge.
//!
//! This crate contains the value and identity types shared by the registry
//! and the dispatcher:
//!
//! - [`TypeHash`] - deterministic native class identity
//! - [`Dynamic`] - script-side values, with [`convert`] traits to Rust types
//! - [`ObjectWorld`] / [`ObjectRef`] - generational store of native objects
//! - [`NativeObject`] / [`NetworkComponent`] - capabilities of native objects
//! - [`Trace`] - path addressing an object through merge hops
//! - [`ScriptHandle`] / [`BoundMember`] - handles given to scripts
//! - [`reflection`] - native classes, reflected functions, parameter blocks
//! - [`error`] - error types for every phase

pub mod convert;
mod dynamic;
pub mod error;
mod handle;
mod object;
pub mod reflection;
mod trace;
mod type_hash;
mod world;

pub use convert::{FromDynamic, IntoDynamic};
pub use dynamic::Dynamic;
pub use error::{BridgeError, ConversionError, NativeError, PersistError, RegistrationError};
pub use handle::{BoundMember, ClassHandle, ExposedType, InstanceHandle, MemberKind, ScriptHandle};
pub use object::{NativeObject, NetworkComponent};
pub use trace::Trace;
pub use type_hash::{TypeHash, hash_constants};
pub use world::{ObjectRef, ObjectWorld};
