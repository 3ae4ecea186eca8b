//! Reflection data for native classes.
//!
//! A [`NativeClass`] lists the functions a native class declares. Functions
//! whose declared name carries the scripting prefix become callable from
//! scripts without any explicit registration. The [`ClassCatalog`] links
//! classes through their super-class chain for inheritance checks.

mod class;
mod function;
mod params;

pub use class::{Ancestors, ClassCatalog, NativeClass};
pub use function::{NativeBody, ReflectedFunction};
pub use params::{NativeValue, ParamBlock, ParamDecl, ParamFlags, ParamType};
