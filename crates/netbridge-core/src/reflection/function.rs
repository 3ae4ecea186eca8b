//! Reflected native functions.

use std::fmt;
use std::sync::Arc;

use crate::error::NativeError;
use crate::object::NativeObject;
use crate::reflection::params::{ParamBlock, ParamDecl};
use crate::TypeHash;

/// Body of a reflected function.
///
/// Receives the target object and the parameter block with inputs already
/// filled. Outputs are written back into the block.
pub type NativeBody =
    Arc<dyn Fn(&dyn NativeObject, &mut ParamBlock) -> Result<(), NativeError> + Send + Sync>;

/// A native function discovered through reflection.
///
/// Only functions whose declared name carries the scripting prefix are
/// reachable from scripts. The declaring class is assigned when the function
/// is added to a [`NativeClass`](super::NativeClass).
#[derive(Clone)]
pub struct ReflectedFunction {
    name: String,
    declaring: TypeHash,
    params: Vec<ParamDecl>,
    body: NativeBody,
}

impl ReflectedFunction {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&dyn NativeObject, &mut ParamBlock) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declaring: TypeHash::EMPTY,
            params: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Append a parameter declaration.
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring(&self) -> TypeHash {
        self.declaring
    }

    pub(crate) fn set_declaring(&mut self, class: TypeHash) {
        self.declaring = class;
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Run the body against `target`.
    pub fn invoke(&self, target: &dyn NativeObject, block: &mut ParamBlock) -> Result<(), NativeError> {
        (self.body)(target, block)
    }
}

impl fmt::Debug for ReflectedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectedFunction")
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
