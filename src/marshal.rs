//! Calling reflected native functions.
//!
//! A call allocates a [`ParamBlock`] for the declared parameters, converts
//! the script arguments into every input parameter, runs the native body
//! under the target's call lock, and converts the out and return parameters
//! back into script values. If any argument fails to convert the native
//! body is never run.

use std::sync::Arc;

use tracing::trace;

use netbridge_core::reflection::{NativeValue, ParamBlock, ParamType, ReflectedFunction};
use netbridge_core::{
    BoundMember, BridgeError, Dynamic, InstanceHandle, NativeObject, ObjectWorld, ScriptHandle, Trace,
    TypeHash,
};
use netbridge_registry::BridgeRegistry;

use crate::bridge::Bridge;
use crate::dispatch::merged_objects;

/// Invoke the reflected function bound as `member` on `handle`.
///
/// The call goes to the addressed object if its class declares or inherits
/// the function, otherwise to the first merged object that does.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn invoke_reflected(
    bridge: &Bridge,
    handle: &InstanceHandle,
    member: &BoundMember,
    declaring: TypeHash,
    args: &[Dynamic],
) -> Result<Vec<Dynamic>, BridgeError> {
    let registry = &*bridge.registry;
    let world = &*bridge.world;

    let object = handle.trace.resolve(world)?;
    let function = registry
        .reflected_function(declaring, &member.name)
        .ok_or_else(|| BridgeError::UnableToCallFunction {
            name: member.name.clone(),
        })?;

    let (trace, target) = select_target(registry, world, handle, object, declaring).ok_or_else(|| {
        BridgeError::NotAllowedTypeForFunction {
            name: member.name.clone(),
        }
    })?;

    let mut block = marshal_inputs(registry, world, function, args)?;

    trace!(function = function.name(), object = ?trace.target(), "reflected call");
    bridge
        .locks
        .with_lock(world, trace.target(), || function.invoke(target.as_ref(), &mut block))??;

    Ok(block
        .outputs()
        .map(|(_, value)| to_script(registry, world, &trace, value))
        .collect())
}

fn select_target(
    registry: &BridgeRegistry,
    world: &ObjectWorld,
    handle: &InstanceHandle,
    object: Arc<dyn NativeObject>,
    declaring: TypeHash,
) -> Option<(Trace, Arc<dyn NativeObject>)> {
    if registry.is_child_of(object.class(), declaring) {
        return Some((handle.trace.clone(), object));
    }
    merged_objects(world, object.as_ref())
        .into_iter()
        .find(|(_, merged)| registry.is_child_of(merged.class(), declaring))
        .map(|(r, merged)| (handle.trace.through(r), merged))
}

/// Fill a fresh parameter block from the script arguments.
///
/// Each input parameter consumes the next argument, missing arguments read
/// as nil. Output parameters keep their default.
pub(crate) fn marshal_inputs(
    registry: &BridgeRegistry,
    world: &ObjectWorld,
    function: &ReflectedFunction,
    args: &[Dynamic],
) -> Result<ParamBlock, BridgeError> {
    let mut block = ParamBlock::new(function.params());
    let mut next_arg = 0;
    for (index, decl) in function.params().iter().enumerate() {
        if !decl.flags.is_input() {
            continue;
        }
        let value = args.get(next_arg).unwrap_or(&Dynamic::Nil);
        next_arg += 1;
        let native = to_native(registry, world, &decl.ty, value).ok_or_else(|| {
            BridgeError::ArgumentTypeMismatch {
                index: next_arg,
                expected: describe(registry, &decl.ty),
                actual: value.type_name().to_string(),
            }
        })?;
        block.set(index, native)?;
    }
    Ok(block)
}

/// Convert a script value to the declared native type.
///
/// Conversion is strict except that integers widen to floats.
pub(crate) fn to_native(
    registry: &BridgeRegistry,
    world: &ObjectWorld,
    ty: &ParamType,
    value: &Dynamic,
) -> Option<NativeValue> {
    match (ty, value) {
        (ParamType::Bool, Dynamic::Bool(v)) => Some(NativeValue::Bool(*v)),
        (ParamType::Int, Dynamic::Int(v)) => Some(NativeValue::Int(*v)),
        (ParamType::Float, Dynamic::Float(v)) => Some(NativeValue::Float(*v)),
        (ParamType::Float, Dynamic::Int(v)) => Some(NativeValue::Float(*v as f64)),
        (ParamType::Str, Dynamic::String(s)) => Some(NativeValue::Str(s.clone())),
        (ParamType::Object(_), Dynamic::Nil) => Some(NativeValue::Object(None)),
        (ParamType::Object(required), Dynamic::Handle(ScriptHandle::Instance(h))) => {
            let target = h.trace.target();
            let object = world.get(target)?;
            if let Some(required) = required
                && !registry.is_child_of(object.class(), *required)
            {
                return None;
            }
            Some(NativeValue::Object(Some(target)))
        }
        (ParamType::Class(_), Dynamic::Nil) => Some(NativeValue::Class(None)),
        (ParamType::Class(required), Dynamic::Handle(ScriptHandle::Class(h))) => {
            if let Some(required) = required
                && !registry.is_child_of(h.class, *required)
            {
                return None;
            }
            Some(NativeValue::Class(Some(h.class)))
        }
        (ParamType::Array(inner), Dynamic::Array(items)) => items
            .iter()
            .map(|item| to_native(registry, world, inner, item))
            .collect::<Option<Vec<_>>>()
            .map(NativeValue::Array),
        _ => None,
    }
}

/// Convert a native output back into a script value.
///
/// Returned objects are addressed through the call's trace. Objects and
/// classes without an exposed type become nil.
pub(crate) fn to_script(registry: &BridgeRegistry, world: &ObjectWorld, trace: &Trace, value: &NativeValue) -> Dynamic {
    match value {
        NativeValue::Bool(v) => Dynamic::Bool(*v),
        NativeValue::Int(v) => Dynamic::Int(*v),
        NativeValue::Float(v) => Dynamic::Float(*v),
        NativeValue::Str(s) => Dynamic::String(s.clone()),
        NativeValue::Object(None) | NativeValue::Class(None) => Dynamic::Nil,
        NativeValue::Object(Some(object)) => registry
            .instance_for(world, trace.through(*object))
            .map(|handle| Dynamic::Handle(ScriptHandle::Instance(handle)))
            .unwrap_or_default(),
        NativeValue::Class(Some(class)) => registry
            .class_instance_for(*class)
            .map(|handle| Dynamic::Handle(ScriptHandle::Class(handle)))
            .unwrap_or_default(),
        NativeValue::Array(items) => {
            Dynamic::Array(items.iter().map(|item| to_script(registry, world, trace, item)).collect())
        }
    }
}

/// Name of a parameter type as reported in argument errors.
fn describe(registry: &BridgeRegistry, ty: &ParamType) -> String {
    match ty {
        ParamType::Object(Some(class)) | ParamType::Class(Some(class)) => registry
            .exposed_type(*class)
            .map(|exposed| exposed.name().to_string())
            .unwrap_or_else(|| ty.name().to_string()),
        ParamType::Array(inner) => format!("array of {}", describe(registry, inner)),
        other => other.name().to_string(),
    }
}
