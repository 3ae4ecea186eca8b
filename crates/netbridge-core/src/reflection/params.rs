//! Parameter declarations and per-call parameter storage.

use bitflags::bitflags;

use crate::error::NativeError;
use crate::world::ObjectRef;
use crate::TypeHash;

bitflags! {
    /// Role of a declared parameter.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ParamFlags: u8 {
        /// Part of the call signature
        const PARM = 0b0001;
        /// Written by the callee
        const OUT = 0b0010;
        /// The return value
        const RETURN = 0b0100;
    }
}

impl ParamFlags {
    /// Read from a script argument before the call.
    pub fn is_input(self) -> bool {
        self.contains(ParamFlags::PARM) && !self.intersects(ParamFlags::OUT | ParamFlags::RETURN)
    }

    /// Handed back to the script after the call.
    pub fn is_output(self) -> bool {
        self.contains(ParamFlags::PARM) && self.intersects(ParamFlags::OUT | ParamFlags::RETURN)
    }
}

/// Native type of a declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
    /// Object reference, optionally required to be of a class or subclass
    Object(Option<TypeHash>),
    /// Class reference, optionally required to be a class or subclass
    Class(Option<TypeHash>),
    Array(Box<ParamType>),
}

impl ParamType {
    /// Type name used in conversion errors.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "string",
            ParamType::Object(_) => "object",
            ParamType::Class(_) => "class",
            ParamType::Array(_) => "array",
        }
    }

    /// Value a freshly initialized parameter holds.
    pub fn default_value(&self) -> NativeValue {
        match self {
            ParamType::Bool => NativeValue::Bool(false),
            ParamType::Int => NativeValue::Int(0),
            ParamType::Float => NativeValue::Float(0.0),
            ParamType::Str => NativeValue::Str(String::new()),
            ParamType::Object(_) => NativeValue::Object(None),
            ParamType::Class(_) => NativeValue::Class(None),
            ParamType::Array(_) => NativeValue::Array(Vec::new()),
        }
    }
}

/// A declared parameter of a reflected function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: ParamType,
    pub flags: ParamFlags,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: ParamType, flags: ParamFlags) -> Self {
        Self {
            name: name.into(),
            ty,
            flags,
        }
    }

    /// An input parameter.
    pub fn input(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty, ParamFlags::PARM)
    }

    /// An out parameter.
    pub fn output(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty, ParamFlags::PARM | ParamFlags::OUT)
    }

    /// The return parameter.
    pub fn returns(ty: ParamType) -> Self {
        Self::new("ReturnValue", ty, ParamFlags::PARM | ParamFlags::RETURN)
    }
}

/// A value held in a parameter slot.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(Option<ObjectRef>),
    Class(Option<TypeHash>),
    Array(Vec<NativeValue>),
}

impl NativeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) => "int",
            NativeValue::Float(_) => "float",
            NativeValue::Str(_) => "string",
            NativeValue::Object(_) => "object",
            NativeValue::Class(_) => "class",
            NativeValue::Array(_) => "array",
        }
    }
}

#[derive(Debug)]
struct ParamSlot {
    flags: ParamFlags,
    value: NativeValue,
}

/// Storage for one native call.
///
/// Every declared parameter gets a slot initialized to its type's default.
/// Inputs are filled before the call, the native body writes outputs, and
/// the block is dropped once the outputs have been read back.
#[derive(Debug)]
pub struct ParamBlock {
    slots: Vec<ParamSlot>,
}

macro_rules! typed_getter {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(&self, index: usize) -> Result<$ty, NativeError> {
            match self.get(index)? {
                NativeValue::$variant(v) => Ok(v.clone()),
                other => Err(NativeError::ParamType {
                    index,
                    expected: $expected,
                    actual: other.type_name(),
                }),
            }
        }
    };
}

impl ParamBlock {
    /// Allocate and initialize storage for the declared parameters.
    pub fn new(decls: &[ParamDecl]) -> Self {
        Self {
            slots: decls
                .iter()
                .map(|decl| ParamSlot {
                    flags: decl.flags,
                    value: decl.ty.default_value(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current value of parameter `index`.
    pub fn get(&self, index: usize) -> Result<&NativeValue, NativeError> {
        self.slots
            .get(index)
            .map(|slot| &slot.value)
            .ok_or(NativeError::ParamIndexOutOfBounds {
                index,
                count: self.slots.len(),
            })
    }

    typed_getter!(boolean, Bool, bool, "bool");
    typed_getter!(int, Int, i64, "int");
    typed_getter!(float, Float, f64, "float");
    typed_getter!(string, Str, String, "string");
    typed_getter!(object, Object, Option<ObjectRef>, "object");
    typed_getter!(class, Class, Option<TypeHash>, "class");
    typed_getter!(array, Array, Vec<NativeValue>, "array");

    /// Write a parameter. The value must match the declared type.
    pub fn set(&mut self, index: usize, value: NativeValue) -> Result<(), NativeError> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(NativeError::ParamIndexOutOfBounds { index, count })?;
        if std::mem::discriminant(&slot.value) != std::mem::discriminant(&value) {
            return Err(NativeError::ParamType {
                index,
                expected: slot.value.type_name(),
                actual: value.type_name(),
            });
        }
        slot.value = value;
        Ok(())
    }

    /// Write the return parameter.
    pub fn set_return(&mut self, value: NativeValue) -> Result<(), NativeError> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.flags.contains(ParamFlags::RETURN))
            .ok_or(NativeError::NoReturnParam)?;
        self.set(index, value)
    }

    /// Output values in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (usize, &NativeValue)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.flags.is_output())
            .map(|(index, slot)| (index, &slot.value))
    }
}
