//! Shared world for the integration tests.
//!
//! A `Computer` merged with a `PowerConnector` and a `Screen`. The screen
//! knows the power connector it draws from. A `Laptop` extends `Computer`
//! without a binding of its own.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use netbridge_core::convert::arg;
use netbridge_core::reflection::{NativeClass, NativeValue, ParamDecl, ParamType, ReflectedFunction};
use netbridge_core::{NativeError, NativeObject, NetworkComponent};
use netbridge_registry::PropertyBinding;
use netbridge::{Bridge, BridgeRegistry, Dynamic, ObjectRef, ObjectWorld, RegistryBuilder, ScriptHandle, TypeHash};

pub const COMPUTER_ID: &str = "AA11-BB22";

pub fn hash(name: &str) -> TypeHash {
    TypeHash::from_name(name)
}

// ============================================================================
// Native objects
// ============================================================================

pub struct Computer {
    class: TypeHash,
    id: String,
    nick: Mutex<String>,
    label: Mutex<String>,
    merged: Mutex<Vec<ObjectRef>>,
    screen: Option<ObjectRef>,
    pub calls: AtomicI64,
    busy: AtomicBool,
    pub overlaps: AtomicUsize,
}

impl Computer {
    pub fn new(id: &str, merged: Vec<ObjectRef>, screen: Option<ObjectRef>) -> Self {
        Self {
            class: hash("Computer"),
            id: id.to_string(),
            nick: Mutex::new(String::new()),
            label: Mutex::new(String::new()),
            merged: Mutex::new(merged),
            screen,
            calls: AtomicI64::new(0),
            busy: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
        }
    }

    pub fn laptop(id: &str) -> Self {
        Self {
            class: hash("Laptop"),
            ..Self::new(id, Vec::new(), None)
        }
    }

    pub fn set_merged(&self, merged: Vec<ObjectRef>) {
        *self.merged.lock() = merged;
    }

    /// Body of a slow call that records whether another call overlapped it.
    fn slow_increment(&self) -> i64 {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.busy.store(false, Ordering::SeqCst);
        calls
    }
}

impl NativeObject for Computer {
    fn class(&self) -> TypeHash {
        self.class
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_network_component(&self) -> Option<&dyn NetworkComponent> {
        Some(self)
    }
}

impl NetworkComponent for Computer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn nick(&self) -> String {
        self.nick.lock().clone()
    }

    fn set_nick(&self, nick: &str) {
        *self.nick.lock() = nick.to_string();
    }

    fn merged(&self) -> Vec<ObjectRef> {
        self.merged.lock().clone()
    }
}

pub struct PowerConnector {
    pub voltage: f64,
}

impl NativeObject for PowerConnector {
    fn class(&self) -> TypeHash {
        hash("PowerConnector")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Screen {
    pub width: i64,
    pub height: i64,
    pub power: Option<ObjectRef>,
}

impl NativeObject for Screen {
    fn class(&self) -> TypeHash {
        hash("Screen")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn computer(target: &dyn NativeObject) -> Result<&Computer, NativeError> {
    target
        .downcast_ref::<Computer>()
        .ok_or_else(|| NativeError::Failed("not a computer".to_string()))
}

// ============================================================================
// Registry
// ============================================================================

pub fn registry() -> BridgeRegistry {
    let mut builder = RegistryBuilder::new();
    builder.register_class(NativeClass::new("Actor")).unwrap();
    builder
        .register_class(
            NativeClass::new("Computer")
                .extends(hash("Actor"))
                .function(
                    ReflectedFunction::new("netFunc_getID", |target, block| {
                        block.set_return(NativeValue::Str(computer(target)?.id.clone()))
                    })
                    .param(ParamDecl::returns(ParamType::Str)),
                )
                .function(
                    ReflectedFunction::new("netFunc_add", |_, block| {
                        let sum = block.int(0)? + block.int(1)?;
                        block.set_return(NativeValue::Int(sum))
                    })
                    .param(ParamDecl::input("a", ParamType::Int))
                    .param(ParamDecl::input("b", ParamType::Int))
                    .param(ParamDecl::returns(ParamType::Int)),
                )
                .function(
                    ReflectedFunction::new("netFunc_increment", |target, block| {
                        let calls = computer(target)?.slow_increment();
                        block.set_return(NativeValue::Int(calls))
                    })
                    .param(ParamDecl::returns(ParamType::Int)),
                )
                .function(
                    ReflectedFunction::new("netFunc_getScreen", |target, block| {
                        block.set_return(NativeValue::Object(computer(target)?.screen))
                    })
                    .param(ParamDecl::returns(ParamType::Object(Some(hash("Screen"))))),
                )
                .function(
                    ReflectedFunction::new("netFunc_incrementBy", |target, block| {
                        let amount = block.int(0)?;
                        let calls = computer(target)?.calls.fetch_add(amount, Ordering::SeqCst) + amount;
                        block.set_return(NativeValue::Int(calls))
                    })
                    .param(ParamDecl::input("amount", ParamType::Int))
                    .param(ParamDecl::returns(ParamType::Int)),
                )
                .function(ReflectedFunction::new("selfTest", |_, _| Ok(()))),
        )
        .unwrap();
    builder
        .register_class(NativeClass::new("Laptop").extends(hash("Computer")))
        .unwrap();
    builder
        .register_class(NativeClass::new("PowerConnector").extends(hash("Actor")))
        .unwrap();
    builder
        .register_class(
            NativeClass::new("Screen")
                .extends(hash("Actor"))
                .function(
                    ReflectedFunction::new("netFunc_getResolution", |target, block| {
                        let screen = target
                            .downcast_ref::<Screen>()
                            .ok_or_else(|| NativeError::Failed("not a screen".to_string()))?;
                        block.set(0, NativeValue::Int(screen.width))?;
                        block.set(1, NativeValue::Int(screen.height))?;
                        block.set_return(NativeValue::Bool(true))
                    })
                    .param(ParamDecl::output("width", ParamType::Int))
                    .param(ParamDecl::output("height", ParamType::Int))
                    .param(ParamDecl::returns(ParamType::Bool)),
                )
                .function(ReflectedFunction::new("netFunc_blank", |_, _| {
                    Err(NativeError::Failed("no signal".to_string()))
                }))
                .function(
                    ReflectedFunction::new("netFunc_getPower", |target, block| {
                        let screen = target
                            .downcast_ref::<Screen>()
                            .ok_or_else(|| NativeError::Failed("not a screen".to_string()))?;
                        block.set_return(NativeValue::Object(screen.power))
                    })
                    .param(ParamDecl::returns(ParamType::Object(Some(hash("PowerConnector"))))),
                ),
        )
        .unwrap();

    builder.register_type(hash("Computer"), "Computer", false).unwrap();
    builder.register_type(hash("Computer"), "ComputerClass", true).unwrap();
    builder.register_type(hash("PowerConnector"), "PowerConnector", false).unwrap();
    builder.register_type(hash("Screen"), "Screen", false).unwrap();

    builder
        .register_function(hash("Computer"), "describe", |_, _| Ok(vec![Dynamic::String("computer".into())]))
        .unwrap();
    builder
        .register_property(
            hash("Computer"),
            "label",
            PropertyBinding::read_write(
                |ctx| ctx.with_target(|c: &Computer| Dynamic::String(c.label.lock().clone())),
                |ctx, value| {
                    let label = arg::<String>(&[value], 0)?;
                    ctx.with_target(|c: &Computer| *c.label.lock() = label)
                },
            ),
        )
        .unwrap();
    builder
        .register_class_function(hash("Computer"), "__tostring", |_, _| {
            Ok(vec![Dynamic::String("Computer (class)".into())])
        })
        .unwrap();
    builder
        .register_class_function(hash("Computer"), "self", |ctx, _| Ok(vec![ctx.class_handle(ctx.class())]))
        .unwrap();

    builder
        .register_property(
            hash("PowerConnector"),
            "voltage",
            PropertyBinding::read_only(|ctx| ctx.with_target(|p: &PowerConnector| Dynamic::Float(p.voltage))),
        )
        .unwrap();
    builder
        .register_function(hash("PowerConnector"), "isConnected", |ctx, _| {
            let target = ctx.trace().target();
            Ok(vec![Dynamic::Bool(true), Dynamic::Int(i64::from(target.index))])
        })
        .unwrap();

    builder
        .register_function(hash("Screen"), "describe", |_, _| Ok(vec![Dynamic::String("screen".into())]))
        .unwrap();
    builder
        .register_function(hash("Screen"), "isConnected", |_, _| Ok(vec![Dynamic::Bool(false)]))
        .unwrap();

    builder.build()
}

// ============================================================================
// World
// ============================================================================

pub struct Fixture {
    pub bridge: Bridge,
    pub computer: ObjectRef,
    pub power: ObjectRef,
    pub screen: ObjectRef,
}

impl Fixture {
    pub fn new() -> Self {
        let world = Arc::new(ObjectWorld::new());
        let power = world.spawn(PowerConnector { voltage: 230.0 });
        let screen = world.spawn(Screen {
            width: 1920,
            height: 1080,
            power: Some(power),
        });
        let computer = world.spawn(Computer::new(COMPUTER_ID, vec![power, screen], Some(screen)));
        Self {
            bridge: Bridge::new(registry(), world),
            computer,
            power,
            screen,
        }
    }

    pub fn handle(&self, object: ObjectRef) -> ScriptHandle {
        match self.bridge.instance(object) {
            Dynamic::Handle(handle) => handle,
            other => panic!("object {object:?} has no handle: {other:?}"),
        }
    }

    pub fn computer_handle(&self) -> ScriptHandle {
        self.handle(self.computer)
    }

    pub fn computer_class(&self) -> ScriptHandle {
        match self.bridge.class_instance(hash("Computer")) {
            Dynamic::Handle(handle) => handle,
            other => panic!("Computer has no class handle: {other:?}"),
        }
    }

    pub fn with_computer<R>(&self, f: impl FnOnce(&Computer) -> R) -> R {
        let object = self.bridge.world().get(self.computer).unwrap();
        f(object.downcast_ref::<Computer>().unwrap())
    }
}
