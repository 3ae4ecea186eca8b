//! Dispatch benchmarks.
//!
//! - Member lookup: cold (fresh dispatcher every iteration) vs cached
//! - Calls: registered library function, reflected function with argument
//!   marshaling, reflected function on a merged object
//! - Persistence: snapshot of a runtime holding handles
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- dispatch
//! ```

#[path = "../tests/common/mod.rs"]
mod common;

use std::hint::black_box;

use common::Fixture;
use criterion::{Criterion, criterion_group, criterion_main};
use netbridge::{Dispatcher, Dynamic};

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn lookup_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let fixture = Fixture::new();
    let computer = fixture.computer_handle();

    let mut group = c.benchmark_group("dispatch/lookup");

    group.bench_function("cold", |b| {
        b.iter(|| {
            let mut dispatcher = Dispatcher::new(fixture.bridge.clone());
            let member = dispatcher.index(black_box(&computer), "getResolution").unwrap();
            end_profiling_frame();
            black_box(member)
        });
    });

    let mut dispatcher = Dispatcher::new(fixture.bridge.clone());
    dispatcher.index(&computer, "getResolution").unwrap();
    group.bench_function("cached", |b| {
        b.iter(|| {
            let member = dispatcher.index(black_box(&computer), "getResolution").unwrap();
            end_profiling_frame();
            black_box(member)
        });
    });

    group.bench_function("merged_property", |b| {
        b.iter(|| black_box(dispatcher.index(black_box(&computer), "voltage").unwrap()));
    });

    group.finish();
}

fn call_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let fixture = Fixture::new();
    let computer = fixture.computer_handle();
    let mut runtime = fixture.bridge.runtime();
    let dispatcher = runtime.dispatcher_mut();
    let args = [Dynamic::Int(40), Dynamic::Int(2)];

    let mut group = c.benchmark_group("dispatch/call");

    group.bench_function("library", |b| {
        b.iter(|| black_box(dispatcher.call_method(&computer, "describe", &[]).unwrap()));
    });

    group.bench_function("reflected_with_args", |b| {
        b.iter(|| {
            let results = dispatcher.call_method(&computer, "add", black_box(&args)).unwrap();
            end_profiling_frame();
            black_box(results)
        });
    });

    group.bench_function("reflected_on_merged", |b| {
        b.iter(|| black_box(dispatcher.call_method(&computer, "getResolution", &[]).unwrap()));
    });

    group.finish();
}

fn persist_benchmarks(c: &mut Criterion) {
    let fixture = Fixture::new();
    let mut runtime = fixture.bridge.runtime();
    for i in 0..32 {
        runtime.set_global(format!("computer{i}"), Dynamic::Handle(fixture.computer_handle()));
        runtime.set_global(format!("screen{i}"), Dynamic::Handle(fixture.handle(fixture.screen)));
    }

    c.bench_function("persist/snapshot_to_json", |b| {
        b.iter(|| black_box(runtime.persist().to_json().unwrap()));
    });
}

criterion_group!(benches, lookup_benchmarks, call_benchmarks, persist_benchmarks);
criterion_main!(benches);
