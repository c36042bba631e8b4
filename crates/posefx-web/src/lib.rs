pub mod runner;

pub use runner::EffectsRunner;

use std::cell::RefCell;

use posefx::{CompletionCallback, DispatchOutcome};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<EffectsRunner>> = RefCell::new(None);
    /// Completions raised during a runner call, invoked once the runner is
    /// released so callbacks may call back into the bridge.
    static DUE: RefCell<Vec<(js_sys::Function, u32)>> = RefCell::new(Vec::new());
}

/// Run `f` against the runner. Logs and returns `None` before `fx_init`.
fn with_runner<R>(f: impl FnOnce(&mut EffectsRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::error!("posefx not initialized; call fx_init() first");
                None
            }
        }
    })
}

/// Wire code for a dispatch result.
fn outcome_code(outcome: DispatchOutcome) -> u32 {
    match outcome {
        DispatchOutcome::Ignored => 0,
        DispatchOutcome::Dispatched { queued: false, .. } => 1,
        DispatchOutcome::Dispatched { queued: true, .. } => 2,
        DispatchOutcome::Rejected { .. } => 3,
        DispatchOutcome::Skipped(_) => 4,
    }
}

fn js_callback(f: Option<js_sys::Function>) -> Option<CompletionCallback> {
    f.map(|f| -> CompletionCallback {
        Box::new(move |label| DUE.with(|due| due.borrow_mut().push((f, label.index()))))
    })
}

/// Invoke queued completions. Exceptions are reported to the console and
/// swallowed.
fn flush_callbacks() {
    let due = DUE.with(|due| std::mem::take(&mut *due.borrow_mut()));
    for (f, label) in due {
        if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from(label)) {
            web_sys::console::error_1(&e);
        }
    }
}

#[wasm_bindgen]
pub fn fx_init(config_json: &str) -> bool {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    match EffectsRunner::new(config_json) {
        Ok(runner) => {
            RUNNER.with(|cell| *cell.borrow_mut() = Some(runner));
            log::info!("posefx: initialized");
            true
        }
        Err(e) => {
            log::error!("posefx: {}", e);
            false
        }
    }
}

#[wasm_bindgen]
pub fn fx_load_manifest(json: &str) -> bool {
    with_runner(|r| match r.load_manifest(json) {
        Ok(n) => {
            log::info!("manifest: {} textures", n);
            true
        }
        Err(e) => {
            log::error!("manifest: {}", e);
            false
        }
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn fx_texture_loaded(name: &str, ok: bool) -> bool {
    with_runner(|r| r.texture_loaded(name, ok)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn fx_vector_asset_loaded(json: &str) {
    with_runner(|r| r.vector_asset_loaded(json));
}

#[wasm_bindgen]
pub fn fx_vector_asset_failed(reason: &str) {
    with_runner(|r| r.vector_asset_failed(reason));
}

/// Dispatch a label directly. Negative `label` means no confident label.
#[wasm_bindgen]
pub fn fx_show_effect(label: i32, landmarks: &[f32], on_complete: Option<js_sys::Function>) -> u32 {
    let callback = js_callback(on_complete);
    with_runner(|r| outcome_code(r.show_effect(label, landmarks, callback))).unwrap_or(0)
}

/// Dispatch a label once it has been seen enough frames in a row.
#[wasm_bindgen]
pub fn fx_observe_label(label: i32, landmarks: &[f32], on_complete: Option<js_sys::Function>) -> u32 {
    let callback = js_callback(on_complete);
    with_runner(|r| outcome_code(r.observe_label(label, landmarks, callback))).unwrap_or(0)
}

#[wasm_bindgen]
pub fn fx_update_landmarks(landmarks: &[f32]) {
    with_runner(|r| r.update_landmarks(landmarks));
}

#[wasm_bindgen]
pub fn fx_is_effect_in_progress() -> bool {
    with_runner(|r| r.is_effect_in_progress()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn fx_tick(now_ms: f64) {
    with_runner(|r| r.tick(now_ms));
    flush_callbacks();
}

#[wasm_bindgen]
pub fn fx_stop_all() {
    with_runner(|r| r.stop_all());
    flush_callbacks();
}

// ---- Commentary ----

#[wasm_bindgen]
pub fn fx_commentary_text() -> String {
    with_runner(|r| r.commentary_text()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn fx_commentary_generation() -> f64 {
    with_runner(|r| r.commentary_generation() as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn fx_commentary_animation_end() {
    with_runner(|r| r.commentary_animation_end());
}

// ---- Buffer accessors ----

#[wasm_bindgen]
pub fn get_frame_ptr() -> *const f32 {
    with_runner(|r| r.frame_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_frame_len() -> u32 {
    with_runner(|r| r.frame_len()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_instance_count() -> u32 {
    with_runner(|r| r.instance_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_vector_vertex_count() -> u32 {
    with_runner(|r| r.vector_vertex_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_buffer_total_floats() -> u32 {
    with_runner(|r| r.layout().buffer_total_floats as u32).unwrap_or(0)
}
