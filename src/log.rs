//! Engine diagnostics.
//!
//! Messages go to the browser console when compiled for wasm32. Native builds
//! (tests, tooling) have no console to write to and drop them.

/// Master switch for diagnostic output.
pub const ENABLED: bool = true;

pub fn debug(scope: &str, message: &str) {
    if ENABLED {
        emit(false, scope, message);
    }
}

pub fn warn(scope: &str, message: &str) {
    if ENABLED {
        emit(true, scope, message);
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(warning: bool, scope: &str, message: &str) {
    let line = wasm_bindgen::JsValue::from_str(&format!("[{scope}] {message}"));
    if warning {
        web_sys::console::warn_1(&line);
    } else {
        web_sys::console::log_1(&line);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_warning: bool, _scope: &str, _message: &str) {}
