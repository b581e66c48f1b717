use crate::context::{KiraBridge, TokenCallback};
use crate::marshal::guard;
use kira_bridge::{BridgeConfig, ErrorKind};
use once_cell::sync::Lazy;
use std::ffi::{c_char, c_void};
use std::ptr;

const INTERNAL: i32 = ErrorKind::Internal.sentinel();
const INVALID_INPUT: i32 = ErrorKind::InvalidInput.sentinel();

static GLOBAL: Lazy<KiraBridge> = Lazy::new(|| {
    let config = BridgeConfig::from_env().unwrap_or_else(|e| {
        log::warn!("[ffi] Ignoring bridge config: {e}");
        BridgeConfig::default()
    });
    KiraBridge::new(config)
});

pub(crate) fn global() -> &'static KiraBridge {
    &GLOBAL
}

/// Installs the `env_logger` backend. Returns 0, or 1 when a logger was already set.
#[unsafe(no_mangle)]
pub extern "C" fn kira_init_logging() -> i32 {
    guard(INTERNAL, || {
        if kira_bridge::logging::try_init_logger() {
            0
        } else {
            1
        }
    })
}

/// Initializes the process-wide model handle.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn llama_init(path: *const c_char) -> i32 {
    // SAFETY: forwarded caller contract.
    guard(INTERNAL, || unsafe { global().initialize(path) })
}

/// Runs one prompt on the process-wide model. Returns the response length in bytes,
/// or a negative status (`-1` when no model is initialized).
///
/// # Safety
///
/// `prompt` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gemma_run(prompt: *const c_char) -> i32 {
    // SAFETY: forwarded caller contract.
    guard(INTERNAL, || unsafe { global().run(prompt) })
}

/// Last response of the process-wide bridge. Owned by the library and valid until the
/// next `llama_init`, `gemma_run` or `gemma_stream` call.
#[unsafe(no_mangle)]
pub extern "C" fn get_last_response() -> *const c_char {
    guard(ptr::null(), || global().last_response())
}

/// Streams the response word by word to `callback`, then publishes it like `gemma_run`.
///
/// # Safety
///
/// `prompt` must be null or a valid NUL-terminated string; `user_data` must be valid
/// for `callback`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn gemma_stream(
    prompt: *const c_char,
    callback: Option<TokenCallback>,
    user_data: *mut c_void,
) -> i32 {
    // SAFETY: forwarded caller contract.
    guard(INTERNAL, || unsafe {
        global().stream(prompt, callback, user_data)
    })
}

/// JSON description of the active model, or `null` before initialization.
#[unsafe(no_mangle)]
pub extern "C" fn gemma_model_info() -> *const c_char {
    guard(ptr::null(), || global().model_info())
}

/// Message of the most recent failure on the process-wide bridge; empty after a
/// successful call.
#[unsafe(no_mangle)]
pub extern "C" fn kira_last_error() -> *const c_char {
    guard(ptr::null(), || global().last_error())
}

/// Creates a caller-owned bridge configured from `KIRA_BRIDGE_CONFIG` or defaults.
/// Release it with `kira_bridge_free`.
#[unsafe(no_mangle)]
pub extern "C" fn kira_bridge_new() -> *mut KiraBridge {
    guard(ptr::null_mut(), || {
        let config = BridgeConfig::from_env().unwrap_or_else(|e| {
            log::warn!("[ffi] Ignoring bridge config: {e}");
            BridgeConfig::default()
        });
        Box::into_raw(Box::new(KiraBridge::new(config)))
    })
}

/// # Safety
///
/// `ctx` must be null or a pointer returned by `kira_bridge_new` that was not freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kira_bridge_free(ctx: *mut KiraBridge) {
    if !ctx.is_null() {
        // SAFETY: allocated by `kira_bridge_new` and not freed yet.
        guard((), || drop(unsafe { Box::from_raw(ctx) }));
    }
}

/// # Safety
///
/// `ctx` must be null or a live context; `path` must be null or a valid
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kira_bridge_initialize(ctx: *const KiraBridge, path: *const c_char) -> i32 {
    // SAFETY: forwarded caller contract.
    match unsafe { ctx.as_ref() } {
        Some(ctx) => guard(INTERNAL, || unsafe { ctx.initialize(path) }),
        None => INVALID_INPUT,
    }
}

/// # Safety
///
/// `ctx` must be null or a live context; `prompt` must be null or a valid
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kira_bridge_run(ctx: *const KiraBridge, prompt: *const c_char) -> i32 {
    // SAFETY: forwarded caller contract.
    match unsafe { ctx.as_ref() } {
        Some(ctx) => guard(INTERNAL, || unsafe { ctx.run(prompt) }),
        None => INVALID_INPUT,
    }
}

/// Last response of a caller-owned bridge, valid until its next mutating call.
///
/// # Safety
///
/// `ctx` must be null or a live context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kira_bridge_last_response(ctx: *const KiraBridge) -> *const c_char {
    // SAFETY: forwarded caller contract.
    match unsafe { ctx.as_ref() } {
        Some(ctx) => guard(ptr::null(), || ctx.last_response()),
        None => ptr::null(),
    }
}

/// Error message of the last failed call on a caller-owned bridge.
///
/// # Safety
///
/// `ctx` must be null or a live context.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn kira_bridge_last_error(ctx: *const KiraBridge) -> *const c_char {
    // SAFETY: forwarded caller contract.
    match unsafe { ctx.as_ref() } {
        Some(ctx) => guard(ptr::null(), || ctx.last_error()),
        None => ptr::null(),
    }
}
