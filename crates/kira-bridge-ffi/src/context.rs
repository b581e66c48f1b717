use crate::marshal::{read_str, to_c_string};
use kira_bridge::inference::{EmitError, Emitter};
use kira_bridge::{Bridge, BridgeConfig, BridgeError, CancelToken, InferenceResult, OutStream};
use std::ffi::{CString, c_char, c_void};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives one streamed token. `token` is only valid for the duration of the call.
pub type TokenCallback = extern "C" fn(token: *const c_char, user_data: *mut c_void);

/// Strings handed out to the host. Each pointer stays valid until the next mutating
/// call replaces the buffer.
struct Published {
    response: CString,
    model_info: CString,
    last_error: CString,
}

/// A bridge plus the C strings it has published. Opaque to C.
pub struct KiraBridge {
    bridge: Bridge,
    published: Mutex<Published>,
}

impl KiraBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self::from_bridge(Bridge::new(config))
    }

    pub fn from_bridge(bridge: Bridge) -> Self {
        let published = Published {
            response: to_c_string(&bridge.last_response()),
            model_info: CString::from(c"null"),
            last_error: CString::default(),
        };
        Self {
            bridge,
            published: Mutex::new(published),
        }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// # Safety
    ///
    /// `path` must be null or a valid NUL-terminated string.
    pub unsafe fn initialize(&self, path: *const c_char) -> i32 {
        // SAFETY: forwarded caller contract.
        let result = unsafe { read_str(path, "model path") }
            .and_then(|path| self.bridge.initialize(path));
        let info = match self.bridge.model_info() {
            Some(info) => serde_json::to_string(&info).unwrap_or_else(|e| {
                log::warn!("[ffi] Failed to serialize model info: {e}");
                String::from("null")
            }),
            None => String::from("null"),
        };

        let mut published = self.lock_published();
        published.model_info = to_c_string(&info);
        self.finish(&mut published, result.map(|()| 0))
    }

    /// # Safety
    ///
    /// `prompt` must be null or a valid NUL-terminated string.
    pub unsafe fn run(&self, prompt: *const c_char) -> i32 {
        // SAFETY: forwarded caller contract.
        let result = unsafe { read_str(prompt, "prompt") }
            .and_then(|prompt| self.bridge.run_inference(prompt))
            .and_then(|result| status_for(&result));

        let mut published = self.lock_published();
        self.finish(&mut published, result)
    }

    /// # Safety
    ///
    /// `prompt` must be null or a valid NUL-terminated string. `user_data` is passed to
    /// `callback` untouched and must be valid for whatever the callback does with it.
    pub unsafe fn stream(
        &self,
        prompt: *const c_char,
        callback: Option<TokenCallback>,
        user_data: *mut c_void,
    ) -> i32 {
        // SAFETY: forwarded caller contract.
        let result = unsafe { read_str(prompt, "prompt") }.and_then(|prompt| {
            let callback = callback.ok_or_else(|| {
                BridgeError::InvalidInput("token callback is a null pointer".to_string())
            })?;
            let out = OutStream::new(Arc::new(CallbackEmitter {
                callback,
                user_data,
            }));
            let result = self.bridge.stream(prompt, &out, &CancelToken::new())?;
            status_for(&result)
        });

        let mut published = self.lock_published();
        self.finish(&mut published, result)
    }

    pub fn last_response(&self) -> *const c_char {
        self.lock_published().response.as_ptr()
    }

    pub fn model_info(&self) -> *const c_char {
        self.lock_published().model_info.as_ptr()
    }

    pub fn last_error(&self) -> *const c_char {
        self.lock_published().last_error.as_ptr()
    }

    fn lock_published(&self) -> std::sync::MutexGuard<'_, Published> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Refreshes the published response and error message, then maps the outcome to
    /// a status code.
    fn finish(&self, published: &mut Published, result: Result<i32, BridgeError>) -> i32 {
        published.response = to_c_string(&self.bridge.last_response());
        match result {
            Ok(code) => {
                published.last_error = CString::default();
                code
            }
            Err(e) => {
                log::warn!("[ffi] Call failed with {}: {e}", e.kind());
                published.last_error = to_c_string(&e.to_string());
                e.sentinel()
            }
        }
    }
}

/// Status code for a finished inference. A result that was not published is reported
/// as cancelled, since `get_last_response` does not show it.
fn status_for(result: &InferenceResult) -> Result<i32, BridgeError> {
    if !result.published {
        return Err(BridgeError::Cancelled);
    }
    published_len(&result.text)
}

/// Length of `text` as the host will see it through `get_last_response`.
fn published_len(text: &str) -> Result<i32, BridgeError> {
    let len = text.bytes().filter(|b| *b != 0).count();
    i32::try_from(len).map_err(|_| {
        BridgeError::ResourceExhausted(format!(
            "response of {len} bytes does not fit the status code"
        ))
    })
}

struct CallbackEmitter {
    callback: TokenCallback,
    user_data: *mut c_void,
}

// SAFETY: `Bridge::stream` emits synchronously on the calling thread, so the callback
// and `user_data` never leave the thread that passed them in.
unsafe impl Send for CallbackEmitter {}
unsafe impl Sync for CallbackEmitter {}

impl Emitter<String> for CallbackEmitter {
    fn emit(&self, item: String) -> Result<(), EmitError<String>> {
        let token = to_c_string(&item);
        (self.callback)(token.as_ptr(), self.user_data);
        Ok(())
    }
}
