use kira_bridge::BridgeError;
use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Borrows a NUL-terminated UTF-8 string from the host.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated buffer that stays valid and
/// unmodified for `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, BridgeError> {
    if ptr.is_null() {
        return Err(BridgeError::InvalidInput(format!("{what} is a null pointer")));
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str()
        .map_err(|e| BridgeError::InvalidInput(format!("{what} is not valid UTF-8: {e}")))
}

/// Converts text for the host. Interior NUL bytes cannot be represented in a C string
/// and are dropped.
pub(crate) fn to_c_string(text: &str) -> CString {
    CString::new(text).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    })
}

/// Runs `f`, turning a panic into `fallback` so it never unwinds into the host.
pub(crate) fn guard<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        log::error!("[ffi] Panic caught at the C boundary");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointer_is_invalid_input() {
        let err = unsafe { read_str(std::ptr::null(), "prompt") }.unwrap_err();
        assert_eq!(err.sentinel(), -2);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = [0xff_u8, 0xfe, 0x00];
        let err = unsafe { read_str(bytes.as_ptr().cast(), "path") }.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn strips_interior_nul() {
        assert_eq!(to_c_string("a\0b").as_bytes(), b"ab");
        assert_eq!(to_c_string("plain").as_bytes(), b"plain");
    }

    #[test]
    fn guard_turns_panic_into_fallback() {
        assert_eq!(guard(-9, || panic!("boom")), -9);
        assert_eq!(guard(-9, || 3), 3);
    }
}
