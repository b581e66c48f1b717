use crate::error::LaunchError;
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

/// Owned, NULL-terminated `argv` for a C `main`-style entry point.
///
/// The strings are heap buffers owned by this value; the entry point may rewrite them in
/// place, as libuv does with the process title.
pub struct CArgv {
    ptrs: Vec<*mut c_char>,
}

// SAFETY: every pointer is an exclusively owned allocation from `CString::into_raw`.
unsafe impl Send for CArgv {}

impl CArgv {
    pub fn new<I, S>(args: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        let strings = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| {
                CString::new(arg).map_err(|e| {
                    LaunchError::InvalidArgument(format!(
                        "argument {i} contains a NUL byte at {}",
                        e.nul_position()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if strings.is_empty() {
            return Err(LaunchError::InvalidArgument(
                "argv must contain at least the program name".to_string(),
            ));
        }
        if c_int::try_from(strings.len()).is_err() {
            return Err(LaunchError::InvalidArgument(format!(
                "{} arguments do not fit in argc",
                strings.len()
            )));
        }

        let mut ptrs: Vec<*mut c_char> = strings.into_iter().map(CString::into_raw).collect();
        ptrs.push(ptr::null_mut());
        Ok(Self { ptrs })
    }

    pub fn argc(&self) -> c_int {
        // Checked against `c_int` in `new`.
        (self.ptrs.len() - 1) as c_int
    }

    /// Pointer to the first element. `argv[argc]` is NULL.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }

    pub fn args(&self) -> impl Iterator<Item = &CStr> {
        self.ptrs[..self.ptrs.len() - 1]
            .iter()
            // SAFETY: non-null NUL-terminated buffers owned by `self`.
            .map(|p| unsafe { CStr::from_ptr(*p) })
    }
}

impl Drop for CArgv {
    fn drop(&mut self) {
        for p in self.ptrs.drain(..).filter(|p| !p.is_null()) {
            // SAFETY: produced by `CString::into_raw` in `new` and released only here.
            drop(unsafe { CString::from_raw(p) });
        }
    }
}
