use crate::argv::CArgv;
use crate::launcher::RuntimeEntry;
use std::ffi::{c_char, c_int};

unsafe extern "C" {
    /// C-linkage shim compiled into the host app that forwards to `node::Start`.
    fn kira_node_start(argc: c_int, argv: *mut *mut c_char) -> c_int;
}

/// Node.js entry point resolved at link time.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeEntry;

impl RuntimeEntry for NodeEntry {
    fn start(&self, argv: &mut CArgv) -> i32 {
        // SAFETY: `argv` holds `argc` valid NUL-terminated strings followed by NULL and
        // outlives the call.
        unsafe { kira_node_start(argv.argc(), argv.as_mut_ptr()) }
    }
}
