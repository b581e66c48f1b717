//! C ABI for the Kira inference bridge.
//!
//! The fixed symbols `llama_init`, `gemma_run` and `get_last_response` operate on one
//! process-wide bridge, meant to be called from a single host worker thread. Hosts that
//! need isolated or concurrent models use the `kira_bridge_*` symbols, which take a
//! caller-owned context.
//!
//! Status codes: a non-negative value is success (for inference calls, the response
//! length in bytes), a negative value is an error sentinel from
//! [`kira_bridge::ErrorKind::sentinel`]. Strings returned to the host are owned by the
//! library and stay valid until the next mutating call on the same bridge.
//!
//! See `include/kira_bridge.h` for the C declarations.

mod context;
mod exports;
mod marshal;

pub use context::{KiraBridge, TokenCallback};
pub use exports::*;
