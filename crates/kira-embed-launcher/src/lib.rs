//! Launcher for a JavaScript runtime embedded in the host process.
//!
//! The runtime's process entry point is reached through [`RuntimeEntry`]. Its lifecycle
//! is independent of the inference bridge: it is started once, runs until it exits, and
//! cannot be restarted.
//!
//! Features:
//! * `libnode` provides [`NodeEntry`], which calls a host-linked `kira_node_start` shim.
//! * `jni` exports `Java_com_kira_app_NodeBridge_startNode` on top of it.

mod argv;
mod error;
mod launcher;

#[cfg(feature = "libnode")]
mod node;

#[cfg(feature = "jni")]
pub mod jni;

pub use argv::CArgv;
pub use error::LaunchError;
pub use launcher::{EmbeddedRuntime, LaunchHandle, LaunchState, RuntimeEntry};

#[cfg(feature = "libnode")]
pub use node::NodeEntry;
