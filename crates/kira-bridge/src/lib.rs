//! Single-model native inference bridge.
//!
//! A host application initializes a model by path, submits prompts and reads the last
//! produced text back. Response generation is delegated to a [`policy::ResponsePolicy`]:
//! a rule-based wellness responder, a fixed placeholder, or a real inference engine
//! attached through [`policy::EngineFactory`].
//!
//! The C ABI over this crate lives in `kira-bridge-ffi`.

pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod model;
pub mod policy;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{BridgeConfig, ConfigError};
pub use error::{BridgeError, ErrorKind};
pub use inference::{Bridge, CancelToken, InferenceResult, JobHandle, OutStream};
pub use model::{ModelHandle, ModelInfo, ModelStatus, Variant};
pub use policy::{EngineFactory, InferenceEngine, PolicyKind, ResponsePolicy};
