//! Inference bridge.
//!
//! The [`Bridge`] owns a single model handle and a single response slot:
//! 1. [`Bridge::initialize`] creates the handle for a model path and picks a response policy.
//! 2. [`Bridge::run_inference`] generates one response, returns it and publishes it.
//! 3. [`Bridge::last_response`] reads the published response back.
//!
//! Streaming variants emit the response as word tokens through an [`OutStream`], either
//! inline ([`Bridge::stream`]) or on a background job ([`Bridge::spawn_stream`]).
mod bridge;
mod job;
mod streaming;


pub use bridge::{Bridge, InferenceResult};
pub use job::JobHandle;
pub use streaming::{
    CancelToken, ChannelEmitter, CollectEmitter, EmitError, Emitter, OutStream, word_tokens,
};
