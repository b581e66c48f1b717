use super::job::JobHandle;
use super::streaming::{CancelToken, ChannelEmitter, OutStream, word_tokens};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::model::{ModelHandle, ModelInfo, Variant, validate_model_path};
use crate::policy::{EngineFactory, ResponsePolicy, select_policy};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

const STREAM_CHANNEL_CAPACITY: usize = 16;

/// Outcome of one inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceResult {
    pub request_id: Uuid,
    pub variant: Variant,
    pub text: String,
    /// Whether `text` became the last response. `false` when the model was
    /// re-initialized while this result was being generated.
    pub published: bool,
}

impl InferenceResult {
    /// Length of the text in UTF-8 bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length as reported across the C boundary.
    pub fn status_len(&self) -> Result<i32, BridgeError> {
        i32::try_from(self.len()).map_err(|_| {
            BridgeError::ResourceExhausted(format!(
                "response of {} bytes does not fit the status code",
                self.len()
            ))
        })
    }
}

#[derive(Clone)]
struct LoadedModel {
    handle: Arc<ModelHandle>,
    policy: Arc<dyn ResponsePolicy>,
}

#[derive(Default)]
struct BridgeState {
    /// Bumped on every successful `initialize`; results generated for an older epoch
    /// are never published.
    epoch: u64,
    model: Option<LoadedModel>,
    last_response: Option<String>,
}

/// Native inference bridge: one model handle, one response slot.
///
/// The bridge is a caller-owned context; share it behind an [`Arc`] to call it from
/// several threads. `initialize` and the commit of an inference result are serialized
/// by an internal lock, generation itself runs outside of it.
pub struct Bridge {
    config: BridgeConfig,
    engine_factory: Option<EngineFactory>,
    state: Mutex<BridgeState>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            engine_factory: None,
            state: Mutex::new(BridgeState::default()),
        }
    }

    /// Routes every model initialized from now on through a real inference engine.
    pub fn with_engine_factory(mut self, factory: EngineFactory) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Creates the model handle for `path`, replacing any previous one, and clears the
    /// last response. On error the previous handle stays active.
    pub fn initialize(&self, path: &str) -> Result<(), BridgeError> {
        if self.config.validate_model_path {
            validate_model_path(path, &self.config.model_extensions)?;
        }

        let handle = ModelHandle::new(path, &self.config.wellness_marker);
        let policy = select_policy(&handle, &self.config, self.engine_factory.as_ref())?;
        log::info!(
            "[bridge] Model initialized: path={} variant={} policy={}",
            handle.path(),
            handle.variant(),
            policy.kind()
        );

        let previous = {
            let mut state = self.state.lock()?;
            state.epoch += 1;
            state.last_response = None;
            state.model.replace(LoadedModel {
                handle: Arc::new(handle),
                policy,
            })
        };
        // Released outside the lock: dropping an engine policy joins its worker.
        drop(previous);
        Ok(())
    }

    /// Runs one prompt and publishes the text as the last response.
    pub fn run_inference(&self, prompt: &str) -> Result<InferenceResult, BridgeError> {
        let (epoch, mut result) = self.generate(prompt, &CancelToken::new())?;
        self.commit(epoch, &mut result)?;
        Ok(result)
    }

    /// Runs one prompt and emits the response word by word to `out`. The complete text is
    /// published only once every token was delivered.
    pub fn stream(
        &self,
        prompt: &str,
        out: &OutStream<String>,
        cancel: &CancelToken,
    ) -> Result<InferenceResult, BridgeError> {
        let (epoch, mut result) = self.generate(prompt, cancel)?;
        for token in word_tokens(&result.text) {
            if cancel.is_cancelled() {
                log::info!("[{}] [bridge] Stream cancelled", result.request_id);
                return Err(BridgeError::Cancelled);
            }
            if let Err(e) = out.emit(token) {
                log::info!("[{}] [bridge] Stream stopped: {e}", result.request_id);
                return Err(BridgeError::Cancelled);
            }
        }
        self.commit(epoch, &mut result)?;
        Ok(result)
    }

    /// Same as [`Bridge::stream`] on a background thread. Tokens arrive on the job's
    /// bounded channel.
    pub fn spawn_stream(self: &Arc<Self>, prompt: &str) -> Result<JobHandle<String>, BridgeError> {
        let (tx, rx) = crossbeam::channel::bounded(STREAM_CHANNEL_CAPACITY);
        let cancel = CancelToken::new();
        let out = OutStream::new(Arc::new(ChannelEmitter::new(tx, cancel.clone())));
        let id = Uuid::new_v4();

        let bridge = Arc::clone(self);
        let prompt = prompt.to_string();
        let job_cancel = cancel.clone();
        let join = std::thread::Builder::new()
            .name(format!("kira-stream-{id}"))
            .spawn(move || bridge.stream(&prompt, &out, &job_cancel))
            .map_err(|e| BridgeError::Internal(format!("Failed to spawn stream job: {e}")))?;

        Ok(JobHandle::new(id, rx, cancel, join))
    }

    /// The last generated text, or a fixed default when nothing non-empty was generated
    /// since the last `initialize`. Never fails.
    pub fn last_response(&self) -> String {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(text) = state.last_response.as_ref().filter(|text| !text.is_empty()) {
            text.clone()
        } else if state
            .model
            .as_ref()
            .is_some_and(|model| model.handle.is_loaded())
        {
            self.config.greeting_response.clone()
        } else {
            self.config.not_loaded_response.clone()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .model
            .as_ref()
            .is_some_and(|model| model.handle.is_loaded())
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .model
            .as_ref()
            .map(|model| ModelInfo::new(&model.handle, model.policy.kind()))
    }

    fn snapshot(&self) -> Result<(u64, LoadedModel), BridgeError> {
        let state = self.state.lock()?;
        match &state.model {
            Some(model) if model.handle.is_loaded() => Ok((state.epoch, model.clone())),
            _ => Err(BridgeError::NotInitialized),
        }
    }

    fn generate(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<(u64, InferenceResult), BridgeError> {
        let (epoch, model) = self.snapshot()?;

        if let Some(max) = self.config.max_prompt_bytes {
            if prompt.len() > max {
                return Err(BridgeError::ResourceExhausted(format!(
                    "prompt of {} bytes exceeds the limit of {max}",
                    prompt.len()
                )));
            }
        }

        let request_id = Uuid::new_v4();
        log::info!(
            "[{request_id}] [bridge] Starting {} inference",
            model.policy.kind()
        );
        let text = model.policy.generate(prompt, cancel).inspect_err(|e| {
            log::error!("[{request_id}] [bridge] Inference failed: {e}");
        })?;

        let result = InferenceResult {
            request_id,
            variant: model.handle.variant(),
            text,
            published: false,
        };
        result.status_len()?;
        log::debug!(
            "[{request_id}] [bridge] Inference completed with {} bytes",
            result.len()
        );
        Ok((epoch, result))
    }

    fn commit(&self, epoch: u64, result: &mut InferenceResult) -> Result<(), BridgeError> {
        let mut state = self.state.lock()?;
        result.published = state.epoch == epoch;
        if result.published {
            state.last_response = Some(result.text.clone());
        } else {
            log::warn!(
                "[{}] [bridge] Model was re-initialized during inference, result not published",
                result.request_id
            );
        }
        Ok(())
    }
}
