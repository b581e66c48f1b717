use super::bridge::InferenceResult;
use super::streaming::CancelToken;
use crate::error::BridgeError;
use std::thread::JoinHandle;
use uuid::Uuid;

/// Handle to a streaming inference running on a background thread.
pub struct JobHandle<S> {
    pub id: Uuid,
    pub stream: crossbeam::channel::Receiver<S>,
    cancel: CancelToken,
    join: Option<JoinHandle<Result<InferenceResult, BridgeError>>>,
}

impl<S> JobHandle<S> {
    pub fn new(
        id: Uuid,
        stream: crossbeam::channel::Receiver<S>,
        cancel: CancelToken,
        join: JoinHandle<Result<InferenceResult, BridgeError>>,
    ) -> Self {
        Self {
            id,
            stream,
            cancel,
            join: Some(join),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the job and returns the complete result.
    pub fn join(mut self) -> Result<InferenceResult, BridgeError> {
        match self.join.take() {
            Some(join) => join.join().unwrap_or_else(|e| {
                Err(BridgeError::Internal(format!(
                    "Inference thread panicked: {e:?}"
                )))
            }),
            None => Err(BridgeError::Internal("Job was already joined".to_string())),
        }
    }
}
