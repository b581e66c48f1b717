use super::{PolicyKind, ResponsePolicy};
use crate::error::BridgeError;
use crate::inference::CancelToken;
use crate::model::ModelHandle;
use crossbeam::channel::RecvTimeoutError;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A genuine model-execution backend. It is owned by a dedicated worker thread, so it
/// only needs to be `Send`.
pub trait InferenceEngine: Send + 'static {
    /// Runs one prompt to completion. Long-running engines should check `cancel`
    /// between steps and stop early once it fires.
    fn generate(&mut self, prompt: &str, cancel: &CancelToken) -> anyhow::Result<String>;
}

/// Loads an engine for the model selected by `initialize`.
pub type EngineFactory =
    Arc<dyn Fn(&ModelHandle) -> anyhow::Result<Box<dyn InferenceEngine>> + Send + Sync>;

/// Wraps a closure as an [`EngineFactory`].
pub fn engine_factory<F>(factory: F) -> EngineFactory
where
    F: Fn(&ModelHandle) -> anyhow::Result<Box<dyn InferenceEngine>> + Send + Sync + 'static,
{
    Arc::new(factory)
}

struct Request {
    prompt: String,
    cancel: CancelToken,
    reply: crossbeam::channel::Sender<anyhow::Result<String>>,
}

/// Owns an [`InferenceEngine`] on its own thread and serializes requests to it.
pub struct EngineHost {
    tx: crossbeam::channel::Sender<Request>,
    abort_tx: crossbeam::channel::Sender<()>,
    join_handle: Option<JoinHandle<()>>,
}

impl EngineHost {
    pub fn spawn(engine: Box<dyn InferenceEngine>) -> Result<Self, BridgeError> {
        let (abort_tx, abort_rx) = crossbeam::channel::bounded::<()>(1);
        let (tx, rx) = crossbeam::channel::unbounded::<Request>();
        let join_handle = std::thread::Builder::new()
            .name("kira-engine".to_string())
            .spawn(move || {
                let mut engine = engine;
                loop {
                    crossbeam::channel::select! {
                        recv(rx) -> msg => {
                            match msg {
                                Ok(request) => {
                                    let result = if request.cancel.is_cancelled() {
                                        Err(anyhow::anyhow!("Request cancelled before start"))
                                    } else {
                                        engine.generate(&request.prompt, &request.cancel)
                                    };
                                    let _ = request.reply.send(result);
                                }
                                Err(_) => break,
                            }
                        }
                        recv(abort_rx) -> _ => {
                            break;
                        }
                    }
                }
                log::debug!("Engine worker stopped");
            })
            .map_err(|e| BridgeError::ModelLoadFailed(e.into()))?;

        Ok(Self {
            tx,
            abort_tx,
            join_handle: Some(join_handle),
        })
    }

    /// Queues a prompt. The returned channel yields exactly one reply, or disconnects if
    /// the worker dies.
    pub fn submit(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<crossbeam::channel::Receiver<anyhow::Result<String>>, BridgeError> {
        let (reply, reply_rx) = crossbeam::channel::bounded(1);
        self.tx
            .send(Request {
                prompt: prompt.to_string(),
                cancel: cancel.clone(),
                reply,
            })
            .map_err(|_| BridgeError::InferenceFailed(anyhow::anyhow!("Engine worker stopped")))?;
        Ok(reply_rx)
    }
}

impl Drop for EngineHost {
    fn drop(&mut self) {
        let _ = self.abort_tx.try_send(());
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.join();
        }
    }
}

/// Policy that forwards prompts to an attached engine, bounded by a timeout.
pub struct EnginePolicy {
    host: EngineHost,
    timeout: Duration,
}

impl EnginePolicy {
    pub fn spawn(engine: Box<dyn InferenceEngine>, timeout: Duration) -> Result<Self, BridgeError> {
        Ok(Self {
            host: EngineHost::spawn(engine)?,
            timeout,
        })
    }
}

impl ResponsePolicy for EnginePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RealEngine
    }

    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String, BridgeError> {
        let reply = self.host.submit(prompt, cancel)?;
        let deadline = Instant::now() + self.timeout;
        loop {
            match reply.recv_timeout(REPLY_POLL_INTERVAL) {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(_)) if cancel.is_cancelled() => return Err(BridgeError::Cancelled),
                Ok(Err(e)) => return Err(BridgeError::InferenceFailed(e)),
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        return Err(BridgeError::Cancelled);
                    }
                    if Instant::now() >= deadline {
                        // Nobody will read this result anymore.
                        cancel.cancel();
                        log::warn!("Engine did not answer within {:?}", self.timeout);
                        return Err(BridgeError::Timeout(self.timeout));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(BridgeError::InferenceFailed(anyhow::anyhow!(
                        "Engine worker stopped"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Echo;

    impl InferenceEngine for Echo {
        fn generate(&mut self, prompt: &str, _cancel: &CancelToken) -> anyhow::Result<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    struct Slow;

    impl InferenceEngine for Slow {
        fn generate(&mut self, _prompt: &str, cancel: &CancelToken) -> anyhow::Result<String> {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            anyhow::bail!("stopped")
        }
    }

    struct Broken;

    impl InferenceEngine for Broken {
        fn generate(&mut self, _prompt: &str, _cancel: &CancelToken) -> anyhow::Result<String> {
            anyhow::bail!("out of memory")
        }
    }

    #[test]
    fn forwards_prompt_to_engine() {
        let policy = EnginePolicy::spawn(Box::new(Echo), Duration::from_secs(5)).unwrap();
        let text = policy.generate("hi", &CancelToken::new()).unwrap();
        assert_eq!(text, "echo: hi");
        assert_eq!(policy.kind(), PolicyKind::RealEngine);
    }

    #[test]
    fn times_out_and_cancels_the_engine() {
        let policy = EnginePolicy::spawn(Box::new(Slow), Duration::from_millis(50)).unwrap();
        let cancel = CancelToken::new();
        let err = policy.generate("hi", &cancel).unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn caller_cancellation_stops_waiting() {
        let policy = EnginePolicy::spawn(Box::new(Slow), Duration::from_secs(30)).unwrap();
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });
        let err = policy.generate("hi", &cancel).unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, BridgeError::Cancelled));
    }

    #[test]
    fn engine_errors_are_inference_failures() {
        let policy = EnginePolicy::spawn(Box::new(Broken), Duration::from_secs(5)).unwrap();
        let err = policy.generate("hi", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, BridgeError::InferenceFailed(_)));
    }
}
