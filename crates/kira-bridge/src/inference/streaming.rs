use derive_more::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const SEND_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Error returned when emitting an item fails.
/// The item of type [T](EmitError::item) is returned to allow for potential retries.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct EmitError<T> {
    #[source]
    pub source: anyhow::Error,
    pub item: T,
}

/// The sending side of a token stream.
pub trait Emitter<T>: Send + Sync + 'static {
    fn emit(&self, item: T) -> Result<(), EmitError<T>>;
}

/// A token that can be used to cancel an ongoing inference.
#[derive(Clone, Debug)]
pub struct CancelToken(Arc<AtomicBool>);

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// An emitter that collects all emitted items into a vector.
pub struct CollectEmitter<T>(Mutex<Vec<T>>);

impl<T> CollectEmitter<T> {
    pub fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for CollectEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Emitter<T> for CollectEmitter<T> {
    fn emit(&self, item: T) -> Result<(), EmitError<T>> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
        Ok(())
    }
}

/// Emitter backed by a bounded crossbeam channel. A full channel applies backpressure
/// until the consumer catches up, the receiver is dropped, or the job is cancelled.
pub struct ChannelEmitter<T> {
    tx: crossbeam::channel::Sender<T>,
    cancel: CancelToken,
}

impl<T: Send + 'static> ChannelEmitter<T> {
    pub fn new(tx: crossbeam::channel::Sender<T>, cancel: CancelToken) -> Self {
        Self { tx, cancel }
    }
}

impl<T: Send + 'static> Emitter<T> for ChannelEmitter<T> {
    fn emit(&self, item: T) -> Result<(), EmitError<T>> {
        let mut item = item;
        loop {
            match self.tx.send_timeout(item, SEND_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(crossbeam::channel::SendTimeoutError::Timeout(pending)) => {
                    if self.cancel.is_cancelled() {
                        return Err(EmitError {
                            source: anyhow::anyhow!("Stream was cancelled"),
                            item: pending,
                        });
                    }
                    item = pending;
                }
                Err(crossbeam::channel::SendTimeoutError::Disconnected(pending)) => {
                    return Err(EmitError {
                        source: anyhow::anyhow!("Channel is disconnected"),
                        item: pending,
                    });
                }
            }
        }
    }
}

/// Lightweight cloneable wrapper around an [`Emitter`] trait object.
#[derive(Clone, Deref)]
pub struct OutStream<T> {
    emitter: Arc<dyn Emitter<T>>,
}

impl<T> OutStream<T> {
    pub fn new(emitter: Arc<dyn Emitter<T>>) -> Self {
        Self { emitter }
    }
}

/// Splits a response into word tokens the way a streaming model would emit them:
/// the first word bare, every following word prefixed by one space.
pub fn word_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(' ').enumerate().map(|(i, word)| {
        if i == 0 {
            word.to_string()
        } else {
            format!(" {word}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_tokens_rebuild_the_text() {
        let text = "Hello! I'm Kira,  your assistant.";
        let tokens: Vec<String> = word_tokens(text).collect();
        assert_eq!(tokens[0], "Hello!");
        assert_eq!(tokens[1], " I'm");
        assert_eq!(tokens.concat(), text);
    }

    #[test]
    fn channel_emitter_reports_disconnect() {
        let (tx, rx) = crossbeam::channel::bounded::<String>(1);
        drop(rx);
        let emitter = ChannelEmitter::new(tx, CancelToken::new());
        let err = emitter.emit("token".to_string()).unwrap_err();
        assert_eq!(err.item, "token");
    }

    #[test]
    fn channel_emitter_gives_up_on_full_channel_once_cancelled() {
        let (tx, _rx) = crossbeam::channel::bounded::<u32>(1);
        let cancel = CancelToken::new();
        let emitter = ChannelEmitter::new(tx, cancel.clone());
        emitter.emit(1).unwrap();

        cancel.cancel();
        let err = emitter.emit(2).unwrap_err();
        assert_eq!(err.item, 2);
    }

    #[test]
    fn collect_emitter_keeps_order() {
        let collector = CollectEmitter::new();
        collector.emit(1).unwrap();
        collector.emit(2).unwrap();
        assert_eq!(collector.into_inner(), vec![1, 2]);
    }
}
