use std::sync::PoisonError;
use std::time::Duration;

use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

/// Category of a bridge failure. Each kind maps to a fixed negative sentinel so it
/// can cross a minimal-marshalling boundary as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotInitialized,
    InvalidInput,
    InvalidModelPath,
    ModelLoadFailed,
    InferenceFailed,
    Timeout,
    ResourceExhausted,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub const fn sentinel(self) -> i32 {
        match self {
            ErrorKind::NotInitialized => -1,
            ErrorKind::InvalidInput => -2,
            ErrorKind::InvalidModelPath => -3,
            ErrorKind::ModelLoadFailed => -4,
            ErrorKind::InferenceFailed => -5,
            ErrorKind::Timeout => -6,
            ErrorKind::ResourceExhausted => -7,
            ErrorKind::Cancelled => -8,
            ErrorKind::Internal => -9,
        }
    }

    pub fn from_sentinel(code: i32) -> Option<Self> {
        ErrorKind::iter().find(|kind| kind.sentinel() == code)
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Model is not initialized")]
    NotInitialized,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid model path '{path}': {reason}")]
    InvalidModelPath { path: String, reason: String },
    #[error("Model loading failed: {0}")]
    ModelLoadFailed(anyhow::Error),
    #[error("Inference failed: {0}")]
    InferenceFailed(anyhow::Error),
    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("Inference cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::NotInitialized => ErrorKind::NotInitialized,
            BridgeError::InvalidInput(_) => ErrorKind::InvalidInput,
            BridgeError::InvalidModelPath { .. } => ErrorKind::InvalidModelPath,
            BridgeError::ModelLoadFailed(_) => ErrorKind::ModelLoadFailed,
            BridgeError::InferenceFailed(_) => ErrorKind::InferenceFailed,
            BridgeError::Timeout(_) => ErrorKind::Timeout,
            BridgeError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            BridgeError::Cancelled => ErrorKind::Cancelled,
            BridgeError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Negative status code reported across the C boundary.
    pub fn sentinel(&self) -> i32 {
        self.kind().sentinel()
    }
}

impl<T> From<PoisonError<T>> for BridgeError {
    fn from(error: PoisonError<T>) -> Self {
        BridgeError::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sentinels_are_negative_and_unique() {
        let codes: HashSet<i32> = ErrorKind::iter().map(ErrorKind::sentinel).collect();
        assert_eq!(codes.len(), ErrorKind::iter().count());
        assert!(codes.iter().all(|code| *code < 0));
    }

    #[test]
    fn not_initialized_is_minus_one() {
        assert_eq!(BridgeError::NotInitialized.sentinel(), -1);
        assert_eq!(ErrorKind::from_sentinel(-1), Some(ErrorKind::NotInitialized));
        assert_eq!(ErrorKind::from_sentinel(0), None);
    }

    #[test]
    fn poisoned_lock_maps_to_internal() {
        let lock = std::sync::Mutex::new(());
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: BridgeError = lock.lock().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
