use super::{PolicyKind, ResponsePolicy};
use crate::error::BridgeError;
use crate::inference::CancelToken;

/// Answers every prompt with the same fixed text.
#[derive(Debug, Clone)]
pub struct Placeholder {
    text: String,
}

impl Placeholder {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ResponsePolicy for Placeholder {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Placeholder
    }

    fn generate(&self, _prompt: &str, _cancel: &CancelToken) -> Result<String, BridgeError> {
        Ok(self.text.clone())
    }
}
