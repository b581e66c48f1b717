use crate::error::BridgeError;
use crate::policy::PolicyKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumString, IntoStaticStr};

/// Behavior profile of a loaded model, picked from its artifact path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Wellness,
    Standard,
}

impl Variant {
    /// Plain substring check on the path. This is a naming heuristic: renaming the
    /// artifact changes the variant.
    pub fn classify(path: &str, wellness_marker: &str) -> Self {
        if !wellness_marker.is_empty() && path.contains(wellness_marker) {
            Variant::Wellness
        } else {
            Variant::Standard
        }
    }
}

/// One loaded model instance. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    path: String,
    loaded: bool,
    variant: Variant,
}

impl ModelHandle {
    pub fn new(path: impl Into<String>, wellness_marker: &str) -> Self {
        let path = path.into();
        let variant = Variant::classify(&path, wellness_marker);
        Self {
            path,
            loaded: true,
            variant,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// File stem of the artifact, or the whole path when it has none.
    pub fn artifact_name(&self) -> &str {
        Path::new(&self.path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.path)
    }
}

/// Checks that `path` names an existing regular file with one of `extensions`.
pub fn validate_model_path(path: &str, extensions: &[String]) -> Result<(), BridgeError> {
    let invalid = |reason: &str| BridgeError::InvalidModelPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    let file = Path::new(path);
    let metadata = file.metadata().map_err(|e| invalid(&e.to_string()))?;
    if !metadata.is_file() {
        return Err(invalid("not a regular file"));
    }
    if !extensions.is_empty() {
        let extension = file
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if !extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
        {
            return Err(invalid(&format!(
                "unsupported extension, expected one of {extensions:?}"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// A stand-in policy answers prompts.
    Mock,
    /// An inference engine is attached.
    Ready,
}

/// Description of the active model as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: String,
    pub path: String,
    pub variant: Variant,
    pub backend: PolicyKind,
    pub status: ModelStatus,
    pub version: String,
}

impl ModelInfo {
    pub fn new(handle: &ModelHandle, backend: PolicyKind) -> Self {
        let status = match backend {
            PolicyKind::RealEngine => ModelStatus::Ready,
            PolicyKind::RuleBasedWellness | PolicyKind::Placeholder => ModelStatus::Mock,
        };
        Self {
            model: handle.artifact_name().to_string(),
            path: handle.path().to_string(),
            variant: handle.variant(),
            backend,
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
