//! Response generation policies.
//!
//! A [`ResponsePolicy`] turns one prompt into one text. The bridge picks the policy when
//! a model is initialized and never inspects it afterwards, so the keyword stand-in and a
//! real engine share the same call site.
mod engine;
mod placeholder;
mod wellness;

pub use engine::{EngineFactory, EngineHost, EnginePolicy, InferenceEngine, engine_factory};
pub use placeholder::Placeholder;
pub use wellness::{RuleBasedWellness, Topic};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::inference::CancelToken;
use crate::model::{ModelHandle, Variant};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    RuleBasedWellness,
    Placeholder,
    RealEngine,
}

pub trait ResponsePolicy: Send + Sync {
    fn kind(&self) -> PolicyKind;

    /// Produces the response for `prompt`. Implementations that can block should give
    /// up with [`BridgeError::Cancelled`] once `cancel` fires.
    fn generate(&self, prompt: &str, cancel: &CancelToken) -> Result<String, BridgeError>;
}

/// Builds the policy for a freshly initialized model. An attached engine factory takes
/// precedence over the stand-in policies.
pub fn select_policy(
    handle: &ModelHandle,
    config: &BridgeConfig,
    engine_factory: Option<&EngineFactory>,
) -> Result<Arc<dyn ResponsePolicy>, BridgeError> {
    if let Some(factory) = engine_factory {
        let engine = factory(handle).map_err(BridgeError::ModelLoadFailed)?;
        let policy = EnginePolicy::spawn(engine, config.inference_timeout())?;
        return Ok(Arc::new(policy));
    }

    Ok(match handle.variant() {
        Variant::Wellness => Arc::new(RuleBasedWellness),
        Variant::Standard => Arc::new(Placeholder::new(config.placeholder_response.clone())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_picks_stand_in_policy() {
        let config = BridgeConfig::default();
        let wellness = ModelHandle::new("/m/gemma-wellness-f16.gguf", &config.wellness_marker);
        let standard = ModelHandle::new("/m/other.bin", &config.wellness_marker);

        assert_eq!(
            select_policy(&wellness, &config, None).unwrap().kind(),
            PolicyKind::RuleBasedWellness
        );
        assert_eq!(
            select_policy(&standard, &config, None).unwrap().kind(),
            PolicyKind::Placeholder
        );
    }

    #[test]
    fn failing_factory_is_model_load_error() {
        let config = BridgeConfig::default();
        let handle = ModelHandle::new("/m/other.bin", &config.wellness_marker);
        let factory = engine_factory(|_| Err(anyhow::anyhow!("corrupt weights")));

        let err = select_policy(&handle, &config, Some(&factory))
            .err()
            .unwrap();
        assert!(matches!(err, BridgeError::ModelLoadFailed(_)));
    }

    #[test]
    fn policy_kind_names() {
        assert_eq!(PolicyKind::RuleBasedWellness.to_string(), "rule-based-wellness");
        assert_eq!(
            "real-engine".parse::<PolicyKind>().unwrap(),
            PolicyKind::RealEngine
        );
    }
}
