//! Configuration loading and management
//!
//! Policy envelopes are read from a TOML or JSON file, adjusted by
//! environment overrides, and completed with the built-in presets for any
//! known domain the file leaves out.

pub mod loader;

use serde::{Deserialize, Serialize};
use voxguard_common::resilience::PolicyEnvelope;

use crate::errors::{InfraError, InfraResult};

// Re-export commonly used items
pub use loader::{
    apply_env_overrides, load, load_from_file, parse_config, probe_config_paths, ENV_PREFIX,
};

/// Envelopes for every failure domain the process calls into
///
/// ```toml
/// [[envelopes]]
/// domain = "auth"
/// policy = "exponential"
/// initial_delay_ms = 500
/// max_attempts = 4
/// jitter_strategy = "deterministic-equal"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    #[serde(default)]
    pub envelopes: Vec<PolicyEnvelope>,
}

impl ResilienceConfig {
    /// Config holding only the built-in presets
    pub fn with_presets() -> Self {
        Self { envelopes: PolicyEnvelope::presets() }
    }

    /// Envelope for `domain`, falling back to its preset
    pub fn envelope(&self, domain: &str) -> Option<PolicyEnvelope> {
        self.envelopes
            .iter()
            .find(|envelope| envelope.domain == domain)
            .cloned()
            .or_else(|| PolicyEnvelope::preset(domain))
    }

    /// Configured domains in file order
    pub fn domains(&self) -> Vec<&str> {
        self.envelopes.iter().map(|envelope| envelope.domain.as_str()).collect()
    }

    /// Mutable envelope for `domain`, inserted from its preset (or the
    /// default shape) when absent
    pub fn envelope_mut(&mut self, domain: &str) -> &mut PolicyEnvelope {
        let index = match self.envelopes.iter().position(|envelope| envelope.domain == domain) {
            Some(index) => index,
            None => {
                let envelope = PolicyEnvelope::preset(domain)
                    .unwrap_or_else(|| PolicyEnvelope::with_defaults(domain));
                self.envelopes.push(envelope);
                self.envelopes.len() - 1
            }
        };
        &mut self.envelopes[index]
    }

    /// Append presets for known domains the config does not mention
    pub fn fill_presets(&mut self) {
        for preset in PolicyEnvelope::presets() {
            if !self.envelopes.iter().any(|envelope| envelope.domain == preset.domain) {
                self.envelopes.push(preset);
            }
        }
    }

    /// Validate every envelope and reject duplicate domains
    ///
    /// # Errors
    /// Returns `InfraError::Envelope` for the first invalid envelope, or
    /// `InfraError::Config` if a domain appears twice.
    pub fn validate(&self) -> InfraResult<()> {
        for (index, envelope) in self.envelopes.iter().enumerate() {
            envelope.validate()?;
            if self.envelopes[..index].iter().any(|other| other.domain == envelope.domain) {
                return Err(InfraError::config(format!(
                    "Duplicate envelope for domain '{}'",
                    envelope.domain
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config::ResilienceConfig.
    use voxguard_common::resilience::BackoffPolicy;

    use super::*;

    /// Validates lookup prefers configured envelopes over presets.
    ///
    /// Assertions:
    /// - Confirms a configured `auth` envelope wins.
    /// - Confirms `session` falls back to its preset.
    /// - Confirms unknown domains return `None`.
    #[test]
    fn test_envelope_lookup_falls_back_to_preset() {
        let auth = PolicyEnvelope { max_attempts: 7, ..PolicyEnvelope::auth() };
        let config = ResilienceConfig { envelopes: vec![auth] };

        assert_eq!(config.envelope("auth").map(|e| e.max_attempts), Some(7));
        assert_eq!(config.envelope("session").map(|e| e.policy), Some(BackoffPolicy::Hybrid));
        assert!(config.envelope("billing").is_none());
    }

    /// Validates presets fill only missing domains.
    ///
    /// Assertions:
    /// - Confirms the configured envelope is kept.
    /// - Confirms all three preset domains are present once.
    #[test]
    fn test_fill_presets_keeps_configured() {
        let transport = PolicyEnvelope { max_attempts: 2, ..PolicyEnvelope::transport() };
        let mut config = ResilienceConfig { envelopes: vec![transport] };

        config.fill_presets();

        assert_eq!(config.envelopes.len(), 3);
        assert_eq!(config.envelope("transport").map(|e| e.max_attempts), Some(2));
        assert_eq!(config.domains(), vec!["transport", "auth", "session"]);
    }

    /// Validates `envelope_mut` inserts default-shaped envelopes for new
    /// domains.
    ///
    /// Assertions:
    /// - Confirms the inserted envelope uses the default attempts.
    #[test]
    fn test_envelope_mut_inserts_unknown_domain() {
        let mut config = ResilienceConfig::default();

        config.envelope_mut("billing").max_attempts = 6;

        assert_eq!(config.domains(), vec!["billing"]);
        assert_eq!(config.envelopes[0].max_attempts, 6);
        assert_eq!(config.envelopes[0].policy, BackoffPolicy::Exponential);
    }

    /// Validates duplicate domains are rejected.
    ///
    /// Assertions:
    /// - Confirms a `Config` error naming the domain.
    #[test]
    fn test_validate_rejects_duplicates() {
        let config = ResilienceConfig {
            envelopes: vec![PolicyEnvelope::auth(), PolicyEnvelope::auth()],
        };

        match config.validate() {
            Err(InfraError::Config(message)) => assert!(message.contains("auth")),
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    /// Validates the preset-only config passes validation.
    ///
    /// Assertions:
    /// - Ensures `validate` returns `Ok`.
    #[test]
    fn test_presets_validate() {
        assert!(ResilienceConfig::with_presets().validate().is_ok());
    }
}
