//! Client configuration.
//!
//! Values come from a deserialized config source or from `ATHENA_*`
//! environment variables.

use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// API root, without the `/v1/{practiceid}` prefix.
    pub base_url: String,
    pub practice_id: String,
    /// OAuth bearer token sent as `authorization`. Obtaining it is the caller's job.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(base_url: &str, practice_id: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            practice_id: practice_id.to_string(),
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_string());
        self
    }

    /// Reads `ATHENA_BASE_URL`, `ATHENA_PRACTICE_ID`, `ATHENA_ACCESS_TOKEN`
    /// and `ATHENA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::InvalidUsage(format!("{key} is not set")))
        };
        let timeout_secs = match lookup("ATHENA_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                ApiError::InvalidUsage(format!("ATHENA_TIMEOUT_SECS is not a number: {raw:?}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            base_url: required("ATHENA_BASE_URL")?,
            practice_id: required("ATHENA_PRACTICE_ID")?,
            access_token: lookup("ATHENA_ACCESS_TOKEN").filter(|v| !v.is_empty()),
            timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_all_variables() {
        let vars = env(&[
            ("ATHENA_BASE_URL", "https://api.preview.platform.athenahealth.com"),
            ("ATHENA_PRACTICE_ID", "195900"),
            ("ATHENA_ACCESS_TOKEN", "tok"),
            ("ATHENA_TIMEOUT_SECS", "5"),
        ]);
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.practice_id, "195900");
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn missing_practice_is_invalid_usage() {
        let vars = env(&[("ATHENA_BASE_URL", "http://localhost:3000")]);
        let err = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUsage(msg) if msg.contains("ATHENA_PRACTICE_ID")));
    }

    #[test]
    fn timeout_defaults_when_absent() {
        let vars = env(&[
            ("ATHENA_BASE_URL", "http://localhost:3000"),
            ("ATHENA_PRACTICE_ID", "1"),
        ]);
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://localhost:3000","practice_id":"1"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("http://localhost:3000", "1"));
    }
}
