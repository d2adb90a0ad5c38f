//! ConfigPayload - the configuration document pushed to a device
//!
//! Canonical form is compact JSON with keys in sorted order (`BTreeMap`),
//! transport form is standard padded base64 of the canonical bytes.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, EncodingError};

/// A single configuration value
///
/// Variant order matters for untagged deserialization: integers try `Int`,
/// then `UInt` (above `i64::MAX`), and only non-integral numbers land in
/// `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(v: Vec<ConfigValue>) -> Self {
        Self::List(v)
    }
}

/// Opaque mapping of configuration keys to values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPayload(BTreeMap<String, ConfigValue>);

impl ConfigPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.0.iter()
    }

    /// Reject values that have no JSON representation
    pub fn check_representable(&self) -> Result<(), EncodingError> {
        for (key, value) in &self.0 {
            check_value(key, value)?;
        }
        Ok(())
    }
}

fn check_value(path: &str, value: &ConfigValue) -> Result<(), EncodingError> {
    match value {
        ConfigValue::Float(f) if !f.is_finite() => Err(EncodingError::unrepresentable(
            path,
            format!("non-finite number {f}"),
        )),
        ConfigValue::List(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, v)| check_value(&format!("{path}[{i}]"), v)),
        ConfigValue::Map(map) => map
            .iter()
            .try_for_each(|(k, v)| check_value(&format!("{path}.{k}"), v)),
        _ => Ok(()),
    }
}

impl TryFrom<serde_json::Value> for ConfigPayload {
    type Error = EncodingError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| EncodingError::Deserialize(e.to_string())),
            other => Err(EncodingError::NotAnObject {
                found: json_type_name(&other).to_string(),
            }),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Fan controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FanConfig {
    pub on: bool,
    #[validate(range(min = 0, max = 100))]
    pub speed: i64,
}

impl FanConfig {
    /// Create a fan configuration, rejecting speeds outside `0..=100`
    pub fn new(on: bool, speed: i64) -> Result<Self, ContractError> {
        let config = Self { on, speed };
        config
            .validate()
            .map_err(|e| ContractError::config_validation("speed", e.to_string()))?;
        Ok(config)
    }
}

impl From<FanConfig> for ConfigPayload {
    fn from(fan: FanConfig) -> Self {
        ConfigPayload::new().with("on", fan.on).with("speed", fan.speed)
    }
}

/// Payload in canonical and transport form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    canonical: Bytes,
    base64: String,
}

impl EncodedPayload {
    /// Canonical JSON bytes
    pub fn canonical(&self) -> &[u8] {
        &self.canonical
    }

    /// Base64 transport string
    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    pub fn into_base64(self) -> String {
        self.base64
    }
}

/// Encoder between `ConfigPayload` and its transport string
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Canonical JSON serialization
    ///
    /// # Errors
    /// `EncodingError::Unrepresentable` for non-finite floats.
    pub fn canonical_bytes(payload: &ConfigPayload) -> Result<Bytes, EncodingError> {
        payload.check_representable()?;
        serde_json::to_vec(payload)
            .map(Bytes::from)
            .map_err(|e| EncodingError::Serialize(e.to_string()))
    }

    /// Canonical bytes, then base64
    pub fn encode(payload: &ConfigPayload) -> Result<EncodedPayload, EncodingError> {
        let canonical = Self::canonical_bytes(payload)?;
        let base64 = STANDARD.encode(&canonical);
        Ok(EncodedPayload { canonical, base64 })
    }

    /// Inverse of [`PayloadEncoder::encode`]
    pub fn decode(encoded: &str) -> Result<ConfigPayload, EncodingError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| EncodingError::Base64(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| EncodingError::Deserialize(e.to_string()))
    }
}
