//! Core types shared across FinOps components

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GenerationError;

/// Opaque job-request event delivered to the webhook
///
/// Always a JSON object; the core never inspects its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Wrap a JSON value, rejecting anything that is not an object
    pub fn from_value(value: Value) -> Result<Self, GenerationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(GenerationError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Parse raw JSON text into a payload
    pub fn from_json_str(text: &str) -> Result<Self, GenerationError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Build a payload from a typed job request
    pub fn from_job(job: &JobRequest) -> Result<Self, GenerationError> {
        Self::from_value(serde_json::to_value(job)?)
    }

    /// Look up a top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrow the underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compute resources requested by a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResources {
    /// Number of accelerators
    pub gpus: u32,

    /// Accelerator type (A100, H100, TPU v4, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Free-form details
    pub description: String,
}

/// Typed view of a generated compute-job request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub tier: String,
    pub priority: String,
    pub resources: JobResources,
    pub duration_hours: u32,
    /// ISO-8601 deadline in simulated time
    pub sla_deadline: NaiveDateTime,
    pub region: String,
    pub compliance: String,
    pub sla: String,
    pub min_quality: String,
    pub min_availability: String,
    /// Natural-language request as an engineer would write it
    pub description: String,
}
