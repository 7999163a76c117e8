//! Device data feed: named values pushed periodically by the device.

use fl_graph::Value;
use serde::{Deserialize, Serialize};

use crate::error::EvalResult;

/// One named value from a device data batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReading {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl DeviceReading {
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(Value::Number(value)),
        }
    }
}

/// Parse one batch, a JSON array of `{name, value}` objects.
pub fn parse_batch(json: &str) -> EvalResult<Vec<DeviceReading>> {
    Ok(serde_json::from_str(json)?)
}
