use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub response: String,
    pub error: bool,
}

/// Diagnostics payload for `GET /status`. Rebuilt from scratch on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub device_info: BTreeMap<String, String>,
    pub memory_usage: BTreeMap<String, f64>,
    pub model_info: BTreeMap<String, serde_json::Value>,
    pub uptime_seconds: Option<f64>,
}

/// What the inference backend knows about the device it runs on.
/// `None` fields become the "No GPU" / "N/A" sentinels in [`SystemStatus`].
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub device: String,
    pub cuda_available: bool,
    pub gpu_name: Option<String>,
    pub cuda_version: Option<String>,
    pub gpu_total_gb: Option<f64>,
    pub gpu_allocated_gb: Option<f64>,
}

impl DeviceReport {
    pub fn cpu_only(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            cuda_available: false,
            gpu_name: None,
            cuda_version: None,
            gpu_total_gb: None,
            gpu_allocated_gb: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub vocab_size: usize,
    pub accelerated: bool,
}
