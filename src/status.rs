use std::collections::BTreeMap;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::{
    config::AppConfig,
    model::{DeviceReport, ModelReport, SystemStatus},
};

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Assembles the `/status` payload from the backend's device report, host
/// memory counters, and the fixed model configuration.
pub fn collect(config: &AppConfig, device: &DeviceReport, model: &ModelReport) -> SystemStatus {
    let mut device_info = BTreeMap::new();
    device_info.insert("device".to_string(), device.device.clone());
    device_info.insert(
        "cuda_available".to_string(),
        device.cuda_available.to_string(),
    );
    device_info.insert(
        "gpu_name".to_string(),
        device.gpu_name.clone().unwrap_or_else(|| "No GPU".to_string()),
    );
    device_info.insert(
        "cuda_version".to_string(),
        device.cuda_version.clone().unwrap_or_else(|| "N/A".to_string()),
    );

    let sys = System::new_with_specifics(
        RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
    );
    let total = sys.total_memory() as f64;
    let mut memory_usage = BTreeMap::new();
    memory_usage.insert("total_gb".to_string(), total / BYTES_PER_GIB);
    memory_usage.insert(
        "available_gb".to_string(),
        sys.available_memory() as f64 / BYTES_PER_GIB,
    );
    let percent_used = if total > 0.0 {
        sys.used_memory() as f64 / total * 100.0
    } else {
        0.0
    };
    memory_usage.insert("percent_used".to_string(), percent_used);

    if let Some(gpu_total) = device.gpu_total_gb {
        memory_usage.insert("gpu_total_gb".to_string(), gpu_total);
    }
    if let Some(gpu_allocated) = device.gpu_allocated_gb {
        memory_usage.insert("gpu_allocated_gb".to_string(), gpu_allocated);
    }

    let mut model_info = BTreeMap::new();
    model_info.insert("model_name".to_string(), config.model_id.clone().into());
    model_info.insert("max_tokens".to_string(), config.max_new_tokens.into());
    model_info.insert(
        "tokenizer_vocab_size".to_string(),
        model.vocab_size.into(),
    );
    model_info.insert("accelerated".to_string(), model.accelerated.into());

    SystemStatus {
        device_info,
        memory_usage,
        model_info,
        // The original service never populates this field.
        uptime_seconds: None,
    }
}
