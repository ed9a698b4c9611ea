// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Setup helpers: configuration loading, headless systems and telemetry.

use crate::{RenderServices, RenderSystem};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strata_core::renderer::{DeviceMemory, RenderBackend, RenderSystemConfig};
use strata_core::telemetry::MonitoredResourceType;
use strata_infra::telemetry::HeapMonitor;
use strata_infra::{HeadlessBackend, HeadlessConfig};
use strata_telemetry::TelemetryService;

/// Reads a JSON [`RenderSystemConfig`] from `path`. Missing fields take their
/// defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<RenderSystemConfig> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read render system config '{}'", path.display()))?;
    let config = RenderSystemConfig::from_json_str(&json)
        .with_context(|| format!("Failed to parse render system config '{}'", path.display()))?;
    log::info!("Loaded render system config '{}' from {}", config.label, path.display());
    Ok(config)
}

/// Creates a render system on a new headless device.
pub fn headless_render_system(
    config: RenderSystemConfig,
    device_config: HeadlessConfig,
) -> RenderSystem<HeadlessBackend> {
    let device = Arc::new(HeadlessBackend::with_config(device_config));
    let services = RenderServices::new(device.as_ref());
    RenderSystem::new(device, config, services)
}

/// Creates a telemetry service polling the memory monitors of `system`.
pub fn telemetry_for<B: RenderBackend>(
    system: &RenderSystem<B>,
    update_interval: Duration,
) -> TelemetryService {
    let telemetry = TelemetryService::new(update_interval);
    log::info!("Registering resource monitors...");
    for monitor in system.resource_monitors() {
        telemetry.monitor_registry().register(monitor);
    }
    telemetry
}

/// Registers one monitor per memory heap of a headless device.
pub fn register_heap_monitors(telemetry: &TelemetryService, device: &Arc<HeadlessBackend>) {
    for heap_index in 0..device.memory_heaps().len() {
        let monitor = Arc::new(HeapMonitor::new(Arc::downgrade(device), heap_index));
        telemetry.monitor_registry().register(monitor);
    }
}

/// Logs a summary of all registered telemetry monitors.
pub fn log_telemetry_summary(telemetry: &TelemetryService) {
    log::info!("--- Telemetry Summary ---");
    let monitors = telemetry.monitor_registry().get_all_monitors();

    if monitors.is_empty() {
        log::info!("  No monitors registered.");
    }

    for monitor in monitors {
        let report = monitor.get_usage_report();
        let current_mb = report.current_bytes as f64 / (1024.0 * 1024.0);
        let peak_mb = report.peak_bytes.unwrap_or(0) as f64 / (1024.0 * 1024.0);
        match monitor.resource_type() {
            MonitoredResourceType::Vram => {
                log::info!(
                    "  VRAM Usage [{}]: {:.2} MB (Peak: {:.2} MB)",
                    monitor.monitor_id(),
                    current_mb,
                    peak_mb
                );
            }
            MonitoredResourceType::StagingMemory => {
                log::info!(
                    "  Staging Usage [{}]: {:.2} MB (Peak: {:.2} MB)",
                    monitor.monitor_id(),
                    current_mb,
                    peak_mb
                );
            }
        }
        if let Some(utilization) = report.utilization() {
            log::info!("    {:.1}% of capacity", utilization * 100.0);
        }
    }
    log::info!("-------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_reports_missing_files() {
        let err = load_config("does/not/exist.json").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn load_config_reads_partial_json() {
        let path = std::env::temp_dir().join(format!("strata-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "label": "editor", "debug_layer": true }"#).unwrap();

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.label, "editor");
        assert!(config.debug_layer);
        assert_eq!(config.allocator, RenderSystemConfig::default().allocator);
    }

    #[test]
    fn telemetry_polls_system_and_heap_monitors() {
        let mut system =
            headless_render_system(RenderSystemConfig::default(), HeadlessConfig::default());
        let mut telemetry = telemetry_for(&system, Duration::from_secs(1));
        let device = Arc::clone(system.device());
        register_heap_monitors(&telemetry, &device);

        telemetry.refresh();
        log_telemetry_summary(&telemetry);

        assert_eq!(
            telemetry.monitor_registry().len(),
            2 + device.memory_heaps().len()
        );
        system.shutdown();
    }
}
