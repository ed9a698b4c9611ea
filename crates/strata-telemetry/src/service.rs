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

//! Service for polling resource monitors.

use crate::monitoring::MonitorRegistry;
use serde::Serialize;
use std::time::{Duration, Instant};

/// One monitor's usage at the last update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSample {
    /// Id of the monitor.
    pub monitor_id: String,
    /// Kind of the monitored resource, e.g. `Vram`.
    pub resource_type: String,
    /// Bytes in use.
    pub current_bytes: u64,
    /// Peak bytes in use, if tracked.
    pub peak_bytes: Option<u64>,
    /// Capacity in bytes, if known.
    pub total_capacity_bytes: Option<u64>,
}

/// Periodically updates the registered resource monitors and keeps their
/// latest usage samples.
#[derive(Debug)]
pub struct TelemetryService {
    monitors: MonitorRegistry,
    samples: Vec<UsageSample>,
    last_update: Option<Instant>,
    update_interval: Duration,
}

impl TelemetryService {
    /// Creates a new telemetry service with the given update interval.
    pub fn new(update_interval: Duration) -> Self {
        Self {
            monitors: MonitorRegistry::new(),
            samples: Vec::new(),
            last_update: None,
            update_interval,
        }
    }

    /// Should be called periodically (e.g., after every batch of transfers).
    /// Updates all registered monitors if the interval has passed and returns
    /// `true` when it did. The first call always updates.
    pub fn tick(&mut self) -> bool {
        if self
            .last_update
            .is_some_and(|last| last.elapsed() < self.update_interval)
        {
            return false;
        }
        self.refresh();
        true
    }

    /// Updates all monitors now and records their usage.
    pub fn refresh(&mut self) {
        log::trace!("Updating all resource monitors...");
        self.monitors.update_all();
        self.samples = self
            .monitors
            .get_all_monitors()
            .iter()
            .map(|monitor| {
                let report = monitor.get_usage_report();
                UsageSample {
                    monitor_id: monitor.monitor_id().into_owned(),
                    resource_type: format!("{:?}", monitor.resource_type()),
                    current_bytes: report.current_bytes,
                    peak_bytes: report.peak_bytes,
                    total_capacity_bytes: report.total_capacity_bytes,
                }
            })
            .collect();
        for sample in &self.samples {
            log::debug!(
                "{}: {} byte(s) in use (peak {:?})",
                sample.monitor_id,
                sample.current_bytes,
                sample.peak_bytes
            );
        }
        self.last_update = Some(Instant::now());
    }

    /// The samples of the last update.
    pub fn samples(&self) -> &[UsageSample] {
        &self.samples
    }

    /// The samples of the last update as a JSON array.
    pub fn samples_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.samples)
    }

    /// Returns a reference to the monitor registry.
    pub fn monitor_registry(&self) -> &MonitorRegistry {
        &self.monitors
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use strata_core::telemetry::{MonitoredResourceType, ResourceMonitor, ResourceUsageReport};

    #[derive(Debug, Default)]
    struct Counting {
        updates: AtomicU64,
    }

    impl ResourceMonitor for Counting {
        fn monitor_id(&self) -> Cow<'static, str> {
            Cow::Borrowed("counting")
        }

        fn resource_type(&self) -> MonitoredResourceType {
            MonitoredResourceType::StagingMemory
        }

        fn get_usage_report(&self) -> ResourceUsageReport {
            ResourceUsageReport {
                current_bytes: self.updates.load(Ordering::Relaxed) * 100,
                peak_bytes: None,
                total_capacity_bytes: Some(1000),
            }
        }

        fn update(&self) {
            self.updates.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn tick_respects_the_interval() {
        // --- 1. ARRANGE ---
        let mut service = TelemetryService::new(Duration::from_secs(3600));
        let monitor = Arc::new(Counting::default());
        service.monitor_registry().register(monitor.clone());

        // --- 2. ACT ---
        let first = service.tick();
        let second = service.tick();

        // --- 3. ASSERT ---
        assert!(first);
        assert!(!second);
        assert_eq!(monitor.updates.load(Ordering::Relaxed), 1);
        assert_eq!(service.samples()[0].current_bytes, 100);
        assert_eq!(service.samples()[0].resource_type, "StagingMemory");
    }

    #[test]
    fn samples_serialize_to_json() {
        let mut service = TelemetryService::default();
        service.monitor_registry().register(Arc::new(Counting::default()));
        service.refresh();

        let json: serde_json::Value = serde_json::from_str(&service.samples_json().unwrap()).unwrap();
        assert_eq!(json[0]["monitor_id"], "counting");
        assert_eq!(json[0]["total_capacity_bytes"], 1000);
    }
}
