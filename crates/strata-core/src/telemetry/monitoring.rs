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

//! Provides traits and data structures for active resource monitoring.
//!
//! A monitor is polled for a snapshot of a resource's state, as opposed to
//! event-based metrics. The device memory allocator is the main implementor:
//! it reports the bytes it has reserved from the device.

use std::borrow::Cow;
use std::fmt::Debug;

/// The core trait for a resource monitor.
///
/// Monitors typically live next to the resource they observe (the allocator in
/// `strata-data`); the telemetry service holds a collection of them and
/// periodically calls `update` and `get_usage_report`.
pub trait ResourceMonitor: Send + Sync + Debug + 'static {
    /// Returns a unique, human-readable identifier for this monitor instance.
    fn monitor_id(&self) -> Cow<'static, str>;

    /// Returns the general type of resource being monitored.
    fn resource_type(&self) -> MonitoredResourceType;

    /// Returns a snapshot of the current usage data for the monitored resource.
    fn get_usage_report(&self) -> ResourceUsageReport;

    /// Triggers the monitor to refresh its internal state.
    /// Monitors that update passively keep this default no-op.
    fn update(&self) {}
}

/// The kinds of resources that can be monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredResourceType {
    /// Device-local video memory.
    Vram,
    /// Host-visible memory reserved for staging traffic.
    StagingMemory,
}

/// A generic report of resource usage, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsageReport {
    /// The number of bytes currently in use.
    pub current_bytes: u64,
    /// The peak number of bytes ever in use simultaneously, if tracked.
    pub peak_bytes: Option<u64>,
    /// The total capacity of the resource in bytes, if known.
    pub total_capacity_bytes: Option<u64>,
}

impl ResourceUsageReport {
    /// Returns the fraction of the capacity in use, if the capacity is known.
    pub fn utilization(&self) -> Option<f64> {
        match self.total_capacity_bytes {
            Some(0) | None => None,
            Some(capacity) => Some(self.current_bytes as f64 / capacity as f64),
        }
    }
}
