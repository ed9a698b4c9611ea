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

//! VRAM Resource Monitor
//!
//! Reports the driver-managed memory a [`WgpuBackend`] allocated. The
//! allocator never sees that memory, so it needs its own monitor.

use crate::graphics::wgpu::WgpuBackend;
use std::borrow::Cow;
use std::sync::Weak;
use strata_core::telemetry::{MonitoredResourceType, ResourceMonitor, ResourceUsageReport};

/// VRAM Monitor of a WGPU device.
#[derive(Debug)]
pub struct VramMonitor {
    /// Weak reference to the device to avoid circular dependencies
    backend: Weak<WgpuBackend>,
}

impl VramMonitor {
    /// Create a new VRAM monitor
    pub fn new(backend: Weak<WgpuBackend>) -> Self {
        Self { backend }
    }
}

impl ResourceMonitor for VramMonitor {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("wgpu_vram")
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::Vram
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        if let Some(backend) = self.backend.upgrade() {
            ResourceUsageReport {
                current_bytes: backend.vram_allocated_bytes() as u64,
                peak_bytes: Some(backend.vram_peak_bytes() as u64),
                total_capacity_bytes: None,
            }
        } else {
            ResourceUsageReport::default()
        }
    }
}
