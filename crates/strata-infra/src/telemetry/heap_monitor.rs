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

//! Heap Resource Monitor
//!
//! Reports how much of one memory heap of a [`HeadlessBackend`] is allocated,
//! as seen by the device rather than by the allocator.

use crate::headless::HeadlessBackend;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;
use strata_core::renderer::api::MemoryPropertyFlags;
use strata_core::renderer::DeviceMemory;
use strata_core::telemetry::{MonitoredResourceType, ResourceMonitor, ResourceUsageReport};

/// Monitors one heap of a headless device.
#[derive(Debug)]
pub struct HeapMonitor {
    /// Weak reference to the device to avoid keeping it alive.
    backend: Weak<HeadlessBackend>,
    heap_index: usize,
    monitor_id: String,
    peak_bytes: AtomicU64,
}

impl HeapMonitor {
    /// Create a monitor of heap `heap_index`.
    pub fn new(backend: Weak<HeadlessBackend>, heap_index: usize) -> Self {
        Self {
            backend,
            heap_index,
            monitor_id: format!("headless_heap_{heap_index}"),
            peak_bytes: AtomicU64::new(0),
        }
    }
}

impl ResourceMonitor for HeapMonitor {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Owned(self.monitor_id.clone())
    }

    fn resource_type(&self) -> MonitoredResourceType {
        let host_visible = self.backend.upgrade().is_some_and(|backend| {
            backend.memory_types().iter().any(|memory_type| {
                memory_type.heap_index as usize == self.heap_index
                    && memory_type.property_flags.contains(MemoryPropertyFlags::HOST_VISIBLE)
                    && !memory_type.property_flags.contains(MemoryPropertyFlags::DEVICE_LOCAL)
            })
        });
        if host_visible {
            MonitoredResourceType::StagingMemory
        } else {
            MonitoredResourceType::Vram
        }
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        let Some(backend) = self.backend.upgrade() else {
            // Device is no longer available
            return ResourceUsageReport::default();
        };
        let current = backend.heap_usage(self.heap_index);
        let peak = self.peak_bytes.fetch_max(current, Ordering::Relaxed).max(current);
        ResourceUsageReport {
            current_bytes: current,
            peak_bytes: Some(peak),
            total_capacity_bytes: backend
                .memory_heaps()
                .get(self.heap_index)
                .map(|heap| heap.size),
        }
    }

    fn update(&self) {
        if let Some(backend) = self.backend.upgrade() {
            self.peak_bytes
                .fetch_max(backend.heap_usage(self.heap_index), Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reports_device_side_heap_usage() {
        let backend = Arc::new(HeadlessBackend::new());
        let monitor = HeapMonitor::new(Arc::downgrade(&backend), 1);

        let memory = backend.allocate_memory(4096, 1).unwrap();
        let report = monitor.get_usage_report();
        backend.free_memory(memory);
        monitor.update();

        assert_eq!(monitor.resource_type(), MonitoredResourceType::StagingMemory);
        assert_eq!(report.current_bytes, 4096);
        assert_eq!(monitor.get_usage_report().current_bytes, 0);
        assert_eq!(monitor.get_usage_report().peak_bytes, Some(4096));
    }

    #[test]
    fn dropped_device_reports_nothing() {
        let backend = Arc::new(HeadlessBackend::new());
        let monitor = HeapMonitor::new(Arc::downgrade(&backend), 0);
        drop(backend);

        assert_eq!(monitor.get_usage_report(), ResourceUsageReport::default());
    }
}
