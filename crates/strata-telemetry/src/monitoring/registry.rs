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

//! Registry for managing resource monitors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::telemetry::ResourceMonitor;

type Monitors = Vec<Arc<dyn ResourceMonitor>>;

/// A thread-safe registry for resource monitors.
///
/// Clones share the same set of monitors.
#[derive(Debug, Clone, Default)]
pub struct MonitorRegistry {
    monitors: Arc<Mutex<Monitors>>,
}

impl MonitorRegistry {
    /// Creates a new, empty monitor registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Monitors> {
        self.monitors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new resource monitor.
    pub fn register(&self, monitor: Arc<dyn ResourceMonitor>) {
        let monitor_id = monitor.monitor_id();
        self.lock().push(monitor);
        log::info!("Registered resource monitor: {monitor_id}");
    }

    /// Removes every monitor registered under `monitor_id`. Returns how many
    /// were removed.
    pub fn unregister(&self, monitor_id: &str) -> usize {
        let mut monitors = self.lock();
        let before = monitors.len();
        monitors.retain(|monitor| monitor.monitor_id() != monitor_id);
        before - monitors.len()
    }

    /// Calls the `update` method on all registered monitors.
    pub fn update_all(&self) {
        for monitor in self.lock().iter() {
            monitor.update();
        }
    }

    /// Returns a clone of all registered monitors.
    pub fn get_all_monitors(&self) -> Vec<Arc<dyn ResourceMonitor>> {
        self.lock().clone()
    }

    /// Number of registered monitors.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no monitor is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
