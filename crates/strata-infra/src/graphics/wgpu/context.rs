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

use anyhow::anyhow;
use anyhow::Result;
use wgpu::{Features, Instance, InstanceDescriptor, RequestAdapterOptions};

/// Holds the core WGPU state objects required for transfers.
///
/// The context is headless: no surface is created, the adapter is picked by
/// power preference alone.
#[derive(Debug)]
pub struct WgpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub active_device_features: wgpu::Features,
    pub device_limits: wgpu::Limits,
}

impl WgpuContext {
    /// Asynchronously initializes a headless graphics context.
    ///
    /// ## Arguments
    /// * `label` - Debug label of the logical device.
    /// * `debug_layer` - Logs uncaptured device errors when set.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or why no usable device was found.
    pub async fn new(label: &str, debug_layer: bool) -> Result<Self> {
        log::info!("Initializing headless WGPU context...");

        // --- 1. Pick an adapter ---
        let instance = Instance::new(&InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("No suitable graphics adapter: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        // --- 2. Create Logical Device and Command Queue from Adapter ---
        // Staging memory is a buffer mapped for both directions.
        let required_features: Features = Features::MAPPABLE_PRIMARY_BUFFERS;
        if !adapter.features().contains(required_features) {
            return Err(anyhow!(
                "Adapter \"{}\" lacks {:?}",
                adapter_info.name,
                required_features
            ));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(label),
                required_features,
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        if debug_layer {
            device.on_uncaptured_error(Box::new(|e| {
                log::error!("WGPU Uncaptured Error: {e:?}");
            }));
        }

        let active_device_features = device.features();
        let device_limits = device.limits();
        log::debug!("Device limits: {device_limits:?}");

        Ok(WgpuContext {
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            active_device_features,
            device_limits,
        })
    }

    /// Blocking variant of [`WgpuContext::new`].
    pub fn new_blocking(label: &str, debug_layer: bool) -> Result<Self> {
        pollster::block_on(Self::new(label, debug_layer))
    }

    /// Blocks until the queue is idle.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| anyhow!("Failed to poll device: {:?}", e))
    }
}
