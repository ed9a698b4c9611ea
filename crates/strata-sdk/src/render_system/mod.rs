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

//! The render system: owner of every object created on one device.
//!
//! A [`RenderSystem`] validates descriptors, forwards transfers to the
//! [`TransferLane`], and keeps one [`ObjectRegistry`] per object kind. Handles
//! stay valid until the matching `release_*` call or [`RenderSystem::shutdown`].

mod objects;
mod transfer;

use crate::records::*;
use crate::services::RenderServices;
use crate::validation::Validator;
use std::fmt;
use std::sync::Arc;
use strata_core::renderer::api::*;
use strata_core::renderer::{NativeResourceFactory, RenderBackend, RenderError};
use strata_core::telemetry::ResourceMonitor;
use strata_data::{BufferResource, DeviceMemoryAllocator, ObjectRegistry, RegistryKey, TextureResource};
use strata_lanes::{MipGenerator, TransferLane};

/// Releases one record of `registry`.
fn release_record<B, K, V>(
    registry: &mut ObjectRegistry<K, V>,
    lane: &TransferLane<B>,
    id: K,
) -> Result<(), RenderError>
where
    B: RenderBackend,
    K: RegistryKey,
    V: Record<B>,
{
    let record = registry.release(id)?;
    Record::release(record, lane);
    log::debug!("Released {} {}", K::KIND, id.raw());
    Ok(())
}

/// Releases every record of `registry` and returns how many there were.
fn drain_registry<B, K, V>(registry: &mut ObjectRegistry<K, V>, lane: &TransferLane<B>) -> usize
where
    B: RenderBackend,
    K: RegistryKey,
    V: Record<B>,
{
    let mut count = 0;
    for (_, record) in registry.drain() {
        Record::release(record, lane);
        count += 1;
    }
    if count > 0 {
        log::debug!("Released {count} remaining {} object(s)", K::KIND);
    }
    count
}

/// The device resource manager of one backend device.
///
/// Teardown releases the services first, then every registry in
/// [`ObjectKind::ALL`] order, then the allocator, and the device last.
pub struct RenderSystem<B: RenderBackend> {
    config: RenderSystemConfig,
    validator: Validator,
    services: Option<RenderServices<B>>,

    command_buffers: ObjectRegistry<CommandBufferId, CommandBufferRecord<B>>,
    resource_heaps: ObjectRegistry<ResourceHeapId, ResourceHeapRecord<B>>,
    pipeline_states: ObjectRegistry<PipelineStateId, PipelineStateRecord<B>>,
    pipeline_layouts: ObjectRegistry<PipelineLayoutId, PipelineLayoutRecord<B>>,
    shaders: ObjectRegistry<ShaderId, ShaderRecord<B>>,
    render_targets: ObjectRegistry<RenderTargetId, RenderTargetRecord<B>>,
    render_passes: ObjectRegistry<RenderPassId, NativeRecord<B>>,
    query_heaps: ObjectRegistry<QueryHeapId, QueryHeapRecord<B>>,
    fences: ObjectRegistry<FenceId, NativeRecord<B>>,
    swap_chains: ObjectRegistry<SwapChainId, NativeRecord<B>>,
    buffer_arrays: ObjectRegistry<BufferArrayId, BufferArrayRecord>,
    samplers: ObjectRegistry<SamplerId, NativeRecord<B>>,
    textures: ObjectRegistry<TextureId, TextureResource<B>>,
    buffers: ObjectRegistry<BufferId, BufferResource<B>>,

    // Field order is drop order: the lane holds the allocator, which must go
    // before the device.
    lane: TransferLane<B>,
    device: Arc<B>,
    is_shut_down: bool,
}

impl<B: RenderBackend> RenderSystem<B> {
    /// Creates a render system on `device`.
    pub fn new(device: Arc<B>, config: RenderSystemConfig, services: RenderServices<B>) -> Self {
        let allocator = Arc::new(DeviceMemoryAllocator::new(Arc::clone(&device), config.allocator));
        let validator = Validator::new(*device.limits(), config.debug_layer);
        let info = device.backend_info();
        log::info!(
            "Render system '{}' created on {} ({}, {:?} memory model), mip generation: {}",
            config.label,
            info.name,
            info.device_name,
            info.memory_model,
            services.mip_generator().strategy_name()
        );
        if config.debug_layer {
            log::info!("Render system '{}': debug layer enabled", config.label);
        }

        Self {
            config,
            validator,
            services: Some(services),
            command_buffers: ObjectRegistry::new(),
            resource_heaps: ObjectRegistry::new(),
            pipeline_states: ObjectRegistry::new(),
            pipeline_layouts: ObjectRegistry::new(),
            shaders: ObjectRegistry::new(),
            render_targets: ObjectRegistry::new(),
            render_passes: ObjectRegistry::new(),
            query_heaps: ObjectRegistry::new(),
            fences: ObjectRegistry::new(),
            swap_chains: ObjectRegistry::new(),
            buffer_arrays: ObjectRegistry::new(),
            samplers: ObjectRegistry::new(),
            textures: ObjectRegistry::new(),
            buffers: ObjectRegistry::new(),
            lane: TransferLane::new(allocator),
            device,
            is_shut_down: false,
        }
    }

    /// Creates a render system with the default configuration and services.
    pub fn with_defaults(device: Arc<B>) -> Self {
        let services = RenderServices::new(device.as_ref());
        Self::new(device, RenderSystemConfig::default(), services)
    }

    /// The configuration the system was created with.
    pub fn config(&self) -> &RenderSystemConfig {
        &self.config
    }

    /// The backend device.
    pub fn device(&self) -> &Arc<B> {
        &self.device
    }

    /// The device memory allocator shared by every resource of this system.
    pub fn allocator(&self) -> &Arc<DeviceMemoryAllocator<B>> {
        self.lane.allocator()
    }

    /// The transfer lane executing uploads and read-backs.
    pub fn transfer_lane(&self) -> &TransferLane<B> {
        &self.lane
    }

    /// Returns `true` once [`RenderSystem::shutdown`] ran.
    pub fn is_shut_down(&self) -> bool {
        self.is_shut_down
    }

    /// The number of live objects of `kind`.
    pub fn object_count(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Buffer => self.buffers.len(),
            ObjectKind::Texture => self.textures.len(),
            ObjectKind::Sampler => self.samplers.len(),
            ObjectKind::RenderPass => self.render_passes.len(),
            ObjectKind::RenderTarget => self.render_targets.len(),
            ObjectKind::Shader => self.shaders.len(),
            ObjectKind::PipelineLayout => self.pipeline_layouts.len(),
            ObjectKind::PipelineState => self.pipeline_states.len(),
            ObjectKind::QueryHeap => self.query_heaps.len(),
            ObjectKind::Fence => self.fences.len(),
            ObjectKind::BufferArray => self.buffer_arrays.len(),
            ObjectKind::ResourceHeap => self.resource_heaps.len(),
            ObjectKind::CommandBuffer => self.command_buffers.len(),
            ObjectKind::SwapChain => self.swap_chains.len(),
        }
    }

    /// The monitors that report the device and staging memory of this system.
    pub fn resource_monitors(&self) -> Vec<Arc<dyn ResourceMonitor>> {
        let allocator: Arc<dyn ResourceMonitor> = Arc::clone(self.lane.allocator()) as _;
        let staging: Arc<dyn ResourceMonitor> = Arc::clone(self.lane.staging()) as _;
        vec![allocator, staging]
    }

    /// Releases every object, in dependency order, and drops the services.
    ///
    /// Safe to call more than once. Every later `create_*` call fails with
    /// [`RenderError::InvalidState`], every other call with
    /// [`RenderError::InvalidHandle`].
    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        self.is_shut_down = true;
        log::info!("Render system '{}' is shutting down...", self.config.label);

        self.services = None;

        let lane = &self.lane;
        let mut released = 0;
        for kind in ObjectKind::ALL {
            released += match kind {
                ObjectKind::CommandBuffer => drain_registry(&mut self.command_buffers, lane),
                ObjectKind::ResourceHeap => drain_registry(&mut self.resource_heaps, lane),
                ObjectKind::PipelineState => drain_registry(&mut self.pipeline_states, lane),
                ObjectKind::PipelineLayout => drain_registry(&mut self.pipeline_layouts, lane),
                ObjectKind::Shader => drain_registry(&mut self.shaders, lane),
                ObjectKind::RenderTarget => drain_registry(&mut self.render_targets, lane),
                ObjectKind::RenderPass => drain_registry(&mut self.render_passes, lane),
                ObjectKind::QueryHeap => drain_registry(&mut self.query_heaps, lane),
                ObjectKind::Fence => drain_registry(&mut self.fences, lane),
                ObjectKind::SwapChain => drain_registry(&mut self.swap_chains, lane),
                ObjectKind::BufferArray => drain_registry(&mut self.buffer_arrays, lane),
                ObjectKind::Sampler => drain_registry(&mut self.samplers, lane),
                ObjectKind::Texture => drain_registry(&mut self.textures, lane),
                ObjectKind::Buffer => drain_registry(&mut self.buffers, lane),
            };
        }

        let trimmed = lane.allocator().trim();
        log::info!(
            "Render system '{}' shutdown complete: {released} object(s) released, {trimmed} byte(s) returned to the device",
            self.config.label
        );
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.is_shut_down {
            return Err(RenderError::InvalidState(format!(
                "render system '{}' was shut down",
                self.config.label
            )));
        }
        Ok(())
    }

    fn mip_generator(&self) -> Result<&dyn MipGenerator<B>, RenderError> {
        self.services
            .as_ref()
            .map(RenderServices::mip_generator)
            .ok_or_else(|| {
                RenderError::InvalidState(format!(
                    "render system '{}' has no services after shutdown",
                    self.config.label
                ))
            })
    }
}

impl<B: RenderBackend> Drop for RenderSystem<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: RenderBackend> fmt::Debug for RenderSystem<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RenderSystem");
        s.field("label", &self.config.label);
        for kind in ObjectKind::ALL {
            let count = self.object_count(kind);
            if count > 0 {
                s.field(&kind.to_string(), &count);
            }
        }
        s.field("is_shut_down", &self.is_shut_down).finish()
    }
}
