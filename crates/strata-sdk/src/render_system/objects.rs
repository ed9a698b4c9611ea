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

use super::{release_record, RenderSystem};
use crate::records::*;
use crate::validation::ViewedResource;
use std::borrow::Cow;
use strata_core::math::Extent3D;
use strata_core::renderer::api::*;
use strata_core::renderer::{NativeResourceFactory, RenderBackend, RenderError};
use strata_data::TextureResource;

impl<B: RenderBackend> RenderSystem<B> {
    fn create_native(&self, desc: NativeObjectDescriptor<'_>) -> Result<B::Object, RenderError> {
        self.ensure_live()?;
        let object = self.device.create_object(desc)?;
        log::debug!(
            "Created {} '{}'",
            desc.kind(),
            desc.label().unwrap_or("unlabeled")
        );
        Ok(object)
    }

    /// Resolves a heap view to the creation parameters of its resource.
    fn viewed_resource(&self, view: &ResourceViewDescriptor) -> Result<ViewedResource, RenderError> {
        Ok(match view.resource {
            ResourceRef::Buffer(id) => ViewedResource::Buffer {
                bind_flags: self.buffers.get(id)?.info().bind_flags,
            },
            ResourceRef::Texture(id) => {
                let info = self.textures.get(id)?.info();
                ViewedResource::Texture {
                    bind_flags: info.bind_flags,
                    full_range: info.full_range(),
                }
            }
            ResourceRef::Sampler(id) => {
                self.samplers.get(id)?;
                ViewedResource::Sampler
            }
        })
    }

    /// Checks `views`, written from heap slot `first`, against `bindings`.
    fn check_views(
        &self,
        bindings: &[BindingDescriptor],
        first: usize,
        views: &[ResourceViewDescriptor],
    ) -> Result<(), RenderError> {
        for (offset, view) in views.iter().enumerate() {
            let binding = &bindings[(first + offset) % bindings.len()];
            let resource = self.viewed_resource(view)?;
            self.validator.resource_view(binding, view, resource)?;
        }
        Ok(())
    }

    // --- Samplers ---

    /// Creates a sampler.
    pub fn create_sampler(&mut self, desc: &SamplerDescriptor<'_>) -> Result<SamplerId, RenderError> {
        self.validator.sampler_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::Sampler(desc))?;
        Ok(self.samplers.take_ownership(NativeRecord { object }))
    }

    /// Releases a sampler.
    pub fn release_sampler(&mut self, id: SamplerId) -> Result<(), RenderError> {
        release_record(&mut self.samplers, &self.lane, id)
    }

    // --- Render passes and render targets ---

    /// Creates a render pass.
    pub fn create_render_pass(
        &mut self,
        desc: &RenderPassDescriptor<'_>,
    ) -> Result<RenderPassId, RenderError> {
        self.validator.render_pass_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::RenderPass(desc))?;
        Ok(self.render_passes.take_ownership(NativeRecord { object }))
    }

    /// Releases a render pass.
    pub fn release_render_pass(&mut self, id: RenderPassId) -> Result<(), RenderError> {
        release_record(&mut self.render_passes, &self.lane, id)
    }

    /// Creates a render target.
    ///
    /// Depth and stencil attachments without a texture get a depth-stencil
    /// texture of the target's resolution, owned and released by the target.
    pub fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor<'_>,
    ) -> Result<RenderTargetId, RenderError> {
        self.ensure_live()?;
        if desc.resolution.width == 0 || desc.resolution.height == 0 {
            return Err(RenderError::InvalidArgument(format!(
                "render target resolution must not be empty ({}x{})",
                desc.resolution.width, desc.resolution.height
            )));
        }
        if let Some(pass) = desc.render_pass {
            self.render_passes.get(pass)?;
        }

        let mut textures = Vec::new();
        let mut internal = None;
        let mut depth_attachments = 0;
        for (index, attachment) in desc.attachments.iter().enumerate() {
            if attachment.attachment_type.is_depth_or_stencil() {
                depth_attachments += 1;
            }
            let info = match attachment.texture {
                Some(id) => {
                    textures.push(id);
                    Some(self.textures.get(id)?.info())
                }
                None => None,
            };
            self.validator
                .attachment(index, attachment, info, desc.resolution)?;
            if attachment.texture.is_none() {
                internal = Some(attachment);
            }
        }
        if depth_attachments > 1 {
            return Err(RenderError::InvalidArgument(format!(
                "render target has {depth_attachments} depth-stencil attachments, at most one is allowed"
            )));
        }

        let depth_stencil = match internal {
            Some(attachment) => Some(self.create_internal_depth_stencil(desc, attachment)?),
            None => None,
        };
        let object = match self.create_native(NativeObjectDescriptor::RenderTarget(desc)) {
            Ok(object) => object,
            Err(err) => {
                if let Some(texture) = depth_stencil {
                    self.lane.release_texture(texture);
                }
                return Err(err);
            }
        };
        Ok(self.render_targets.take_ownership(RenderTargetRecord {
            object,
            resolution: desc.resolution,
            textures,
            depth_stencil,
        }))
    }

    fn create_internal_depth_stencil(
        &self,
        desc: &RenderTargetDescriptor<'_>,
        attachment: &AttachmentDescriptor,
    ) -> Result<TextureResource<B>, RenderError> {
        let format = attachment.format.unwrap_or(match attachment.attachment_type {
            AttachmentType::Depth => Format::D32Float,
            _ => Format::D24UNormS8UInt,
        });
        if !format.is_depth_or_stencil() {
            return Err(RenderError::InvalidArgument(format!(
                "internal depth-stencil attachment cannot use color format {format:?}"
            )));
        }
        let samples = desc.samples.max(1);
        let label = format!(
            "{} depth-stencil",
            desc.label.as_deref().unwrap_or("render target")
        );
        let texture_desc = TextureDescriptor {
            label: Some(Cow::Owned(label)),
            texture_type: if samples > 1 {
                TextureType::Texture2DMS
            } else {
                TextureType::Texture2D
            },
            bind_flags: BindFlags::DEPTH_STENCIL_ATTACHMENT,
            format,
            extent: Extent3D::new(desc.resolution.width, desc.resolution.height, 1),
            samples,
            ..Default::default()
        };
        self.validator.texture_desc(&texture_desc, false)?;
        self.lane
            .create_texture(&texture_desc, None, self.mip_generator()?)
    }

    /// Releases a render target and its internal depth-stencil texture.
    pub fn release_render_target(&mut self, id: RenderTargetId) -> Result<(), RenderError> {
        release_record(&mut self.render_targets, &self.lane, id)
    }

    /// The resolution of a live render target.
    pub fn render_target_resolution(
        &self,
        id: RenderTargetId,
    ) -> Result<strata_core::math::Extent2D, RenderError> {
        Ok(self.render_targets.get(id)?.resolution)
    }

    /// The internally allocated depth-stencil texture of a render target.
    pub fn render_target_depth_stencil(
        &self,
        id: RenderTargetId,
    ) -> Result<Option<&TextureResource<B>>, RenderError> {
        Ok(self.render_targets.get(id)?.depth_stencil.as_ref())
    }

    // --- Shaders and pipelines ---

    /// Creates a shader.
    pub fn create_shader(&mut self, desc: &ShaderDescriptor<'_>) -> Result<ShaderId, RenderError> {
        self.validator.shader_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::Shader(desc))?;
        Ok(self.shaders.take_ownership(ShaderRecord {
            object,
            shader_type: desc.shader_type,
        }))
    }

    /// Releases a shader.
    pub fn release_shader(&mut self, id: ShaderId) -> Result<(), RenderError> {
        if self.shaders.contains(id) {
            for (pipeline, record) in self.pipeline_states.iter() {
                if record.shaders.contains(&id) {
                    self.validator.warn(format_args!(
                        "releasing shader {} still used by pipeline state {}",
                        id.0, pipeline.0
                    ));
                }
            }
        }
        release_record(&mut self.shaders, &self.lane, id)
    }

    /// Creates a pipeline layout.
    pub fn create_pipeline_layout(
        &mut self,
        desc: &PipelineLayoutDescriptor<'_>,
    ) -> Result<PipelineLayoutId, RenderError> {
        self.validator.pipeline_layout_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::PipelineLayout(desc))?;
        Ok(self.pipeline_layouts.take_ownership(PipelineLayoutRecord {
            object,
            bindings: desc.bindings.clone(),
        }))
    }

    /// Releases a pipeline layout.
    pub fn release_pipeline_layout(&mut self, id: PipelineLayoutId) -> Result<(), RenderError> {
        if self.pipeline_layouts.contains(id) {
            let users = self
                .pipeline_states
                .iter()
                .filter(|(_, record)| record.layout == Some(id))
                .count()
                + self
                    .resource_heaps
                    .iter()
                    .filter(|(_, record)| record.layout == id)
                    .count();
            if users > 0 {
                self.validator.warn(format_args!(
                    "releasing pipeline layout {} still used by {users} object(s)",
                    id.0
                ));
            }
        }
        release_record(&mut self.pipeline_layouts, &self.lane, id)
    }

    /// Creates a graphics or compute pipeline state.
    pub fn create_pipeline_state(
        &mut self,
        desc: &PipelineStateDescriptor<'_>,
    ) -> Result<PipelineStateId, RenderError> {
        self.ensure_live()?;
        let layout = desc.layout();
        if let Some(layout) = layout {
            self.pipeline_layouts.get(layout)?;
        }
        let shaders = &self.shaders;
        self.validator
            .pipeline_state_desc(desc, |id| shaders.get(id).map(|record| record.shader_type))?;

        let (stages, shaders): (ShaderStageFlags, Vec<ShaderId>) = match desc {
            PipelineStateDescriptor::Graphics(graphics) => {
                if let Some(pass) = graphics.render_pass {
                    self.render_passes.get(pass)?;
                }
                graphics
                    .shaders()
                    .fold((ShaderStageFlags::EMPTY, Vec::new()), |(mut stages, mut ids), (stage, id)| {
                        stages |= stage;
                        ids.push(id);
                        (stages, ids)
                    })
            }
            PipelineStateDescriptor::Compute(compute) => (
                ShaderStageFlags::COMPUTE,
                compute.compute_shader.into_iter().collect(),
            ),
        };
        if let Some(layout) = layout {
            for binding in &self.pipeline_layouts.get(layout)?.bindings {
                if !binding.stages.is_empty() && !binding.stages.intersects(stages) {
                    self.validator.warn(format_args!(
                        "binding at slot {} is not visible to any shader stage of the pipeline",
                        binding.slot
                    ));
                }
            }
        }

        let object = self.create_native(NativeObjectDescriptor::PipelineState(desc))?;
        Ok(self.pipeline_states.take_ownership(PipelineStateRecord {
            object,
            layout,
            shaders,
        }))
    }

    /// Releases a pipeline state.
    pub fn release_pipeline_state(&mut self, id: PipelineStateId) -> Result<(), RenderError> {
        release_record(&mut self.pipeline_states, &self.lane, id)
    }

    // --- Queries and synchronization ---

    /// Creates a query heap.
    pub fn create_query_heap(
        &mut self,
        desc: &QueryHeapDescriptor<'_>,
    ) -> Result<QueryHeapId, RenderError> {
        self.validator.query_heap_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::QueryHeap(desc))?;
        Ok(self.query_heaps.take_ownership(QueryHeapRecord {
            object,
            query_type: desc.query_type,
            num_queries: desc.num_queries,
        }))
    }

    /// Releases a query heap.
    pub fn release_query_heap(&mut self, id: QueryHeapId) -> Result<(), RenderError> {
        release_record(&mut self.query_heaps, &self.lane, id)
    }

    /// The query type and number of queries of a live query heap.
    pub fn query_heap_info(&self, id: QueryHeapId) -> Result<(QueryType, u32), RenderError> {
        let record = self.query_heaps.get(id)?;
        Ok((record.query_type, record.num_queries))
    }

    /// Creates a fence.
    pub fn create_fence(&mut self, desc: &FenceDescriptor<'_>) -> Result<FenceId, RenderError> {
        let object = self.create_native(NativeObjectDescriptor::Fence(desc))?;
        Ok(self.fences.take_ownership(NativeRecord { object }))
    }

    /// Releases a fence.
    pub fn release_fence(&mut self, id: FenceId) -> Result<(), RenderError> {
        release_record(&mut self.fences, &self.lane, id)
    }

    // --- Buffer arrays and resource heaps ---

    /// Groups live buffers that share a binding category.
    pub fn create_buffer_array(&mut self, buffers: &[BufferId]) -> Result<BufferArrayId, RenderError> {
        self.ensure_live()?;
        let flags = buffers
            .iter()
            .map(|id| self.buffers.get(*id).map(|buffer| buffer.info().bind_flags))
            .collect::<Result<Vec<_>, _>>()?;
        let bind_flags = self.validator.buffer_array(&flags)?;
        log::debug!("Created buffer array of {} buffer(s)", buffers.len());
        Ok(self.buffer_arrays.take_ownership(BufferArrayRecord {
            buffers: buffers.to_vec(),
            bind_flags,
        }))
    }

    /// Releases a buffer array. The buffers stay alive.
    pub fn release_buffer_array(&mut self, id: BufferArrayId) -> Result<(), RenderError> {
        release_record(&mut self.buffer_arrays, &self.lane, id)
    }

    /// The buffers of a live buffer array.
    pub fn buffer_array_buffers(&self, id: BufferArrayId) -> Result<&[BufferId], RenderError> {
        Ok(&self.buffer_arrays.get(id)?.buffers)
    }

    /// The binding flags shared by every buffer of a live buffer array.
    pub fn buffer_array_bind_flags(&self, id: BufferArrayId) -> Result<BindFlags, RenderError> {
        Ok(self.buffer_arrays.get(id)?.bind_flags)
    }

    /// Creates a resource heap laid out by a live pipeline layout.
    pub fn create_resource_heap(
        &mut self,
        desc: &ResourceHeapDescriptor<'_>,
    ) -> Result<ResourceHeapId, RenderError> {
        self.ensure_live()?;
        let bindings = &self.pipeline_layouts.get(desc.pipeline_layout)?.bindings;
        self.validator.resource_heap_size(desc, bindings.len())?;
        self.check_views(bindings, 0, &desc.initial_views)?;

        let object = self.create_native(NativeObjectDescriptor::ResourceHeap(desc))?;
        let mut views = vec![None; desc.capacity() as usize];
        for (slot, view) in views.iter_mut().zip(&desc.initial_views) {
            *slot = Some(*view);
        }
        Ok(self.resource_heaps.take_ownership(ResourceHeapRecord {
            object,
            layout: desc.pipeline_layout,
            views,
        }))
    }

    /// Writes `views` into a resource heap starting at slot `first`.
    /// Returns the number of views written.
    pub fn write_resource_heap(
        &mut self,
        id: ResourceHeapId,
        first: u32,
        views: &[ResourceViewDescriptor],
    ) -> Result<u32, RenderError> {
        let record = self.resource_heaps.get(id)?;
        self.validator
            .resource_heap_range(record.views.len() as u32, first, views.len())?;
        let bindings = &self.pipeline_layouts.get(record.layout)?.bindings;
        self.check_views(bindings, first as usize, views)?;

        let record = self.resource_heaps.get_mut(id)?;
        for (slot, view) in record.views[first as usize..].iter_mut().zip(views) {
            *slot = Some(*view);
        }
        Ok(views.len() as u32)
    }

    /// Releases a resource heap.
    pub fn release_resource_heap(&mut self, id: ResourceHeapId) -> Result<(), RenderError> {
        release_record(&mut self.resource_heaps, &self.lane, id)
    }

    /// The views of a live resource heap; unwritten slots are `None`.
    pub fn resource_heap_views(
        &self,
        id: ResourceHeapId,
    ) -> Result<&[Option<ResourceViewDescriptor>], RenderError> {
        Ok(&self.resource_heaps.get(id)?.views)
    }

    // --- Command buffers and swap chains ---

    /// Creates a command buffer.
    pub fn create_command_buffer(
        &mut self,
        desc: &CommandBufferDescriptor<'_>,
    ) -> Result<CommandBufferId, RenderError> {
        self.validator.command_buffer_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::CommandBuffer(desc))?;
        Ok(self.command_buffers.take_ownership(CommandBufferRecord {
            object,
            flags: desc.flags,
        }))
    }

    /// Releases a command buffer.
    pub fn release_command_buffer(&mut self, id: CommandBufferId) -> Result<(), RenderError> {
        release_record(&mut self.command_buffers, &self.lane, id)
    }

    /// The creation flags of a live command buffer.
    pub fn command_buffer_flags(&self, id: CommandBufferId) -> Result<CommandBufferFlags, RenderError> {
        Ok(self.command_buffers.get(id)?.flags)
    }

    /// Creates a swap chain.
    pub fn create_swap_chain(
        &mut self,
        desc: &SwapChainDescriptor<'_>,
    ) -> Result<SwapChainId, RenderError> {
        self.validator.swap_chain_desc(desc)?;
        let object = self.create_native(NativeObjectDescriptor::SwapChain(desc))?;
        Ok(self.swap_chains.take_ownership(NativeRecord { object }))
    }

    /// Releases a swap chain.
    pub fn release_swap_chain(&mut self, id: SwapChainId) -> Result<(), RenderError> {
        release_record(&mut self.swap_chains, &self.lane, id)
    }
}
