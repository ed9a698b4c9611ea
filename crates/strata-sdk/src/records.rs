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

//! What a render system keeps for every object it owns.
//!
//! Each record holds the native object and the creation parameters later
//! calls are validated against. [`Record::release`] is the single release path
//! of every kind.

use strata_core::math::Extent2D;
use strata_core::renderer::api::*;
use strata_core::renderer::{NativeResourceFactory, RenderBackend};
use strata_data::{BufferResource, TextureResource};
use strata_lanes::TransferLane;

/// An owned object that gives its native resources back on release.
pub(crate) trait Record<B: RenderBackend> {
    fn release(self, lane: &TransferLane<B>);
}

impl<B: RenderBackend> Record<B> for BufferResource<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.release_buffer(self);
    }
}

impl<B: RenderBackend> Record<B> for TextureResource<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.release_texture(self);
    }
}

/// A native object without metadata: samplers, render passes, fences and
/// swap chains.
#[derive(Debug)]
pub(crate) struct NativeRecord<B: RenderBackend> {
    pub object: B::Object,
}

impl<B: RenderBackend> Record<B> for NativeRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

#[derive(Debug)]
pub(crate) struct ShaderRecord<B: RenderBackend> {
    pub object: B::Object,
    pub shader_type: ShaderType,
}

impl<B: RenderBackend> Record<B> for ShaderRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

#[derive(Debug)]
pub(crate) struct PipelineLayoutRecord<B: RenderBackend> {
    pub object: B::Object,
    pub bindings: Vec<BindingDescriptor>,
}

impl<B: RenderBackend> Record<B> for PipelineLayoutRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

#[derive(Debug)]
pub(crate) struct PipelineStateRecord<B: RenderBackend> {
    pub object: B::Object,
    pub layout: Option<PipelineLayoutId>,
    pub shaders: Vec<ShaderId>,
}

impl<B: RenderBackend> Record<B> for PipelineStateRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

/// A render target and the depth-stencil texture it allocated for
/// attachments that named none.
#[derive(Debug)]
pub(crate) struct RenderTargetRecord<B: RenderBackend> {
    pub object: B::Object,
    pub resolution: Extent2D,
    pub textures: Vec<TextureId>,
    pub depth_stencil: Option<TextureResource<B>>,
}

impl<B: RenderBackend> Record<B> for RenderTargetRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
        if let Some(texture) = self.depth_stencil {
            lane.release_texture(texture);
        }
    }
}

#[derive(Debug)]
pub(crate) struct ResourceHeapRecord<B: RenderBackend> {
    pub object: B::Object,
    pub layout: PipelineLayoutId,
    pub views: Vec<Option<ResourceViewDescriptor>>,
}

impl<B: RenderBackend> Record<B> for ResourceHeapRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

#[derive(Debug)]
pub(crate) struct QueryHeapRecord<B: RenderBackend> {
    pub object: B::Object,
    pub query_type: QueryType,
    pub num_queries: u32,
}

impl<B: RenderBackend> Record<B> for QueryHeapRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

#[derive(Debug)]
pub(crate) struct CommandBufferRecord<B: RenderBackend> {
    pub object: B::Object,
    pub flags: CommandBufferFlags,
}

impl<B: RenderBackend> Record<B> for CommandBufferRecord<B> {
    fn release(self, lane: &TransferLane<B>) {
        lane.device().destroy_object(self.object);
    }
}

/// Buffers bound together. Exists on the CPU side only.
#[derive(Debug)]
pub(crate) struct BufferArrayRecord {
    pub buffers: Vec<BufferId>,
    pub bind_flags: BindFlags,
}

impl<B: RenderBackend> Record<B> for BufferArrayRecord {
    fn release(self, _lane: &TransferLane<B>) {}
}
