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

//! Kinds of objects owned by a render system and the descriptors of the
//! opaque native objects a backend creates for them.

use super::command::{CommandBufferDescriptor, FenceDescriptor};
use super::pipeline::{PipelineLayoutDescriptor, PipelineStateDescriptor};
use super::query::QueryHeapDescriptor;
use super::render_pass::RenderPassDescriptor;
use super::render_target::RenderTargetDescriptor;
use super::resource_heap::ResourceHeapDescriptor;
use super::sampler::SamplerDescriptor;
use super::shader::ShaderDescriptor;
use super::swap_chain::SwapChainDescriptor;
use std::fmt;

/// Every kind of object a render system takes ownership of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// A GPU buffer.
    Buffer,
    /// A GPU texture.
    Texture,
    /// A sampler.
    Sampler,
    /// A render pass.
    RenderPass,
    /// A render target.
    RenderTarget,
    /// A shader.
    Shader,
    /// A pipeline layout.
    PipelineLayout,
    /// A pipeline state object.
    PipelineState,
    /// A query heap.
    QueryHeap,
    /// A fence.
    Fence,
    /// An array of buffers bound together.
    BufferArray,
    /// A resource heap.
    ResourceHeap,
    /// A command buffer.
    CommandBuffer,
    /// A swap chain.
    SwapChain,
}

impl ObjectKind {
    /// All kinds, in release order used at shutdown.
    pub const ALL: [ObjectKind; 14] = [
        ObjectKind::CommandBuffer,
        ObjectKind::ResourceHeap,
        ObjectKind::PipelineState,
        ObjectKind::PipelineLayout,
        ObjectKind::Shader,
        ObjectKind::RenderTarget,
        ObjectKind::RenderPass,
        ObjectKind::QueryHeap,
        ObjectKind::Fence,
        ObjectKind::SwapChain,
        ObjectKind::BufferArray,
        ObjectKind::Sampler,
        ObjectKind::Texture,
        ObjectKind::Buffer,
    ];
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Buffer => "buffer",
            ObjectKind::Texture => "texture",
            ObjectKind::Sampler => "sampler",
            ObjectKind::RenderPass => "render pass",
            ObjectKind::RenderTarget => "render target",
            ObjectKind::Shader => "shader",
            ObjectKind::PipelineLayout => "pipeline layout",
            ObjectKind::PipelineState => "pipeline state",
            ObjectKind::QueryHeap => "query heap",
            ObjectKind::Fence => "fence",
            ObjectKind::BufferArray => "buffer array",
            ObjectKind::ResourceHeap => "resource heap",
            ObjectKind::CommandBuffer => "command buffer",
            ObjectKind::SwapChain => "swap chain",
        };
        f.write_str(name)
    }
}

/// The description of an opaque native object.
///
/// Buffers and textures are created through dedicated factory methods since
/// their memory is bound by the allocator; buffer arrays exist only on the
/// CPU side.
#[derive(Debug, Clone, Copy)]
pub enum NativeObjectDescriptor<'a> {
    /// A sampler.
    Sampler(&'a SamplerDescriptor<'a>),
    /// A render pass.
    RenderPass(&'a RenderPassDescriptor<'a>),
    /// A render target.
    RenderTarget(&'a RenderTargetDescriptor<'a>),
    /// A shader.
    Shader(&'a ShaderDescriptor<'a>),
    /// A pipeline layout.
    PipelineLayout(&'a PipelineLayoutDescriptor<'a>),
    /// A pipeline state object.
    PipelineState(&'a PipelineStateDescriptor<'a>),
    /// A query heap.
    QueryHeap(&'a QueryHeapDescriptor<'a>),
    /// A fence.
    Fence(&'a FenceDescriptor<'a>),
    /// A resource heap.
    ResourceHeap(&'a ResourceHeapDescriptor<'a>),
    /// A command buffer.
    CommandBuffer(&'a CommandBufferDescriptor<'a>),
    /// A swap chain.
    SwapChain(&'a SwapChainDescriptor<'a>),
}

impl NativeObjectDescriptor<'_> {
    /// The kind of the described object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            NativeObjectDescriptor::Sampler(_) => ObjectKind::Sampler,
            NativeObjectDescriptor::RenderPass(_) => ObjectKind::RenderPass,
            NativeObjectDescriptor::RenderTarget(_) => ObjectKind::RenderTarget,
            NativeObjectDescriptor::Shader(_) => ObjectKind::Shader,
            NativeObjectDescriptor::PipelineLayout(_) => ObjectKind::PipelineLayout,
            NativeObjectDescriptor::PipelineState(_) => ObjectKind::PipelineState,
            NativeObjectDescriptor::QueryHeap(_) => ObjectKind::QueryHeap,
            NativeObjectDescriptor::Fence(_) => ObjectKind::Fence,
            NativeObjectDescriptor::ResourceHeap(_) => ObjectKind::ResourceHeap,
            NativeObjectDescriptor::CommandBuffer(_) => ObjectKind::CommandBuffer,
            NativeObjectDescriptor::SwapChain(_) => ObjectKind::SwapChain,
        }
    }

    /// The debug label of the described object.
    pub fn label(&self) -> Option<&str> {
        match self {
            NativeObjectDescriptor::Sampler(d) => d.label.as_deref(),
            NativeObjectDescriptor::RenderPass(d) => d.label.as_deref(),
            NativeObjectDescriptor::RenderTarget(d) => d.label.as_deref(),
            NativeObjectDescriptor::Shader(d) => d.label.as_deref(),
            NativeObjectDescriptor::PipelineLayout(d) => d.label.as_deref(),
            NativeObjectDescriptor::PipelineState(PipelineStateDescriptor::Graphics(d)) => {
                d.label.as_deref()
            }
            NativeObjectDescriptor::PipelineState(PipelineStateDescriptor::Compute(d)) => {
                d.label.as_deref()
            }
            NativeObjectDescriptor::QueryHeap(d) => d.label.as_deref(),
            NativeObjectDescriptor::Fence(d) => d.label.as_deref(),
            NativeObjectDescriptor::ResourceHeap(d) => d.label.as_deref(),
            NativeObjectDescriptor::CommandBuffer(d) => d.label.as_deref(),
            NativeObjectDescriptor::SwapChain(d) => d.label.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn release_order_lists_every_kind_once() {
        let unique: HashSet<_> = ObjectKind::ALL.iter().collect();
        assert_eq!(unique.len(), 14);
        let pos = |k| ObjectKind::ALL.iter().position(|x| *x == k).unwrap();
        assert!(pos(ObjectKind::PipelineState) < pos(ObjectKind::PipelineLayout));
        assert!(pos(ObjectKind::PipelineState) < pos(ObjectKind::Shader));
        assert!(pos(ObjectKind::RenderTarget) < pos(ObjectKind::Texture));
        assert!(pos(ObjectKind::BufferArray) < pos(ObjectKind::Buffer));
    }

    #[test]
    fn native_descriptor_reports_kind_and_label() {
        let fence = FenceDescriptor {
            label: Some("frame".into()),
            signaled: true,
        };
        let desc = NativeObjectDescriptor::Fence(&fence);
        assert_eq!(desc.kind(), ObjectKind::Fence);
        assert_eq!(desc.label(), Some("frame"));
        assert_eq!(ObjectKind::QueryHeap.to_string(), "query heap");
    }
}
