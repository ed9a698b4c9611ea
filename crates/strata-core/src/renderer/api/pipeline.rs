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

//! Pipeline layout and pipeline state descriptors.

use super::render_pass::RenderPassId;
use super::shader::{ShaderId, ShaderStageFlags};
use std::borrow::Cow;

/// The kind of resource a binding slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// A constant (uniform) buffer.
    ConstantBuffer,
    /// A storage buffer.
    StorageBuffer,
    /// A sampled texture.
    SampledTexture,
    /// A storage texture.
    StorageTexture,
    /// A sampler.
    Sampler,
}

/// One binding slot of a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingDescriptor {
    /// Binding slot index.
    pub slot: u32,
    /// The kind of resource bound at the slot.
    pub binding_type: BindingType,
    /// Stages that can access the binding.
    pub stages: ShaderStageFlags,
    /// Number of array elements, 1 for a single resource.
    pub array_size: u32,
}

/// A descriptor used to create a pipeline layout.
#[derive(Debug, Clone, Default)]
pub struct PipelineLayoutDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The binding slots.
    pub bindings: Vec<BindingDescriptor>,
}

/// An opaque handle to a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineLayoutId(pub usize);

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// A list of points.
    PointList,
    /// A list of lines.
    LineList,
    /// A strip of lines.
    LineStrip,
    /// A list of triangles.
    #[default]
    TriangleList,
    /// A strip of triangles.
    TriangleStrip,
}

/// A descriptor used to create a graphics pipeline.
#[derive(Debug, Clone, Default)]
pub struct GraphicsPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Layout of bound resources, or `None` for a pipeline without bindings.
    pub layout: Option<PipelineLayoutId>,
    /// The vertex shader. Required.
    pub vertex_shader: Option<ShaderId>,
    /// Optional tessellation control shader.
    pub tess_control_shader: Option<ShaderId>,
    /// Optional tessellation evaluation shader.
    pub tess_evaluation_shader: Option<ShaderId>,
    /// Optional geometry shader.
    pub geometry_shader: Option<ShaderId>,
    /// Optional fragment shader.
    pub fragment_shader: Option<ShaderId>,
    /// Render pass the pipeline is compatible with.
    pub render_pass: Option<RenderPassId>,
    /// Primitive assembly.
    pub primitive_topology: PrimitiveTopology,
}

impl GraphicsPipelineDescriptor<'_> {
    /// Every shader referenced by the pipeline with the stage it is bound to.
    pub fn shaders(&self) -> impl Iterator<Item = (ShaderStageFlags, ShaderId)> + '_ {
        [
            (ShaderStageFlags::VERTEX, self.vertex_shader),
            (ShaderStageFlags::TESS_CONTROL, self.tess_control_shader),
            (ShaderStageFlags::TESS_EVALUATION, self.tess_evaluation_shader),
            (ShaderStageFlags::GEOMETRY, self.geometry_shader),
            (ShaderStageFlags::FRAGMENT, self.fragment_shader),
        ]
        .into_iter()
        .filter_map(|(stage, shader)| shader.map(|id| (stage, id)))
    }
}

/// A descriptor used to create a compute pipeline.
#[derive(Debug, Clone, Default)]
pub struct ComputePipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Layout of bound resources.
    pub layout: Option<PipelineLayoutId>,
    /// The compute shader. Required.
    pub compute_shader: Option<ShaderId>,
}

/// A descriptor used to create a pipeline state object.
#[derive(Debug, Clone)]
pub enum PipelineStateDescriptor<'a> {
    /// A rasterization pipeline.
    Graphics(GraphicsPipelineDescriptor<'a>),
    /// A compute pipeline.
    Compute(ComputePipelineDescriptor<'a>),
}

impl PipelineStateDescriptor<'_> {
    /// The pipeline layout, if any.
    pub fn layout(&self) -> Option<PipelineLayoutId> {
        match self {
            PipelineStateDescriptor::Graphics(desc) => desc.layout,
            PipelineStateDescriptor::Compute(desc) => desc.layout,
        }
    }
}

/// An opaque handle to a pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineStateId(pub usize);
