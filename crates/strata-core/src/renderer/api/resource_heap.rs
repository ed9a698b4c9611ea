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

//! Resource heap descriptors.
//!
//! A resource heap holds views of buffers, textures and samplers laid out by
//! the binding slots of a pipeline layout. It holds `num_resource_views`
//! views, which is a multiple of the layout's binding count (one set of
//! bindings per descriptor set).

use super::buffer::BufferId;
use super::pipeline::PipelineLayoutId;
use super::sampler::SamplerId;
use super::texture::{TextureId, TextureSubresource};
use std::borrow::Cow;

/// A resource referenced by a heap view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// A buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
    /// A sampler.
    Sampler(SamplerId),
}

/// One view written into a resource heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceViewDescriptor {
    /// The viewed resource.
    pub resource: ResourceRef,
    /// Subresource range of texture views, `None` for the whole texture.
    pub subresource: Option<TextureSubresource>,
}

impl ResourceViewDescriptor {
    /// A view of the whole resource.
    pub fn whole(resource: ResourceRef) -> Self {
        Self {
            resource,
            subresource: None,
        }
    }
}

/// A descriptor used to create a resource heap.
#[derive(Debug, Clone)]
pub struct ResourceHeapDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Layout whose bindings the heap serves.
    pub pipeline_layout: PipelineLayoutId,
    /// Capacity of the heap, or 0 to size it from `initial_views`.
    pub num_resource_views: u32,
    /// Views written at creation.
    pub initial_views: Vec<ResourceViewDescriptor>,
}

impl ResourceHeapDescriptor<'_> {
    /// Effective capacity of the heap.
    pub fn capacity(&self) -> u32 {
        if self.num_resource_views == 0 {
            self.initial_views.len() as u32
        } else {
            self.num_resource_views
        }
    }
}

/// An opaque handle to a resource heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHeapId(pub usize);
