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

//! Records of the buffers and textures owned by a render system.

use crate::allocator::{DeviceMemoryAllocator, MemoryRegion};
use crate::staging::{StagingBuffer, StagingBufferFactory};
use crate::state::{steady_state, ResourceStateTracker};
use strata_core::math::Extent3D;
use strata_core::renderer::api::{
    mip_extent, BindFlags, BufferDescriptor, ClearValue, CpuAccessFlags, Format, MiscFlags,
    ResourceState, TextureDescriptor, TextureSubresource, TextureType,
};
use strata_core::renderer::NativeResourceFactory;

/// The creation parameters of a buffer, kept for validation of later use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Element stride, 0 if unstructured.
    pub stride: u32,
    /// Binding flags.
    pub bind_flags: BindFlags,
    /// CPU access flags.
    pub cpu_access_flags: CpuAccessFlags,
    /// Miscellaneous flags.
    pub misc_flags: MiscFlags,
}

impl From<&BufferDescriptor<'_>> for BufferInfo {
    fn from(desc: &BufferDescriptor<'_>) -> Self {
        Self {
            label: desc.label.as_ref().map(|label| label.to_string()),
            size: desc.size,
            stride: desc.stride,
            bind_flags: desc.bind_flags,
            cpu_access_flags: desc.cpu_access_flags,
            misc_flags: desc.misc_flags,
        }
    }
}

/// A device-local buffer, its memory, and its retained staging buffer.
#[derive(Debug)]
pub struct BufferResource<B: NativeResourceFactory> {
    info: BufferInfo,
    buffer: B::Buffer,
    region: Option<MemoryRegion<B::Memory>>,
    staging: Option<StagingBuffer<B>>,
    initialized: bool,
}

impl<B: NativeResourceFactory> BufferResource<B> {
    /// Assembles a buffer record. `region` is `None` for driver-managed memory.
    pub fn new(info: BufferInfo, buffer: B::Buffer, region: Option<MemoryRegion<B::Memory>>) -> Self {
        Self {
            info,
            buffer,
            region,
            staging: None,
            initialized: false,
        }
    }

    /// Creation parameters.
    pub fn info(&self) -> &BufferInfo {
        &self.info
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// The native buffer.
    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    /// The memory region, `None` for driver-managed memory.
    pub fn region(&self) -> Option<&MemoryRegion<B::Memory>> {
        self.region.as_ref()
    }

    /// The retained staging buffer, if any.
    pub fn staging(&self) -> Option<&StagingBuffer<B>> {
        self.staging.as_ref()
    }

    /// Keeps `staging` for later CPU access.
    pub fn retain_staging(&mut self, staging: StagingBuffer<B>) {
        self.staging = Some(staging);
    }

    /// Returns `true` once any data was uploaded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Marks the buffer contents as defined.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Releases the memory region, then the staging buffer, then the native buffer.
    pub fn release(self, staging_factory: &StagingBufferFactory<B>) {
        let allocator = staging_factory.allocator();
        if let Some(region) = self.region {
            allocator.release(region);
        }
        if let Some(staging) = self.staging {
            staging_factory.release(staging);
        }
        allocator.device().destroy_buffer(self.buffer);
    }
}

/// The creation parameters of a texture, kept for validation of later use.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Dimensionality.
    pub texture_type: TextureType,
    /// Hardware format.
    pub format: Format,
    /// Size of mip level 0.
    pub extent: Extent3D,
    /// Number of array layers.
    pub array_layers: u32,
    /// Effective number of mip levels.
    pub mip_levels: u32,
    /// Samples per texel.
    pub samples: u32,
    /// Binding flags.
    pub bind_flags: BindFlags,
    /// Miscellaneous flags.
    pub misc_flags: MiscFlags,
    /// Fill values used without image data.
    pub clear_value: ClearValue,
}

impl From<&TextureDescriptor<'_>> for TextureInfo {
    fn from(desc: &TextureDescriptor<'_>) -> Self {
        Self {
            label: desc.label.as_ref().map(|label| label.to_string()),
            texture_type: desc.texture_type,
            format: desc.format,
            extent: desc.extent,
            array_layers: desc.array_layers,
            mip_levels: desc.num_mip_levels(),
            samples: desc.samples,
            bind_flags: desc.bind_flags,
            misc_flags: desc.misc_flags,
            clear_value: desc.clear_value,
        }
    }
}

impl TextureInfo {
    /// Extent of mip `level`.
    pub fn mip_extent(&self, level: u32) -> Extent3D {
        mip_extent(self.texture_type, self.extent, level)
    }

    /// The range covering the whole texture.
    pub fn full_range(&self) -> TextureSubresource {
        TextureSubresource::new(0, self.array_layers, 0, self.mip_levels)
    }

    /// The state the texture rests in between transfers.
    pub fn steady_state(&self) -> ResourceState {
        steady_state(self.bind_flags)
    }
}

/// A texture, its memory, and the states of its subresources.
#[derive(Debug)]
pub struct TextureResource<B: NativeResourceFactory> {
    info: TextureInfo,
    image: B::Image,
    region: Option<MemoryRegion<B::Memory>>,
    tracker: ResourceStateTracker,
}

impl<B: NativeResourceFactory> TextureResource<B> {
    /// Assembles a texture record with every subresource `Undefined`.
    pub fn new(info: TextureInfo, image: B::Image, region: Option<MemoryRegion<B::Memory>>) -> Self {
        let tracker = ResourceStateTracker::new(info.mip_levels, info.array_layers);
        Self {
            info,
            image,
            region,
            tracker,
        }
    }

    /// Creation parameters.
    pub fn info(&self) -> &TextureInfo {
        &self.info
    }

    /// The native image.
    pub fn image(&self) -> &B::Image {
        &self.image
    }

    /// The memory region, `None` for driver-managed memory.
    pub fn region(&self) -> Option<&MemoryRegion<B::Memory>> {
        self.region.as_ref()
    }

    /// The subresource states.
    pub fn tracker(&self) -> &ResourceStateTracker {
        &self.tracker
    }

    /// The native image together with the mutable state tracker, for
    /// recording transitions against the image.
    pub fn image_and_tracker(&mut self) -> (&B::Image, &mut ResourceStateTracker) {
        (&self.image, &mut self.tracker)
    }

    /// Releases the memory region, then destroys the native image.
    pub fn release(self, allocator: &DeviceMemoryAllocator<B>) {
        if let Some(region) = self.region {
            allocator.release(region);
        }
        allocator.device().destroy_image(self.image);
    }
}
