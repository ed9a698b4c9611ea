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

use super::device_memory::DeviceMemory;
use crate::renderer::api::{
    BackendInfo, DeviceLimits, Format, MemoryRequirements, NativeBufferDescriptor,
    NativeImageDescriptor, NativeObjectDescriptor,
};
use crate::renderer::error::BackendError;
use std::fmt::Debug;

/// Creation and destruction of native objects.
///
/// Buffers and images are created unbound: the caller queries their memory
/// requirements, allocates a region and binds it. Resources whose requirements
/// are [`MemoryRequirements::driver_managed`] need no binding.
pub trait NativeResourceFactory: DeviceMemory {
    /// A native buffer.
    type Buffer: Send + Sync + Debug;
    /// A native image.
    type Image: Send + Sync + Debug;
    /// Any other native object (samplers, pipelines, fences, ...).
    type Object: Send + Sync + Debug;

    /// Describes the backend and its device.
    fn backend_info(&self) -> BackendInfo;

    /// Returns the limits validation and transfers are checked against.
    fn limits(&self) -> &DeviceLimits;

    /// Returns `true` if images of `format` can be created.
    fn is_format_supported(&self, format: Format) -> bool;

    /// Creates an unbound buffer.
    fn create_buffer(&self, descriptor: &NativeBufferDescriptor<'_>) -> Result<Self::Buffer, BackendError>;

    /// Returns what `buffer` needs from device memory.
    fn buffer_memory_requirements(&self, buffer: &Self::Buffer) -> MemoryRequirements;

    /// Binds `memory` at `offset` to `buffer`.
    fn bind_buffer_memory(
        &self,
        buffer: &mut Self::Buffer,
        memory: &Self::Memory,
        offset: u64,
    ) -> Result<(), BackendError>;

    /// Destroys a buffer. Its memory must be released separately.
    fn destroy_buffer(&self, buffer: Self::Buffer);

    /// Creates an unbound image.
    fn create_image(&self, descriptor: &NativeImageDescriptor<'_>) -> Result<Self::Image, BackendError>;

    /// Returns what `image` needs from device memory.
    fn image_memory_requirements(&self, image: &Self::Image) -> MemoryRequirements;

    /// Binds `memory` at `offset` to `image`.
    fn bind_image_memory(
        &self,
        image: &mut Self::Image,
        memory: &Self::Memory,
        offset: u64,
    ) -> Result<(), BackendError>;

    /// Destroys an image. Its memory must be released separately.
    fn destroy_image(&self, image: Self::Image);

    /// Creates an opaque native object.
    fn create_object(&self, descriptor: NativeObjectDescriptor<'_>) -> Result<Self::Object, BackendError>;

    /// Destroys an opaque native object.
    fn destroy_object(&self, object: Self::Object);
}
