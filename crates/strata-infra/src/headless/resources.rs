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

use super::memory::{HeadlessMemory, MemoryBlock};
use super::HeadlessBackend;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use strata_core::math::Extent3D;
use strata_core::renderer::api::*;
use strata_core::renderer::{BackendError, NativeResourceFactory};

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment.max(1)) * alignment.max(1)
}

/// Where a buffer or image lives inside a memory block.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) block: Arc<MemoryBlock>,
    pub(crate) offset: u64,
}

/// A buffer of the headless backend.
#[derive(Debug)]
pub struct HeadlessBuffer {
    pub(crate) id: u64,
    pub(crate) size: u64,
    pub(crate) usage: BufferUsage,
    host_visible: bool,
    pub(crate) binding: Option<Binding>,
}

impl HeadlessBuffer {
    /// Size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Native usage of the buffer.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Returns `true` once memory is bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// The layout of an image in linear memory: mip levels follow each other,
/// each holding its array layers back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImageInfo {
    pub(crate) texture_type: TextureType,
    pub(crate) format: Format,
    pub(crate) extent: Extent3D,
    pub(crate) array_layers: u32,
    pub(crate) mip_levels: u32,
    pub(crate) usage: TextureUsage,
}

impl ImageInfo {
    pub(crate) fn mip_extent(&self, mip: u32) -> Extent3D {
        mip_extent(self.texture_type, self.extent, mip)
    }

    /// Bytes of one layer of mip `mip`.
    pub(crate) fn layer_size(&self, mip: u32) -> u64 {
        memory_footprint(self.format, self.mip_extent(mip), 1)
    }

    pub(crate) fn subresource_offset(&self, mip: u32, layer: u32) -> u64 {
        let preceding: u64 = (0..mip)
            .map(|m| self.layer_size(m) * self.array_layers as u64)
            .sum();
        preceding + self.layer_size(mip) * layer as u64
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.subresource_offset(self.mip_levels, 0)
    }

    pub(crate) fn layout_index(&self, mip: u32, layer: u32) -> usize {
        (mip * self.array_layers + layer) as usize
    }
}

/// An image of the headless backend.
#[derive(Debug)]
pub struct HeadlessImage {
    pub(crate) id: u64,
    pub(crate) info: ImageInfo,
    pub(crate) binding: Option<Binding>,
    /// The layout of each subresource as the device sees it.
    pub(crate) layouts: Arc<Mutex<Vec<ResourceState>>>,
}

impl HeadlessImage {
    /// The layout the device last put subresource (`mip`, `layer`) in.
    pub fn layout(&self, mip: u32, layer: u32) -> Option<ResourceState> {
        if mip >= self.info.mip_levels || layer >= self.info.array_layers {
            return None;
        }
        let layouts = self.layouts.lock().ok()?;
        layouts.get(self.info.layout_index(mip, layer)).copied()
    }

    /// Returns `true` once memory is bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// Any other object of the headless backend. Only its kind is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessObject {
    id: u64,
    kind: ObjectKind,
    label: Option<String>,
}

impl HeadlessObject {
    /// The kind of the object.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The debug label of the object.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

fn bind(
    what: &str,
    id: u64,
    binding: &mut Option<Binding>,
    memory: &HeadlessMemory,
    offset: u64,
    size: u64,
) -> Result<(), BackendError> {
    if binding.is_some() {
        return Err(BackendError::InvalidUsage(format!("{what} {id} is already bound")));
    }
    memory.block.check_range(offset, size)?;
    *binding = Some(Binding {
        block: Arc::clone(&memory.block),
        offset,
    });
    Ok(())
}

impl NativeResourceFactory for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Image = HeadlessImage;
    type Object = HeadlessObject;

    fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            name: "headless".to_owned(),
            backend_type: GraphicsBackendType::Headless,
            device_name: "Strata Headless Device".to_owned(),
            memory_model: MemoryModel::Explicit,
        }
    }

    fn limits(&self) -> &DeviceLimits {
        &self.config.limits
    }

    fn is_format_supported(&self, format: Format) -> bool {
        !self.config.unsupported_formats.contains(&format)
    }

    fn create_buffer(&self, descriptor: &NativeBufferDescriptor<'_>) -> Result<HeadlessBuffer, BackendError> {
        if descriptor.size == 0 {
            return Err(BackendError::InvalidUsage("buffer of zero bytes".to_owned()));
        }
        if descriptor.size > self.config.limits.max_buffer_size {
            return Err(BackendError::Unsupported(format!(
                "buffer of {} bytes exceeds the maximum of {}",
                descriptor.size, self.config.limits.max_buffer_size
            )));
        }
        self.counters.live_buffers.fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessBuffer {
            id: self.next_id(),
            size: descriptor.size,
            usage: descriptor.usage,
            host_visible: descriptor.host_visible,
            binding: None,
        })
    }

    fn buffer_memory_requirements(&self, buffer: &HeadlessBuffer) -> MemoryRequirements {
        let memory_type_bits = if buffer.host_visible {
            self.type_bits_with(MemoryPropertyFlags::STAGING)
        } else {
            self.type_bits_with(MemoryPropertyFlags::EMPTY)
        };
        MemoryRequirements {
            size: align_up(buffer.size, self.config.buffer_alignment),
            alignment: self.config.buffer_alignment,
            memory_type_bits,
            prefers_dedicated: false,
            driver_managed: false,
        }
    }

    fn bind_buffer_memory(
        &self,
        buffer: &mut HeadlessBuffer,
        memory: &HeadlessMemory,
        offset: u64,
    ) -> Result<(), BackendError> {
        if buffer.host_visible && !memory.block.host_visible {
            return Err(BackendError::InvalidUsage(format!(
                "host-visible buffer {} bound to device-local memory",
                buffer.id
            )));
        }
        bind("buffer", buffer.id, &mut buffer.binding, memory, offset, buffer.size)
    }

    fn destroy_buffer(&self, buffer: HeadlessBuffer) {
        self.counters.live_buffers.fetch_sub(1, Ordering::Relaxed);
        log::trace!("Headless: destroyed buffer {}", buffer.id);
    }

    fn create_image(&self, descriptor: &NativeImageDescriptor<'_>) -> Result<HeadlessImage, BackendError> {
        if !self.is_format_supported(descriptor.format) {
            return Err(BackendError::Unsupported(format!(
                "format {:?} is not supported",
                descriptor.format
            )));
        }
        if descriptor.mip_levels == 0 || descriptor.array_layers == 0 || descriptor.extent.is_empty() {
            return Err(BackendError::InvalidUsage(format!(
                "image with {} mip level(s), {} layer(s) and extent {:?}",
                descriptor.mip_levels, descriptor.array_layers, descriptor.extent
            )));
        }

        let info = ImageInfo {
            texture_type: descriptor.texture_type,
            format: descriptor.format,
            extent: descriptor.extent,
            array_layers: descriptor.array_layers,
            mip_levels: descriptor.mip_levels,
            usage: descriptor.usage,
        };
        let subresources = (info.mip_levels * info.array_layers) as usize;
        self.counters.live_images.fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessImage {
            id: self.next_id(),
            info,
            binding: None,
            layouts: Arc::new(Mutex::new(vec![ResourceState::Undefined; subresources])),
        })
    }

    fn image_memory_requirements(&self, image: &HeadlessImage) -> MemoryRequirements {
        MemoryRequirements {
            size: align_up(image.info.total_size(), self.config.image_alignment),
            alignment: self.config.image_alignment,
            memory_type_bits: self.type_bits_with(MemoryPropertyFlags::DEVICE_LOCAL),
            prefers_dedicated: false,
            driver_managed: false,
        }
    }

    fn bind_image_memory(
        &self,
        image: &mut HeadlessImage,
        memory: &HeadlessMemory,
        offset: u64,
    ) -> Result<(), BackendError> {
        let size = image.info.total_size();
        bind("image", image.id, &mut image.binding, memory, offset, size)
    }

    fn destroy_image(&self, image: HeadlessImage) {
        self.counters.live_images.fetch_sub(1, Ordering::Relaxed);
        log::trace!("Headless: destroyed image {}", image.id);
    }

    fn create_object(&self, descriptor: NativeObjectDescriptor<'_>) -> Result<HeadlessObject, BackendError> {
        if let NativeObjectDescriptor::Shader(shader) = descriptor {
            if shader.source.is_empty() {
                return Err(BackendError::InvalidUsage(
                    "shader compilation failed: empty source".to_owned(),
                ));
            }
        }
        self.counters.live_objects.fetch_add(1, Ordering::Relaxed);
        Ok(HeadlessObject {
            id: self.next_id(),
            kind: descriptor.kind(),
            label: descriptor.label().map(str::to_owned),
        })
    }

    fn destroy_object(&self, object: HeadlessObject) {
        self.counters.live_objects.fetch_sub(1, Ordering::Relaxed);
        log::trace!("Headless: destroyed {} {}", object.kind, object.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::renderer::DeviceMemory;

    fn image_descriptor(format: Format, extent: Extent3D, layers: u32, mips: u32) -> NativeImageDescriptor<'static> {
        NativeImageDescriptor {
            label: None,
            texture_type: if layers > 1 {
                TextureType::Texture2DArray
            } else {
                TextureType::Texture2D
            },
            format,
            extent,
            array_layers: layers,
            mip_levels: mips,
            samples: 1,
            usage: TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST,
        }
    }

    #[test]
    fn image_subresources_are_laid_out_mip_major() {
        let backend = HeadlessBackend::new();
        let image = backend
            .create_image(&image_descriptor(Format::RGBA8UNorm, Extent3D::new(4, 4, 1), 2, 3))
            .unwrap();

        assert_eq!(image.info.subresource_offset(0, 1), 64);
        assert_eq!(image.info.subresource_offset(1, 0), 128);
        assert_eq!(image.info.subresource_offset(2, 1), 128 + 32 + 4);
        assert_eq!(image.info.total_size(), 128 + 32 + 8);
        assert_eq!(image.layout(2, 1), Some(ResourceState::Undefined));
        backend.destroy_image(image);
    }

    #[test]
    fn staging_buffers_require_host_visible_types() {
        let backend = HeadlessBackend::new();
        let buffer = backend
            .create_buffer(&NativeBufferDescriptor {
                label: None,
                size: 10,
                usage: BufferUsage::TRANSFER_SRC,
                host_visible: true,
            })
            .unwrap();
        let requirements = backend.buffer_memory_requirements(&buffer);

        assert_eq!(requirements.memory_type_bits, 0b10);
        assert_eq!(requirements.size, 16);
    }

    #[test]
    fn double_binding_is_rejected() {
        let backend = HeadlessBackend::new();
        let memory = backend.allocate_memory(256, 0).unwrap();
        let mut buffer = backend
            .create_buffer(&NativeBufferDescriptor {
                label: None,
                size: 64,
                usage: BufferUsage::TRANSFER_DST,
                host_visible: false,
            })
            .unwrap();

        backend.bind_buffer_memory(&mut buffer, &memory, 0).unwrap();
        assert!(backend.bind_buffer_memory(&mut buffer, &memory, 64).is_err());
    }

    #[test]
    fn unsupported_formats_are_refused() {
        let backend = HeadlessBackend::with_config(crate::headless::HeadlessConfig {
            unsupported_formats: vec![Format::BC1UNorm],
            ..Default::default()
        });
        assert!(!backend.is_format_supported(Format::BC1UNorm));
        let err = backend
            .create_image(&image_descriptor(Format::BC1UNorm, Extent3D::new(4, 4, 1), 1, 1))
            .unwrap_err();
        assert!(matches!(err, BackendError::Unsupported(_)));
    }

    #[test]
    fn empty_shaders_fail_to_compile() {
        let backend = HeadlessBackend::new();
        let shader = ShaderDescriptor {
            label: None,
            shader_type: ShaderType::Vertex,
            source: ShaderSource::Code("".into()),
            entry_point: "main".into(),
        };
        assert!(backend.create_object(NativeObjectDescriptor::Shader(&shader)).is_err());
    }
}
