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

use super::context::WgpuContext;
use super::conversions::{wgpu_format, IntoWgpu};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use strata_core::renderer::api::*;
use strata_core::renderer::{BackendError, DeviceMemory, NativeResourceFactory};

/// Index of the memory type backing staging chunks.
const STAGING_MEMORY_TYPE: u32 = 1;
/// Offsets of buffer/texture copies must be multiples of this.
const STAGING_ALIGNMENT: u64 = 256;

/// A staging chunk: one mappable WGPU buffer the allocator sub-allocates from.
#[derive(Debug)]
pub struct WgpuMemory {
    buffer: Arc<wgpu::Buffer>,
    size: u64,
    mapped: AtomicBool,
}

/// A WGPU buffer, or a window into a staging chunk once memory is bound.
#[derive(Debug)]
pub struct WgpuBuffer {
    id: u64,
    size: u64,
    usage: BufferUsage,
    host_visible: bool,
    buffer: Option<Arc<wgpu::Buffer>>,
    offset: u64,
}

impl WgpuBuffer {
    /// The WGPU buffer and the offset of this buffer inside it.
    pub(crate) fn resolve(&self) -> Result<(&wgpu::Buffer, u64), BackendError> {
        self.buffer
            .as_deref()
            .map(|buffer| (buffer, self.offset))
            .ok_or_else(|| BackendError::InvalidUsage(format!("buffer {} has no memory bound", self.id)))
    }

    pub(crate) fn usage(&self) -> BufferUsage {
        self.usage
    }
}

/// A WGPU texture. Its memory is owned by the driver.
#[derive(Debug)]
pub struct WgpuImage {
    id: u64,
    pub(crate) texture: wgpu::Texture,
    pub(crate) texture_type: TextureType,
    footprint: u64,
}

impl WgpuImage {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

/// Any other object created on a WGPU device.
#[derive(Debug)]
pub enum WgpuObject {
    /// A sampler.
    Sampler(wgpu::Sampler),
    /// A compiled WGSL module.
    Shader(wgpu::ShaderModule),
    /// An object WGPU has no standalone equivalent for; only its kind is kept.
    Opaque(ObjectKind),
}

impl WgpuObject {
    /// The kind of the object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            WgpuObject::Sampler(_) => ObjectKind::Sampler,
            WgpuObject::Shader(_) => ObjectKind::Shader,
            WgpuObject::Opaque(kind) => *kind,
        }
    }
}

/// The WGPU backend.
///
/// Device-local buffers and all textures are allocated by the driver. Only
/// staging memory is managed explicitly: each chunk is a mappable buffer and
/// staging buffers are windows into it.
#[derive(Debug)]
pub struct WgpuBackend {
    pub(crate) context: WgpuContext,
    memory_types: Vec<MemoryType>,
    memory_heaps: Vec<MemoryHeap>,
    limits: DeviceLimits,
    next_id: AtomicU64,
    vram_allocated_bytes: AtomicUsize,
    vram_peak_bytes: AtomicUsize,
}

impl WgpuBackend {
    /// Wraps an initialized context.
    pub fn new(context: WgpuContext) -> Self {
        let device_limits = &context.device_limits;
        let limits = DeviceLimits {
            max_buffer_size: device_limits.max_buffer_size,
            max_constant_buffer_size: device_limits.max_uniform_buffer_binding_size as u64,
            max_texture_1d_size: device_limits.max_texture_dimension_1d,
            max_texture_2d_size: device_limits.max_texture_dimension_2d,
            max_texture_3d_size: device_limits.max_texture_dimension_3d,
            max_texture_cube_size: device_limits.max_texture_dimension_2d,
            max_texture_array_layers: device_limits.max_texture_array_layers,
            row_pitch_alignment: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
            buffer_copy_alignment: wgpu::COPY_BUFFER_ALIGNMENT,
        };
        let heap_size = limits.max_buffer_size;

        Self {
            context,
            memory_types: vec![
                MemoryType {
                    property_flags: MemoryPropertyFlags::DEVICE_LOCAL,
                    heap_index: 0,
                },
                MemoryType {
                    property_flags: MemoryPropertyFlags::STAGING,
                    heap_index: 1,
                },
            ],
            memory_heaps: vec![MemoryHeap { size: heap_size }, MemoryHeap { size: heap_size }],
            limits,
            next_id: AtomicU64::new(1),
            vram_allocated_bytes: AtomicUsize::new(0),
            vram_peak_bytes: AtomicUsize::new(0),
        }
    }

    /// Creates a context on the best adapter and wraps it.
    pub fn new_blocking(label: &str, debug_layer: bool) -> anyhow::Result<Self> {
        Ok(Self::new(WgpuContext::new_blocking(label, debug_layer)?))
    }

    /// Bytes of driver-managed memory currently allocated through this backend.
    pub fn vram_allocated_bytes(&self) -> usize {
        self.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Highest value [`WgpuBackend::vram_allocated_bytes`] reached.
    pub fn vram_peak_bytes(&self) -> usize {
        self.vram_peak_bytes.load(Ordering::Relaxed)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn track_vram(&self, bytes: u64) {
        let current = self
            .vram_allocated_bytes
            .fetch_add(bytes as usize, Ordering::Relaxed)
            + bytes as usize;
        self.vram_peak_bytes.fetch_max(current, Ordering::Relaxed);
    }

    fn untrack_vram(&self, bytes: u64) {
        self.vram_allocated_bytes
            .fetch_sub(bytes as usize, Ordering::Relaxed);
    }

    pub(crate) fn wait_idle(&self) -> Result<(), BackendError> {
        self.context
            .wait_idle()
            .map_err(|e| BackendError::DeviceLost(e.to_string()))
    }

    fn create_shader(&self, shader: &ShaderDescriptor<'_>) -> Result<WgpuObject, BackendError> {
        let code = match &shader.source {
            ShaderSource::Code(code) => code,
            ShaderSource::Binary(_) => {
                return Err(BackendError::Unsupported(
                    "precompiled shader binaries".to_owned(),
                ))
            }
        };
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: shader.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(code.as_ref())),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(BackendError::InvalidUsage(format!(
                "shader compilation failed: {error}"
            )));
        }
        Ok(WgpuObject::Shader(module))
    }

    fn create_sampler(&self, sampler: &SamplerDescriptor<'_>) -> WgpuObject {
        let clamps_to_border = [
            sampler.address_mode_u,
            sampler.address_mode_v,
            sampler.address_mode_w,
        ]
        .contains(&AddressMode::ClampToBorder);
        let border_color = clamps_to_border.then(|| match sampler.border_color {
            [_, _, _, a] if a == 0.0 => wgpu::SamplerBorderColor::TransparentBlack,
            [r, g, b, _] if r == 0.0 && g == 0.0 && b == 0.0 => wgpu::SamplerBorderColor::OpaqueBlack,
            _ => wgpu::SamplerBorderColor::OpaqueWhite,
        });

        let wgpu_sampler = self.context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: sampler.label.as_deref(),
            address_mode_u: sampler.address_mode_u.into_wgpu(),
            address_mode_v: sampler.address_mode_v.into_wgpu(),
            address_mode_w: sampler.address_mode_w.into_wgpu(),
            mag_filter: sampler.mag_filter.into_wgpu(),
            min_filter: sampler.min_filter.into_wgpu(),
            mipmap_filter: sampler.mipmap_filter.into_wgpu(),
            lod_min_clamp: sampler.lod_min_clamp,
            lod_max_clamp: sampler.lod_max_clamp,
            compare: sampler.compare.map(|f| f.into_wgpu()),
            anisotropy_clamp: sampler.max_anisotropy.max(1),
            border_color,
        });
        WgpuObject::Sampler(wgpu_sampler)
    }
}

impl DeviceMemory for WgpuBackend {
    type Memory = WgpuMemory;

    fn memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    fn memory_heaps(&self) -> &[MemoryHeap] {
        &self.memory_heaps
    }

    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> Result<WgpuMemory, BackendError> {
        if memory_type_index != STAGING_MEMORY_TYPE {
            return Err(BackendError::Unsupported(
                "device-local memory is managed by the driver".to_owned(),
            ));
        }
        if size > self.limits.max_buffer_size {
            return Err(BackendError::OutOfDeviceMemory { requested: size });
        }
        let size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata staging chunk"),
            size,
            usage: wgpu::BufferUsages::MAP_READ
                | wgpu::BufferUsages::MAP_WRITE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("WgpuBackend: Created staging chunk of {size} bytes");
        Ok(WgpuMemory {
            buffer: Arc::new(buffer),
            size,
            mapped: AtomicBool::new(false),
        })
    }

    fn free_memory(&self, memory: WgpuMemory) {
        memory.buffer.destroy();
        log::debug!("WgpuBackend: Destroyed staging chunk of {} bytes", memory.size);
    }

    fn map_memory(&self, memory: &WgpuMemory, offset: u64, size: u64) -> Result<(), BackendError> {
        if offset.checked_add(size).map_or(true, |end| end > memory.size) {
            return Err(BackendError::InvalidUsage(format!(
                "{size} byte(s) at offset {offset} exceed a staging chunk of {} byte(s)",
                memory.size
            )));
        }
        if memory.mapped.swap(true, Ordering::AcqRel) {
            return Err(BackendError::InvalidUsage("staging chunk is already mapped".to_owned()));
        }
        Ok(())
    }

    fn unmap_memory(&self, memory: &WgpuMemory) {
        memory.mapped.store(false, Ordering::Release);
    }

    // Host writes are queued and land before the next submission.
    fn write_mapped(&self, memory: &WgpuMemory, offset: u64, data: &[u8]) -> Result<(), BackendError> {
        if !memory.mapped.load(Ordering::Acquire) {
            return Err(BackendError::InvalidUsage("staging chunk is not mapped".to_owned()));
        }
        if data.is_empty() {
            return Ok(());
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            // Widen to the copy alignment, keeping the surrounding bytes.
            let start = offset - offset % wgpu::COPY_BUFFER_ALIGNMENT;
            let end = (offset + data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
            let mut widened = vec![0u8; (end - start) as usize];
            self.read_mapped(memory, start, &mut widened)?;
            let at = (offset - start) as usize;
            widened[at..at + data.len()].copy_from_slice(data);
            self.context.queue.write_buffer(&memory.buffer, start, &widened);
        } else {
            self.context.queue.write_buffer(&memory.buffer, offset, data);
        }
        self.context.queue.submit(std::iter::empty());
        Ok(())
    }

    fn read_mapped(&self, memory: &WgpuMemory, offset: u64, out: &mut [u8]) -> Result<(), BackendError> {
        if !memory.mapped.load(Ordering::Acquire) {
            return Err(BackendError::InvalidUsage("staging chunk is not mapped".to_owned()));
        }
        if out.is_empty() {
            return Ok(());
        }
        let start = offset - offset % wgpu::MAP_ALIGNMENT;
        let end = (offset + out.len() as u64)
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
            .min(memory.size);
        let slice = memory.buffer.slice(start..end);

        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.wait_idle()?;
        receiver
            .recv()
            .map_err(|e| BackendError::DeviceLost(format!("map callback dropped: {e}")))?
            .map_err(|e| BackendError::DeviceLost(format!("failed to map staging chunk: {e}")))?;

        {
            let view = slice.get_mapped_range();
            let at = (offset - start) as usize;
            out.copy_from_slice(&view[at..at + out.len()]);
        }
        memory.buffer.unmap();
        Ok(())
    }
}

impl NativeResourceFactory for WgpuBackend {
    type Buffer = WgpuBuffer;
    type Image = WgpuImage;
    type Object = WgpuObject;

    fn backend_info(&self) -> BackendInfo {
        let backend_type = match self.context.adapter_backend {
            wgpu::Backend::Vulkan => GraphicsBackendType::Vulkan,
            wgpu::Backend::Metal => GraphicsBackendType::Metal,
            wgpu::Backend::Dx12 => GraphicsBackendType::Dx12,
            wgpu::Backend::Gl => GraphicsBackendType::OpenGL,
            wgpu::Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
            _ => GraphicsBackendType::Unknown,
        };
        BackendInfo {
            name: "wgpu".to_owned(),
            backend_type,
            device_name: self.context.adapter_name.clone(),
            memory_model: MemoryModel::DriverManaged,
        }
    }

    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn is_format_supported(&self, format: Format) -> bool {
        wgpu_format(format).is_some_and(|wgpu_format| {
            self.context
                .active_device_features
                .contains(wgpu_format.required_features())
        })
    }

    fn create_buffer(&self, descriptor: &NativeBufferDescriptor<'_>) -> Result<WgpuBuffer, BackendError> {
        if descriptor.size > self.limits.max_buffer_size {
            return Err(BackendError::Unsupported(format!(
                "buffer of {} bytes exceeds the maximum of {}",
                descriptor.size, self.limits.max_buffer_size
            )));
        }
        let id = self.next_id();
        let buffer = if descriptor.host_visible {
            None
        } else {
            let size = descriptor.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
            let usage: wgpu::BufferUsages = descriptor.usage.into_wgpu();
            let wgpu_buffer = self.context.device.create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label,
                size,
                usage: usage | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.track_vram(size);
            Some(Arc::new(wgpu_buffer))
        };
        log::debug!(
            "WgpuBackend: Created buffer '{}' ({} bytes)",
            descriptor.label.unwrap_or_default(),
            descriptor.size
        );
        Ok(WgpuBuffer {
            id,
            size: descriptor.size,
            usage: descriptor.usage,
            host_visible: descriptor.host_visible,
            buffer,
            offset: 0,
        })
    }

    fn buffer_memory_requirements(&self, buffer: &WgpuBuffer) -> MemoryRequirements {
        if !buffer.host_visible {
            return MemoryRequirements::driver_managed();
        }
        MemoryRequirements {
            size: buffer.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            alignment: STAGING_ALIGNMENT,
            memory_type_bits: 1 << STAGING_MEMORY_TYPE,
            prefers_dedicated: false,
            driver_managed: false,
        }
    }

    fn bind_buffer_memory(&self, buffer: &mut WgpuBuffer, memory: &WgpuMemory, offset: u64) -> Result<(), BackendError> {
        if !buffer.host_visible || buffer.buffer.is_some() {
            return Err(BackendError::InvalidUsage(format!(
                "buffer {} cannot be bound to staging memory",
                buffer.id
            )));
        }
        buffer.buffer = Some(Arc::clone(&memory.buffer));
        buffer.offset = offset;
        Ok(())
    }

    fn destroy_buffer(&self, buffer: WgpuBuffer) {
        if let (false, Some(wgpu_buffer)) = (buffer.host_visible, buffer.buffer) {
            self.untrack_vram(wgpu_buffer.size());
            wgpu_buffer.destroy();
        }
    }

    fn create_image(&self, descriptor: &NativeImageDescriptor<'_>) -> Result<WgpuImage, BackendError> {
        let format = wgpu_format(descriptor.format)
            .filter(|_| self.is_format_supported(descriptor.format))
            .ok_or_else(|| BackendError::Unsupported(format!("format {:?}", descriptor.format)))?;
        let mut size: wgpu::Extent3d = descriptor.extent.into_wgpu();
        if descriptor.texture_type.has_layers() {
            size.depth_or_array_layers = descriptor.array_layers;
        }

        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label,
            size,
            mip_level_count: descriptor.mip_levels,
            sample_count: descriptor.samples,
            dimension: descriptor.texture_type.into_wgpu(),
            format,
            usage: descriptor.usage.into_wgpu(),
            view_formats: &[],
        });
        let footprint = (0..descriptor.mip_levels)
            .map(|mip| {
                let extent = mip_extent(descriptor.texture_type, descriptor.extent, mip);
                memory_footprint(descriptor.format, extent, descriptor.array_layers)
            })
            .sum();
        self.track_vram(footprint);
        Ok(WgpuImage {
            id: self.next_id(),
            texture,
            texture_type: descriptor.texture_type,
            footprint,
        })
    }

    fn image_memory_requirements(&self, _image: &WgpuImage) -> MemoryRequirements {
        MemoryRequirements::driver_managed()
    }

    fn bind_image_memory(&self, image: &mut WgpuImage, _memory: &WgpuMemory, _offset: u64) -> Result<(), BackendError> {
        Err(BackendError::InvalidUsage(format!(
            "image {} uses driver-managed memory",
            image.id
        )))
    }

    fn destroy_image(&self, image: WgpuImage) {
        self.untrack_vram(image.footprint);
        image.texture.destroy();
    }

    fn create_object(&self, descriptor: NativeObjectDescriptor<'_>) -> Result<WgpuObject, BackendError> {
        match descriptor {
            NativeObjectDescriptor::Shader(shader) => self.create_shader(shader),
            NativeObjectDescriptor::Sampler(sampler) => Ok(self.create_sampler(sampler)),
            other => Ok(WgpuObject::Opaque(other.kind())),
        }
    }

    fn destroy_object(&self, object: WgpuObject) {
        log::trace!("WgpuBackend: Destroyed {}", object.kind());
    }
}
