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

use super::TransferLane;
use strata_core::renderer::api::{
    BufferDescriptor, BufferUsage, MemoryPropertyFlags, MiscFlags, NativeBufferDescriptor,
};
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::{BufferInfo, BufferResource, StagingBuffer};

fn check_range(resource_size: u64, offset: u64, len: usize, what: &str) -> Result<(), RenderError> {
    if offset.checked_add(len as u64).map_or(true, |end| end > resource_size) {
        return Err(RenderError::InvalidArgument(format!(
            "{what} of {len} byte(s) at offset {offset} exceeds buffer size of {resource_size} byte(s)"
        )));
    }
    Ok(())
}

impl<B: RenderBackend> TransferLane<B> {
    fn copy_alignment(&self) -> u64 {
        self.device().limits().buffer_copy_alignment.max(1)
    }

    /// The smallest copy-aligned range `(start, len)` that covers `len` bytes
    /// at `offset`.
    pub(super) fn copy_window(&self, offset: u64, len: u64) -> (u64, u64) {
        let alignment = self.copy_alignment();
        let start = offset - offset % alignment;
        let end = (offset + len).div_ceil(alignment) * alignment;
        (start, end - start)
    }

    /// Creates a device-local buffer and uploads `initial_data` into it.
    ///
    /// Shorter data fills the buffer from offset 0. Without data, the buffer
    /// is zero-filled unless the descriptor has `MiscFlags::NO_INITIAL_DATA`.
    /// A staging buffer is kept with the resource when the descriptor asks
    /// for CPU access or dynamic usage.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the size is zero or the data is longer than the buffer.
    /// * `RenderError::UnsupportedSize` - If the size exceeds the device limit.
    /// * `RenderError::OutOfMemory` - If no device-local or staging memory is left.
    pub fn create_buffer(
        &self,
        desc: &BufferDescriptor<'_>,
        initial_data: Option<&[u8]>,
    ) -> Result<BufferResource<B>, RenderError> {
        let limit = self.device().limits().max_buffer_size;
        if desc.size == 0 {
            return Err(RenderError::InvalidArgument(
                "buffer size must be greater than zero".to_owned(),
            ));
        }
        if desc.size > limit {
            return Err(RenderError::UnsupportedSize {
                requested: desc.size,
                limit,
            });
        }
        if let Some(data) = initial_data {
            check_range(desc.size, 0, data.len(), "initial data")?;
        }

        let mut resource = self.create_native_buffer(desc)?;
        if let Err(err) = self.upload_initial(&mut resource, desc, initial_data) {
            self.release_buffer(resource);
            return Err(err);
        }

        log::info!(
            "Created buffer '{}' of {} byte(s){}",
            desc.label.as_deref().unwrap_or("unnamed"),
            desc.size,
            if resource.staging().is_some() { " with retained staging" } else { "" }
        );
        Ok(resource)
    }

    fn create_native_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<BufferResource<B>, RenderError> {
        let device = self.device();
        let allocator = self.allocator();
        let mut buffer = device.create_buffer(&NativeBufferDescriptor {
            label: desc.label.as_deref(),
            size: desc.size.next_multiple_of(self.copy_alignment()),
            usage: BufferUsage::from_bind_flags(desc.bind_flags),
            host_visible: false,
        })?;

        let requirements = device.buffer_memory_requirements(&buffer);
        let region = if requirements.driver_managed {
            None
        } else {
            let region = match allocator.allocate(&requirements, MemoryPropertyFlags::DEVICE_LOCAL) {
                Ok(region) => region,
                Err(err) => {
                    device.destroy_buffer(buffer);
                    return Err(err);
                }
            };
            if let Err(err) = device.bind_buffer_memory(&mut buffer, region.memory(), region.offset()) {
                allocator.release(region);
                device.destroy_buffer(buffer);
                return Err(err.into());
            }
            Some(region)
        };
        Ok(BufferResource::new(BufferInfo::from(desc), buffer, region))
    }

    fn upload_initial(
        &self,
        resource: &mut BufferResource<B>,
        desc: &BufferDescriptor<'_>,
        initial_data: Option<&[u8]>,
    ) -> Result<(), RenderError> {
        let size = desc.size;
        if desc.retains_staging() {
            let usage = BufferUsage::staging_for(desc.cpu_access_flags);
            let padded_size = size.next_multiple_of(self.copy_alignment());
            let staging = self.staging.create_staging_and_initialize(padded_size, usage, initial_data)?;
            resource.retain_staging(staging);
        }

        let data = match initial_data {
            Some(data) if data.is_empty() => return Ok(()),
            Some(data) => data.to_vec(),
            None if desc.misc_flags.contains(MiscFlags::NO_INITIAL_DATA) => return Ok(()),
            None => vec![0u8; size as usize],
        };

        // The tail up to the next copy boundary is fresh memory, so zeros are
        // as good as a read-back.
        let (_, window_len) = self.copy_window(0, data.len() as u64);
        let mut window = data;
        window.resize(window_len as usize, 0);
        log::debug!("Uploading {} byte(s) of initial buffer data", window.len());
        self.write_window(resource, 0, &window)?;
        resource.mark_initialized();
        Ok(())
    }

    /// Uploads `bytes` at the copy-aligned offset `start`.
    fn write_window(&self, resource: &BufferResource<B>, start: u64, bytes: &[u8]) -> Result<(), RenderError> {
        match resource.staging() {
            Some(staging) => {
                self.staging.write(staging, start, bytes)?;
                self.copy_to_buffer(staging, start, resource, start, bytes.len() as u64)
            }
            None => {
                let staging = self
                    .staging
                    .create_scoped(bytes.len() as u64, BufferUsage::TRANSFER_SRC, Some(bytes))?;
                self.copy_to_buffer(&staging, 0, resource, start, bytes.len() as u64)
            }
        }
    }

    /// Reads back `out.len()` bytes at the copy-aligned offset `start`.
    fn read_window(&self, resource: &BufferResource<B>, start: u64, out: &mut [u8]) -> Result<(), RenderError> {
        match resource
            .staging()
            .filter(|staging| staging.usage().contains(BufferUsage::TRANSFER_DST))
        {
            Some(staging) => {
                self.copy_from_buffer(resource, start, staging, start, out.len() as u64)?;
                self.staging.read(staging, start, out)
            }
            None => {
                let staging = self
                    .staging
                    .create_scoped(out.len() as u64, BufferUsage::TRANSFER_DST, None)?;
                self.copy_from_buffer(resource, start, &staging, 0, out.len() as u64)?;
                self.staging.read(&staging, 0, out)
            }
        }
    }

    pub(super) fn copy_to_buffer(
        &self,
        staging: &StagingBuffer<B>,
        staging_offset: u64,
        resource: &BufferResource<B>,
        offset: u64,
        size: u64,
    ) -> Result<(), RenderError> {
        let mut commands = self.begin("buffer upload")?;
        self.device()
            .copy_buffer(&mut commands, staging.buffer(), staging_offset, resource.buffer(), offset, size)?;
        self.submit(commands)
    }

    pub(super) fn copy_from_buffer(
        &self,
        resource: &BufferResource<B>,
        offset: u64,
        staging: &StagingBuffer<B>,
        staging_offset: u64,
        size: u64,
    ) -> Result<(), RenderError> {
        let mut commands = self.begin("buffer read-back")?;
        self.device()
            .copy_buffer(&mut commands, resource.buffer(), offset, staging.buffer(), staging_offset, size)?;
        self.submit(commands)
    }

    /// Writes `data` into `resource` at `offset`.
    ///
    /// Goes through the retained staging buffer when there is one, and
    /// through a one-shot staging buffer otherwise. Ranges that do not meet
    /// the device copy alignment are widened: the bytes around `data` are
    /// read back first and written again unchanged.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the range exceeds the buffer.
    pub fn write_buffer(
        &self,
        resource: &mut BufferResource<B>,
        offset: u64,
        data: &[u8],
    ) -> Result<(), RenderError> {
        check_range(resource.size(), offset, data.len(), "write")?;
        if data.is_empty() {
            return Ok(());
        }

        log::debug!("Writing {} byte(s) to buffer at offset {offset}", data.len());
        let (start, len) = self.copy_window(offset, data.len() as u64);
        if start == offset && len == data.len() as u64 {
            self.write_window(resource, offset, data)?;
        } else {
            let mut window = vec![0u8; len as usize];
            self.read_window(resource, start, &mut window)?;
            let at = (offset - start) as usize;
            window[at..at + data.len()].copy_from_slice(data);
            self.write_window(resource, start, &window)?;
        }
        resource.mark_initialized();
        Ok(())
    }

    /// Reads `out.len()` bytes of `resource` at `offset`.
    ///
    /// The retained staging buffer is used when it can be a copy
    /// destination, a one-shot read-back buffer otherwise.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the range exceeds the buffer.
    pub fn read_buffer(
        &self,
        resource: &BufferResource<B>,
        offset: u64,
        out: &mut [u8],
    ) -> Result<(), RenderError> {
        check_range(resource.size(), offset, out.len(), "read")?;
        if out.is_empty() {
            return Ok(());
        }

        log::debug!("Reading {} byte(s) from buffer at offset {offset}", out.len());
        let (start, len) = self.copy_window(offset, out.len() as u64);
        if start == offset && len == out.len() as u64 {
            return self.read_window(resource, offset, out);
        }
        let mut window = vec![0u8; len as usize];
        self.read_window(resource, start, &mut window)?;
        let at = (offset - start) as usize;
        out.copy_from_slice(&window[at..at + out.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::renderer::api::{AllocatorConfig, BindFlags, CpuAccessFlags};
    use strata_core::renderer::ErrorKind;
    use strata_core::renderer::NativeResourceFactory;
    use strata_core::telemetry::ResourceMonitor;
    use strata_data::DeviceMemoryAllocator;
    use strata_infra::HeadlessBackend;

    fn lane() -> TransferLane<HeadlessBackend> {
        let device = Arc::new(HeadlessBackend::new());
        TransferLane::new(Arc::new(DeviceMemoryAllocator::new(device, AllocatorConfig::default())))
    }

    #[test]
    fn oversized_buffers_fail_before_touching_the_device() {
        let lane = lane();
        let desc = BufferDescriptor::new(lane.device().limits().max_buffer_size + 1, BindFlags::VERTEX_BUFFER);

        let err = lane.create_buffer(&desc, None).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedSize);
        assert_eq!(lane.device().stats().live_buffers, 0);
    }

    #[test]
    fn data_longer_than_the_buffer_is_rejected() {
        let lane = lane();
        let desc = BufferDescriptor::new(4, BindFlags::VERTEX_BUFFER);
        let err = lane.create_buffer(&desc, Some(&[0; 8])).unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    #[test]
    fn buffers_without_data_are_zero_filled() {
        let lane = lane();
        let buffer = lane
            .create_buffer(&BufferDescriptor::new(32, BindFlags::CONSTANT_BUFFER), None)
            .unwrap();

        let mut out = [0xFFu8; 32];
        lane.read_buffer(&buffer, 0, &mut out).unwrap();

        assert!(buffer.is_initialized());
        assert_eq!(out, [0u8; 32]);
        lane.release_buffer(buffer);
    }

    #[test]
    fn no_initial_data_skips_the_upload() {
        let lane = lane();
        let desc = BufferDescriptor {
            misc_flags: MiscFlags::NO_INITIAL_DATA,
            ..BufferDescriptor::new(64, BindFlags::STORAGE)
        };
        let copies_before = lane.device().stats().copies;

        let buffer = lane.create_buffer(&desc, None).unwrap();

        assert!(!buffer.is_initialized());
        assert_eq!(lane.device().stats().copies, copies_before);
        lane.release_buffer(buffer);
    }

    #[test]
    fn upload_only_staging_is_not_used_for_read_back() {
        let lane = lane();
        let desc = BufferDescriptor {
            misc_flags: MiscFlags::DYNAMIC_USAGE,
            ..BufferDescriptor::new(16, BindFlags::CONSTANT_BUFFER)
        };
        let buffer = lane.create_buffer(&desc, Some(&[7; 16])).unwrap();
        let retained = buffer.staging().map(StagingBuffer::id);
        assert_eq!(buffer.staging().map(StagingBuffer::usage), Some(BufferUsage::TRANSFER_SRC));

        let mut out = [0u8; 16];
        lane.read_buffer(&buffer, 0, &mut out).unwrap();

        assert_eq!(out, [7; 16]);
        assert_eq!(buffer.staging().map(StagingBuffer::id), retained);
        lane.release_buffer(buffer);
    }

    #[test]
    fn cpu_access_staging_serves_both_directions() {
        let lane = lane();
        let desc = BufferDescriptor {
            cpu_access_flags: CpuAccessFlags::READ | CpuAccessFlags::WRITE,
            ..BufferDescriptor::new(8, BindFlags::STORAGE)
        };
        let mut buffer = lane.create_buffer(&desc, Some(&[1, 2, 3, 4])).unwrap();

        lane.write_buffer(&mut buffer, 4, &[5, 6, 7, 8]).unwrap();
        let mut out = [0u8; 8];
        lane.read_buffer(&buffer, 0, &mut out).unwrap();

        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(lane.staging().get_usage_report().current_bytes, 8);
        lane.release_buffer(buffer);
        assert_eq!(lane.staging().get_usage_report().current_bytes, 0);
    }

    #[test]
    fn out_of_bounds_writes_are_rejected() {
        let lane = lane();
        let mut buffer = lane
            .create_buffer(&BufferDescriptor::new(8, BindFlags::VERTEX_BUFFER), None)
            .unwrap();
        let err = lane.write_buffer(&mut buffer, 6, &[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        lane.release_buffer(buffer);
    }
}
