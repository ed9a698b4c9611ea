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
use std::fmt;
use std::ops::Range;
use strata_core::renderer::api::CpuAccessFlags;
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::{BufferResource, StagingBuffer};

/// CPU access to a range of a buffer through its retained staging buffer.
///
/// Mapping with [`CpuAccessFlags::READ`] copies the device contents into the
/// staging buffer first. Writes land in the staging buffer and reach the
/// device on [`MappedBuffer::unmap`], or when the guard is dropped.
pub struct MappedBuffer<'a, B: RenderBackend> {
    lane: &'a TransferLane<B>,
    resource: &'a mut BufferResource<B>,
    access: CpuAccessFlags,
    range: Range<u64>,
    window: (u64, u64),
    dirty: bool,
    unmapped: bool,
}

impl<B: RenderBackend> TransferLane<B> {
    /// Maps `range` of `resource` for CPU access.
    ///
    /// Only buffers created with CPU access flags covering `access` keep a
    /// staging buffer that can be mapped.
    /// ## Errors
    /// * `RenderError::InvalidAccess` - If the buffer was not created for `access`.
    /// * `RenderError::InvalidArgument` - If the range is empty or exceeds the buffer.
    pub fn map_buffer<'a>(
        &'a self,
        resource: &'a mut BufferResource<B>,
        access: CpuAccessFlags,
        range: Range<u64>,
    ) -> Result<MappedBuffer<'a, B>, RenderError> {
        let allowed = resource.info().cpu_access_flags;
        if access.is_empty() || !allowed.contains(access) || resource.staging().is_none() {
            return Err(RenderError::InvalidAccess(format!(
                "buffer created with {allowed:?} cannot be mapped for {access:?}"
            )));
        }
        if range.start >= range.end || range.end > resource.size() {
            return Err(RenderError::InvalidArgument(format!(
                "map range {range:?} is empty or exceeds buffer size of {} byte(s)",
                resource.size()
            )));
        }

        let window = self.copy_window(range.start, range.end - range.start);
        let partial_window = window != (range.start, range.end - range.start);
        if access.contains(CpuAccessFlags::READ) || partial_window {
            let staging = mapped_staging(resource)?;
            self.copy_from_buffer(resource, window.0, staging, window.0, window.1)?;
        }
        log::trace!("Mapped buffer range {range:?} for {access:?}");
        Ok(MappedBuffer {
            lane: self,
            resource,
            access,
            range,
            window,
            dirty: false,
            unmapped: false,
        })
    }

    /// Unmaps a buffer, flushing CPU writes to the device.
    pub fn unmap_buffer(&self, mapped: MappedBuffer<'_, B>) -> Result<(), RenderError> {
        mapped.unmap()
    }
}

fn mapped_staging<B: RenderBackend>(resource: &BufferResource<B>) -> Result<&StagingBuffer<B>, RenderError> {
    resource
        .staging()
        .ok_or_else(|| RenderError::InvalidState("mapped buffer lost its staging buffer".to_owned()))
}

impl<B: RenderBackend> MappedBuffer<'_, B> {
    /// The mapped byte range of the buffer.
    pub fn range(&self) -> Range<u64> {
        self.range.clone()
    }

    /// The access the buffer was mapped with.
    pub fn access(&self) -> CpuAccessFlags {
        self.access
    }

    fn check(&self, needed: CpuAccessFlags, offset: u64, len: usize) -> Result<(), RenderError> {
        if !self.access.contains(needed) {
            return Err(RenderError::InvalidAccess(format!(
                "buffer mapped for {:?} does not allow {needed:?}",
                self.access
            )));
        }
        let mapped_len = self.range.end - self.range.start;
        if offset.checked_add(len as u64).map_or(true, |end| end > mapped_len) {
            return Err(RenderError::InvalidArgument(format!(
                "{len} byte(s) at offset {offset} exceed mapped range of {mapped_len} byte(s)"
            )));
        }
        Ok(())
    }

    /// Reads `out.len()` bytes at `offset` into the mapped range.
    pub fn read(&self, offset: u64, out: &mut [u8]) -> Result<(), RenderError> {
        self.check(CpuAccessFlags::READ, offset, out.len())?;
        let staging = mapped_staging(self.resource)?;
        self.lane.staging().read(staging, self.range.start + offset, out)
    }

    /// Writes `data` at `offset` into the mapped range.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        self.check(CpuAccessFlags::WRITE, offset, data.len())?;
        let staging = mapped_staging(self.resource)?;
        self.lane.staging().write(staging, self.range.start + offset, data)?;
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), RenderError> {
        if !self.dirty {
            return Ok(());
        }
        let (start, len) = self.window;
        let staging = mapped_staging(self.resource)?;
        self.lane.copy_to_buffer(staging, start, self.resource, start, len)?;
        self.resource.mark_initialized();
        self.dirty = false;
        Ok(())
    }

    /// Unmaps the buffer, copying CPU writes to the device.
    /// ## Errors
    /// * `RenderError::DeviceLost` - If the flush could not be submitted.
    pub fn unmap(mut self) -> Result<(), RenderError> {
        self.unmapped = true;
        self.flush()
    }
}

impl<B: RenderBackend> Drop for MappedBuffer<'_, B> {
    fn drop(&mut self) {
        if self.unmapped {
            return;
        }
        if let Err(err) = self.flush() {
            log::error!("Failed to flush mapped buffer range {:?}: {err}", self.range);
        }
    }
}

impl<B: RenderBackend> fmt::Debug for MappedBuffer<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedBuffer")
            .field("range", &self.range)
            .field("access", &self.access)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_core::renderer::api::{AllocatorConfig, BindFlags, BufferDescriptor, DeviceLimits};
    use strata_core::renderer::ErrorKind;
    use strata_data::DeviceMemoryAllocator;
    use strata_infra::{HeadlessBackend, HeadlessConfig};

    fn lane(buffer_copy_alignment: u64) -> TransferLane<HeadlessBackend> {
        let device = Arc::new(HeadlessBackend::with_config(HeadlessConfig {
            limits: DeviceLimits {
                buffer_copy_alignment,
                ..DeviceLimits::default()
            },
            ..HeadlessConfig::default()
        }));
        TransferLane::new(Arc::new(DeviceMemoryAllocator::new(device, AllocatorConfig::default())))
    }

    fn cpu_buffer(lane: &TransferLane<HeadlessBackend>, access: CpuAccessFlags) -> BufferResource<HeadlessBackend> {
        let desc = BufferDescriptor {
            cpu_access_flags: access,
            ..BufferDescriptor::new(10, BindFlags::STORAGE)
        };
        let data: Vec<u8> = (0..10).collect();
        lane.create_buffer(&desc, Some(&data)).unwrap()
    }

    #[test]
    fn read_mapping_sees_device_writes() {
        let lane = lane(1);
        let mut buffer = cpu_buffer(&lane, CpuAccessFlags::READ | CpuAccessFlags::WRITE);
        lane.write_buffer(&mut buffer, 2, &[42, 43]).unwrap();

        let mapped = lane.map_buffer(&mut buffer, CpuAccessFlags::READ, 1..5).unwrap();
        let mut out = [0u8; 4];
        mapped.read(0, &mut out).unwrap();
        lane.unmap_buffer(mapped).unwrap();

        assert_eq!(out, [1, 42, 43, 4]);
        lane.release_buffer(buffer);
    }

    #[test]
    fn unmapping_flushes_writes_and_keeps_neighbors() {
        let lane = lane(4);
        let mut buffer = cpu_buffer(&lane, CpuAccessFlags::READ | CpuAccessFlags::WRITE);

        let mut mapped = lane.map_buffer(&mut buffer, CpuAccessFlags::WRITE, 3..6).unwrap();
        mapped.write(0, &[90, 91, 92]).unwrap();
        mapped.unmap().unwrap();
        let mut out = [0u8; 10];
        lane.read_buffer(&buffer, 0, &mut out).unwrap();

        assert_eq!(out, [0, 1, 2, 90, 91, 92, 6, 7, 8, 9]);
        lane.release_buffer(buffer);
    }

    #[test]
    fn dropping_the_guard_flushes_too() {
        let lane = lane(1);
        let mut buffer = cpu_buffer(&lane, CpuAccessFlags::WRITE);
        {
            let mut mapped = lane.map_buffer(&mut buffer, CpuAccessFlags::WRITE, 0..2).unwrap();
            mapped.write(0, &[7, 7]).unwrap();
        }
        let mut out = [0u8; 3];
        lane.read_buffer(&buffer, 0, &mut out).unwrap();
        assert_eq!(out, [7, 7, 2]);
        lane.release_buffer(buffer);
    }

    #[test]
    fn access_outside_the_creation_flags_is_invalid() {
        let lane = lane(1);
        let mut write_only = cpu_buffer(&lane, CpuAccessFlags::WRITE);
        let err = lane.map_buffer(&mut write_only, CpuAccessFlags::READ, 0..4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);

        let mut gpu_only = lane
            .create_buffer(&BufferDescriptor::new(16, BindFlags::VERTEX_BUFFER), None)
            .unwrap();
        let err = lane
            .map_buffer(&mut gpu_only, CpuAccessFlags::WRITE, 0..4)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);

        let mapped = lane.map_buffer(&mut write_only, CpuAccessFlags::WRITE, 0..4).unwrap();
        let err = mapped.read(0, &mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);
        drop(mapped);

        lane.release_buffer(write_only);
        lane.release_buffer(gpu_only);
    }

    #[test]
    fn ranges_past_the_end_are_rejected() {
        let lane = lane(1);
        let mut buffer = cpu_buffer(&lane, CpuAccessFlags::READ);
        let err = lane.map_buffer(&mut buffer, CpuAccessFlags::READ, 8..12).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        lane.release_buffer(buffer);
    }
}
