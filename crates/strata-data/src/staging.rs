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

//! Staging buffers: host-visible, host-coherent buffers that carry every
//! byte moving between the CPU and device-local resources.

use crate::allocator::{DeviceMemoryAllocator, MemoryRegion};
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_core::renderer::api::{BufferUsage, MemoryPropertyFlags, NativeBufferDescriptor, StagingBufferId};
use strata_core::renderer::{NativeResourceFactory, RenderError};
use strata_core::telemetry::{MonitoredResourceType, ResourceMonitor, ResourceUsageReport};

/// A native buffer bound to a host-visible memory region.
pub struct StagingBuffer<B: NativeResourceFactory> {
    id: StagingBufferId,
    buffer: B::Buffer,
    region: MemoryRegion<B::Memory>,
    size: u64,
    usage: BufferUsage,
}

impl<B: NativeResourceFactory> StagingBuffer<B> {
    /// Unique id of this staging buffer.
    pub fn id(&self) -> StagingBufferId {
        self.id
    }

    /// The native buffer.
    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    /// The memory region backing the buffer.
    pub fn region(&self) -> &MemoryRegion<B::Memory> {
        &self.region
    }

    /// Usable size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Native usage of the buffer.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl<B: NativeResourceFactory> fmt::Debug for StagingBuffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingBuffer")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("usage", &self.usage)
            .field("region", &self.region)
            .finish()
    }
}

/// Creates, fills, reads and releases staging buffers.
pub struct StagingBufferFactory<B: NativeResourceFactory> {
    allocator: Arc<DeviceMemoryAllocator<B>>,
    next_id: AtomicU64,
    live_bytes: AtomicU64,
    peak_bytes: AtomicU64,
}

impl<B: NativeResourceFactory> StagingBufferFactory<B> {
    /// Creates a factory drawing memory from `allocator`.
    pub fn new(allocator: Arc<DeviceMemoryAllocator<B>>) -> Self {
        Self {
            allocator,
            next_id: AtomicU64::new(1),
            live_bytes: AtomicU64::new(0),
            peak_bytes: AtomicU64::new(0),
        }
    }

    /// The allocator the factory draws memory from.
    pub fn allocator(&self) -> &Arc<DeviceMemoryAllocator<B>> {
        &self.allocator
    }

    /// Creates a staging buffer of `size` bytes.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If `size` is zero.
    /// * `RenderError::OutOfMemory` - If no host-visible memory is left.
    pub fn create_staging(&self, size: u64, usage: BufferUsage) -> Result<StagingBuffer<B>, RenderError> {
        if size == 0 {
            return Err(RenderError::InvalidArgument(
                "staging buffer size must be greater than zero".to_owned(),
            ));
        }

        let device = self.allocator.device();
        let mut buffer = device.create_buffer(&NativeBufferDescriptor {
            label: Some("staging"),
            size,
            usage,
            host_visible: true,
        })?;
        let requirements = device.buffer_memory_requirements(&buffer);
        if requirements.driver_managed {
            device.destroy_buffer(buffer);
            return Err(RenderError::Unsupported(
                "backend does not expose host-visible memory for staging".to_owned(),
            ));
        }

        let region = match self.allocator.allocate(&requirements, MemoryPropertyFlags::STAGING) {
            Ok(region) => region,
            Err(err) => {
                device.destroy_buffer(buffer);
                return Err(err);
            }
        };
        if let Err(err) = device.bind_buffer_memory(&mut buffer, region.memory(), region.offset()) {
            self.allocator.release(region);
            device.destroy_buffer(buffer);
            return Err(err.into());
        }

        let id = StagingBufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let live = self.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_bytes.fetch_max(live, Ordering::Relaxed);
        log::trace!("Created staging buffer {} of {size} bytes ({usage:?})", id.0);

        Ok(StagingBuffer {
            id,
            buffer,
            region,
            size,
            usage,
        })
    }

    /// Creates a staging buffer and copies `data` into it from offset 0.
    /// ## Errors
    /// * `RenderError::InitializationFailed` - If `data` is given but `size` is zero.
    /// * `RenderError::InvalidArgument` - If `data` is longer than `size`.
    pub fn create_staging_and_initialize(
        &self,
        size: u64,
        usage: BufferUsage,
        data: Option<&[u8]>,
    ) -> Result<StagingBuffer<B>, RenderError> {
        if let Some(data) = data {
            if size == 0 {
                return Err(RenderError::InitializationFailed(
                    "cannot initialize a staging buffer of zero bytes".to_owned(),
                ));
            }
            if data.len() as u64 > size {
                return Err(RenderError::InvalidArgument(format!(
                    "initial data of {} byte(s) exceeds staging size of {size} byte(s)",
                    data.len()
                )));
            }
        }

        let staging = self.create_staging(size, usage)?;
        if let Some(data) = data.filter(|data| !data.is_empty()) {
            if let Err(err) = self.write(&staging, 0, data) {
                self.release(staging);
                return Err(err);
            }
        }
        Ok(staging)
    }

    /// Like [`StagingBufferFactory::create_staging_and_initialize`], but
    /// returns a guard that releases the buffer when dropped.
    pub fn create_scoped(
        &self,
        size: u64,
        usage: BufferUsage,
        data: Option<&[u8]>,
    ) -> Result<ScopedStaging<'_, B>, RenderError> {
        let staging = self.create_staging_and_initialize(size, usage, data)?;
        Ok(ScopedStaging {
            factory: self,
            staging: Some(staging),
        })
    }

    fn check_range(staging: &StagingBuffer<B>, offset: u64, len: usize) -> Result<(), RenderError> {
        if offset.checked_add(len as u64).map_or(true, |end| end > staging.size) {
            return Err(RenderError::InvalidArgument(format!(
                "{len} byte(s) at offset {offset} exceed staging buffer {} of {} byte(s)",
                staging.id.0, staging.size
            )));
        }
        Ok(())
    }

    /// Writes `data` into the staging buffer at `offset`.
    pub fn write(&self, staging: &StagingBuffer<B>, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        Self::check_range(staging, offset, data.len())?;
        self.allocator.map(&staging.region)?.write(offset, data)
    }

    /// Reads `out.len()` bytes of the staging buffer at `offset`.
    pub fn read(&self, staging: &StagingBuffer<B>, offset: u64, out: &mut [u8]) -> Result<(), RenderError> {
        Self::check_range(staging, offset, out.len())?;
        self.allocator.map(&staging.region)?.read(offset, out)
    }

    /// Releases the memory region of a staging buffer, then destroys the
    /// native buffer.
    pub fn release(&self, staging: StagingBuffer<B>) {
        let StagingBuffer { id, buffer, region, size, .. } = staging;
        self.allocator.release(region);
        self.allocator.device().destroy_buffer(buffer);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
        log::trace!("Released staging buffer {}", id.0);
    }
}

impl<B: NativeResourceFactory> fmt::Debug for StagingBufferFactory<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingBufferFactory")
            .field("live_bytes", &self.live_bytes.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<B: NativeResourceFactory> ResourceMonitor for StagingBufferFactory<B> {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("staging_buffers")
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::StagingMemory
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        ResourceUsageReport {
            current_bytes: self.live_bytes.load(Ordering::Relaxed),
            peak_bytes: Some(self.peak_bytes.load(Ordering::Relaxed)),
            total_capacity_bytes: None,
        }
    }
}

/// A staging buffer released on every exit path of its scope.
pub struct ScopedStaging<'a, B: NativeResourceFactory> {
    factory: &'a StagingBufferFactory<B>,
    staging: Option<StagingBuffer<B>>,
}

impl<B: NativeResourceFactory> ScopedStaging<'_, B> {
    /// Keeps the staging buffer alive past the scope.
    pub fn into_inner(mut self) -> StagingBuffer<B> {
        match self.staging.take() {
            Some(staging) => staging,
            None => unreachable!("staging buffer is only taken once"),
        }
    }
}

impl<B: NativeResourceFactory> Deref for ScopedStaging<'_, B> {
    type Target = StagingBuffer<B>;

    fn deref(&self) -> &StagingBuffer<B> {
        match &self.staging {
            Some(staging) => staging,
            None => unreachable!("staging buffer is only taken on drop"),
        }
    }
}

impl<B: NativeResourceFactory> Drop for ScopedStaging<'_, B> {
    fn drop(&mut self) {
        if let Some(staging) = self.staging.take() {
            self.factory.release(staging);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::renderer::api::AllocatorConfig;
    use strata_core::renderer::ErrorKind;
    use strata_infra::headless::HeadlessBackend;

    fn factory() -> StagingBufferFactory<HeadlessBackend> {
        let device = Arc::new(HeadlessBackend::new());
        StagingBufferFactory::new(Arc::new(DeviceMemoryAllocator::new(device, AllocatorConfig::default())))
    }

    #[test]
    fn staging_lives_in_host_coherent_memory() {
        let factory = factory();
        let staging = factory.create_staging(128, BufferUsage::TRANSFER_SRC).unwrap();

        assert!(staging
            .region()
            .chunk()
            .properties()
            .contains(MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT));
        assert_eq!(staging.size(), 128);
        factory.release(staging);
    }

    #[test]
    fn zero_size_is_rejected() {
        let factory = factory();
        let err = factory.create_staging(0, BufferUsage::TRANSFER_SRC).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = factory
            .create_staging_and_initialize(0, BufferUsage::TRANSFER_SRC, Some(&[1]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }

    #[test]
    fn initial_data_may_be_shorter_but_not_longer() {
        let factory = factory();
        let staging = factory
            .create_staging_and_initialize(8, BufferUsage::TRANSFER_SRC, Some(&[9, 9, 9]))
            .unwrap();
        let mut out = [0u8; 3];
        factory.read(&staging, 0, &mut out).unwrap();
        assert_eq!(out, [9, 9, 9]);
        factory.release(staging);

        let err = factory
            .create_staging_and_initialize(2, BufferUsage::TRANSFER_SRC, Some(&[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument(_)));
    }

    #[test]
    fn ids_are_unique() {
        let factory = factory();
        let a = factory.create_staging(16, BufferUsage::TRANSFER_SRC).unwrap();
        let b = factory.create_staging(16, BufferUsage::TRANSFER_SRC).unwrap();
        assert_ne!(a.id(), b.id());
        factory.release(a);
        factory.release(b);
    }

    #[test]
    fn scoped_staging_is_released_on_drop() {
        // --- 1. ARRANGE ---
        let factory = factory();

        // --- 2. ACT ---
        {
            let scoped = factory
                .create_scoped(64, BufferUsage::TRANSFER_DST, None)
                .unwrap();
            assert_eq!(factory.get_usage_report().current_bytes, 64);
            assert_eq!(scoped.size(), 64);
        }

        // --- 3. ASSERT ---
        assert_eq!(factory.get_usage_report().current_bytes, 0);
        assert_eq!(factory.allocator().stats().live_regions, 0);
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let factory = factory();
        let staging = factory.create_staging(4, BufferUsage::TRANSFER_SRC).unwrap();
        assert!(factory.write(&staging, 2, &[0; 4]).is_err());
        factory.release(staging);
    }
}
