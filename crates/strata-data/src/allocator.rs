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

//! The device memory allocator.
//!
//! Device memory is requested from the backend in large [`MemoryChunk`]s and
//! handed out as non-overlapping [`MemoryRegion`]s. Each chunk keeps a sorted
//! free list behind its own lock, the chunk list has a lock of its own. A
//! region is owned by exactly one resource and goes back through
//! [`DeviceMemoryAllocator::release`].

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::renderer::api::{AllocatorConfig, MemoryPropertyFlags, MemoryRequirements};
use strata_core::renderer::{BackendError, DeviceMemory, RenderError};
use strata_core::telemetry::{MonitoredResourceType, ResourceMonitor, ResourceUsageReport};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeBlock {
    offset: u64,
    size: u64,
}

#[derive(Debug)]
struct ChunkBlocks {
    /// Sorted by offset, never overlapping.
    free: Vec<FreeBlock>,
    live_regions: usize,
    used_bytes: u64,
    map_count: usize,
}

/// One allocation of device memory, sub-allocated into regions.
#[derive(Debug)]
pub struct MemoryChunk<M> {
    memory: M,
    size: u64,
    memory_type_index: u32,
    properties: MemoryPropertyFlags,
    dedicated: bool,
    blocks: Mutex<ChunkBlocks>,
}

impl<M> MemoryChunk<M> {
    fn new(memory: M, size: u64, memory_type_index: u32, properties: MemoryPropertyFlags, dedicated: bool) -> Self {
        Self {
            memory,
            size,
            memory_type_index,
            properties,
            dedicated,
            blocks: Mutex::new(ChunkBlocks {
                free: vec![FreeBlock { offset: 0, size }],
                live_regions: 0,
                used_bytes: 0,
                map_count: 0,
            }),
        }
    }

    /// The native memory backing this chunk.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Size of the chunk in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Index of the memory type the chunk was allocated from.
    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Properties of the chunk's memory type.
    pub fn properties(&self) -> MemoryPropertyFlags {
        self.properties
    }

    /// Returns `true` if the host can map this chunk.
    pub fn is_host_visible(&self) -> bool {
        self.properties.contains(MemoryPropertyFlags::HOST_VISIBLE)
    }

    /// Returns `true` if the chunk was created for a single region.
    pub fn is_dedicated(&self) -> bool {
        self.dedicated
    }

    /// Number of regions currently handed out from this chunk.
    pub fn live_regions(&self) -> usize {
        lock(&self.blocks).live_regions
    }

    /// Bytes currently handed out from this chunk.
    pub fn used_bytes(&self) -> u64 {
        lock(&self.blocks).used_bytes
    }

    /// Number of free blocks. More than one block in an empty chunk means the
    /// free list is fragmented.
    pub fn free_block_count(&self) -> usize {
        lock(&self.blocks).free.len()
    }

    /// First-fit search for `size` bytes at `alignment`.
    fn try_allocate(&self, size: u64, alignment: u64) -> Option<u64> {
        let mut blocks = lock(&self.blocks);
        let (index, offset) = blocks.free.iter().enumerate().find_map(|(index, block)| {
            let offset = align_up(block.offset, alignment);
            (offset + size <= block.offset + block.size).then_some((index, offset))
        })?;

        let block = blocks.free.remove(index);
        let tail_offset = offset + size;
        let tail_size = block.offset + block.size - tail_offset;
        if tail_size > 0 {
            blocks.free.insert(index, FreeBlock { offset: tail_offset, size: tail_size });
        }
        if offset > block.offset {
            blocks.free.insert(index, FreeBlock { offset: block.offset, size: offset - block.offset });
        }
        blocks.live_regions += 1;
        blocks.used_bytes += size;
        Some(offset)
    }

    /// Returns a block to the free list. Returns `true` if the chunk holds no
    /// more live regions.
    fn free(&self, offset: u64, size: u64, merge: bool) -> bool {
        let mut blocks = lock(&self.blocks);
        let index = blocks.free.partition_point(|block| block.offset < offset);
        blocks.free.insert(index, FreeBlock { offset, size });

        if merge {
            if index + 1 < blocks.free.len() {
                let next = blocks.free[index + 1];
                if offset + size == next.offset {
                    blocks.free[index].size += next.size;
                    blocks.free.remove(index + 1);
                }
            }
            if index > 0 {
                let prev = blocks.free[index - 1];
                if prev.offset + prev.size == offset {
                    blocks.free[index - 1].size += blocks.free[index].size;
                    blocks.free.remove(index);
                }
            }
        }

        blocks.live_regions -= 1;
        blocks.used_bytes -= size;
        blocks.live_regions == 0
    }
}

/// A span of device memory inside a [`MemoryChunk`].
///
/// Regions are not `Clone`: the one owner hands the region back to
/// [`DeviceMemoryAllocator::release`]. A region dropped without release keeps
/// its bytes reserved until the allocator is dropped.
#[derive(Debug)]
pub struct MemoryRegion<M> {
    chunk: Arc<MemoryChunk<M>>,
    offset: u64,
    size: u64,
}

impl<M> MemoryRegion<M> {
    /// Offset of the region inside its chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the region in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The chunk the region lives in.
    pub fn chunk(&self) -> &Arc<MemoryChunk<M>> {
        &self.chunk
    }

    /// The native memory the region lives in.
    pub fn memory(&self) -> &M {
        &self.chunk.memory
    }

    /// Returns `true` if the host can map this region.
    pub fn is_host_visible(&self) -> bool {
        self.chunk.is_host_visible()
    }

    /// Returns `true` if the byte ranges of two regions of the same chunk overlap.
    pub fn overlaps(&self, other: &MemoryRegion<M>) -> bool {
        Arc::ptr_eq(&self.chunk, &other.chunk)
            && self.offset < other.offset + other.size
            && other.offset < self.offset + self.size
    }
}

/// Host access to a range of a mapped chunk. The chunk is unmapped when the
/// last guard of the chunk is dropped.
pub struct MappedRegion<'a, D: DeviceMemory> {
    device: &'a D,
    chunk: &'a MemoryChunk<D::Memory>,
    offset: u64,
    size: u64,
}

impl<D: DeviceMemory> MappedRegion<'_, D> {
    /// Size of the mapped range.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<(), RenderError> {
        if offset.checked_add(len as u64).map_or(true, |end| end > self.size) {
            return Err(RenderError::InvalidArgument(format!(
                "mapped access of {len} byte(s) at offset {offset} exceeds mapped size {}",
                self.size
            )));
        }
        Ok(())
    }

    /// Writes `data` at `offset` inside the mapped range.
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        self.check_range(offset, data.len())?;
        self.device
            .write_mapped(&self.chunk.memory, self.offset + offset, data)
            .map_err(RenderError::from)
    }

    /// Reads `out.len()` bytes at `offset` inside the mapped range.
    pub fn read(&self, offset: u64, out: &mut [u8]) -> Result<(), RenderError> {
        self.check_range(offset, out.len())?;
        self.device
            .read_mapped(&self.chunk.memory, self.offset + offset, out)
            .map_err(RenderError::from)
    }
}

impl<D: DeviceMemory> Drop for MappedRegion<'_, D> {
    fn drop(&mut self) {
        let mut blocks = lock(&self.chunk.blocks);
        blocks.map_count -= 1;
        if blocks.map_count == 0 {
            self.device.unmap_memory(&self.chunk.memory);
        }
    }
}

impl<D: DeviceMemory> fmt::Debug for MappedRegion<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedRegion")
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

/// A snapshot of the allocator's bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Number of chunks held.
    pub chunk_count: usize,
    /// Bytes reserved from the device.
    pub reserved_bytes: u64,
    /// Bytes handed out as regions.
    pub used_bytes: u64,
    /// Number of regions handed out.
    pub live_regions: usize,
    /// Largest `reserved_bytes` seen.
    pub peak_reserved_bytes: u64,
}

/// Sub-allocates device memory chunks into regions.
pub struct DeviceMemoryAllocator<D: DeviceMemory> {
    device: Arc<D>,
    config: AllocatorConfig,
    chunks: Mutex<Vec<Arc<MemoryChunk<D::Memory>>>>,
    reserved_bytes: AtomicU64,
    peak_reserved_bytes: AtomicU64,
}

impl<D: DeviceMemory> DeviceMemoryAllocator<D> {
    /// Creates an allocator over the memory of `device`.
    pub fn new(device: Arc<D>, config: AllocatorConfig) -> Self {
        Self {
            device,
            config,
            chunks: Mutex::new(Vec::new()),
            reserved_bytes: AtomicU64::new(0),
            peak_reserved_bytes: AtomicU64::new(0),
        }
    }

    /// The device the allocator requests memory from.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// The allocator configuration.
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    fn find_memory_type(&self, type_bits: u32, properties: MemoryPropertyFlags) -> Option<u32> {
        self.device
            .memory_types()
            .iter()
            .enumerate()
            .find(|(index, memory_type)| {
                *index < 32
                    && type_bits & (1 << index) != 0
                    && memory_type.property_flags.contains(properties)
            })
            .map(|(index, _)| index as u32)
    }

    /// Allocates a region that satisfies `requirements` from memory with at
    /// least `properties`.
    ///
    /// Requests larger than the configured chunk size, or that prefer a
    /// dedicated allocation, get a chunk of their own.
    pub fn allocate(
        &self,
        requirements: &MemoryRequirements,
        properties: MemoryPropertyFlags,
    ) -> Result<MemoryRegion<D::Memory>, RenderError> {
        if requirements.driver_managed {
            return Err(RenderError::InvalidArgument(
                "driver-managed resources are not sub-allocated".to_owned(),
            ));
        }
        if requirements.size == 0 {
            return Err(RenderError::InvalidArgument(
                "cannot allocate a region of zero bytes".to_owned(),
            ));
        }

        let size = requirements.size;
        let alignment = requirements.alignment.max(1);
        let memory_type_index = self
            .find_memory_type(requirements.memory_type_bits, properties)
            .ok_or_else(|| {
                RenderError::Unsupported(format!(
                    "no memory type allowed by {:#b} has {properties:?}",
                    requirements.memory_type_bits
                ))
            })?;
        let dedicated = requirements.prefers_dedicated || size > self.config.min_chunk_size;

        let mut chunks = lock(&self.chunks);
        if !dedicated {
            for chunk in chunks
                .iter()
                .filter(|c| !c.dedicated && c.memory_type_index == memory_type_index)
            {
                if let Some(offset) = chunk.try_allocate(size, alignment) {
                    return Ok(MemoryRegion {
                        chunk: Arc::clone(chunk),
                        offset,
                        size,
                    });
                }
            }
        }

        let chunk_size = if dedicated {
            size
        } else {
            self.config.min_chunk_size.max(size)
        };
        let memory = self
            .device
            .allocate_memory(chunk_size, memory_type_index)
            .map_err(|err| match err {
                BackendError::OutOfDeviceMemory { .. } => RenderError::OutOfMemory {
                    requested: size,
                    properties,
                },
                other => RenderError::from(other),
            })?;

        let type_flags = self.device.memory_types()[memory_type_index as usize].property_flags;
        let chunk = Arc::new(MemoryChunk::new(memory, chunk_size, memory_type_index, type_flags, dedicated));
        let offset = chunk.try_allocate(size, alignment).ok_or_else(|| {
            RenderError::InvalidState("fresh memory chunk cannot hold its first region".to_owned())
        })?;
        chunks.push(Arc::clone(&chunk));

        let reserved = self.reserved_bytes.fetch_add(chunk_size, Ordering::Relaxed) + chunk_size;
        self.peak_reserved_bytes.fetch_max(reserved, Ordering::Relaxed);
        log::debug!(
            "Allocated {} memory chunk of {chunk_size} bytes (type {memory_type_index}, {type_flags:?})",
            if dedicated { "dedicated" } else { "shared" },
        );

        Ok(MemoryRegion { chunk, offset, size })
    }

    /// Returns a region to its chunk.
    ///
    /// With `reduce_fragmentation`, neighboring free blocks are merged and a
    /// chunk without live regions is returned to the device right away.
    /// Dedicated chunks are always returned once empty.
    pub fn release(&self, region: MemoryRegion<D::Memory>) {
        let MemoryRegion { chunk, offset, size } = region;
        let merge = self.config.reduce_fragmentation || chunk.dedicated;
        let empty = chunk.free(offset, size, merge);
        if empty && merge {
            let mut chunks = lock(&self.chunks);
            if let Some(index) = chunks.iter().position(|c| Arc::ptr_eq(c, &chunk)) {
                drop(chunk);
                let candidate = chunks.swap_remove(index);
                self.free_chunk(candidate, &mut chunks);
            }
        }
    }

    /// Returns every chunk without live regions to the device. Returns the
    /// number of bytes freed.
    pub fn trim(&self) -> u64 {
        let mut chunks = lock(&self.chunks);
        let (empty, live): (Vec<_>, Vec<_>) = chunks.drain(..).partition(|c| c.live_regions() == 0);
        *chunks = live;
        empty
            .into_iter()
            .map(|chunk| self.free_chunk(chunk, &mut chunks))
            .sum()
    }

    /// Frees an empty chunk, or puts it back into `chunks` if it is still
    /// referenced (e.g. mapped). Returns the bytes freed.
    fn free_chunk(
        &self,
        chunk: Arc<MemoryChunk<D::Memory>>,
        chunks: &mut Vec<Arc<MemoryChunk<D::Memory>>>,
    ) -> u64 {
        match Arc::try_unwrap(chunk) {
            Ok(chunk) => {
                let size = chunk.size;
                self.device.free_memory(chunk.memory);
                self.reserved_bytes.fetch_sub(size, Ordering::Relaxed);
                log::debug!("Returned memory chunk of {size} bytes to the device");
                size
            }
            Err(chunk) => {
                chunks.push(chunk);
                0
            }
        }
    }

    /// Maps a host-visible region.
    /// ## Errors
    /// * `RenderError::InvalidAccess` - If the region is not host visible.
    pub fn map<'a>(&'a self, region: &'a MemoryRegion<D::Memory>) -> Result<MappedRegion<'a, D>, RenderError> {
        self.map_chunk(&region.chunk, region.offset, region.size)
    }

    /// Maps `size` bytes at `offset` of a chunk directly.
    /// ## Errors
    /// * `RenderError::InvalidAccess` - If the chunk is not host visible.
    /// * `RenderError::InvalidArgument` - If the range exceeds the chunk.
    pub fn map_chunk<'a>(
        &'a self,
        chunk: &'a MemoryChunk<D::Memory>,
        offset: u64,
        size: u64,
    ) -> Result<MappedRegion<'a, D>, RenderError> {
        if !chunk.is_host_visible() {
            return Err(RenderError::InvalidAccess(format!(
                "memory with {:?} cannot be mapped",
                chunk.properties
            )));
        }
        if offset.checked_add(size).map_or(true, |end| end > chunk.size) {
            return Err(RenderError::InvalidArgument(format!(
                "mapping {size} byte(s) at offset {offset} exceeds chunk size {}",
                chunk.size
            )));
        }

        let mut blocks = lock(&chunk.blocks);
        if blocks.map_count == 0 {
            self.device.map_memory(&chunk.memory, 0, chunk.size)?;
        }
        blocks.map_count += 1;
        Ok(MappedRegion {
            device: self.device.as_ref(),
            chunk,
            offset,
            size,
        })
    }

    /// Returns a snapshot of the allocator's bookkeeping.
    pub fn stats(&self) -> AllocatorStats {
        let chunks = lock(&self.chunks);
        let mut stats = AllocatorStats {
            chunk_count: chunks.len(),
            peak_reserved_bytes: self.peak_reserved_bytes.load(Ordering::Relaxed),
            ..Default::default()
        };
        for chunk in chunks.iter() {
            let blocks = lock(&chunk.blocks);
            stats.reserved_bytes += chunk.size;
            stats.used_bytes += blocks.used_bytes;
            stats.live_regions += blocks.live_regions;
        }
        stats
    }
}

impl<D: DeviceMemory> fmt::Debug for DeviceMemoryAllocator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceMemoryAllocator")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<D: DeviceMemory> Drop for DeviceMemoryAllocator<D> {
    fn drop(&mut self) {
        let chunks = std::mem::take(&mut *lock(&self.chunks));
        let mut leaked = 0usize;
        for chunk in chunks {
            match Arc::try_unwrap(chunk) {
                Ok(chunk) => self.device.free_memory(chunk.memory),
                Err(_) => leaked += 1,
            }
        }
        if leaked > 0 {
            log::warn!("{leaked} memory chunk(s) still referenced by live regions at allocator drop");
        }
    }
}

impl<D: DeviceMemory> ResourceMonitor for DeviceMemoryAllocator<D> {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Borrowed("device_memory_allocator")
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::Vram
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        let stats = self.stats();
        let capacity: u64 = self.device.memory_heaps().iter().map(|heap| heap.size).sum();
        ResourceUsageReport {
            current_bytes: stats.reserved_bytes,
            peak_bytes: Some(stats.peak_reserved_bytes),
            total_capacity_bytes: Some(capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_infra::headless::{HeadlessBackend, HeadlessConfig};

    const HOST: MemoryPropertyFlags = MemoryPropertyFlags::STAGING;

    fn requirements(size: u64, alignment: u64) -> MemoryRequirements {
        MemoryRequirements {
            size,
            alignment,
            memory_type_bits: !0,
            prefers_dedicated: false,
            driver_managed: false,
        }
    }

    fn allocator(reduce_fragmentation: bool) -> DeviceMemoryAllocator<HeadlessBackend> {
        DeviceMemoryAllocator::new(
            Arc::new(HeadlessBackend::new()),
            AllocatorConfig {
                min_chunk_size: 4096,
                reduce_fragmentation,
            },
        )
    }

    #[test]
    fn regions_of_one_chunk_never_overlap() {
        let allocator = allocator(false);
        let regions: Vec<_> = (1..=8)
            .map(|i| allocator.allocate(&requirements(100 * i, 64), HOST).unwrap())
            .collect();

        for (i, a) in regions.iter().enumerate() {
            assert_eq!(a.offset() % 64, 0);
            for b in &regions[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(allocator.stats().chunk_count, 1);
    }

    #[test]
    fn concurrent_allocate_and_release_keep_regions_disjoint() {
        // --- 1. ARRANGE ---
        let allocator = allocator(true);

        // --- 2. ACT ---
        let survivors: Vec<MemoryRegion<_>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4u64)
                .map(|worker| {
                    let allocator = &allocator;
                    scope.spawn(move || {
                        let mut live = Vec::new();
                        for round in 0..64u64 {
                            let size = 64 + (worker * 97 + round * 31) % 900;
                            live.push(allocator.allocate(&requirements(size, 16), HOST).unwrap());
                            if round % 3 == 2 {
                                allocator.release(live.swap_remove((round as usize) % live.len()));
                            }
                        }
                        live
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        // --- 3. ASSERT ---
        for (i, a) in survivors.iter().enumerate() {
            assert_eq!(a.offset() % 16, 0);
            for b in &survivors[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(allocator.stats().live_regions, survivors.len());
        for region in survivors {
            allocator.release(region);
        }
        let stats = allocator.stats();
        assert_eq!(stats.live_regions, 0);
        assert_eq!(stats.used_bytes, 0);
    }

    #[test]
    fn large_requests_get_dedicated_chunks() {
        let allocator = allocator(false);
        let small = allocator.allocate(&requirements(256, 16), HOST).unwrap();
        let large = allocator.allocate(&requirements(10_000, 16), HOST).unwrap();

        assert!(!small.chunk().is_dedicated());
        assert!(large.chunk().is_dedicated());
        assert_eq!(large.chunk().size(), 10_000);

        allocator.release(large);
        assert_eq!(allocator.stats().chunk_count, 1);
    }

    #[test]
    fn released_blocks_are_reused_first_fit() {
        let allocator = allocator(false);
        let a = allocator.allocate(&requirements(512, 1), HOST).unwrap();
        let _b = allocator.allocate(&requirements(512, 1), HOST).unwrap();
        let a_offset = a.offset();
        allocator.release(a);

        let c = allocator.allocate(&requirements(256, 1), HOST).unwrap();
        assert_eq!(c.offset(), a_offset);
    }

    #[test]
    fn reduce_fragmentation_merges_and_trims() {
        // --- 1. ARRANGE ---
        let allocator = allocator(true);
        let a = allocator.allocate(&requirements(1024, 1), HOST).unwrap();
        let b = allocator.allocate(&requirements(1024, 1), HOST).unwrap();
        let c = allocator.allocate(&requirements(1024, 1), HOST).unwrap();

        // --- 2. ACT ---
        allocator.release(b);
        allocator.release(a);
        let chunk_blocks = c.chunk().free_block_count();
        allocator.release(c);

        // --- 3. ASSERT ---
        assert_eq!(chunk_blocks, 2, "a and b should merge into one block before the tail");
        let stats = allocator.stats();
        assert_eq!(stats.chunk_count, 0);
        assert_eq!(stats.reserved_bytes, 0);
        assert_eq!(stats.peak_reserved_bytes, 4096);
    }

    #[test]
    fn without_reduce_fragmentation_only_trim_frees_chunks() {
        let allocator = allocator(false);
        let a = allocator.allocate(&requirements(1024, 1), HOST).unwrap();
        let b = allocator.allocate(&requirements(1024, 1), HOST).unwrap();
        allocator.release(a);
        allocator.release(b);

        assert_eq!(allocator.stats().chunk_count, 1);
        assert_eq!(allocator.trim(), 4096);
        assert_eq!(allocator.stats().chunk_count, 0);
    }

    #[test]
    fn mapping_device_local_memory_is_invalid_access() {
        let allocator = allocator(false);
        let region = allocator
            .allocate(&requirements(64, 1), MemoryPropertyFlags::DEVICE_LOCAL)
            .unwrap();

        let err = allocator.map(&region).unwrap_err();
        assert_eq!(err.kind(), strata_core::renderer::ErrorKind::InvalidAccess);
    }

    #[test]
    fn mapped_region_reads_back_writes() {
        let allocator = allocator(false);
        let region = allocator.allocate(&requirements(16, 4), HOST).unwrap();
        {
            let mapped = allocator.map(&region).unwrap();
            mapped.write(4, &[1, 2, 3, 4]).unwrap();
            assert!(mapped.write(14, &[0; 4]).is_err());
        }
        let mapped = allocator.map(&region).unwrap();
        let mut out = [0u8; 4];
        mapped.read(4, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn heap_exhaustion_is_out_of_memory() {
        let backend = HeadlessBackend::with_config(HeadlessConfig {
            host_visible_heap_size: 8192,
            ..Default::default()
        });
        let allocator = DeviceMemoryAllocator::new(Arc::new(backend), AllocatorConfig::default());

        let err = allocator.allocate(&requirements(16_384, 1), HOST).unwrap_err();
        assert!(matches!(
            err,
            RenderError::OutOfMemory { requested: 16_384, properties } if properties == HOST
        ));
    }

    #[test]
    fn allocator_reports_reserved_bytes_as_vram() {
        let allocator = allocator(false);
        let _region = allocator.allocate(&requirements(64, 1), HOST).unwrap();
        let report = allocator.get_usage_report();

        assert_eq!(allocator.resource_type(), MonitoredResourceType::Vram);
        assert_eq!(report.current_bytes, 4096);
        assert_eq!(report.peak_bytes, Some(4096));
    }
}
