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

use super::HeadlessBackend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use strata_core::renderer::api::{MemoryHeap, MemoryPropertyFlags, MemoryType};
use strata_core::renderer::{BackendError, DeviceMemory};

#[derive(Debug)]
pub(crate) struct MemoryBlock {
    pub(crate) id: u64,
    pub(crate) heap_index: u32,
    pub(crate) size: u64,
    pub(crate) host_visible: bool,
    mapped: AtomicBool,
    bytes: Mutex<Vec<u8>>,
}

impl MemoryBlock {
    pub(crate) fn bytes(&self) -> Result<MutexGuard<'_, Vec<u8>>, BackendError> {
        self.bytes
            .lock()
            .map_err(|e| BackendError::DeviceLost(format!("memory block {} poisoned: {e}", self.id)))
    }

    pub(crate) fn check_range(&self, offset: u64, len: u64) -> Result<(), BackendError> {
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            return Err(BackendError::InvalidUsage(format!(
                "{len} byte(s) at offset {offset} exceed memory block {} of {} byte(s)",
                self.id, self.size
            )));
        }
        Ok(())
    }

    /// Copies `len` bytes at `offset` out of the block.
    pub(crate) fn read_vec(&self, offset: u64, len: u64) -> Result<Vec<u8>, BackendError> {
        self.check_range(offset, len)?;
        let bytes = self.bytes()?;
        Ok(bytes[offset as usize..(offset + len) as usize].to_vec())
    }

    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> Result<(), BackendError> {
        self.check_range(offset, data.len() as u64)?;
        let mut bytes = self.bytes()?;
        bytes[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Device memory of the headless backend.
#[derive(Debug)]
pub struct HeadlessMemory {
    pub(crate) block: Arc<MemoryBlock>,
}

impl HeadlessMemory {
    /// Size of the allocation in bytes.
    pub fn size(&self) -> u64 {
        self.block.size
    }
}

impl HeadlessBackend {
    fn check_mapped(memory: &HeadlessMemory) -> Result<(), BackendError> {
        if !memory.block.mapped.load(Ordering::Acquire) {
            return Err(BackendError::InvalidUsage(format!(
                "memory block {} is not mapped",
                memory.block.id
            )));
        }
        Ok(())
    }
}

impl DeviceMemory for HeadlessBackend {
    type Memory = HeadlessMemory;

    fn memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    fn memory_heaps(&self) -> &[MemoryHeap] {
        &self.memory_heaps
    }

    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> Result<HeadlessMemory, BackendError> {
        let memory_type = self
            .memory_types
            .get(memory_type_index as usize)
            .copied()
            .ok_or_else(|| BackendError::InvalidUsage(format!("no memory type {memory_type_index}")))?;
        let heap_index = memory_type.heap_index as usize;
        let budget = self.memory_heaps[heap_index].size;

        self.heap_usage[heap_index]
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(size).filter(|total| *total <= budget)
            })
            .map_err(|_| BackendError::OutOfDeviceMemory { requested: size })?;
        self.counters.live_allocations.fetch_add(1, Ordering::Relaxed);

        let block = MemoryBlock {
            id: self.next_id(),
            heap_index: memory_type.heap_index,
            size,
            host_visible: memory_type.property_flags.contains(MemoryPropertyFlags::HOST_VISIBLE),
            mapped: AtomicBool::new(false),
            bytes: Mutex::new(vec![0; size as usize]),
        };
        log::trace!("Headless: allocated memory block {} of {size} bytes", block.id);
        Ok(HeadlessMemory {
            block: Arc::new(block),
        })
    }

    fn free_memory(&self, memory: HeadlessMemory) {
        let block = &memory.block;
        self.heap_usage[block.heap_index as usize].fetch_sub(block.size, Ordering::AcqRel);
        self.counters.live_allocations.fetch_sub(1, Ordering::Relaxed);
        log::trace!("Headless: freed memory block {}", block.id);
    }

    fn map_memory(&self, memory: &HeadlessMemory, offset: u64, size: u64) -> Result<(), BackendError> {
        let block = &memory.block;
        if !block.host_visible {
            return Err(BackendError::InvalidUsage(format!(
                "memory block {} is not host visible",
                block.id
            )));
        }
        block.check_range(offset, size)?;
        if block.mapped.swap(true, Ordering::AcqRel) {
            return Err(BackendError::InvalidUsage(format!(
                "memory block {} is already mapped",
                block.id
            )));
        }
        Ok(())
    }

    fn unmap_memory(&self, memory: &HeadlessMemory) {
        memory.block.mapped.store(false, Ordering::Release);
    }

    fn write_mapped(&self, memory: &HeadlessMemory, offset: u64, data: &[u8]) -> Result<(), BackendError> {
        Self::check_mapped(memory)?;
        memory.block.write(offset, data)
    }

    fn read_mapped(&self, memory: &HeadlessMemory, offset: u64, out: &mut [u8]) -> Result<(), BackendError> {
        Self::check_mapped(memory)?;
        memory.block.check_range(offset, out.len() as u64)?;
        let bytes = memory.block.bytes()?;
        out.copy_from_slice(&bytes[offset as usize..offset as usize + out.len()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessConfig;

    #[test]
    fn heap_budget_is_enforced() {
        let backend = HeadlessBackend::with_config(HeadlessConfig {
            device_local_heap_size: 1024,
            ..Default::default()
        });

        let first = backend.allocate_memory(1000, 0).unwrap();
        let err = backend.allocate_memory(100, 0).unwrap_err();
        assert_eq!(err, BackendError::OutOfDeviceMemory { requested: 100 });

        backend.free_memory(first);
        assert_eq!(backend.heap_usage(0), 0);
        assert!(backend.allocate_memory(1024, 0).is_ok());
    }

    #[test]
    fn device_local_memory_cannot_be_mapped() {
        let backend = HeadlessBackend::new();
        let memory = backend.allocate_memory(64, 0).unwrap();
        assert!(backend.map_memory(&memory, 0, 64).is_err());
    }

    #[test]
    fn mapped_writes_are_visible_to_reads() {
        let backend = HeadlessBackend::new();
        let memory = backend.allocate_memory(64, 1).unwrap();
        assert!(backend.write_mapped(&memory, 0, &[1]).is_err());

        backend.map_memory(&memory, 0, 64).unwrap();
        backend.write_mapped(&memory, 8, &[1, 2, 3]).unwrap();
        let mut out = [0u8; 3];
        backend.read_mapped(&memory, 8, &mut out).unwrap();
        backend.unmap_memory(&memory);

        assert_eq!(out, [1, 2, 3]);
    }
}
