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

use crate::renderer::api::{MemoryHeap, MemoryType};
use crate::renderer::error::BackendError;
use std::fmt::Debug;

/// Access to the device memory of a backend.
///
/// A backend exposes a list of memory types, each backed by a heap. The
/// allocator in `strata-data` requests large chunks through this trait and
/// sub-allocates them; it never asks for memory per resource.
pub trait DeviceMemory: Send + Sync + Debug + 'static {
    /// A native allocation of device memory.
    type Memory: Send + Sync + Debug;

    /// Returns the memory types of the device. Bit `i` of
    /// [`MemoryRequirements::memory_type_bits`](crate::renderer::api::MemoryRequirements)
    /// refers to entry `i`.
    fn memory_types(&self) -> &[MemoryType];

    /// Returns the memory heaps of the device.
    fn memory_heaps(&self) -> &[MemoryHeap];

    /// Allocates device memory.
    /// ## Arguments
    /// * `size` - Size of the allocation in bytes.
    /// * `memory_type_index` - Index into [`DeviceMemory::memory_types`].
    /// ## Returns
    /// The native allocation.
    /// ## Errors
    /// * `BackendError::OutOfDeviceMemory` - If the heap cannot hold the allocation.
    /// * `BackendError::Unsupported` - If the memory type cannot be allocated explicitly.
    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> Result<Self::Memory, BackendError>;

    /// Returns an allocation to the device.
    fn free_memory(&self, memory: Self::Memory);

    /// Maps a range of host-visible memory for host access.
    /// ## Errors
    /// * `BackendError::InvalidUsage` - If the memory is not host visible or already mapped.
    fn map_memory(&self, memory: &Self::Memory, offset: u64, size: u64) -> Result<(), BackendError>;

    /// Ends the host access started by [`DeviceMemory::map_memory`].
    fn unmap_memory(&self, memory: &Self::Memory);

    /// Copies `data` into mapped memory at `offset`.
    /// ## Errors
    /// * `BackendError::InvalidUsage` - If the range is not mapped.
    fn write_mapped(&self, memory: &Self::Memory, offset: u64, data: &[u8]) -> Result<(), BackendError>;

    /// Copies mapped memory at `offset` into `out`.
    /// ## Errors
    /// * `BackendError::InvalidUsage` - If the range is not mapped.
    fn read_mapped(&self, memory: &Self::Memory, offset: u64, out: &mut [u8]) -> Result<(), BackendError>;
}
