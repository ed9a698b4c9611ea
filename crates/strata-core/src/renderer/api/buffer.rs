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

//! Defines data structures related to GPU buffer resources.

use super::flags::{BindFlags, CpuAccessFlags, MiscFlags};
use crate::strata_bitflags;
use std::borrow::Cow;

strata_bitflags! {
    /// Native usage of a buffer as seen by the backend.
    ///
    /// Derived from the user-facing [`BindFlags`]; staging buffers only carry
    /// transfer usages.
    pub struct BufferUsage: u32 {
        /// The buffer can be the source of a copy command.
        const TRANSFER_SRC = 1 << 0;
        /// The buffer can be the destination of a copy command.
        const TRANSFER_DST = 1 << 1;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 2;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 3;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 4;
        /// The buffer can be bound as a storage buffer.
        const STORAGE = 1 << 5;
        /// The buffer can hold indirect command arguments.
        const INDIRECT = 1 << 6;
    }
}

impl BufferUsage {
    /// Maps bind flags to the native usage of a device-local buffer.
    ///
    /// Device-local buffers are always transfer targets and sources, since
    /// every upload and read-back goes through a staging buffer.
    pub fn from_bind_flags(flags: BindFlags) -> Self {
        let mut usage = BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST;
        if flags.contains(BindFlags::VERTEX_BUFFER) {
            usage |= BufferUsage::VERTEX;
        }
        if flags.contains(BindFlags::INDEX_BUFFER) {
            usage |= BufferUsage::INDEX;
        }
        if flags.contains(BindFlags::CONSTANT_BUFFER) {
            usage |= BufferUsage::UNIFORM;
        }
        if flags.intersects(BindFlags::STORAGE | BindFlags::SAMPLED | BindFlags::STREAM_OUTPUT_BUFFER) {
            usage |= BufferUsage::STORAGE;
        }
        if flags.contains(BindFlags::INDIRECT_BUFFER) {
            usage |= BufferUsage::INDIRECT;
        }
        usage
    }

    /// The usage of a staging buffer that serves the given CPU access.
    ///
    /// Any CPU access makes the staging buffer usable in both directions so it
    /// can also receive read-backs, otherwise it only uploads.
    pub fn staging_for(cpu_access: CpuAccessFlags) -> Self {
        if cpu_access.intersects(CpuAccessFlags::READ | CpuAccessFlags::WRITE) {
            BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST
        } else {
            BufferUsage::TRANSFER_SRC
        }
    }
}

/// A descriptor used to create a buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// Element stride in bytes, or 0 for unstructured buffers.
    pub stride: u32,
    /// How the buffer is bound to the pipeline.
    pub bind_flags: BindFlags,
    /// CPU access the buffer must support.
    pub cpu_access_flags: CpuAccessFlags,
    /// Miscellaneous creation flags.
    pub misc_flags: MiscFlags,
}

impl<'a> BufferDescriptor<'a> {
    /// Creates a descriptor for a buffer of `size` bytes with the given bindings.
    pub fn new(size: u64, bind_flags: BindFlags) -> Self {
        Self {
            size,
            bind_flags,
            ..Default::default()
        }
    }

    /// Returns `true` if the buffer keeps its staging buffer for repeated CPU access.
    pub fn retains_staging(&self) -> bool {
        !self.cpu_access_flags.is_empty() || self.misc_flags.contains(MiscFlags::DYNAMIC_USAGE)
    }
}

impl Default for BufferDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            size: 0,
            stride: 0,
            bind_flags: BindFlags::EMPTY,
            cpu_access_flags: CpuAccessFlags::EMPTY,
            misc_flags: MiscFlags::EMPTY,
        }
    }
}

/// The backend-facing description of a native buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Size in bytes.
    pub size: u64,
    /// Native usage.
    pub usage: BufferUsage,
    /// The buffer is a staging buffer placed in host-visible memory.
    pub host_visible: bool,
}

/// An opaque handle to a buffer owned by a render system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a buffer array owned by a render system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferArrayId(pub usize);

/// A unique identity of a staging buffer, stable while the staging buffer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StagingBufferId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_access_or_dynamic_usage_retains_staging() {
        let mut desc = BufferDescriptor::new(256, BindFlags::VERTEX_BUFFER);
        assert!(!desc.retains_staging());
        desc.cpu_access_flags = CpuAccessFlags::WRITE;
        assert!(desc.retains_staging());
        desc.cpu_access_flags = CpuAccessFlags::EMPTY;
        desc.misc_flags = MiscFlags::DYNAMIC_USAGE;
        assert!(desc.retains_staging());
    }

    #[test]
    fn staging_usage_follows_cpu_access() {
        assert_eq!(
            BufferUsage::staging_for(CpuAccessFlags::WRITE),
            BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST
        );
        assert!(BufferUsage::staging_for(CpuAccessFlags::READ).contains(BufferUsage::TRANSFER_DST));
        assert_eq!(BufferUsage::staging_for(CpuAccessFlags::EMPTY), BufferUsage::TRANSFER_SRC);
    }

    #[test]
    fn device_buffers_are_always_transfer_capable() {
        let usage = BufferUsage::from_bind_flags(BindFlags::CONSTANT_BUFFER);
        assert!(usage.contains(BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST | BufferUsage::UNIFORM));
        assert!(!usage.contains(BufferUsage::VERTEX));
    }
}
