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

//! # Strata Data
//!
//! The data structures of the device resource layer: how device memory is
//! carved up, how staging traffic is buffered, how texture states are tracked
//! and how owned objects are looked up.
//!
//! - [`allocator`]: chunked device memory sub-allocation.
//! - [`staging`]: host-visible staging buffers and their scope guard.
//! - [`state`]: per-subresource texture state tracking.
//! - [`registry`]: typed handle tables.
//! - [`resource`]: buffer and texture records.

#![warn(missing_docs)]

pub mod allocator;
pub mod registry;
pub mod resource;
pub mod staging;
pub mod state;

pub use allocator::{AllocatorStats, DeviceMemoryAllocator, MappedRegion, MemoryChunk, MemoryRegion};
pub use registry::{ObjectRegistry, RegistryKey};
pub use resource::{BufferInfo, BufferResource, TextureInfo, TextureResource};
pub use staging::{ScopedStaging, StagingBuffer, StagingBufferFactory};
pub use state::{steady_state, ResourceStateTracker};
