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

//! A software backend without a GPU.
//!
//! Device memory is host RAM split into a device-local and a host-visible
//! heap with fixed budgets. Commands are recorded into a list and executed on
//! submission, with image layouts checked per subresource the way a
//! validation layer would. Device loss can be simulated.

mod commands;
mod memory;
mod resources;

pub use self::commands::HeadlessCommandList;
pub use self::memory::HeadlessMemory;
pub use self::resources::{HeadlessBuffer, HeadlessImage, HeadlessObject};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use strata_core::renderer::api::{DeviceLimits, Format, MemoryHeap, MemoryPropertyFlags, MemoryType};

/// Configuration of a [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Budget of the device-local heap in bytes.
    pub device_local_heap_size: u64,
    /// Budget of the host-visible heap in bytes.
    pub host_visible_heap_size: u64,
    /// Expose a single heap and memory type that is both device local and
    /// host visible, like integrated GPUs do.
    pub unified_memory: bool,
    /// Limits reported to validation and transfers.
    pub limits: DeviceLimits,
    /// Alignment of buffer memory.
    pub buffer_alignment: u64,
    /// Alignment of image memory.
    pub image_alignment: u64,
    /// Formats the device refuses to create images with.
    pub unsupported_formats: Vec<Format>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            device_local_heap_size: 512 * 1024 * 1024,
            host_visible_heap_size: 256 * 1024 * 1024,
            unified_memory: false,
            limits: DeviceLimits::default(),
            buffer_alignment: 16,
            image_alignment: 256,
            unsupported_formats: Vec::new(),
        }
    }
}

/// Counters of the work a [`HeadlessBackend`] has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Command lists executed.
    pub submits: u64,
    /// Buffer and image copies executed.
    pub copies: u64,
    /// Layout transitions executed.
    pub transitions: u64,
    /// Mip blits executed.
    pub blits: u64,
    /// Memory allocations currently alive.
    pub live_allocations: u64,
    /// Buffers currently alive.
    pub live_buffers: u64,
    /// Images currently alive.
    pub live_images: u64,
    /// Opaque objects currently alive.
    pub live_objects: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submits: AtomicU64,
    copies: AtomicU64,
    transitions: AtomicU64,
    blits: AtomicU64,
    live_allocations: AtomicU64,
    live_buffers: AtomicU64,
    live_images: AtomicU64,
    live_objects: AtomicU64,
}

/// The software backend.
#[derive(Debug)]
pub struct HeadlessBackend {
    config: HeadlessConfig,
    memory_types: Vec<MemoryType>,
    memory_heaps: Vec<MemoryHeap>,
    heap_usage: Vec<AtomicU64>,
    next_id: AtomicU64,
    device_lost: AtomicBool,
    counters: Counters,
}

impl HeadlessBackend {
    /// Creates a backend with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HeadlessConfig::default())
    }

    /// Creates a backend with `config`.
    pub fn with_config(config: HeadlessConfig) -> Self {
        let (memory_types, memory_heaps) = if config.unified_memory {
            (
                vec![MemoryType {
                    property_flags: MemoryPropertyFlags::DEVICE_LOCAL | MemoryPropertyFlags::STAGING,
                    heap_index: 0,
                }],
                vec![MemoryHeap {
                    size: config.device_local_heap_size,
                }],
            )
        } else {
            (
                vec![
                    MemoryType {
                        property_flags: MemoryPropertyFlags::DEVICE_LOCAL,
                        heap_index: 0,
                    },
                    MemoryType {
                        property_flags: MemoryPropertyFlags::STAGING,
                        heap_index: 1,
                    },
                ],
                vec![
                    MemoryHeap {
                        size: config.device_local_heap_size,
                    },
                    MemoryHeap {
                        size: config.host_visible_heap_size,
                    },
                ],
            )
        };
        let heap_usage = memory_heaps.iter().map(|_| AtomicU64::new(0)).collect();
        log::info!(
            "Headless backend created with {} memory type(s) ({})",
            memory_types.len(),
            if config.unified_memory { "unified" } else { "discrete" }
        );

        Self {
            config,
            memory_types,
            memory_heaps,
            heap_usage,
            next_id: AtomicU64::new(1),
            device_lost: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// The configuration the backend was created with.
    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Simulates a lost device. Every later submission fails.
    pub fn lose_device(&self) {
        log::error!("Headless device marked as lost");
        self.device_lost.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the device is lost.
    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::SeqCst)
    }

    /// Bytes currently allocated from heap `heap_index`.
    pub fn heap_usage(&self, heap_index: usize) -> u64 {
        self.heap_usage
            .get(heap_index)
            .map_or(0, |usage| usage.load(Ordering::Relaxed))
    }

    /// A snapshot of the work counters.
    pub fn stats(&self) -> HeadlessStats {
        let c = &self.counters;
        HeadlessStats {
            submits: c.submits.load(Ordering::Relaxed),
            copies: c.copies.load(Ordering::Relaxed),
            transitions: c.transitions.load(Ordering::Relaxed),
            blits: c.blits.load(Ordering::Relaxed),
            live_allocations: c.live_allocations.load(Ordering::Relaxed),
            live_buffers: c.live_buffers.load(Ordering::Relaxed),
            live_images: c.live_images.load(Ordering::Relaxed),
            live_objects: c.live_objects.load(Ordering::Relaxed),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Bitmask of the memory types carrying `flags`.
    fn type_bits_with(&self, flags: MemoryPropertyFlags) -> u32 {
        self.memory_types
            .iter()
            .enumerate()
            .filter(|(_, memory_type)| memory_type.property_flags.contains(flags))
            .fold(0, |bits, (index, _)| bits | (1 << index))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}
