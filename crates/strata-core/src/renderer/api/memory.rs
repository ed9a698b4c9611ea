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

//! Device memory descriptions exchanged between the allocator and a backend.

use super::format::Format;
use crate::math::Extent3D;
use crate::strata_bitflags;

strata_bitflags! {
    /// Properties of a device memory type.
    pub struct MemoryPropertyFlags: u32 {
        /// Memory optimized for device access.
        const DEVICE_LOCAL = 1 << 0;
        /// Memory the host can map.
        const HOST_VISIBLE = 1 << 1;
        /// Host writes are visible to the device without explicit flushes.
        const HOST_COHERENT = 1 << 2;
        /// Host reads are cached.
        const HOST_CACHED = 1 << 3;
    }
}

impl MemoryPropertyFlags {
    /// The properties every staging allocation requests.
    pub const STAGING: Self = Self::from_bits_retain(
        Self::HOST_VISIBLE.bits() | Self::HOST_COHERENT.bits(),
    );
}

/// One memory type exposed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    /// Properties of memory allocated from this type.
    pub property_flags: MemoryPropertyFlags,
    /// Index of the heap backing this type.
    pub heap_index: u32,
}

/// One memory heap exposed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryHeap {
    /// Capacity of the heap in bytes.
    pub size: u64,
}

/// What a native resource needs from device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequirements {
    /// Size of the allocation in bytes.
    pub size: u64,
    /// Required alignment of the allocation offset.
    pub alignment: u64,
    /// Bit `i` is set if memory type `i` may back the resource.
    pub memory_type_bits: u32,
    /// The resource should live in its own allocation.
    pub prefers_dedicated: bool,
    /// The driver manages the memory of this resource; nothing is sub-allocated.
    pub driver_managed: bool,
}

impl MemoryRequirements {
    /// Requirements of a resource whose memory the driver manages.
    pub const fn driver_managed() -> Self {
        Self {
            size: 0,
            alignment: 1,
            memory_type_bits: 0,
            prefers_dedicated: false,
            driver_managed: true,
        }
    }
}

/// Limits of a backend that the validation and transfer code depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Largest buffer that can be created, in bytes.
    pub max_buffer_size: u64,
    /// Largest constant buffer, in bytes.
    pub max_constant_buffer_size: u64,
    /// Largest width of 1D textures.
    pub max_texture_1d_size: u32,
    /// Largest width/height of 2D textures.
    pub max_texture_2d_size: u32,
    /// Largest width/height/depth of 3D textures.
    pub max_texture_3d_size: u32,
    /// Largest width/height of cube textures.
    pub max_texture_cube_size: u32,
    /// Largest number of array layers.
    pub max_texture_array_layers: u32,
    /// Required alignment of `bytes_per_row` in buffer/image copies.
    pub row_pitch_alignment: u32,
    /// Required alignment of offsets and sizes of buffer copies.
    pub buffer_copy_alignment: u64,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 256 * 1024 * 1024,
            max_constant_buffer_size: 64 * 1024,
            max_texture_1d_size: 16384,
            max_texture_2d_size: 16384,
            max_texture_3d_size: 2048,
            max_texture_cube_size: 16384,
            max_texture_array_layers: 2048,
            row_pitch_alignment: 1,
            buffer_copy_alignment: 1,
        }
    }
}

/// The layout of texel data inside a buffer taking part in a buffer/image copy.
///
/// Layers follow each other, each layer holds `depth` slices of
/// `rows_per_image` block rows of `bytes_per_row` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexelCopyLayout {
    /// Byte offset of the first texel inside the buffer.
    pub offset: u64,
    /// Bytes between the starts of two block rows.
    pub bytes_per_row: u64,
    /// Block rows per depth slice.
    pub rows_per_image: u32,
}

impl TexelCopyLayout {
    /// Computes the layout of `extent` in `format` with rows padded to
    /// `row_alignment` bytes.
    pub fn for_extent(format: Format, extent: Extent3D, row_alignment: u32) -> Self {
        let row_size = format.row_size(extent.width);
        let alignment = u64::from(row_alignment.max(1));
        Self {
            offset: 0,
            bytes_per_row: row_size.div_ceil(alignment) * alignment,
            rows_per_image: format.block_rows(extent.height),
        }
    }

    /// Bytes occupied by one array layer of `depth` slices.
    pub fn layer_stride(&self, depth: u32) -> u64 {
        self.bytes_per_row * self.rows_per_image as u64 * depth as u64
    }

    /// Total buffer bytes covered by `layers` layers of `depth` slices.
    pub fn required_size(&self, depth: u32, layers: u32) -> u64 {
        self.layer_stride(depth) * layers as u64
    }
}

/// Copies tightly packed texel rows into a padded copy layout.
///
/// `packed` holds `row_size`-byte rows, `padded` receives them at
/// `layout.bytes_per_row` intervals. Both describe the same number of rows.
pub fn pad_rows(packed: &[u8], row_size: usize, layout: &TexelCopyLayout, padded: &mut [u8]) {
    let pitch = layout.bytes_per_row as usize;
    if pitch == row_size {
        padded[..packed.len()].copy_from_slice(packed);
        return;
    }
    for (row, chunk) in packed.chunks_exact(row_size).enumerate() {
        padded[row * pitch..row * pitch + row_size].copy_from_slice(chunk);
    }
}

/// The inverse of [`pad_rows`].
pub fn unpad_rows(padded: &[u8], row_size: usize, layout: &TexelCopyLayout, packed: &mut [u8]) {
    let pitch = layout.bytes_per_row as usize;
    if pitch == row_size {
        packed.copy_from_slice(&padded[..packed.len()]);
        return;
    }
    for (row, chunk) in packed.chunks_exact_mut(row_size).enumerate() {
        chunk.copy_from_slice(&padded[row * pitch..row * pitch + row_size]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_pads_rows_to_alignment() {
        let layout = TexelCopyLayout::for_extent(Format::RGBA8UNorm, Extent3D::new(3, 2, 1), 256);
        assert_eq!(layout.bytes_per_row, 256);
        assert_eq!(layout.rows_per_image, 2);
        assert_eq!(layout.required_size(1, 2), 1024);
    }

    #[test]
    fn compressed_layout_counts_block_rows() {
        let layout = TexelCopyLayout::for_extent(Format::BC1UNorm, Extent3D::new(8, 8, 1), 1);
        assert_eq!(layout.bytes_per_row, 16);
        assert_eq!(layout.rows_per_image, 2);
    }

    #[test]
    fn pad_then_unpad_restores_rows() {
        let layout = TexelCopyLayout {
            offset: 0,
            bytes_per_row: 8,
            rows_per_image: 2,
        };
        let packed = [1u8, 2, 3, 4, 5, 6];
        let mut padded = [0u8; 16];
        pad_rows(&packed, 3, &layout, &mut padded);
        assert_eq!(&padded[..3], &[1, 2, 3]);
        assert_eq!(&padded[8..11], &[4, 5, 6]);

        let mut restored = [0u8; 6];
        unpad_rows(&padded, 3, &layout, &mut restored);
        assert_eq!(restored, packed);
    }
}
