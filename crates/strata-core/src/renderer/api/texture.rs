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

//! Defines data structures related to textures, their subresources, and regions.

use super::flags::{BindFlags, CpuAccessFlags, MiscFlags};
use super::format::Format;
use crate::math::Extent3D;
use crate::strata_bitflags;
use std::borrow::Cow;
use std::ops::Range;

/// The dimensionality and arrangement of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// One-dimensional texture.
    Texture1D,
    /// Two-dimensional texture.
    Texture2D,
    /// Three-dimensional (volume) texture.
    Texture3D,
    /// Cube texture with six faces stored as layers.
    TextureCube,
    /// Array of one-dimensional textures.
    Texture1DArray,
    /// Array of two-dimensional textures.
    Texture2DArray,
    /// Array of cube textures, six layers per cube.
    TextureCubeArray,
    /// Two-dimensional multisample texture.
    Texture2DMS,
    /// Array of two-dimensional multisample textures.
    Texture2DMSArray,
}

impl TextureType {
    /// Returns `true` if the type addresses more than one layer by design.
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            TextureType::Texture1DArray
                | TextureType::Texture2DArray
                | TextureType::TextureCubeArray
                | TextureType::Texture2DMSArray
        )
    }

    /// Returns `true` for multisample types.
    pub const fn is_multisample(self) -> bool {
        matches!(self, TextureType::Texture2DMS | TextureType::Texture2DMSArray)
    }

    /// Returns `true` for cube and cube array types.
    pub const fn is_cube(self) -> bool {
        matches!(self, TextureType::TextureCube | TextureType::TextureCubeArray)
    }

    /// Returns `true` if layers are part of the texture, either as array
    /// elements or as cube faces.
    pub const fn has_layers(self) -> bool {
        self.is_array() || self.is_cube()
    }
}

/// Returns the number of levels of a full mip chain for `extent`.
pub fn full_mip_chain(texture_type: TextureType, extent: Extent3D) -> u32 {
    let max_size = match texture_type {
        TextureType::Texture1D | TextureType::Texture1DArray => extent.width,
        TextureType::Texture3D => extent.width.max(extent.height).max(extent.depth),
        TextureType::Texture2DMS | TextureType::Texture2DMSArray => return 1,
        _ => extent.width.max(extent.height),
    };
    // 1 + floor(log2(max_size))
    u32::BITS - max_size.max(1).leading_zeros()
}

/// Returns the extent of mip `level`. Dimensions never drop below 1.
pub fn mip_extent(texture_type: TextureType, extent: Extent3D, level: u32) -> Extent3D {
    let shrink = |size: u32| size.checked_shr(level).unwrap_or(0).max(1);
    match texture_type {
        TextureType::Texture1D | TextureType::Texture1DArray => {
            Extent3D::new(shrink(extent.width), 1, 1)
        }
        TextureType::Texture3D => Extent3D::new(
            shrink(extent.width),
            shrink(extent.height),
            shrink(extent.depth),
        ),
        TextureType::Texture2DMS | TextureType::Texture2DMSArray => {
            Extent3D::new(extent.width, extent.height, 1)
        }
        _ => Extent3D::new(shrink(extent.width), shrink(extent.height), 1),
    }
}

strata_bitflags! {
    /// Native usage of an image as seen by the backend.
    pub struct TextureUsage: u32 {
        /// The image can be the source of copies and blits.
        const TRANSFER_SRC = 1 << 0;
        /// The image can be the destination of copies and blits.
        const TRANSFER_DST = 1 << 1;
        /// The image can be sampled.
        const SAMPLED = 1 << 2;
        /// The image can be read and written in shaders.
        const STORAGE = 1 << 3;
        /// The image can be a color attachment.
        const COLOR_ATTACHMENT = 1 << 4;
        /// The image can be a depth-stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

impl TextureUsage {
    /// Maps bind flags to native image usage. Images are always transfer
    /// capable because uploads and read-backs go through staging buffers.
    pub fn from_bind_flags(flags: BindFlags) -> Self {
        let mut usage = TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST;
        if flags.contains(BindFlags::SAMPLED) {
            usage |= TextureUsage::SAMPLED;
        }
        if flags.contains(BindFlags::STORAGE) {
            usage |= TextureUsage::STORAGE;
        }
        if flags.contains(BindFlags::COLOR_ATTACHMENT) {
            usage |= TextureUsage::COLOR_ATTACHMENT;
        }
        if flags.contains(BindFlags::DEPTH_STENCIL_ATTACHMENT) {
            usage |= TextureUsage::DEPTH_STENCIL_ATTACHMENT;
        }
        usage
    }
}

/// Values a texture is filled with when created without image data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValue {
    /// Fill color of color textures.
    pub color: [f32; 4],
    /// Fill depth of depth textures.
    pub depth: f32,
    /// Fill stencil of stencil textures.
    pub stencil: u32,
}

impl Default for ClearValue {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 0.0],
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// A descriptor used to create a texture.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// Dimensionality of the texture.
    pub texture_type: TextureType,
    /// How the texture is bound to the pipeline.
    pub bind_flags: BindFlags,
    /// CPU access the texture must support.
    pub cpu_access_flags: CpuAccessFlags,
    /// Miscellaneous creation flags.
    pub misc_flags: MiscFlags,
    /// Hardware format of the texels.
    pub format: Format,
    /// Size of mip level 0. Unused dimensions must be 1.
    pub extent: Extent3D,
    /// Number of array layers (6 per cube for cube types).
    pub array_layers: u32,
    /// Number of mip levels, or 0 for the full chain.
    pub mip_levels: u32,
    /// Samples per texel of multisample textures.
    pub samples: u32,
    /// Fill values used when no image data is supplied.
    pub clear_value: ClearValue,
}

impl<'a> TextureDescriptor<'a> {
    /// Creates a sampled 2D texture descriptor with one mip level.
    pub fn new_2d(format: Format, width: u32, height: u32) -> Self {
        Self {
            format,
            extent: Extent3D::new(width, height, 1),
            ..Default::default()
        }
    }

    /// Returns the effective number of mip levels.
    pub fn num_mip_levels(&self) -> u32 {
        if self.texture_type.is_multisample() {
            1
        } else if self.mip_levels == 0 {
            full_mip_chain(self.texture_type, self.extent)
        } else {
            self.mip_levels
        }
    }

    /// Returns the subresource range covering the whole texture.
    pub fn full_subresource(&self) -> TextureSubresource {
        TextureSubresource::new(0, self.array_layers, 0, self.num_mip_levels())
    }
}

impl Default for TextureDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            texture_type: TextureType::Texture2D,
            bind_flags: BindFlags::SAMPLED,
            cpu_access_flags: CpuAccessFlags::EMPTY,
            misc_flags: MiscFlags::EMPTY,
            format: Format::RGBA8UNorm,
            extent: Extent3D::new(1, 1, 1),
            array_layers: 1,
            mip_levels: 1,
            samples: 1,
            clear_value: ClearValue::default(),
        }
    }
}

/// The backend-facing description of a native image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeImageDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Dimensionality.
    pub texture_type: TextureType,
    /// Hardware format.
    pub format: Format,
    /// Size of mip level 0.
    pub extent: Extent3D,
    /// Number of array layers.
    pub array_layers: u32,
    /// Effective number of mip levels.
    pub mip_levels: u32,
    /// Samples per texel.
    pub samples: u32,
    /// Native usage.
    pub usage: TextureUsage,
}

/// A range of mip levels and array layers of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSubresource {
    /// First array layer.
    pub base_array_layer: u32,
    /// Number of array layers.
    pub num_array_layers: u32,
    /// First mip level.
    pub base_mip_level: u32,
    /// Number of mip levels.
    pub num_mip_levels: u32,
}

impl TextureSubresource {
    /// Creates a subresource range.
    pub const fn new(
        base_array_layer: u32,
        num_array_layers: u32,
        base_mip_level: u32,
        num_mip_levels: u32,
    ) -> Self {
        Self {
            base_array_layer,
            num_array_layers,
            base_mip_level,
            num_mip_levels,
        }
    }

    /// A single mip level of a single layer.
    pub const fn single(array_layer: u32, mip_level: u32) -> Self {
        Self::new(array_layer, 1, mip_level, 1)
    }

    /// The addressed mip levels.
    pub fn mip_range(&self) -> Range<u32> {
        self.base_mip_level..self.base_mip_level + self.num_mip_levels
    }

    /// The addressed array layers.
    pub fn layer_range(&self) -> Range<u32> {
        self.base_array_layer..self.base_array_layer + self.num_array_layers
    }

    /// Returns `true` if no mip level or no layer is addressed.
    pub fn is_empty(&self) -> bool {
        self.num_mip_levels == 0 || self.num_array_layers == 0
    }
}

impl Default for TextureSubresource {
    fn default() -> Self {
        Self::new(0, 1, 0, 1)
    }
}

/// A box of texels inside one mip level of a range of layers.
///
/// Transfers address `subresource.base_mip_level` only, so
/// `subresource.num_mip_levels` must be 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureRegion {
    /// Addressed mip level and layers.
    pub subresource: TextureSubresource,
    /// Offset of the box inside the mip level.
    pub offset: crate::math::Origin3D,
    /// Size of the box.
    pub extent: Extent3D,
}

impl TextureRegion {
    /// The full extent of `mip_level` on every layer of a texture.
    pub fn whole_level(desc: &TextureDescriptor<'_>, mip_level: u32) -> Self {
        Self {
            subresource: TextureSubresource::new(0, desc.array_layers, mip_level, 1),
            offset: crate::math::Origin3D::ZERO,
            extent: mip_extent(desc.texture_type, desc.extent, mip_level),
        }
    }
}

/// An opaque handle to a texture owned by a render system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_chain_counts_halvings_of_largest_dimension() {
        assert_eq!(full_mip_chain(TextureType::Texture2D, Extent3D::new(256, 64, 1)), 9);
        assert_eq!(full_mip_chain(TextureType::Texture2D, Extent3D::new(5, 3, 1)), 3);
        assert_eq!(full_mip_chain(TextureType::Texture1DArray, Extent3D::new(8, 1, 1)), 4);
        assert_eq!(full_mip_chain(TextureType::Texture3D, Extent3D::new(2, 2, 16)), 5);
        assert_eq!(full_mip_chain(TextureType::Texture2DMS, Extent3D::new(512, 512, 1)), 1);
    }

    #[test]
    fn mip_extent_clamps_to_one() {
        let extent = Extent3D::new(8, 2, 1);
        assert_eq!(mip_extent(TextureType::Texture2D, extent, 1), Extent3D::new(4, 1, 1));
        assert_eq!(mip_extent(TextureType::Texture2D, extent, 3), Extent3D::new(1, 1, 1));
        assert_eq!(
            mip_extent(TextureType::Texture3D, Extent3D::new(4, 4, 4), 1),
            Extent3D::new(2, 2, 2)
        );
    }

    #[test]
    fn mip_extent_past_the_bit_width_stays_at_one() {
        let extent = Extent3D::new(1 << 20, 64, 1);
        assert_eq!(mip_extent(TextureType::Texture2D, extent, 32), Extent3D::new(1, 1, 1));
        assert_eq!(mip_extent(TextureType::Texture2D, extent, 40), Extent3D::new(1, 1, 1));
    }

    #[test]
    fn zero_mip_levels_means_full_chain() {
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 16, 16);
        desc.mip_levels = 0;
        assert_eq!(desc.num_mip_levels(), 5);
        assert_eq!(desc.full_subresource(), TextureSubresource::new(0, 1, 0, 5));
    }

    #[test]
    fn subresource_ranges() {
        let sub = TextureSubresource::new(2, 3, 1, 2);
        assert_eq!(sub.layer_range(), 2..5);
        assert_eq!(sub.mip_range(), 1..3);
        assert!(!sub.is_empty());
        assert!(TextureSubresource::new(0, 0, 0, 1).is_empty());
    }
}
