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

//! Hardware texture formats and their attributes.
//!
//! This is the format side of the conversion collaborator: byte sizes, block
//! dimensions, compression and depth/stencil flags, and the memory footprint
//! of an extent. Pixel conversion itself lives in [`super::image`].

use crate::math::Extent3D;
use crate::strata_bitflags;
use serde::{Deserialize, Serialize};

/// The component layout of CPU-side image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Single alpha component.
    Alpha,
    /// Single red component.
    R,
    /// Red and green components.
    RG,
    /// Red, green and blue components.
    RGB,
    /// Blue, green and red components.
    BGR,
    /// Red, green, blue and alpha components.
    RGBA,
    /// Blue, green, red and alpha components.
    BGRA,
    /// Alpha, red, green and blue components.
    ARGB,
    /// Alpha, blue, green and red components.
    ABGR,
    /// Single depth component.
    Depth,
    /// Depth and stencil components.
    DepthStencil,
    /// Single stencil component.
    Stencil,
    /// Block compressed data, opaque to conversion.
    Compressed,
}

impl ImageFormat {
    /// Returns the number of components, or 0 for compressed data.
    pub const fn components(self) -> u32 {
        match self {
            ImageFormat::Alpha | ImageFormat::R | ImageFormat::Depth | ImageFormat::Stencil => 1,
            ImageFormat::RG | ImageFormat::DepthStencil => 2,
            ImageFormat::RGB | ImageFormat::BGR => 3,
            ImageFormat::RGBA | ImageFormat::BGRA | ImageFormat::ARGB | ImageFormat::ABGR => 4,
            ImageFormat::Compressed => 0,
        }
    }

    /// Returns `true` for depth and/or stencil layouts.
    pub const fn is_depth_or_stencil(self) -> bool {
        matches!(
            self,
            ImageFormat::Depth | ImageFormat::DepthStencil | ImageFormat::Stencil
        )
    }
}

/// The scalar type of each component of CPU-side image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// IEEE 754 half precision float.
    Float16,
    /// IEEE 754 single precision float.
    Float32,
    /// IEEE 754 double precision float.
    Float64,
}

impl DataType {
    /// Returns the size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }
}

strata_bitflags! {
    /// Properties of a hardware [`Format`].
    pub struct FormatFlags: u32 {
        /// The format stores blocks of texels.
        const COMPRESSED = 1 << 0;
        /// The format has a depth component.
        const DEPTH = 1 << 1;
        /// The format has a stencil component.
        const STENCIL = 1 << 2;
        /// Integer components are normalized to [0, 1] or [-1, 1].
        const NORMALIZED = 1 << 3;
        /// Color components are stored in sRGB space.
        const SRGB = 1 << 4;
        /// Components are unnormalized integers.
        const INTEGER = 1 << 5;
        /// Components are floating point.
        const FLOAT = 1 << 6;
        /// The format stores color.
        const COLOR = 1 << 7;
    }
}

/// Static attributes of a hardware [`Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatAttributes {
    /// Bits per block (per texel for uncompressed formats).
    pub bit_size: u16,
    /// Block width in texels (1 for uncompressed formats).
    pub block_width: u8,
    /// Block height in texels (1 for uncompressed formats).
    pub block_height: u8,
    /// Component layout used when converting image data.
    pub image_format: ImageFormat,
    /// Component type used when converting image data.
    pub data_type: DataType,
    /// Format properties.
    pub flags: FormatFlags,
}

/// A hardware texture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// 8-bit normalized red.
    R8UNorm,
    /// 8-bit unsigned integer red.
    R8UInt,
    /// 8-bit normalized red and green.
    RG8UNorm,
    /// 8-bit normalized RGBA.
    RGBA8UNorm,
    /// 8-bit normalized RGBA in sRGB space.
    RGBA8UNormSrgb,
    /// 8-bit normalized BGRA.
    BGRA8UNorm,
    /// 8-bit normalized BGRA in sRGB space.
    BGRA8UNormSrgb,
    /// 16-bit normalized red.
    R16UNorm,
    /// 16-bit float red.
    R16Float,
    /// 16-bit float red and green.
    RG16Float,
    /// 16-bit float RGBA.
    RGBA16Float,
    /// 32-bit unsigned integer red.
    R32UInt,
    /// 32-bit float red.
    R32Float,
    /// 32-bit float red and green.
    RG32Float,
    /// 32-bit float RGB.
    RGB32Float,
    /// 32-bit float RGBA.
    RGBA32Float,
    /// 16-bit normalized depth.
    D16UNorm,
    /// 24-bit normalized depth with 8-bit stencil.
    D24UNormS8UInt,
    /// 32-bit float depth.
    D32Float,
    /// BC1 (DXT1) compressed RGBA, 64 bits per 4x4 block.
    BC1UNorm,
    /// BC2 (DXT3) compressed RGBA, 128 bits per 4x4 block.
    BC2UNorm,
    /// BC3 (DXT5) compressed RGBA, 128 bits per 4x4 block.
    BC3UNorm,
}

const fn attribs(
    bit_size: u16,
    block: u8,
    image_format: ImageFormat,
    data_type: DataType,
    flags: FormatFlags,
) -> FormatAttributes {
    FormatAttributes {
        bit_size,
        block_width: block,
        block_height: block,
        image_format,
        data_type,
        flags,
    }
}

const UNORM: FormatFlags =
    FormatFlags::from_bits_retain(FormatFlags::COLOR.bits() | FormatFlags::NORMALIZED.bits());
const UNORM_SRGB: FormatFlags =
    FormatFlags::from_bits_retain(UNORM.bits() | FormatFlags::SRGB.bits());
const UINT: FormatFlags =
    FormatFlags::from_bits_retain(FormatFlags::COLOR.bits() | FormatFlags::INTEGER.bits());
const FLOAT: FormatFlags =
    FormatFlags::from_bits_retain(FormatFlags::COLOR.bits() | FormatFlags::FLOAT.bits());
const BLOCK: FormatFlags = FormatFlags::from_bits_retain(
    FormatFlags::COLOR.bits() | FormatFlags::COMPRESSED.bits() | FormatFlags::NORMALIZED.bits(),
);

impl Format {
    /// Returns the static attributes of this format.
    pub const fn attributes(self) -> FormatAttributes {
        use DataType as T;
        use ImageFormat as I;
        match self {
            Format::R8UNorm => attribs(8, 1, I::R, T::UInt8, UNORM),
            Format::R8UInt => attribs(8, 1, I::R, T::UInt8, UINT),
            Format::RG8UNorm => attribs(16, 1, I::RG, T::UInt8, UNORM),
            Format::RGBA8UNorm => attribs(32, 1, I::RGBA, T::UInt8, UNORM),
            Format::RGBA8UNormSrgb => attribs(32, 1, I::RGBA, T::UInt8, UNORM_SRGB),
            Format::BGRA8UNorm => attribs(32, 1, I::BGRA, T::UInt8, UNORM),
            Format::BGRA8UNormSrgb => attribs(32, 1, I::BGRA, T::UInt8, UNORM_SRGB),
            Format::R16UNorm => attribs(16, 1, I::R, T::UInt16, UNORM),
            Format::R16Float => attribs(16, 1, I::R, T::Float16, FLOAT),
            Format::RG16Float => attribs(32, 1, I::RG, T::Float16, FLOAT),
            Format::RGBA16Float => attribs(64, 1, I::RGBA, T::Float16, FLOAT),
            Format::R32UInt => attribs(32, 1, I::R, T::UInt32, UINT),
            Format::R32Float => attribs(32, 1, I::R, T::Float32, FLOAT),
            Format::RG32Float => attribs(64, 1, I::RG, T::Float32, FLOAT),
            Format::RGB32Float => attribs(96, 1, I::RGB, T::Float32, FLOAT),
            Format::RGBA32Float => attribs(128, 1, I::RGBA, T::Float32, FLOAT),
            Format::D16UNorm => attribs(
                16,
                1,
                I::Depth,
                T::UInt16,
                FormatFlags::from_bits_retain(
                    FormatFlags::DEPTH.bits() | FormatFlags::NORMALIZED.bits(),
                ),
            ),
            Format::D24UNormS8UInt => attribs(
                32,
                1,
                I::DepthStencil,
                T::UInt32,
                FormatFlags::from_bits_retain(
                    FormatFlags::DEPTH.bits() | FormatFlags::STENCIL.bits(),
                ),
            ),
            Format::D32Float => attribs(
                32,
                1,
                I::Depth,
                T::Float32,
                FormatFlags::from_bits_retain(
                    FormatFlags::DEPTH.bits() | FormatFlags::FLOAT.bits(),
                ),
            ),
            Format::BC1UNorm => attribs(64, 4, I::Compressed, T::UInt8, BLOCK),
            Format::BC2UNorm => attribs(128, 4, I::Compressed, T::UInt8, BLOCK),
            Format::BC3UNorm => attribs(128, 4, I::Compressed, T::UInt8, BLOCK),
        }
    }

    /// Returns `true` for block compressed formats.
    pub const fn is_compressed(self) -> bool {
        self.attributes().flags.contains(FormatFlags::COMPRESSED)
    }

    /// Returns `true` if the format has a depth component.
    pub const fn is_depth(self) -> bool {
        self.attributes().flags.contains(FormatFlags::DEPTH)
    }

    /// Returns `true` if the format has a stencil component.
    pub const fn has_stencil(self) -> bool {
        self.attributes().flags.contains(FormatFlags::STENCIL)
    }

    /// Returns `true` for depth and/or stencil formats.
    pub const fn is_depth_or_stencil(self) -> bool {
        self.attributes()
            .flags
            .intersects(FormatFlags::from_bits_retain(
                FormatFlags::DEPTH.bits() | FormatFlags::STENCIL.bits(),
            ))
    }

    /// Returns `true` if image data can be converted to and from this format.
    ///
    /// Compressed and depth-stencil formats are copied verbatim.
    pub const fn is_convertible(self) -> bool {
        !self.is_compressed() && !matches!(self, Format::D24UNormS8UInt)
    }

    /// Returns the size in bytes of one block (one texel for uncompressed formats).
    pub const fn block_size(self) -> u32 {
        self.attributes().bit_size as u32 / 8
    }

    /// Returns the block dimensions in texels.
    pub const fn block_extent(self) -> (u32, u32) {
        let attribs = self.attributes();
        (attribs.block_width as u32, attribs.block_height as u32)
    }

    /// Returns the number of bytes of one tightly packed row of `width` texels.
    pub const fn row_size(self, width: u32) -> u64 {
        let (block_width, _) = self.block_extent();
        width.div_ceil(block_width) as u64 * self.block_size() as u64
    }

    /// Returns the number of block rows covering `height` texels.
    pub const fn block_rows(self, height: u32) -> u32 {
        let (_, block_height) = self.block_extent();
        height.div_ceil(block_height)
    }
}

/// Returns the number of bytes `layers` slices of `extent` occupy in `format`,
/// tightly packed.
///
/// Block compressed formats are counted in whole blocks, so a 2x2 BC1 region
/// still occupies one 8-byte block.
pub fn memory_footprint(format: Format, extent: Extent3D, layers: u32) -> u64 {
    format.row_size(extent.width)
        * format.block_rows(extent.height) as u64
        * extent.depth as u64
        * layers as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_footprint_is_texels_times_texel_size() {
        let extent = Extent3D::new(4, 4, 1);
        assert_eq!(memory_footprint(Format::RGBA8UNorm, extent, 1), 64);
        assert_eq!(memory_footprint(Format::RGBA32Float, extent, 6), 16 * 16 * 6);
        assert_eq!(memory_footprint(Format::RGB32Float, Extent3D::new(3, 1, 1), 1), 36);
    }

    #[test]
    fn compressed_footprint_rounds_up_to_blocks() {
        assert_eq!(memory_footprint(Format::BC1UNorm, Extent3D::new(4, 4, 1), 1), 8);
        assert_eq!(memory_footprint(Format::BC1UNorm, Extent3D::new(2, 2, 1), 1), 8);
        assert_eq!(memory_footprint(Format::BC3UNorm, Extent3D::new(8, 5, 1), 1), 2 * 2 * 16);
    }

    #[test]
    fn format_classification() {
        assert!(Format::BC2UNorm.is_compressed());
        assert!(!Format::BC2UNorm.is_convertible());
        assert!(Format::D24UNormS8UInt.is_depth_or_stencil());
        assert!(Format::D24UNormS8UInt.has_stencil());
        assert!(Format::D32Float.is_depth());
        assert!(!Format::BGRA8UNorm.is_depth_or_stencil());
        assert_eq!(Format::RGBA16Float.block_size(), 8);
    }
}
