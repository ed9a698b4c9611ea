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

//! CPU-side image data and pixel conversion.
//!
//! Texels are decoded to normalized `f64` RGBA, then encoded to the target
//! layout. Integer types are treated as normalized values, floats are copied
//! as-is. Missing color channels decode to 0 and missing alpha to 1.

use super::format::{memory_footprint, DataType, Format, ImageFormat};
use crate::math::Extent3D;
use crate::renderer::error::RenderError;
use half::f16;

/// A normalized RGBA color used for conversion and default fills.
pub type ColorRGBA = [f64; 4];

/// Read-only image data supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct SrcImageDescriptor<'a> {
    /// Component layout of `data`.
    pub format: ImageFormat,
    /// Component type of `data`.
    pub data_type: DataType,
    /// Tightly packed texel data.
    pub data: &'a [u8],
}

impl<'a> SrcImageDescriptor<'a> {
    /// Creates a descriptor over `data`.
    pub fn new(format: ImageFormat, data_type: DataType, data: &'a [u8]) -> Self {
        Self {
            format,
            data_type,
            data,
        }
    }

    /// Describes `data` as already being in the native layout of `format`.
    pub fn native(format: Format, data: &'a [u8]) -> Self {
        let attribs = format.attributes();
        Self::new(attribs.image_format, attribs.data_type, data)
    }
}

/// Writable destination for read-back image data.
#[derive(Debug)]
pub struct DstImageDescriptor<'a> {
    /// Requested component layout.
    pub format: ImageFormat,
    /// Requested component type.
    pub data_type: DataType,
    /// Destination bytes, tightly packed.
    pub data: &'a mut [u8],
}

impl<'a> DstImageDescriptor<'a> {
    /// Creates a descriptor over `data`.
    pub fn new(format: ImageFormat, data_type: DataType, data: &'a mut [u8]) -> Self {
        Self {
            format,
            data_type,
            data,
        }
    }

    /// Requests the data in the native layout of `format`.
    pub fn native(format: Format, data: &'a mut [u8]) -> Self {
        let attribs = format.attributes();
        Self::new(attribs.image_format, attribs.data_type, data)
    }
}

/// Returns the size in bytes of one texel with the given layout.
pub fn texel_size(format: ImageFormat, data_type: DataType) -> u64 {
    format.components() as u64 * data_type.size() as u64
}

/// Returns the size in bytes of `num_texels` texels with the given layout,
/// or 0 for compressed data.
pub fn image_data_size(format: ImageFormat, data_type: DataType, num_texels: u64) -> u64 {
    texel_size(format, data_type) * num_texels
}

fn channel_indices(format: ImageFormat) -> &'static [usize] {
    match format {
        ImageFormat::Alpha => &[3],
        ImageFormat::R | ImageFormat::Depth | ImageFormat::Stencil => &[0],
        ImageFormat::RG | ImageFormat::DepthStencil => &[0, 1],
        ImageFormat::RGB => &[0, 1, 2],
        ImageFormat::BGR => &[2, 1, 0],
        ImageFormat::RGBA => &[0, 1, 2, 3],
        ImageFormat::BGRA => &[2, 1, 0, 3],
        ImageFormat::ARGB => &[3, 0, 1, 2],
        ImageFormat::ABGR => &[3, 2, 1, 0],
        ImageFormat::Compressed => &[],
    }
}

fn read_component(data_type: DataType, bytes: &[u8]) -> f64 {
    match data_type {
        DataType::Int8 => (bytes[0] as i8) as f64 / i8::MAX as f64,
        DataType::UInt8 => bytes[0] as f64 / u8::MAX as f64,
        DataType::Int16 => bytemuck::pod_read_unaligned::<i16>(&bytes[..2]) as f64 / i16::MAX as f64,
        DataType::UInt16 => bytemuck::pod_read_unaligned::<u16>(&bytes[..2]) as f64 / u16::MAX as f64,
        DataType::Int32 => bytemuck::pod_read_unaligned::<i32>(&bytes[..4]) as f64 / i32::MAX as f64,
        DataType::UInt32 => bytemuck::pod_read_unaligned::<u32>(&bytes[..4]) as f64 / u32::MAX as f64,
        DataType::Float16 => bytemuck::pod_read_unaligned::<f16>(&bytes[..2]).to_f64(),
        DataType::Float32 => bytemuck::pod_read_unaligned::<f32>(&bytes[..4]) as f64,
        DataType::Float64 => bytemuck::pod_read_unaligned::<f64>(&bytes[..8]),
    }
}

fn write_component(data_type: DataType, value: f64, out: &mut [u8]) {
    let unorm = value.clamp(0.0, 1.0);
    let snorm = value.clamp(-1.0, 1.0);
    match data_type {
        DataType::Int8 => out[0] = ((snorm * i8::MAX as f64).round() as i8) as u8,
        DataType::UInt8 => out[0] = (unorm * u8::MAX as f64).round() as u8,
        DataType::Int16 => out[..2]
            .copy_from_slice(bytemuck::bytes_of(&((snorm * i16::MAX as f64).round() as i16))),
        DataType::UInt16 => out[..2]
            .copy_from_slice(bytemuck::bytes_of(&((unorm * u16::MAX as f64).round() as u16))),
        DataType::Int32 => out[..4]
            .copy_from_slice(bytemuck::bytes_of(&((snorm * i32::MAX as f64).round() as i32))),
        DataType::UInt32 => out[..4]
            .copy_from_slice(bytemuck::bytes_of(&((unorm * u32::MAX as f64).round() as u32))),
        DataType::Float16 => out[..2].copy_from_slice(bytemuck::bytes_of(&f16::from_f64(value))),
        DataType::Float32 => out[..4].copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        DataType::Float64 => out[..8].copy_from_slice(bytemuck::bytes_of(&value)),
    }
}

/// Decodes one texel into normalized RGBA.
pub fn decode_texel(format: ImageFormat, data_type: DataType, texel: &[u8]) -> ColorRGBA {
    let mut color = [0.0, 0.0, 0.0, 1.0];
    let component_size = data_type.size() as usize;
    for (i, &channel) in channel_indices(format).iter().enumerate() {
        color[channel] = read_component(data_type, &texel[i * component_size..]);
    }
    color
}

/// Encodes normalized RGBA into one texel.
pub fn encode_texel(format: ImageFormat, data_type: DataType, color: ColorRGBA, texel: &mut [u8]) {
    let component_size = data_type.size() as usize;
    for (i, &channel) in channel_indices(format).iter().enumerate() {
        write_component(data_type, color[channel], &mut texel[i * component_size..]);
    }
}

/// Converts `num_texels` texels of `src` into `dst_format`/`dst_type`.
///
/// Returns `Ok(None)` when the layouts already match and no conversion is needed.
///
/// # Errors
///
/// - [`RenderError::ImageDataSizeMismatch`] if `src.data` does not hold exactly
///   `num_texels` texels.
/// - [`RenderError::Unsupported`] if either side is compressed.
pub fn convert_image_buffer(
    src: &SrcImageDescriptor<'_>,
    dst_format: ImageFormat,
    dst_type: DataType,
    num_texels: u64,
) -> Result<Option<Vec<u8>>, RenderError> {
    if src.format == dst_format && src.data_type == dst_type {
        return Ok(None);
    }
    if src.format == ImageFormat::Compressed || dst_format == ImageFormat::Compressed {
        return Err(RenderError::Unsupported(
            "conversion of compressed image data".to_string(),
        ));
    }

    let expected = image_data_size(src.format, src.data_type, num_texels);
    if src.data.len() as u64 != expected {
        return Err(RenderError::ImageDataSizeMismatch {
            expected,
            actual: src.data.len() as u64,
        });
    }

    let src_stride = texel_size(src.format, src.data_type) as usize;
    let dst_stride = texel_size(dst_format, dst_type) as usize;
    let mut converted = vec![0u8; dst_stride * num_texels as usize];
    for (src_texel, dst_texel) in src
        .data
        .chunks_exact(src_stride)
        .zip(converted.chunks_exact_mut(dst_stride))
    {
        let color = decode_texel(src.format, src.data_type, src_texel);
        encode_texel(dst_format, dst_type, color, dst_texel);
    }
    Ok(Some(converted))
}

/// Generates `num_texels` texels of `color` in the given layout.
pub fn generate_image_buffer(
    format: ImageFormat,
    data_type: DataType,
    num_texels: u64,
    color: ColorRGBA,
) -> Vec<u8> {
    let stride = texel_size(format, data_type) as usize;
    let mut texel = vec![0u8; stride];
    encode_texel(format, data_type, color, &mut texel);
    texel.repeat(num_texels as usize)
}

/// Box-filters `layers` slices of `format` texels from `src` down to `dst`,
/// averaging up to 2x2x2 source texels per destination texel.
///
/// Dimensions that do not shrink sample their single texel twice. `data`
/// holds the slices back to back; the result has the same layout.
pub fn downsample_box(format: Format, src: Extent3D, dst: Extent3D, layers: u32, data: &[u8]) -> Vec<u8> {
    let attribs = format.attributes();
    let texel = format.block_size() as usize;
    let mut out = vec![0u8; memory_footprint(format, dst, layers) as usize];
    let src_layer = src.volume() as usize * texel;
    let dst_layer = dst.volume() as usize * texel;
    let src_index = |x: u32, y: u32, z: u32| ((z * src.height + y) * src.width + x) as usize * texel;
    let pair = |i: u32, limit: u32| [(2 * i).min(limit - 1), (2 * i + 1).min(limit - 1)];

    for layer in 0..layers as usize {
        let src_data = &data[layer * src_layer..(layer + 1) * src_layer];
        let dst_data = &mut out[layer * dst_layer..(layer + 1) * dst_layer];
        for z in 0..dst.depth {
            for y in 0..dst.height {
                for x in 0..dst.width {
                    let mut sum = [0.0f64; 4];
                    let mut count = 0.0;
                    for sz in pair(z, src.depth) {
                        for sy in pair(y, src.height) {
                            for sx in pair(x, src.width) {
                                let offset = src_index(sx, sy, sz);
                                let color = decode_texel(
                                    attribs.image_format,
                                    attribs.data_type,
                                    &src_data[offset..offset + texel],
                                );
                                for (acc, c) in sum.iter_mut().zip(color) {
                                    *acc += c;
                                }
                                count += 1.0;
                            }
                        }
                    }
                    let offset = ((z * dst.height + y) * dst.width + x) as usize * texel;
                    encode_texel(
                        attribs.image_format,
                        attribs.data_type,
                        sum.map(|c| c / count),
                        &mut dst_data[offset..offset + texel],
                    );
                }
            }
        }
    }
    out
}
