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

//! Validation and preparation of the image data moving through texture
//! transfers. User data is always tightly packed; only staging memory
//! carries the row padding the backend asks for.

use std::borrow::Cow;
use strata_core::math::Extent3D;
use strata_core::renderer::api::image::{convert_image_buffer, generate_image_buffer, image_data_size};
use strata_core::renderer::api::{
    memory_footprint, pad_rows, unpad_rows, DstImageDescriptor, Format, SrcImageDescriptor,
    TexelCopyLayout, TextureRegion,
};
use strata_core::renderer::RenderError;
use strata_data::TextureInfo;

/// Checks that `region` addresses one existing mip level, existing layers,
/// and a block-aligned box inside the level.
pub(crate) fn check_region(info: &TextureInfo, region: &TextureRegion) -> Result<(), RenderError> {
    let sub = &region.subresource;
    if sub.num_mip_levels != 1 {
        return Err(RenderError::InvalidArgument(format!(
            "texture regions address exactly one mip level, got {}",
            sub.num_mip_levels
        )));
    }
    if sub.base_mip_level >= info.mip_levels {
        return Err(RenderError::InvalidArgument(format!(
            "mip level {} out of range for a texture with {} level(s)",
            sub.base_mip_level, info.mip_levels
        )));
    }
    if sub.num_array_layers == 0
        || sub
            .base_array_layer
            .checked_add(sub.num_array_layers)
            .map_or(true, |end| end > info.array_layers)
    {
        return Err(RenderError::InvalidArgument(format!(
            "array layers {:?} out of range for a texture with {} layer(s)",
            sub.layer_range(),
            info.array_layers
        )));
    }

    let level = info.mip_extent(sub.base_mip_level);
    let origin = region.offset;
    let extent = region.extent;
    let fits = |origin: u32, size: u32, limit: u32| origin.checked_add(size).is_some_and(|end| end <= limit);
    if extent.is_empty()
        || !fits(origin.x, extent.width, level.width)
        || !fits(origin.y, extent.height, level.height)
        || !fits(origin.z, extent.depth, level.depth)
    {
        return Err(RenderError::InvalidArgument(format!(
            "region at {origin:?} of {extent:?} exceeds mip level {} of {level:?}",
            sub.base_mip_level
        )));
    }

    let (block_width, block_height) = info.format.block_extent();
    let aligned = |origin: u32, size: u32, limit: u32, block: u32| {
        origin % block == 0 && (size % block == 0 || origin + size == limit)
    };
    if !aligned(origin.x, extent.width, level.width, block_width)
        || !aligned(origin.y, extent.height, level.height, block_height)
    {
        return Err(RenderError::InvalidArgument(format!(
            "region at {origin:?} of {extent:?} is not aligned to {block_width}x{block_height} blocks of {:?}",
            info.format
        )));
    }
    Ok(())
}

/// Converts caller data for `layers` slices of `extent` into the native
/// layout of `format`.
///
/// Compressed and depth-stencil formats are taken verbatim and must match
/// the footprint exactly.
/// ## Errors
/// * `RenderError::ImageDataSizeMismatch` - If the data does not cover the region exactly.
pub(crate) fn prepare_upload<'a>(
    format: Format,
    extent: Extent3D,
    layers: u32,
    src: &SrcImageDescriptor<'a>,
) -> Result<Cow<'a, [u8]>, RenderError> {
    let footprint = memory_footprint(format, extent, layers);
    let attribs = format.attributes();
    let native = src.format == attribs.image_format && src.data_type == attribs.data_type;
    if native || !format.is_convertible() {
        if src.data.len() as u64 != footprint {
            return Err(RenderError::ImageDataSizeMismatch {
                expected: footprint,
                actual: src.data.len() as u64,
            });
        }
        return Ok(Cow::Borrowed(src.data));
    }

    let num_texels = extent.volume() * u64::from(layers);
    let expected = image_data_size(src.format, src.data_type, num_texels);
    if src.data.len() as u64 != expected {
        return Err(RenderError::ImageDataSizeMismatch {
            expected,
            actual: src.data.len() as u64,
        });
    }
    log::debug!(
        "Converting {num_texels} texel(s) from {:?}/{:?} to {format:?}",
        src.format,
        src.data_type
    );
    match convert_image_buffer(src, attribs.image_format, attribs.data_type, num_texels)? {
        Some(converted) => Ok(Cow::Owned(converted)),
        None => Ok(Cow::Borrowed(src.data)),
    }
}

/// Generates the clear fill of `layers` slices of `extent`.
///
/// Color formats repeat the clear color, depth formats the clear depth.
/// Formats without a conversion path are zero-filled.
pub(crate) fn clear_fill(info: &TextureInfo, extent: Extent3D, layers: u32) -> Vec<u8> {
    let format = info.format;
    if !format.is_convertible() {
        return vec![0u8; memory_footprint(format, extent, layers) as usize];
    }
    let clear = &info.clear_value;
    let color = if format.is_depth() {
        [f64::from(clear.depth), 0.0, 0.0, 1.0]
    } else {
        clear.color.map(f64::from)
    };
    let attribs = format.attributes();
    generate_image_buffer(
        attribs.image_format,
        attribs.data_type,
        extent.volume() * u64::from(layers),
        color,
    )
}

/// Bytes `dst` must hold to receive `layers` slices of `extent`.
pub(crate) fn readback_size(format: Format, extent: Extent3D, layers: u32, dst: &DstImageDescriptor<'_>) -> u64 {
    let attribs = format.attributes();
    let native = dst.format == attribs.image_format && dst.data_type == attribs.data_type;
    if native || !format.is_convertible() {
        memory_footprint(format, extent, layers)
    } else {
        image_data_size(dst.format, dst.data_type, extent.volume() * u64::from(layers))
    }
}

/// Writes native `packed` data into `dst`, converting when `dst` asks for
/// another layout.
pub(crate) fn finish_readback(
    format: Format,
    packed: &[u8],
    num_texels: u64,
    dst: &mut DstImageDescriptor<'_>,
) -> Result<(), RenderError> {
    let converted = if format.is_convertible() {
        let src = SrcImageDescriptor::native(format, packed);
        convert_image_buffer(&src, dst.format, dst.data_type, num_texels)?
    } else {
        None
    };
    let bytes = converted.as_deref().unwrap_or(packed);
    match dst.data.get_mut(..bytes.len()) {
        Some(out) => {
            out.copy_from_slice(bytes);
            Ok(())
        }
        None => Err(RenderError::ImageDataSizeMismatch {
            expected: bytes.len() as u64,
            actual: dst.data.len() as u64,
        }),
    }
}

/// Lays `packed` rows out the way `layout` describes them in staging memory.
pub(crate) fn pad_for_staging<'a>(
    format: Format,
    extent: Extent3D,
    layers: u32,
    layout: &TexelCopyLayout,
    packed: Cow<'a, [u8]>,
) -> Cow<'a, [u8]> {
    let row_size = format.row_size(extent.width);
    if layout.bytes_per_row == row_size {
        return packed;
    }
    let mut padded = vec![0u8; layout.required_size(extent.depth, layers) as usize];
    pad_rows(&packed, row_size as usize, layout, &mut padded);
    Cow::Owned(padded)
}

/// The inverse of [`pad_for_staging`].
pub(crate) fn unpad_from_staging(
    format: Format,
    extent: Extent3D,
    layers: u32,
    layout: &TexelCopyLayout,
    padded: Vec<u8>,
) -> Vec<u8> {
    let row_size = format.row_size(extent.width);
    if layout.bytes_per_row == row_size {
        return padded;
    }
    let mut packed = vec![0u8; memory_footprint(format, extent, layers) as usize];
    unpad_rows(&padded, row_size as usize, layout, &mut packed);
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::Origin3D;
    use strata_core::renderer::api::{DataType, ImageFormat, TextureDescriptor, TextureSubresource};
    use strata_core::renderer::ErrorKind;

    fn info(format: Format, width: u32, height: u32, mips: u32) -> TextureInfo {
        TextureInfo::from(&TextureDescriptor {
            mip_levels: mips,
            ..TextureDescriptor::new_2d(format, width, height)
        })
    }

    fn region(mip: u32, x: u32, y: u32, width: u32, height: u32) -> TextureRegion {
        TextureRegion {
            subresource: TextureSubresource::single(0, mip),
            offset: Origin3D::new(x, y, 0),
            extent: Extent3D::new(width, height, 1),
        }
    }

    #[test]
    fn regions_must_fit_their_mip_level() {
        let info = info(Format::RGBA8UNorm, 8, 8, 2);
        assert!(check_region(&info, &region(1, 0, 0, 4, 4)).is_ok());
        assert!(check_region(&info, &region(1, 2, 0, 4, 4)).is_err());
        assert!(check_region(&info, &region(2, 0, 0, 1, 1)).is_err());
        assert!(check_region(&info, &region(0, 0, 0, 0, 1)).is_err());
    }

    #[test]
    fn compressed_regions_must_be_block_aligned_except_at_the_edge() {
        let info = info(Format::BC1UNorm, 6, 6, 1);
        assert!(check_region(&info, &region(0, 4, 4, 2, 2)).is_ok());
        assert!(check_region(&info, &region(0, 2, 0, 4, 4)).is_err());
        assert!(check_region(&info, &region(0, 0, 0, 3, 4)).is_err());
    }

    #[test]
    fn mismatched_sizes_report_the_expected_footprint() {
        let data = [0u8; 12];
        let src = SrcImageDescriptor::native(Format::RGBA8UNorm, &data);
        let err = prepare_upload(Format::RGBA8UNorm, Extent3D::new(2, 2, 1), 1, &src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImageDataSizeMismatch);
        assert!(matches!(err, RenderError::ImageDataSizeMismatch { expected: 16, actual: 12 }));
    }

    #[test]
    fn rgb_data_is_expanded_to_rgba() {
        let data = [255u8, 0, 0, 0, 255, 0];
        let src = SrcImageDescriptor::new(ImageFormat::RGB, DataType::UInt8, &data);
        let prepared = prepare_upload(Format::RGBA8UNorm, Extent3D::new(2, 1, 1), 1, &src).unwrap();
        assert_eq!(&prepared[..], &[255, 0, 0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn depth_textures_are_cleared_with_the_clear_depth() {
        let info = info(Format::D32Float, 2, 1, 1);
        let fill = clear_fill(&info, Extent3D::new(2, 1, 1), 1);
        let depths: Vec<f32> = fill.chunks_exact(4).map(bytemuck::pod_read_unaligned).collect();
        assert_eq!(depths, [1.0, 1.0]);
    }

    #[test]
    fn padding_round_trips() {
        let extent = Extent3D::new(3, 2, 1);
        let layout = TexelCopyLayout::for_extent(Format::RGBA8UNorm, extent, 256);
        let packed: Vec<u8> = (0..24).collect();

        let padded = pad_for_staging(Format::RGBA8UNorm, extent, 1, &layout, Cow::Borrowed(&packed[..]));
        assert_eq!(padded.len(), 512);
        let unpadded = unpad_from_staging(Format::RGBA8UNorm, extent, 1, &layout, padded.into_owned());
        assert_eq!(unpadded, packed);
    }
}
