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

use super::image_data::{
    check_region, clear_fill, finish_readback, pad_for_staging, prepare_upload, readback_size,
    unpad_from_staging,
};
use super::TransferLane;
use crate::mip_lane::MipGenerator;
use std::borrow::Cow;
use strata_core::math::{Extent3D, Origin3D};
use strata_core::renderer::api::{
    full_mip_chain, BufferUsage, DstImageDescriptor, Format, MemoryPropertyFlags, MiscFlags, NativeImageDescriptor,
    ResourceState, SrcImageDescriptor, TexelCopyLayout, TextureDescriptor, TextureRegion,
    TextureSubresource, TextureUsage,
};
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::{ScopedStaging, TextureInfo, TextureResource};

impl<B: RenderBackend> TransferLane<B> {
    /// Records commands against `texture` and submits them.
    ///
    /// The texture's state tracker is restored when recording or submission
    /// fails, so it never describes transitions the device did not execute.
    pub fn execute(
        &self,
        texture: &mut TextureResource<B>,
        label: &str,
        record: impl FnOnce(&mut B::CommandList, &mut TextureResource<B>) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        let saved = texture.tracker().clone();
        let result = self.begin(label).and_then(|mut commands| {
            record(&mut commands, texture)?;
            self.submit(commands)
        });
        if result.is_err() {
            *texture.image_and_tracker().1 = saved;
        }
        result
    }

    /// Copies packed texel data into a staging buffer laid out for a copy
    /// of `layers` slices of `extent`.
    fn stage_texels(
        &self,
        format: Format,
        extent: Extent3D,
        layers: u32,
        packed: Cow<'_, [u8]>,
    ) -> Result<(ScopedStaging<'_, B>, TexelCopyLayout), RenderError> {
        let layout = TexelCopyLayout::for_extent(format, extent, self.device().limits().row_pitch_alignment);
        let staged = pad_for_staging(format, extent, layers, &layout, packed);
        let staging = self
            .staging
            .create_scoped(staged.len() as u64, BufferUsage::TRANSFER_SRC, Some(&staged[..]))?;
        Ok((staging, layout))
    }

    /// Creates a device-local texture and fills it.
    ///
    /// `image` covers mip level 0 of every array layer, tightly packed.
    /// Without it, every mip level is filled with the descriptor's clear
    /// value unless `MiscFlags::NO_INITIAL_DATA` is set. Mip levels are
    /// generated by `mips` when image data is given and the descriptor has
    /// `MiscFlags::GENERATE_MIPS`. The whole texture ends in its steady state.
    /// ## Errors
    /// * `RenderError::ImageDataSizeMismatch` - If `image` does not cover level 0 exactly. No device work is done.
    /// * `RenderError::Unsupported` - If the backend cannot create images of the format.
    /// * `RenderError::OutOfMemory` - If no device-local or staging memory is left.
    pub fn create_texture(
        &self,
        desc: &TextureDescriptor<'_>,
        image: Option<&SrcImageDescriptor<'_>>,
        mips: &dyn MipGenerator<B>,
    ) -> Result<TextureResource<B>, RenderError> {
        let info = TextureInfo::from(desc);
        if !self.device().is_format_supported(info.format) {
            return Err(RenderError::Unsupported(format!(
                "backend cannot create textures of {:?}",
                info.format
            )));
        }
        let max_levels = full_mip_chain(info.texture_type, info.extent);
        if info.mip_levels > max_levels {
            return Err(RenderError::InvalidArgument(format!(
                "{} mip levels requested, a {}x{}x{} texture has at most {}",
                info.mip_levels, info.extent.width, info.extent.height, info.extent.depth, max_levels
            )));
        }
        let upload = image
            .map(|src| prepare_upload(info.format, info.extent, info.array_layers, src))
            .transpose()?;

        let mut texture = self.create_native_texture(desc.label.as_deref(), info)?;
        if let Err(err) = self.initialize_texture(&mut texture, upload, mips) {
            self.release_texture(texture);
            return Err(err);
        }

        let info = texture.info();
        log::info!(
            "Created texture '{}' {:?} {}x{}x{} ({} layer(s), {} mip(s))",
            info.label.as_deref().unwrap_or("unnamed"),
            info.format,
            info.extent.width,
            info.extent.height,
            info.extent.depth,
            info.array_layers,
            info.mip_levels
        );
        Ok(texture)
    }

    fn create_native_texture(&self, label: Option<&str>, info: TextureInfo) -> Result<TextureResource<B>, RenderError> {
        let device = self.device();
        let allocator = self.allocator();
        let mut image = device.create_image(&NativeImageDescriptor {
            label,
            texture_type: info.texture_type,
            format: info.format,
            extent: info.extent,
            array_layers: info.array_layers,
            mip_levels: info.mip_levels,
            samples: info.samples,
            usage: TextureUsage::from_bind_flags(info.bind_flags),
        })?;

        let requirements = device.image_memory_requirements(&image);
        let region = if requirements.driver_managed {
            None
        } else {
            let region = match allocator.allocate(&requirements, MemoryPropertyFlags::DEVICE_LOCAL) {
                Ok(region) => region,
                Err(err) => {
                    device.destroy_image(image);
                    return Err(err);
                }
            };
            if let Err(err) = device.bind_image_memory(&mut image, region.memory(), region.offset()) {
                allocator.release(region);
                device.destroy_image(image);
                return Err(err.into());
            }
            Some(region)
        };
        Ok(TextureResource::new(info, image, region))
    }

    fn initialize_texture(
        &self,
        texture: &mut TextureResource<B>,
        upload: Option<Cow<'_, [u8]>>,
        mips: &dyn MipGenerator<B>,
    ) -> Result<(), RenderError> {
        let info = texture.info().clone();
        let full = info.full_range();
        let steady = info.steady_state();

        let has_image = upload.is_some();
        let mut uploads = Vec::new();
        match upload {
            Some(packed) => {
                let (staging, layout) = self.stage_texels(info.format, info.extent, info.array_layers, packed)?;
                uploads.push((staging, layout, whole_level(&info, 0)));
            }
            None if info.misc_flags.contains(MiscFlags::NO_INITIAL_DATA) || info.texture_type.is_multisample() => {}
            None => {
                log::debug!("Filling {} mip level(s) with the clear value", info.mip_levels);
                for level in 0..info.mip_levels {
                    let extent = info.mip_extent(level);
                    let fill = clear_fill(&info, extent, info.array_layers);
                    let (staging, layout) =
                        self.stage_texels(info.format, extent, info.array_layers, Cow::Owned(fill))?;
                    uploads.push((staging, layout, whole_level(&info, level)));
                }
            }
        }

        self.execute(texture, "texture initialization", |commands, texture| {
            if !uploads.is_empty() {
                self.record_transition(commands, texture, &full, ResourceState::TransferDst)?;
                for (staging, layout, region) in &uploads {
                    self.device()
                        .copy_buffer_to_image(commands, staging.buffer(), layout, texture.image(), region)?;
                }
            }
            self.record_transition(commands, texture, &full, steady)
        })?;
        drop(uploads);

        if has_image && info.misc_flags.contains(MiscFlags::GENERATE_MIPS) && info.mip_levels > 1 {
            if info.format.is_compressed() || info.format.is_depth_or_stencil() {
                log::warn!("Skipping mip generation for {:?} textures", info.format);
            } else {
                self.generate_mips(texture, &full, mips)?;
            }
        }
        Ok(())
    }

    /// Uploads `src` into `region` of `texture`.
    ///
    /// The addressed subresources move to `TransferDst` for the copy and
    /// back to the texture's steady state afterwards.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the region is out of range or misaligned.
    /// * `RenderError::ImageDataSizeMismatch` - If `src` does not cover the region exactly.
    pub fn write_texture(
        &self,
        texture: &mut TextureResource<B>,
        region: &TextureRegion,
        src: &SrcImageDescriptor<'_>,
    ) -> Result<(), RenderError> {
        check_region(texture.info(), region)?;
        let format = texture.info().format;
        let layers = region.subresource.num_array_layers;
        let packed = prepare_upload(format, region.extent, layers, src)?;
        let (staging, layout) = self.stage_texels(format, region.extent, layers, packed)?;
        let steady = texture.info().steady_state();

        log::debug!(
            "Writing {:?} at {:?} of mip {} layers {:?}",
            region.extent,
            region.offset,
            region.subresource.base_mip_level,
            region.subresource.layer_range()
        );
        self.execute(texture, "texture upload", |commands, texture| {
            self.record_transition(commands, texture, &region.subresource, ResourceState::TransferDst)?;
            self.device()
                .copy_buffer_to_image(commands, staging.buffer(), &layout, texture.image(), region)?;
            self.record_transition(commands, texture, &region.subresource, steady)
        })
    }

    /// Reads `region` of `texture` into `dst`, converted to the layout `dst` asks for.
    ///
    /// The bytes are read by mapping the staging buffer's memory chunk
    /// directly through the allocator, not through the staging buffer.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the region is out of range or misaligned.
    /// * `RenderError::ImageDataSizeMismatch` - If `dst` is too small. No device work is done.
    pub fn read_texture(
        &self,
        texture: &mut TextureResource<B>,
        region: &TextureRegion,
        dst: &mut DstImageDescriptor<'_>,
    ) -> Result<(), RenderError> {
        check_region(texture.info(), region)?;
        let format = texture.info().format;
        let layers = region.subresource.num_array_layers;
        let required = readback_size(format, region.extent, layers, dst);
        if (dst.data.len() as u64) < required {
            return Err(RenderError::ImageDataSizeMismatch {
                expected: required,
                actual: dst.data.len() as u64,
            });
        }

        let layout = TexelCopyLayout::for_extent(format, region.extent, self.device().limits().row_pitch_alignment);
        let size = layout.required_size(region.extent.depth, layers);
        let staging = self.staging.create_scoped(size, BufferUsage::TRANSFER_DST, None)?;
        let steady = texture.info().steady_state();

        log::debug!(
            "Reading {:?} at {:?} of mip {} layers {:?}",
            region.extent,
            region.offset,
            region.subresource.base_mip_level,
            region.subresource.layer_range()
        );
        self.execute(texture, "texture read-back", |commands, texture| {
            self.record_transition(commands, texture, &region.subresource, ResourceState::TransferSrc)?;
            self.device()
                .copy_image_to_buffer(commands, texture.image(), region, staging.buffer(), &layout)?;
            self.record_transition(commands, texture, &region.subresource, steady)
        })?;

        let mut padded = vec![0u8; size as usize];
        let memory = staging.region();
        self.allocator()
            .map_chunk(memory.chunk(), memory.offset(), size)?
            .read(0, &mut padded)?;
        drop(staging);

        let packed = unpad_from_staging(format, region.extent, layers, &layout, padded);
        finish_readback(format, &packed, region.extent.volume() * u64::from(layers), dst)
    }

    /// Regenerates the mip levels of `range` below its first level.
    ///
    /// The range ends in the texture's steady state.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the range exceeds the texture.
    /// * `RenderError::Unsupported` - For compressed and depth-stencil formats.
    pub fn generate_mips(
        &self,
        texture: &mut TextureResource<B>,
        range: &TextureSubresource,
        mips: &dyn MipGenerator<B>,
    ) -> Result<(), RenderError> {
        check_range(texture.info(), range)?;
        let format = texture.info().format;
        if format.is_compressed() || format.is_depth_or_stencil() {
            return Err(RenderError::Unsupported(format!(
                "mip generation for {format:?} textures"
            )));
        }
        if range.num_mip_levels < 2 {
            return Ok(());
        }
        log::debug!(
            "Generating mips {:?} of layers {:?} with the {} strategy",
            range.mip_range(),
            range.layer_range(),
            mips.strategy_name()
        );
        mips.generate(self, texture, range)
    }
}

fn whole_level(info: &TextureInfo, level: u32) -> TextureRegion {
    TextureRegion {
        subresource: TextureSubresource::new(0, info.array_layers, level, 1),
        offset: Origin3D::ZERO,
        extent: info.mip_extent(level),
    }
}

fn check_range(info: &TextureInfo, range: &TextureSubresource) -> Result<(), RenderError> {
    let within = |base: u32, count: u32, limit: u32| base.checked_add(count).is_some_and(|end| end <= limit);
    if range.is_empty()
        || !within(range.base_mip_level, range.num_mip_levels, info.mip_levels)
        || !within(range.base_array_layer, range.num_array_layers, info.array_layers)
    {
        return Err(RenderError::InvalidArgument(format!(
            "subresource range {range:?} exceeds a texture with {} mip(s) and {} layer(s)",
            info.mip_levels, info.array_layers
        )));
    }
    Ok(())
}
