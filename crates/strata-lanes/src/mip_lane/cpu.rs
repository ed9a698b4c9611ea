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

use super::MipGenerator;
use crate::transfer_lane::TransferLane;
use strata_core::math::{Extent3D, Origin3D};
use strata_core::renderer::api::image::downsample_box;
use strata_core::renderer::api::{
    memory_footprint, DstImageDescriptor, SrcImageDescriptor, TextureRegion, TextureSubresource,
};
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::TextureResource;

/// Generates mips on the host: each level is read back, box-filtered and
/// uploaded as the next level.
///
/// Slower than [`BlitMipGenerator`](super::BlitMipGenerator), but works on
/// backends without device blits.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuMipGenerator;

impl<B: RenderBackend> MipGenerator<B> for CpuMipGenerator {
    fn strategy_name(&self) -> &'static str {
        "cpu"
    }

    fn generate(
        &self,
        lane: &TransferLane<B>,
        texture: &mut TextureResource<B>,
        range: &TextureSubresource,
    ) -> Result<(), RenderError> {
        let format = texture.info().format;
        let (base_layer, layers) = (range.base_array_layer, range.num_array_layers);
        let last_level = range.base_mip_level + range.num_mip_levels - 1;

        for level in range.base_mip_level..last_level {
            let src_extent = texture.info().mip_extent(level);
            let dst_extent = texture.info().mip_extent(level + 1);

            let mut texels = vec![0u8; memory_footprint(format, src_extent, layers) as usize];
            lane.read_texture(
                texture,
                &level_region(base_layer, layers, level, src_extent),
                &mut DstImageDescriptor::native(format, &mut texels),
            )?;
            let reduced = downsample_box(format, src_extent, dst_extent, layers, &texels);
            lane.write_texture(
                texture,
                &level_region(base_layer, layers, level + 1, dst_extent),
                &SrcImageDescriptor::native(format, &reduced),
            )?;
        }
        Ok(())
    }
}

fn level_region(base_layer: u32, layers: u32, level: u32, extent: Extent3D) -> TextureRegion {
    TextureRegion {
        subresource: TextureSubresource::new(base_layer, layers, level, 1),
        offset: Origin3D::ZERO,
        extent,
    }
}
