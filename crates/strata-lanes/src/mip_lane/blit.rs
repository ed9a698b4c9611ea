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
use strata_core::renderer::api::{ResourceState, TextureSubresource};
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::TextureResource;

/// Generates mips with filtered device blits, one level at a time, in a
/// single submission.
///
/// Each source level moves to `TransferSrc` and each destination level to
/// `TransferDst` right before its blit.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlitMipGenerator;

impl<B: RenderBackend> MipGenerator<B> for BlitMipGenerator {
    fn strategy_name(&self) -> &'static str {
        "blit"
    }

    fn generate(
        &self,
        lane: &TransferLane<B>,
        texture: &mut TextureResource<B>,
        range: &TextureSubresource,
    ) -> Result<(), RenderError> {
        let steady = texture.info().steady_state();
        let (base_layer, layers) = (range.base_array_layer, range.num_array_layers);
        let last_level = range.base_mip_level + range.num_mip_levels - 1;

        lane.execute(texture, "mip blit", |commands, texture| {
            for level in range.base_mip_level..last_level {
                let src = TextureSubresource::new(base_layer, layers, level, 1);
                let dst = TextureSubresource::new(base_layer, layers, level + 1, 1);
                lane.record_transition(commands, texture, &src, ResourceState::TransferSrc)?;
                lane.record_transition(commands, texture, &dst, ResourceState::TransferDst)?;
                lane.device()
                    .blit_mip_level(commands, texture.image(), base_layer, layers, level)?;
            }
            lane.record_transition(commands, texture, range, steady)
        })
    }
}
