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

//! Mip-chain generation.
//!
//! A [`MipGenerator`] is an explicitly owned service: the render system
//! creates one at construction, hands it to the transfer lane whenever a
//! texture needs its mip chain, and drops it before the device.

mod blit;
mod cpu;

pub use self::blit::BlitMipGenerator;
pub use self::cpu::CpuMipGenerator;

use crate::transfer_lane::TransferLane;
use std::fmt::Debug;
use strata_core::renderer::api::TextureSubresource;
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::TextureResource;

/// A strategy filling mip levels from the level above them.
pub trait MipGenerator<B: RenderBackend>: Send + Sync + Debug {
    /// Returns a human-readable identifier for this strategy.
    fn strategy_name(&self) -> &'static str;

    /// Fills every level of `range` below `range.base_mip_level` from the
    /// level above it, for every layer of the range.
    ///
    /// `range` is valid for `texture`, has at least two levels, and its
    /// format is uncompressed and not depth-stencil. The range ends in the
    /// texture's steady state.
    fn generate(
        &self,
        lane: &TransferLane<B>,
        texture: &mut TextureResource<B>,
        range: &TextureSubresource,
    ) -> Result<(), RenderError>;
}

/// Picks the device blit path when the backend has one, the CPU path otherwise.
pub fn default_mip_generator<B: RenderBackend>(device: &B) -> Box<dyn MipGenerator<B>> {
    if device.supports_mip_blit() {
        Box::new(BlitMipGenerator)
    } else {
        Box::new(CpuMipGenerator)
    }
}
