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

//! Services owned by a render system for its whole lifetime.

use strata_core::renderer::RenderBackend;
use strata_lanes::{default_mip_generator, MipGenerator};

/// The services a [`RenderSystem`](crate::RenderSystem) is built with.
///
/// Services are dropped first at teardown, before any object registry, the
/// allocator, or the device.
#[derive(Debug)]
pub struct RenderServices<B: RenderBackend> {
    mip_generator: Box<dyn MipGenerator<B>>,
}

impl<B: RenderBackend> RenderServices<B> {
    /// Picks the default services for `device`: hardware blits for mip
    /// generation when the backend supports them, the CPU fallback otherwise.
    pub fn new(device: &B) -> Self {
        Self {
            mip_generator: default_mip_generator(device),
        }
    }

    /// Replaces the mip-chain generator.
    pub fn with_mip_generator(mut self, mip_generator: Box<dyn MipGenerator<B>>) -> Self {
        self.mip_generator = mip_generator;
        self
    }

    /// The mip-chain generator.
    pub fn mip_generator(&self) -> &dyn MipGenerator<B> {
        self.mip_generator.as_ref()
    }
}
