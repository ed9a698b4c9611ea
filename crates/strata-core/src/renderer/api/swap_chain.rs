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

//! Swap chain descriptors. Surface creation and presentation are external.

use crate::math::Extent2D;
use std::borrow::Cow;

/// A descriptor used to create a swap chain.
#[derive(Debug, Clone)]
pub struct SwapChainDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size of the back buffers.
    pub resolution: Extent2D,
    /// Bits per color texel.
    pub color_bits: u32,
    /// Bits of the depth buffer, 0 for none.
    pub depth_bits: u32,
    /// Bits of the stencil buffer, 0 for none.
    pub stencil_bits: u32,
    /// Samples per texel.
    pub samples: u32,
    /// Number of back buffers, between 1 and 3.
    pub swap_buffers: u32,
}

impl Default for SwapChainDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            resolution: Extent2D::new(800, 600),
            color_bits: 32,
            depth_bits: 24,
            stencil_bits: 8,
            samples: 1,
            swap_buffers: 2,
        }
    }
}

/// An opaque handle to a swap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapChainId(pub usize);
