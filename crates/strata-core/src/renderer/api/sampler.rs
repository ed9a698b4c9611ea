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

//! Sampler descriptors.

use std::borrow::Cow;

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range are given the border color.
    ClampToBorder,
}

/// Filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling.
    Nearest,
    /// Linear interpolation.
    Linear,
}

/// Comparison used by depth comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the reference.
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less than or equal to the reference.
    LessEqual,
    /// Passes if the new value is greater than the reference.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the new value is greater than or equal to the reference.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// A descriptor used to create a sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Address mode of the U coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode of the V coordinate.
    pub address_mode_v: AddressMode,
    /// Address mode of the W coordinate.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels, or `None` to sample level 0 only.
    pub mipmap_filter: Option<FilterMode>,
    /// Minimum level of detail.
    pub lod_min_clamp: f32,
    /// Maximum level of detail.
    pub lod_max_clamp: f32,
    /// Makes this a comparison sampler.
    pub compare: Option<CompareFunction>,
    /// Maximum anisotropy, 1 disables it.
    pub max_anisotropy: u16,
    /// Border color used with [`AddressMode::ClampToBorder`].
    pub border_color: [f32; 4],
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: Some(FilterMode::Linear),
            lod_min_clamp: 0.0,
            lod_max_clamp: 1000.0,
            compare: None,
            max_anisotropy: 1,
            border_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// An opaque handle to a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);
