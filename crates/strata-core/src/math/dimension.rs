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

//! Provides structs for representing extents (sizes) and origins (offsets).
//!
//! These types describe texture dimensions and the regions inside them. They use
//! integer (`u32`) components because they address texels, never sub-texel positions.

use serde::{Deserialize, Serialize};

/// A two-dimensional extent, typically the resolution of a render target or swap-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new two-dimensional extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A three-dimensional extent, representing width, height, and depth.
///
/// Array layers are never folded into `depth`; they are addressed separately
/// through a texture subresource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth component of the extent (1 for anything but volume textures).
    pub depth: u32,
}

impl Extent3D {
    /// Creates a new three-dimensional extent.
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Returns the number of texels covered by this extent.
    pub const fn volume(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Returns `true` if any component is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }
}

/// A three-dimensional origin, representing an (x, y, z) offset into a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Origin3D {
    /// The x-coordinate of the origin.
    pub x: u32,
    /// The y-coordinate of the origin.
    pub y: u32,
    /// The z-coordinate of the origin.
    pub z: u32,
}

impl Origin3D {
    /// The origin at (0, 0, 0).
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    /// Creates a new three-dimensional origin.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_volume_multiplies_components() {
        assert_eq!(Extent3D::new(4, 4, 1).volume(), 16);
        assert_eq!(Extent3D::new(65536, 65536, 2).volume(), 8_589_934_592);
    }

    #[test]
    fn extent_with_zero_component_is_empty() {
        assert!(Extent3D::new(0, 4, 1).is_empty());
        assert!(!Extent3D::new(1, 1, 1).is_empty());
    }
}
