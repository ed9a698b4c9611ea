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

//! Render target descriptors.

use super::format::Format;
use super::render_pass::RenderPassId;
use super::texture::TextureId;
use crate::math::Extent2D;
use std::borrow::Cow;

/// The role of a render target attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentType {
    /// A color attachment.
    Color,
    /// A depth-only attachment.
    Depth,
    /// A combined depth-stencil attachment.
    DepthStencil,
    /// A stencil-only attachment.
    Stencil,
}

impl AttachmentType {
    /// Returns `true` for depth, depth-stencil and stencil attachments.
    pub fn is_depth_or_stencil(self) -> bool {
        !matches!(self, AttachmentType::Color)
    }
}

/// One attachment of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDescriptor {
    /// Role of the attachment.
    pub attachment_type: AttachmentType,
    /// Texture rendered into. Depth and stencil attachments may leave this
    /// empty, the render target then owns an internal depth-stencil texture.
    pub texture: Option<TextureId>,
    /// Mip level rendered into.
    pub mip_level: u32,
    /// Array layer rendered into.
    pub array_layer: u32,
    /// Format of the internal texture when `texture` is `None`.
    pub format: Option<Format>,
}

impl AttachmentDescriptor {
    /// A color attachment rendering into mip 0, layer 0 of `texture`.
    pub fn color(texture: TextureId) -> Self {
        Self {
            attachment_type: AttachmentType::Color,
            texture: Some(texture),
            mip_level: 0,
            array_layer: 0,
            format: None,
        }
    }

    /// A depth-stencil attachment backed by an internal texture.
    pub fn internal_depth_stencil() -> Self {
        Self {
            attachment_type: AttachmentType::DepthStencil,
            texture: None,
            mip_level: 0,
            array_layer: 0,
            format: None,
        }
    }
}

/// A descriptor used to create a render target.
#[derive(Debug, Clone, Default)]
pub struct RenderTargetDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Render pass the target is compatible with.
    pub render_pass: Option<RenderPassId>,
    /// Size of the rendered area.
    pub resolution: Extent2D,
    /// Samples per texel.
    pub samples: u32,
    /// Attachments in binding order.
    pub attachments: Vec<AttachmentDescriptor>,
}

/// An opaque handle to a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub usize);
