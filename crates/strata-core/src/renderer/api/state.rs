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

//! Resource states of texture subresources and the transitions between them.

use super::texture::TextureSubresource;
use std::fmt;

/// How a texture subresource may currently be accessed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// Contents are undefined. Every subresource starts here.
    #[default]
    Undefined,
    /// Source of a copy or blit.
    TransferSrc,
    /// Destination of a copy or blit.
    TransferDst,
    /// Read by shaders.
    ShaderReadOnly,
    /// Bound as depth-stencil attachment.
    DepthStencilAttachment,
    /// Bound as color attachment.
    ColorAttachment,
    /// Handed to the presentation engine.
    Present,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceState::Undefined => "undefined",
            ResourceState::TransferSrc => "transfer-src",
            ResourceState::TransferDst => "transfer-dst",
            ResourceState::ShaderReadOnly => "shader-read-only",
            ResourceState::DepthStencilAttachment => "depth-stencil-attachment",
            ResourceState::ColorAttachment => "color-attachment",
            ResourceState::Present => "present",
        };
        f.write_str(name)
    }
}

/// One state change of a contiguous subresource range, recorded into a
/// command list as a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateTransition {
    /// The affected mip levels and layers.
    pub subresource: TextureSubresource,
    /// State the range is in before the barrier.
    pub old_state: ResourceState,
    /// State the range is in after the barrier.
    pub new_state: ResourceState,
}
