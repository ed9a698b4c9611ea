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

//! Render pass descriptors.

use super::format::Format;
use std::borrow::Cow;

/// What happens to an attachment at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentLoadOp {
    /// Previous contents are irrelevant.
    #[default]
    Undefined,
    /// Previous contents are loaded.
    Load,
    /// The attachment is cleared.
    Clear,
}

/// What happens to an attachment at the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachmentStoreOp {
    /// Results may be discarded.
    #[default]
    Undefined,
    /// Results are stored.
    Store,
}

/// Format and load/store behavior of one attachment of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentFormatDescriptor {
    /// Format of the attachment.
    pub format: Format,
    /// Load operation.
    pub load_op: AttachmentLoadOp,
    /// Store operation.
    pub store_op: AttachmentStoreOp,
}

/// A descriptor used to create a render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Color attachments in binding order.
    pub color_attachments: Vec<AttachmentFormatDescriptor>,
    /// Depth (or depth-stencil) attachment.
    pub depth_attachment: Option<AttachmentFormatDescriptor>,
    /// Stencil attachment, must share the depth format if both are set.
    pub stencil_attachment: Option<AttachmentFormatDescriptor>,
    /// Samples per texel of every attachment.
    pub samples: u32,
}

/// An opaque handle to a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPassId(pub usize);
