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

//! Usage flags shared by buffer and texture descriptors.

use crate::strata_bitflags;

strata_bitflags! {
    /// Describes how a resource is bound to the pipeline.
    pub struct BindFlags: u32 {
        /// The buffer can be bound as a vertex buffer.
        const VERTEX_BUFFER = 1 << 0;
        /// The buffer can be bound as an index buffer.
        const INDEX_BUFFER = 1 << 1;
        /// The buffer can be bound as a constant (uniform) buffer.
        const CONSTANT_BUFFER = 1 << 2;
        /// The buffer can be used as a stream-output target.
        const STREAM_OUTPUT_BUFFER = 1 << 3;
        /// The buffer can hold indirect draw or dispatch arguments.
        const INDIRECT_BUFFER = 1 << 4;
        /// The resource can be sampled or read in shaders.
        const SAMPLED = 1 << 5;
        /// The resource can be read and written in shaders.
        const STORAGE = 1 << 6;
        /// The texture can be a color attachment of a render target.
        const COLOR_ATTACHMENT = 1 << 7;
        /// The texture can be the depth-stencil attachment of a render target.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 8;
        /// The resource can be the source of a copy command.
        const COPY_SRC = 1 << 9;
        /// The resource can be the destination of a copy command.
        const COPY_DST = 1 << 10;
    }
}

impl BindFlags {
    /// Flags that only apply to buffers.
    pub const BUFFER_ONLY: Self = Self::from_bits_retain(
        Self::VERTEX_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::CONSTANT_BUFFER.bits()
            | Self::STREAM_OUTPUT_BUFFER.bits()
            | Self::INDIRECT_BUFFER.bits(),
    );

    /// Flags that only apply to textures.
    pub const TEXTURE_ONLY: Self = Self::from_bits_retain(
        Self::COLOR_ATTACHMENT.bits() | Self::DEPTH_STENCIL_ATTACHMENT.bits(),
    );
}

strata_bitflags! {
    /// CPU access requested for a resource.
    pub struct CpuAccessFlags: u32 {
        /// The CPU reads the resource back.
        const READ = 1 << 0;
        /// The CPU writes the resource.
        const WRITE = 1 << 1;
    }
}

strata_bitflags! {
    /// Miscellaneous resource creation flags.
    pub struct MiscFlags: u32 {
        /// The resource is updated frequently from the CPU.
        const DYNAMIC_USAGE = 1 << 0;
        /// Multisample textures use fixed sample locations.
        const FIXED_SAMPLES = 1 << 1;
        /// The mip chain is generated after the initial upload.
        const GENERATE_MIPS = 1 << 2;
        /// Creation skips the default initialization of the resource.
        const NO_INITIAL_DATA = 1 << 3;
    }
}
