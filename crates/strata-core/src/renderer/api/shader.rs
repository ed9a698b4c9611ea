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

//! Shader descriptors. Compilation and reflection are done by the backend.

use crate::strata_bitflags;
use std::borrow::Cow;

/// The programmable stage a shader is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// Vertex stage.
    Vertex,
    /// Tessellation control (hull) stage.
    TessControl,
    /// Tessellation evaluation (domain) stage.
    TessEvaluation,
    /// Geometry stage.
    Geometry,
    /// Fragment (pixel) stage.
    Fragment,
    /// Compute stage.
    Compute,
}

impl ShaderType {
    /// The stage flag matching this shader type.
    pub fn stage_flags(self) -> ShaderStageFlags {
        match self {
            ShaderType::Vertex => ShaderStageFlags::VERTEX,
            ShaderType::TessControl => ShaderStageFlags::TESS_CONTROL,
            ShaderType::TessEvaluation => ShaderStageFlags::TESS_EVALUATION,
            ShaderType::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderType::Fragment => ShaderStageFlags::FRAGMENT,
            ShaderType::Compute => ShaderStageFlags::COMPUTE,
        }
    }
}

strata_bitflags! {
    /// Shader stages that can access a binding.
    pub struct ShaderStageFlags: u32 {
        /// Vertex stage.
        const VERTEX = 1 << 0;
        /// Tessellation control stage.
        const TESS_CONTROL = 1 << 1;
        /// Tessellation evaluation stage.
        const TESS_EVALUATION = 1 << 2;
        /// Geometry stage.
        const GEOMETRY = 1 << 3;
        /// Fragment stage.
        const FRAGMENT = 1 << 4;
        /// Compute stage.
        const COMPUTE = 1 << 5;
    }
}

/// Source data for a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource<'a> {
    /// High-level source code, e.g. WGSL.
    Code(Cow<'a, str>),
    /// Pre-compiled byte code.
    Binary(Cow<'a, [u8]>),
}

impl ShaderSource<'_> {
    /// Returns `true` if the source holds no code.
    pub fn is_empty(&self) -> bool {
        match self {
            ShaderSource::Code(code) => code.trim().is_empty(),
            ShaderSource::Binary(bytes) => bytes.is_empty(),
        }
    }
}

/// A descriptor used to create a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Stage of the shader.
    pub shader_type: ShaderType,
    /// The shader code.
    pub source: ShaderSource<'a>,
    /// Name of the entry point function.
    pub entry_point: Cow<'a, str>,
}

/// An opaque handle to a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub usize);
