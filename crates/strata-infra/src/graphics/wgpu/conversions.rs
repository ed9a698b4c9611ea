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

use strata_core::math::{Extent3D, Origin3D};
use strata_core::renderer::api::{
    AddressMode, BufferUsage, CompareFunction, FilterMode, Format, TextureType, TextureUsage,
};

/// A local extension trait to convert our types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

// --- Dimensions and Origins ---

impl IntoWgpu<wgpu::Extent3d> for Extent3D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.depth,
        }
    }
}

impl IntoWgpu<wgpu::Origin3d> for Origin3D {
    fn into_wgpu(self) -> wgpu::Origin3d {
        wgpu::Origin3d {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

// --- Texture related Enums ---

impl IntoWgpu<wgpu::TextureDimension> for TextureType {
    fn into_wgpu(self) -> wgpu::TextureDimension {
        match self {
            TextureType::Texture1D | TextureType::Texture1DArray => wgpu::TextureDimension::D1,
            TextureType::Texture3D => wgpu::TextureDimension::D3,
            _ => wgpu::TextureDimension::D2,
        }
    }
}

impl IntoWgpu<wgpu::AddressMode> for AddressMode {
    fn into_wgpu(self) -> wgpu::AddressMode {
        match self {
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
            AddressMode::ClampToBorder => wgpu::AddressMode::ClampToBorder,
        }
    }
}

impl IntoWgpu<wgpu::FilterMode> for FilterMode {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl IntoWgpu<wgpu::MipmapFilterMode> for Option<FilterMode> {
    fn into_wgpu(self) -> wgpu::MipmapFilterMode {
        match self {
            Some(FilterMode::Linear) => wgpu::MipmapFilterMode::Linear,
            Some(FilterMode::Nearest) | None => wgpu::MipmapFilterMode::Nearest,
        }
    }
}

impl IntoWgpu<wgpu::CompareFunction> for CompareFunction {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunction::Never => wgpu::CompareFunction::Never,
            CompareFunction::Less => wgpu::CompareFunction::Less,
            CompareFunction::Equal => wgpu::CompareFunction::Equal,
            CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunction::Greater => wgpu::CompareFunction::Greater,
            CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
            CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            CompareFunction::Always => wgpu::CompareFunction::Always,
        }
    }
}

/// Returns the WGPU format of `format`, or `None` if WGPU has no equivalent.
pub fn wgpu_format(format: Format) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as W;
    Some(match format {
        Format::R8UNorm => W::R8Unorm,
        Format::R8UInt => W::R8Uint,
        Format::RG8UNorm => W::Rg8Unorm,
        Format::RGBA8UNorm => W::Rgba8Unorm,
        Format::RGBA8UNormSrgb => W::Rgba8UnormSrgb,
        Format::BGRA8UNorm => W::Bgra8Unorm,
        Format::BGRA8UNormSrgb => W::Bgra8UnormSrgb,
        Format::R16UNorm => W::R16Unorm,
        Format::R16Float => W::R16Float,
        Format::RG16Float => W::Rg16Float,
        Format::RGBA16Float => W::Rgba16Float,
        Format::R32UInt => W::R32Uint,
        Format::R32Float => W::R32Float,
        Format::RG32Float => W::Rg32Float,
        Format::RGBA32Float => W::Rgba32Float,
        Format::D16UNorm => W::Depth16Unorm,
        Format::D24UNormS8UInt => W::Depth24PlusStencil8,
        Format::D32Float => W::Depth32Float,
        Format::BC1UNorm => W::Bc1RgbaUnorm,
        Format::BC2UNorm => W::Bc2RgbaUnorm,
        Format::BC3UNorm => W::Bc3RgbaUnorm,
        Format::RGB32Float => return None,
    })
}

// --- Flags ---

impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::empty();
        let table = [
            (BufferUsage::TRANSFER_SRC, wgpu::BufferUsages::COPY_SRC),
            (BufferUsage::TRANSFER_DST, wgpu::BufferUsages::COPY_DST),
            (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
            (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
            (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
            (BufferUsage::STORAGE, wgpu::BufferUsages::STORAGE),
            (BufferUsage::INDIRECT, wgpu::BufferUsages::INDIRECT),
        ];
        for (ours, theirs) in table {
            if self.contains(ours) {
                usages |= theirs;
            }
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        let table = [
            (TextureUsage::TRANSFER_SRC, wgpu::TextureUsages::COPY_SRC),
            (TextureUsage::TRANSFER_DST, wgpu::TextureUsages::COPY_DST),
            (TextureUsage::SAMPLED, wgpu::TextureUsages::TEXTURE_BINDING),
            (TextureUsage::STORAGE, wgpu::TextureUsages::STORAGE_BINDING),
            (TextureUsage::COLOR_ATTACHMENT, wgpu::TextureUsages::RENDER_ATTACHMENT),
            (TextureUsage::DEPTH_STENCIL_ATTACHMENT, wgpu::TextureUsages::RENDER_ATTACHMENT),
        ];
        for (ours, theirs) in table {
            if self.contains(ours) {
                usages |= theirs;
            }
        }
        usages
    }
}
