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

//! Descriptor validation, run before any device call.
//!
//! Violations reject the call with [`RenderError::InvalidArgument`] (or
//! [`RenderError::UnsupportedSize`] for byte limits). Legal but suspicious
//! usage is only logged, and only when the debug layer is enabled.

use std::collections::HashSet;
use std::fmt;
use strata_core::renderer::api::*;
use strata_core::renderer::RenderError;

fn invalid(message: impl Into<String>) -> RenderError {
    RenderError::InvalidArgument(message.into())
}

/// Creation parameters of a resource referenced by a heap view.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ViewedResource {
    Buffer { bind_flags: BindFlags },
    Texture { bind_flags: BindFlags, full_range: TextureSubresource },
    Sampler,
}

/// Checks descriptors against the limits of one device.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Validator {
    limits: DeviceLimits,
    debug_layer: bool,
}

impl Validator {
    pub(crate) fn new(limits: DeviceLimits, debug_layer: bool) -> Self {
        Self { limits, debug_layer }
    }

    /// Logs a debug-layer finding.
    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        if self.debug_layer {
            log::warn!("Debug layer: {args}");
        }
    }

    pub(crate) fn bind_flags(&self, flags: BindFlags) -> Result<(), RenderError> {
        if flags.unknown_bits() != 0 {
            self.warn(format_args!("unknown bind flags specified: {:#x}", flags.unknown_bits()));
        }
        if flags.intersects(BindFlags::BUFFER_ONLY) && flags.intersects(BindFlags::TEXTURE_ONLY) {
            return Err(invalid(
                "cannot combine binding flags that are exclusive for buffers and textures",
            ));
        }
        if flags.contains(BindFlags::COLOR_ATTACHMENT | BindFlags::DEPTH_STENCIL_ATTACHMENT) {
            return Err(invalid(
                "resources cannot have color attachment and depth-stencil attachment binding flags at the same time",
            ));
        }
        Ok(())
    }

    pub(crate) fn buffer_desc(&self, desc: &BufferDescriptor<'_>) -> Result<(), RenderError> {
        self.bind_flags(desc.bind_flags)?;
        if desc.size == 0 {
            return Err(invalid("buffer size must not be 0"));
        }
        if desc.bind_flags.contains(BindFlags::CONSTANT_BUFFER) {
            if desc.size > self.limits.max_constant_buffer_size {
                return Err(RenderError::UnsupportedSize {
                    requested: desc.size,
                    limit: self.limits.max_constant_buffer_size,
                });
            }
            if desc.size % 16 != 0 {
                self.warn(format_args!(
                    "constant buffer size {} is out of pack alignment (alignment is 16 bytes)",
                    desc.size
                ));
            }
        }
        if desc.stride > 0 && desc.size % u64::from(desc.stride) != 0 {
            return Err(invalid(format!(
                "buffer size {} is not a multiple of its stride {}",
                desc.size, desc.stride
            )));
        }
        if desc.bind_flags.intersects(BindFlags::TEXTURE_ONLY) {
            self.warn(format_args!("attachment binding flags specified for a buffer"));
        }
        if desc.cpu_access_flags.unknown_bits() != 0 {
            self.warn(format_args!("unknown CPU access flags specified for buffer"));
        }
        if desc
            .misc_flags
            .intersects(MiscFlags::FIXED_SAMPLES | MiscFlags::GENERATE_MIPS)
        {
            self.warn(format_args!("texture-only miscellaneous flags specified for buffer"));
        }
        Ok(())
    }

    fn texture_size(&self, size: u32, limit: u32, type_name: &str) -> Result<(), RenderError> {
        if size == 0 {
            return Err(invalid("texture size must not be 0"));
        }
        if size > limit {
            return Err(invalid(format!(
                "{type_name} texture size exceeded limit ({size} specified but limit is {limit})"
            )));
        }
        Ok(())
    }

    fn unused_dimension(&self, size: u32) -> Result<(), RenderError> {
        match size {
            0 => Err(invalid("texture size must not be 0")),
            1 => Ok(()),
            _ => Err(invalid(format!(
                "unused texture dimension must be one (but {size} was specified)"
            ))),
        }
    }

    fn cube_size(&self, width: u32, height: u32) -> Result<(), RenderError> {
        self.texture_size(width, self.limits.max_texture_cube_size, "cube")?;
        self.texture_size(height, self.limits.max_texture_cube_size, "cube")?;
        if width != height {
            return Err(invalid("width and height of cube textures must be equal"));
        }
        Ok(())
    }

    fn array_layers(&self, texture_type: TextureType, layers: u32) -> Result<(), RenderError> {
        if layers == 0 {
            return Err(invalid("number of texture array layers must not be 0"));
        }
        let limit = self.limits.max_texture_array_layers;
        match texture_type {
            TextureType::TextureCube if layers != 6 => Err(invalid(format!(
                "number of texture layers must be 6 for cube textures (but {layers} was specified)"
            ))),
            TextureType::TextureCubeArray if layers % 6 != 0 => Err(invalid(format!(
                "number of texture layers must be a multiple of 6 for cube array textures (but {layers} was specified)"
            ))),
            ty if ty.has_layers() && layers > limit => Err(invalid(format!(
                "number of texture layers exceeded limit ({layers} specified but limit is {limit})"
            ))),
            ty if !ty.has_layers() && layers != 1 => Err(invalid(format!(
                "number of texture array layers must be 1 for non-array textures (but {layers} was specified)"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn texture_desc(
        &self,
        desc: &TextureDescriptor<'_>,
        has_image: bool,
    ) -> Result<(), RenderError> {
        let limits = &self.limits;
        let extent = desc.extent;
        match desc.texture_type {
            TextureType::Texture1D | TextureType::Texture1DArray => {
                self.texture_size(extent.width, limits.max_texture_1d_size, "1D")?;
                self.unused_dimension(extent.height)?;
                self.unused_dimension(extent.depth)?;
            }
            TextureType::Texture2D
            | TextureType::Texture2DArray
            | TextureType::Texture2DMS
            | TextureType::Texture2DMSArray => {
                self.texture_size(extent.width, limits.max_texture_2d_size, "2D")?;
                self.texture_size(extent.height, limits.max_texture_2d_size, "2D")?;
                self.unused_dimension(extent.depth)?;
            }
            TextureType::TextureCube | TextureType::TextureCubeArray => {
                self.cube_size(extent.width, extent.height)?;
                self.unused_dimension(extent.depth)?;
            }
            TextureType::Texture3D => {
                self.texture_size(extent.width, limits.max_texture_3d_size, "3D")?;
                self.texture_size(extent.height, limits.max_texture_3d_size, "3D")?;
                self.texture_size(extent.depth, limits.max_texture_3d_size, "3D")?;
            }
        }

        self.array_layers(desc.texture_type, desc.array_layers)?;

        if desc.texture_type.is_multisample() {
            if desc.mip_levels > 1 {
                return Err(invalid(format!(
                    "multisample textures must have one MIP-map level (but {} was specified)",
                    desc.mip_levels
                )));
            }
        } else if desc.mip_levels > 1 {
            let max_levels = full_mip_chain(desc.texture_type, extent);
            if desc.mip_levels > max_levels {
                return Err(invalid(format!(
                    "number of MIP-map levels exceeded limit ({} specified but limit is {max_levels})",
                    desc.mip_levels
                )));
            }
        }
        if desc.samples == 0 {
            return Err(invalid("number of samples must not be 0"));
        }

        self.bind_flags(desc.bind_flags)?;
        if desc.bind_flags.intersects(BindFlags::BUFFER_ONLY) {
            self.warn(format_args!("buffer binding flags specified for a texture"));
        }
        if desc.misc_flags.contains(MiscFlags::GENERATE_MIPS)
            && desc.misc_flags.contains(MiscFlags::NO_INITIAL_DATA)
            && has_image
        {
            self.warn(format_args!(
                "cannot generate MIP-maps with initial image data discarded: GENERATE_MIPS specified but also NO_INITIAL_DATA"
            ));
        }
        Ok(())
    }

    pub(crate) fn sampler_desc(&self, desc: &SamplerDescriptor<'_>) -> Result<(), RenderError> {
        if desc.lod_min_clamp.is_nan() || desc.lod_max_clamp.is_nan() {
            return Err(invalid("sampler LOD clamps must not be NaN"));
        }
        if desc.lod_min_clamp > desc.lod_max_clamp {
            return Err(invalid(format!(
                "sampler LOD range is inverted ({} > {})",
                desc.lod_min_clamp, desc.lod_max_clamp
            )));
        }
        if !(1..=16).contains(&desc.max_anisotropy) {
            return Err(invalid(format!(
                "sampler anisotropy must be in range [1, 16] (but {} was specified)",
                desc.max_anisotropy
            )));
        }
        Ok(())
    }

    pub(crate) fn shader_desc(&self, desc: &ShaderDescriptor<'_>) -> Result<(), RenderError> {
        if desc.source.is_empty() {
            return Err(invalid("cannot create shader from empty source"));
        }
        if matches!(desc.source, ShaderSource::Code(_)) && desc.entry_point.trim().is_empty() {
            return Err(invalid("shader entry point must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn render_pass_desc(&self, desc: &RenderPassDescriptor<'_>) -> Result<(), RenderError> {
        for (index, attachment) in desc.color_attachments.iter().enumerate() {
            if attachment.format.is_depth_or_stencil() {
                return Err(invalid(format!(
                    "color attachment {index} of render pass has depth-stencil format {:?}",
                    attachment.format
                )));
            }
        }
        if let Some(depth) = &desc.depth_attachment {
            if !depth.format.is_depth() {
                return Err(invalid(format!(
                    "depth attachment of render pass has non-depth format {:?}",
                    depth.format
                )));
            }
        }
        if let Some(stencil) = &desc.stencil_attachment {
            if !stencil.format.has_stencil() {
                return Err(invalid(format!(
                    "stencil attachment of render pass has format {:?} without stencil",
                    stencil.format
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn pipeline_layout_desc(
        &self,
        desc: &PipelineLayoutDescriptor<'_>,
    ) -> Result<(), RenderError> {
        let mut slots = HashSet::new();
        for binding in &desc.bindings {
            if !slots.insert(binding.slot) {
                return Err(invalid(format!(
                    "pipeline layout binds slot {} more than once",
                    binding.slot
                )));
            }
            if binding.array_size == 0 {
                return Err(invalid(format!(
                    "binding at slot {} has an array size of 0",
                    binding.slot
                )));
            }
            if binding.stages.is_empty() {
                self.warn(format_args!(
                    "no shader stages are specified for binding at slot {}",
                    binding.slot
                ));
            }
        }
        Ok(())
    }

    /// Checks the shader stages of a pipeline. `shader_type` resolves a
    /// shader handle and fails for handles that are not live.
    pub(crate) fn pipeline_state_desc(
        &self,
        desc: &PipelineStateDescriptor<'_>,
        mut shader_type: impl FnMut(ShaderId) -> Result<ShaderType, RenderError>,
    ) -> Result<(), RenderError> {
        match desc {
            PipelineStateDescriptor::Graphics(graphics) => {
                if graphics.vertex_shader.is_none() {
                    return Err(invalid("cannot create graphics PSO without vertex shader"));
                }
                if graphics.tess_control_shader.is_some() != graphics.tess_evaluation_shader.is_some() {
                    return Err(invalid(
                        "cannot create graphics PSO with incomplete tessellation shader stages",
                    ));
                }
                for (stage, id) in graphics.shaders() {
                    let ty = shader_type(id)?;
                    if ty.stage_flags() != stage {
                        return Err(invalid(format!(
                            "cannot create graphics PSO with {ty:?} shader being assigned to {stage:?} stage"
                        )));
                    }
                }
                if graphics.fragment_shader.is_none() {
                    self.warn(format_args!("graphics PSO has no fragment shader"));
                }
            }
            PipelineStateDescriptor::Compute(compute) => {
                let id = compute
                    .compute_shader
                    .ok_or_else(|| invalid("cannot create compute PSO without compute shader"))?;
                let ty = shader_type(id)?;
                if ty != ShaderType::Compute {
                    return Err(invalid(format!(
                        "cannot create compute PSO with {ty:?} shader being assigned to compute stage"
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn query_heap_desc(&self, desc: &QueryHeapDescriptor<'_>) -> Result<(), RenderError> {
        if desc.num_queries == 0 {
            return Err(invalid("cannot create query heap with zero queries"));
        }
        if desc.render_condition && !desc.query_type.is_occlusion() {
            return Err(invalid(format!(
                "cannot use {:?} queries as render condition",
                desc.query_type
            )));
        }
        Ok(())
    }

    pub(crate) fn command_buffer_desc(
        &self,
        desc: &CommandBufferDescriptor<'_>,
    ) -> Result<(), RenderError> {
        if desc.flags.contains(CommandBufferFlags::IMMEDIATE_SUBMIT)
            && desc
                .flags
                .intersects(CommandBufferFlags::SECONDARY | CommandBufferFlags::MULTI_SUBMIT)
        {
            return Err(invalid(
                "cannot create immediate command buffer with SECONDARY or MULTI_SUBMIT flags",
            ));
        }
        if desc.num_native_buffers == 0 {
            return Err(invalid("cannot create command buffer with zero native buffers"));
        }
        Ok(())
    }

    pub(crate) fn swap_chain_desc(&self, desc: &SwapChainDescriptor<'_>) -> Result<(), RenderError> {
        if desc.resolution.width == 0 || desc.resolution.height == 0 {
            return Err(invalid(format!(
                "swap chain resolution must not be empty ({}x{})",
                desc.resolution.width, desc.resolution.height
            )));
        }
        if desc.swap_buffers == 0 {
            return Err(invalid("swap chain needs at least one buffer"));
        }
        if desc.samples == 0 {
            return Err(invalid("number of samples must not be 0"));
        }
        if desc.color_bits == 0 {
            return Err(invalid("swap chain color bits must not be 0"));
        }
        Ok(())
    }

    /// Checks the bind flags of the buffers of an array and returns the flags
    /// they share.
    pub(crate) fn buffer_array(&self, bind_flags: &[BindFlags]) -> Result<BindFlags, RenderError> {
        let (first, rest) = bind_flags
            .split_first()
            .ok_or_else(|| invalid("cannot create buffer array with zero buffers"))?;
        let common = rest.iter().fold(*first, |acc, flags| acc & *flags);
        let category = BindFlags::BUFFER_ONLY | BindFlags::SAMPLED | BindFlags::STORAGE;
        if !common.intersects(category) {
            return Err(invalid(
                "cannot create buffer array with buffers that share no binding category",
            ));
        }
        Ok(common)
    }

    /// Checks one render target attachment. `texture` is the attached texture,
    /// already resolved to a live one.
    pub(crate) fn attachment(
        &self,
        index: usize,
        attachment: &AttachmentDescriptor,
        texture: Option<&strata_data::TextureInfo>,
        resolution: strata_core::math::Extent2D,
    ) -> Result<(), RenderError> {
        let Some(info) = texture else {
            if attachment.attachment_type == AttachmentType::Color {
                return Err(invalid(format!(
                    "cannot have color attachment {index} without a texture"
                )));
            }
            return Ok(());
        };

        match attachment.attachment_type {
            AttachmentType::Color if !info.bind_flags.contains(BindFlags::COLOR_ATTACHMENT) => {
                return Err(RenderError::InvalidState(format!(
                    "cannot have color attachment {index} with a texture that was not created with the COLOR_ATTACHMENT flag"
                )));
            }
            ty if ty.is_depth_or_stencil()
                && !info.bind_flags.contains(BindFlags::DEPTH_STENCIL_ATTACHMENT) =>
            {
                return Err(RenderError::InvalidState(format!(
                    "cannot have depth-stencil attachment {index} with a texture that was not created with the DEPTH_STENCIL_ATTACHMENT flag"
                )));
            }
            _ => {}
        }

        if attachment.mip_level >= info.mip_levels {
            return Err(invalid(format!(
                "render-target attachment {index} exceeded number of MIP-map levels ({} specified but upper bound is {})",
                attachment.mip_level, info.mip_levels
            )));
        }
        if attachment.array_layer >= info.array_layers {
            return Err(invalid(format!(
                "render-target attachment {index} exceeded number of array layers ({} specified but upper bound is {})",
                attachment.array_layer, info.array_layers
            )));
        }
        let extent = info.mip_extent(attachment.mip_level);
        if extent.width < resolution.width || extent.height < resolution.height {
            return Err(invalid(format!(
                "render-target attachment {index} of {}x{} is smaller than the resolution {}x{}",
                extent.width, extent.height, resolution.width, resolution.height
            )));
        }
        Ok(())
    }

    /// Checks the sizing of a resource heap against its pipeline layout.
    pub(crate) fn resource_heap_size(
        &self,
        desc: &ResourceHeapDescriptor<'_>,
        num_bindings: usize,
    ) -> Result<(), RenderError> {
        let capacity = desc.capacity() as usize;
        if num_bindings == 0 {
            return Err(invalid("cannot create resource heap with empty pipeline layout"));
        }
        if capacity == 0 {
            return Err(invalid(
                "cannot create resource heap with both 'num_resource_views' being zero and 'initial_views' being empty",
            ));
        }
        if capacity < num_bindings {
            return Err(invalid(format!(
                "cannot create resource heap with less resources ({capacity}) than bindings in pipeline layout ({num_bindings})"
            )));
        }
        if capacity % num_bindings != 0 {
            return Err(invalid(format!(
                "cannot create resource heap with number of resource views ({capacity}) not being a multiple of bindings in pipeline layout ({num_bindings})"
            )));
        }
        if !desc.initial_views.is_empty() && desc.initial_views.len() != capacity {
            return Err(invalid(format!(
                "mismatch between number of initial resource views and resource heap descriptor ({} specified but expected {capacity})",
                desc.initial_views.len()
            )));
        }
        Ok(())
    }

    /// Checks that a range of views fits in a heap of `capacity` views.
    pub(crate) fn resource_heap_range(
        &self,
        capacity: u32,
        first: u32,
        count: usize,
    ) -> Result<(), RenderError> {
        if first >= capacity {
            return Err(invalid(format!(
                "first descriptor in resource heap out of bounds ({first} specified but upper bound is {capacity})"
            )));
        }
        if first as usize + count > capacity as usize {
            return Err(invalid(format!(
                "number of resource views for first descriptor in resource heap out of bounds ({first}+{count} specified but limit is {capacity})"
            )));
        }
        Ok(())
    }

    /// Checks one view against the binding it is written to.
    pub(crate) fn resource_view(
        &self,
        binding: &BindingDescriptor,
        view: &ResourceViewDescriptor,
        resource: ViewedResource,
    ) -> Result<(), RenderError> {
        if binding.stages.is_empty() {
            self.warn(format_args!(
                "no shader stages are specified for binding at slot {}",
                binding.slot
            ));
        }
        let (expected, required) = match binding.binding_type {
            BindingType::ConstantBuffer => ("buffer", BindFlags::CONSTANT_BUFFER),
            BindingType::StorageBuffer => ("buffer", BindFlags::STORAGE),
            BindingType::SampledTexture => ("texture", BindFlags::SAMPLED),
            BindingType::StorageTexture => ("texture", BindFlags::STORAGE),
            BindingType::Sampler => ("sampler", BindFlags::EMPTY),
        };
        let (actual, flags) = match resource {
            ViewedResource::Buffer { bind_flags } => ("buffer", bind_flags),
            ViewedResource::Texture { bind_flags, .. } => ("texture", bind_flags),
            ViewedResource::Sampler => ("sampler", BindFlags::EMPTY),
        };
        if expected != actual {
            return Err(invalid(format!(
                "cannot bind a {actual} to {:?} binding at slot {}",
                binding.binding_type, binding.slot
            )));
        }
        if !flags.contains(required) {
            return Err(invalid(format!(
                "binding flags mismatch between {actual} resource and binding descriptor (slot = {})",
                binding.slot
            )));
        }
        match (resource, view.subresource) {
            (ViewedResource::Texture { full_range, .. }, Some(sub)) => {
                let fits = !sub.is_empty()
                    && sub.mip_range().end <= full_range.mip_range().end
                    && sub.layer_range().end <= full_range.layer_range().end;
                if !fits {
                    return Err(invalid(format!(
                        "texture view {sub:?} exceeds the texture range {full_range:?} (slot = {})",
                        binding.slot
                    )));
                }
            }
            (_, None) => {}
            (_, Some(_)) => {
                return Err(invalid(format!(
                    "subresource ranges only apply to texture views (slot = {})",
                    binding.slot
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::{Extent2D, Extent3D};

    fn validator() -> Validator {
        Validator::new(DeviceLimits::default(), true)
    }

    fn is_invalid(result: Result<impl fmt::Debug, RenderError>) -> bool {
        matches!(result, Err(RenderError::InvalidArgument(_)))
    }

    #[test]
    fn exclusive_bind_flags_are_rejected() {
        let v = validator();
        assert!(is_invalid(v.bind_flags(BindFlags::VERTEX_BUFFER | BindFlags::COLOR_ATTACHMENT)));
        assert!(is_invalid(
            v.bind_flags(BindFlags::COLOR_ATTACHMENT | BindFlags::DEPTH_STENCIL_ATTACHMENT)
        ));
        assert!(v.bind_flags(BindFlags::VERTEX_BUFFER | BindFlags::STORAGE).is_ok());
    }

    #[test]
    fn buffer_stride_must_divide_size() {
        let v = validator();
        let mut desc = BufferDescriptor::new(100, BindFlags::STORAGE);
        desc.stride = 12;
        assert!(is_invalid(v.buffer_desc(&desc)));
        desc.stride = 4;
        assert!(v.buffer_desc(&desc).is_ok());
    }

    #[test]
    fn constant_buffers_respect_their_own_limit() {
        let v = validator();
        let desc = BufferDescriptor::new(1024 * 1024, BindFlags::CONSTANT_BUFFER);
        assert!(matches!(
            v.buffer_desc(&desc),
            Err(RenderError::UnsupportedSize { limit, .. }) if limit == 64 * 1024
        ));
    }

    #[test]
    fn unused_texture_dimensions_must_be_one() {
        let v = validator();
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 16, 16);
        desc.extent = Extent3D::new(16, 16, 2);
        assert!(is_invalid(v.texture_desc(&desc, false)));

        desc.texture_type = TextureType::Texture1D;
        desc.extent = Extent3D::new(16, 4, 1);
        assert!(is_invalid(v.texture_desc(&desc, false)));
    }

    #[test]
    fn cube_textures_are_square_with_six_faces() {
        let v = validator();
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 32, 16);
        desc.texture_type = TextureType::TextureCube;
        desc.array_layers = 6;
        assert!(is_invalid(v.texture_desc(&desc, false)));

        desc.extent = Extent3D::new(32, 32, 1);
        assert!(v.texture_desc(&desc, false).is_ok());
        desc.array_layers = 1;
        assert!(is_invalid(v.texture_desc(&desc, false)));

        desc.texture_type = TextureType::TextureCubeArray;
        desc.array_layers = 12;
        assert!(v.texture_desc(&desc, false).is_ok());
        desc.array_layers = 8;
        assert!(is_invalid(v.texture_desc(&desc, false)));
    }

    #[test]
    fn layer_counts_follow_the_texture_type() {
        let v = validator();
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 8, 8);
        desc.array_layers = 2;
        assert!(is_invalid(v.texture_desc(&desc, false)));

        desc.texture_type = TextureType::Texture2DArray;
        assert!(v.texture_desc(&desc, false).is_ok());
        desc.array_layers = DeviceLimits::default().max_texture_array_layers + 1;
        assert!(is_invalid(v.texture_desc(&desc, false)));
    }

    #[test]
    fn mip_count_is_bounded_by_the_full_chain() {
        let v = validator();
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 16, 16);
        desc.mip_levels = 5;
        assert!(v.texture_desc(&desc, false).is_ok());
        desc.mip_levels = 6;
        assert!(is_invalid(v.texture_desc(&desc, false)));

        desc.texture_type = TextureType::Texture2DMS;
        desc.samples = 4;
        desc.mip_levels = 2;
        assert!(is_invalid(v.texture_desc(&desc, false)));
    }

    #[test]
    fn oversized_textures_are_rejected() {
        let v = validator();
        let desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 16385, 4);
        assert!(is_invalid(v.texture_desc(&desc, false)));
    }

    #[test]
    fn command_buffer_flags_and_native_count() {
        let v = validator();
        let mut desc = CommandBufferDescriptor {
            flags: CommandBufferFlags::IMMEDIATE_SUBMIT | CommandBufferFlags::SECONDARY,
            ..Default::default()
        };
        assert!(is_invalid(v.command_buffer_desc(&desc)));
        desc.flags = CommandBufferFlags::IMMEDIATE_SUBMIT;
        assert!(v.command_buffer_desc(&desc).is_ok());
        desc.num_native_buffers = 0;
        assert!(is_invalid(v.command_buffer_desc(&desc)));
    }

    #[test]
    fn render_condition_needs_occlusion_queries() {
        let v = validator();
        let mut desc = QueryHeapDescriptor {
            query_type: QueryType::TimeElapsed,
            render_condition: true,
            ..Default::default()
        };
        assert!(is_invalid(v.query_heap_desc(&desc)));
        desc.query_type = QueryType::AnySamplesPassed;
        assert!(v.query_heap_desc(&desc).is_ok());
        desc.num_queries = 0;
        assert!(is_invalid(v.query_heap_desc(&desc)));
    }

    #[test]
    fn graphics_pipelines_need_a_vertex_shader_in_the_vertex_stage() {
        let v = validator();
        let types = |id: ShaderId| {
            Ok(match id.0 {
                1 => ShaderType::Vertex,
                2 => ShaderType::Fragment,
                _ => ShaderType::Compute,
            })
        };

        let missing = PipelineStateDescriptor::Graphics(GraphicsPipelineDescriptor {
            fragment_shader: Some(ShaderId(2)),
            ..Default::default()
        });
        assert!(is_invalid(v.pipeline_state_desc(&missing, types)));

        let swapped = PipelineStateDescriptor::Graphics(GraphicsPipelineDescriptor {
            vertex_shader: Some(ShaderId(2)),
            ..Default::default()
        });
        assert!(is_invalid(v.pipeline_state_desc(&swapped, types)));

        let half_tessellation = PipelineStateDescriptor::Graphics(GraphicsPipelineDescriptor {
            vertex_shader: Some(ShaderId(1)),
            tess_control_shader: Some(ShaderId(3)),
            ..Default::default()
        });
        assert!(is_invalid(v.pipeline_state_desc(&half_tessellation, types)));

        let good = PipelineStateDescriptor::Graphics(GraphicsPipelineDescriptor {
            vertex_shader: Some(ShaderId(1)),
            fragment_shader: Some(ShaderId(2)),
            ..Default::default()
        });
        assert!(v.pipeline_state_desc(&good, types).is_ok());
    }

    #[test]
    fn compute_pipelines_need_a_compute_shader() {
        let v = validator();
        let types = |_: ShaderId| Ok(ShaderType::Vertex);
        let desc = PipelineStateDescriptor::Compute(ComputePipelineDescriptor {
            compute_shader: Some(ShaderId(1)),
            ..Default::default()
        });
        assert!(is_invalid(v.pipeline_state_desc(&desc, types)));
        let none = PipelineStateDescriptor::Compute(ComputePipelineDescriptor::default());
        assert!(is_invalid(v.pipeline_state_desc(&none, types)));
    }

    #[test]
    fn buffer_arrays_need_a_shared_binding_category() {
        let v = validator();
        assert!(is_invalid(v.buffer_array(&[])));
        assert!(is_invalid(
            v.buffer_array(&[BindFlags::VERTEX_BUFFER, BindFlags::INDEX_BUFFER])
        ));
        let common = v
            .buffer_array(&[
                BindFlags::VERTEX_BUFFER | BindFlags::COPY_DST,
                BindFlags::VERTEX_BUFFER,
            ])
            .unwrap();
        assert_eq!(common, BindFlags::VERTEX_BUFFER);
    }

    #[test]
    fn resource_heap_sizes_are_multiples_of_the_binding_count() {
        let v = validator();
        let mut desc = ResourceHeapDescriptor {
            label: None,
            pipeline_layout: PipelineLayoutId(1),
            num_resource_views: 3,
            initial_views: Vec::new(),
        };
        assert!(is_invalid(v.resource_heap_size(&desc, 2)));
        desc.num_resource_views = 1;
        assert!(is_invalid(v.resource_heap_size(&desc, 2)));
        desc.num_resource_views = 4;
        assert!(v.resource_heap_size(&desc, 2).is_ok());
        assert!(is_invalid(v.resource_heap_size(&desc, 0)));

        assert!(v.resource_heap_range(4, 2, 2).is_ok());
        assert!(is_invalid(v.resource_heap_range(4, 4, 1)));
        assert!(is_invalid(v.resource_heap_range(4, 3, 2)));
    }

    #[test]
    fn views_must_match_their_binding() {
        let v = validator();
        let binding = BindingDescriptor {
            slot: 0,
            binding_type: BindingType::ConstantBuffer,
            stages: ShaderStageFlags::VERTEX,
            array_size: 1,
        };
        let view = ResourceViewDescriptor::whole(ResourceRef::Buffer(BufferId(1)));
        let constant = ViewedResource::Buffer {
            bind_flags: BindFlags::CONSTANT_BUFFER,
        };
        let vertex = ViewedResource::Buffer {
            bind_flags: BindFlags::VERTEX_BUFFER,
        };
        assert!(v.resource_view(&binding, &view, constant).is_ok());
        assert!(is_invalid(v.resource_view(&binding, &view, vertex)));
        assert!(is_invalid(v.resource_view(&binding, &view, ViewedResource::Sampler)));
    }

    #[test]
    fn color_attachments_need_a_texture_with_the_right_flags() {
        let v = validator();
        let mut desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 64, 64);
        desc.bind_flags = BindFlags::SAMPLED;
        let info = strata_data::TextureInfo::from(&desc);
        let attachment = AttachmentDescriptor::color(TextureId(1));
        let resolution = Extent2D::new(64, 64);

        assert!(matches!(
            v.attachment(0, &attachment, Some(&info), resolution),
            Err(RenderError::InvalidState(_))
        ));

        desc.bind_flags = BindFlags::COLOR_ATTACHMENT;
        let info = strata_data::TextureInfo::from(&desc);
        assert!(v.attachment(0, &attachment, Some(&info), resolution).is_ok());
        assert!(is_invalid(v.attachment(0, &attachment, Some(&info), Extent2D::new(128, 64))));
        assert!(is_invalid(v.attachment(0, &attachment, None, resolution)));
        assert!(v
            .attachment(1, &AttachmentDescriptor::internal_depth_stencil(), None, resolution)
            .is_ok());
    }
}
