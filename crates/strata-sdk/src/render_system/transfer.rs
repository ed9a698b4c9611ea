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

use super::{release_record, RenderSystem};
use std::ops::Range;
use strata_core::renderer::api::*;
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::{BufferInfo, BufferResource, TextureInfo, TextureResource};
use strata_lanes::MappedBuffer;

impl<B: RenderBackend> RenderSystem<B> {
    /// Creates a device-local buffer, optionally filled with `initial_data`.
    ///
    /// Data shorter than the buffer fills it from offset 0. The buffer keeps
    /// a staging buffer for later CPU access when the descriptor requests
    /// CPU access or [`MiscFlags::DYNAMIC_USAGE`].
    pub fn create_buffer(
        &mut self,
        desc: &BufferDescriptor<'_>,
        initial_data: Option<&[u8]>,
    ) -> Result<BufferId, RenderError> {
        self.ensure_live()?;
        self.validator.buffer_desc(desc)?;
        let buffer = self.lane.create_buffer(desc, initial_data)?;
        Ok(self.buffers.take_ownership(buffer))
    }

    /// Releases a buffer: its memory region, then its staging buffer, then
    /// the native buffer.
    pub fn release_buffer(&mut self, id: BufferId) -> Result<(), RenderError> {
        if self.buffers.contains(id) {
            for (array, record) in self.buffer_arrays.iter() {
                if record.buffers.contains(&id) {
                    self.validator.warn(format_args!(
                        "releasing buffer {} still referenced by buffer array {}",
                        id.0, array.0
                    ));
                }
            }
        }
        release_record(&mut self.buffers, &self.lane, id)
    }

    /// Writes `data` into a buffer at `offset`.
    pub fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), RenderError> {
        let buffer = self.buffers.get_mut(id)?;
        self.lane.write_buffer(buffer, offset, data)
    }

    /// Reads `out.len()` bytes of a buffer starting at `offset`.
    pub fn read_buffer(&self, id: BufferId, offset: u64, out: &mut [u8]) -> Result<(), RenderError> {
        let buffer = self.buffers.get(id)?;
        if !buffer.is_initialized() {
            self.validator.warn(format_args!("reading uninitialized buffer {}", id.0));
        }
        self.lane.read_buffer(buffer, offset, out)
    }

    /// Maps `range` of a buffer for CPU access, the whole buffer when `range`
    /// is `None`.
    ///
    /// The buffer must have been created with CPU access flags covering
    /// `access`. Writes reach the device when the mapping is passed to
    /// [`RenderSystem::unmap_buffer`] or dropped.
    pub fn map_buffer(
        &mut self,
        id: BufferId,
        access: CpuAccessFlags,
        range: Option<Range<u64>>,
    ) -> Result<MappedBuffer<'_, B>, RenderError> {
        self.ensure_live()?;
        let buffer = self.buffers.get_mut(id)?;
        let range = range.unwrap_or(0..buffer.size());
        self.lane.map_buffer(buffer, access, range)
    }

    /// Unmaps a buffer mapped with [`RenderSystem::map_buffer`], flushing CPU
    /// writes to the device.
    pub fn unmap_buffer(mapped: MappedBuffer<'_, B>) -> Result<(), RenderError> {
        mapped.unmap()
    }

    /// The record of a live buffer.
    pub fn buffer(&self, id: BufferId) -> Result<&BufferResource<B>, RenderError> {
        self.buffers.get(id)
    }

    /// The creation parameters of a live buffer.
    pub fn buffer_info(&self, id: BufferId) -> Result<&BufferInfo, RenderError> {
        Ok(self.buffers.get(id)?.info())
    }

    /// Creates a texture, uploading `image` into mip level 0 of every layer.
    ///
    /// Without image data the texture is filled with its clear value unless
    /// [`MiscFlags::NO_INITIAL_DATA`] is set. With image data and
    /// [`MiscFlags::GENERATE_MIPS`] the rest of the mip chain is generated.
    pub fn create_texture(
        &mut self,
        desc: &TextureDescriptor<'_>,
        image: Option<&SrcImageDescriptor<'_>>,
    ) -> Result<TextureId, RenderError> {
        self.ensure_live()?;
        self.validator.texture_desc(desc, image.is_some())?;
        let texture = self.lane.create_texture(desc, image, self.mip_generator()?)?;
        Ok(self.textures.take_ownership(texture))
    }

    /// Releases a texture and its memory.
    pub fn release_texture(&mut self, id: TextureId) -> Result<(), RenderError> {
        if self.textures.contains(id) {
            for (target, record) in self.render_targets.iter() {
                if record.textures.contains(&id) {
                    self.validator.warn(format_args!(
                        "releasing texture {} still attached to render target {}",
                        id.0, target.0
                    ));
                }
            }
            for (heap, record) in self.resource_heaps.iter() {
                let viewed = record
                    .views
                    .iter()
                    .flatten()
                    .any(|view| view.resource == ResourceRef::Texture(id));
                if viewed {
                    self.validator.warn(format_args!(
                        "releasing texture {} still viewed by resource heap {}",
                        id.0, heap.0
                    ));
                }
            }
        }
        release_record(&mut self.textures, &self.lane, id)
    }

    /// Writes image data into one mip level of a range of layers.
    pub fn write_texture(
        &mut self,
        id: TextureId,
        region: &TextureRegion,
        image: &SrcImageDescriptor<'_>,
    ) -> Result<(), RenderError> {
        let texture = self.textures.get_mut(id)?;
        self.lane.write_texture(texture, region, image)
    }

    /// Reads one mip level of a range of layers into `dst`, converting to the
    /// destination format when it differs.
    pub fn read_texture(
        &mut self,
        id: TextureId,
        region: &TextureRegion,
        dst: &mut DstImageDescriptor<'_>,
    ) -> Result<(), RenderError> {
        let texture = self.textures.get_mut(id)?;
        self.lane.read_texture(texture, region, dst)
    }

    /// Regenerates every mip level after the first from level 0.
    pub fn generate_mips(&mut self, id: TextureId) -> Result<(), RenderError> {
        let range = self.textures.get(id)?.info().full_range();
        self.generate_mips_range(id, &range)
    }

    /// Regenerates the levels of `range` after its base level.
    pub fn generate_mips_range(
        &mut self,
        id: TextureId,
        range: &TextureSubresource,
    ) -> Result<(), RenderError> {
        let mips = self.services.as_ref().map(|services| services.mip_generator());
        let texture = self.textures.get_mut(id)?;
        match mips {
            Some(mips) => self.lane.generate_mips(texture, range, mips),
            None => Err(RenderError::InvalidState(
                "mip generation is unavailable after shutdown".to_owned(),
            )),
        }
    }

    /// The record of a live texture.
    pub fn texture(&self, id: TextureId) -> Result<&TextureResource<B>, RenderError> {
        self.textures.get(id)
    }

    /// The creation parameters of a live texture.
    pub fn texture_info(&self, id: TextureId) -> Result<&TextureInfo, RenderError> {
        Ok(self.textures.get(id)?.info())
    }
}
