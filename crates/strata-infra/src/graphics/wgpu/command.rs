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

use super::conversions::IntoWgpu;
use super::device::{WgpuBackend, WgpuBuffer, WgpuImage};
use strata_core::renderer::api::*;
use strata_core::renderer::{BackendError, CommandRecorder};

/// Commands recorded into a WGPU encoder.
#[derive(Debug)]
pub struct WgpuCommandList {
    encoder: wgpu::CommandEncoder,
    recorded: usize,
}

fn bytes_per_row(layout: &TexelCopyLayout) -> Result<u32, BackendError> {
    u32::try_from(layout.bytes_per_row)
        .map_err(|_| BackendError::Unsupported(format!("{} bytes per row", layout.bytes_per_row)))
}

/// The WGPU view of one subresource region of a texture.
fn texture_copy<'a>(image: &'a WgpuImage, region: &TextureRegion) -> (wgpu::TexelCopyTextureInfo<'a>, wgpu::Extent3d) {
    let mut origin: wgpu::Origin3d = region.offset.into_wgpu();
    let mut size: wgpu::Extent3d = region.extent.into_wgpu();
    if image.texture_type.has_layers() {
        origin.z = region.subresource.base_array_layer;
        size.depth_or_array_layers = region.subresource.num_array_layers;
    }
    (
        wgpu::TexelCopyTextureInfo {
            texture: &image.texture,
            mip_level: region.subresource.base_mip_level,
            origin,
            aspect: wgpu::TextureAspect::All,
        },
        size,
    )
}

impl CommandRecorder for WgpuBackend {
    type CommandList = WgpuCommandList;

    fn begin_commands(&self, label: Option<&str>) -> Result<WgpuCommandList, BackendError> {
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });
        Ok(WgpuCommandList { encoder, recorded: 0 })
    }

    fn copy_buffer(
        &self,
        commands: &mut WgpuCommandList,
        src: &WgpuBuffer,
        src_offset: u64,
        dst: &WgpuBuffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), BackendError> {
        if !src.usage().contains(BufferUsage::TRANSFER_SRC) || !dst.usage().contains(BufferUsage::TRANSFER_DST) {
            return Err(BackendError::InvalidUsage("buffer copy without transfer usage".to_owned()));
        }
        let (src_buffer, src_base) = src.resolve()?;
        let (dst_buffer, dst_base) = dst.resolve()?;
        commands.encoder.copy_buffer_to_buffer(
            src_buffer,
            src_base + src_offset,
            dst_buffer,
            dst_base + dst_offset,
            size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
        );
        commands.recorded += 1;
        Ok(())
    }

    fn copy_buffer_to_image(
        &self,
        commands: &mut WgpuCommandList,
        src: &WgpuBuffer,
        layout: &TexelCopyLayout,
        dst: &WgpuImage,
        region: &TextureRegion,
    ) -> Result<(), BackendError> {
        let (buffer, base) = src.resolve()?;
        let (texture, size) = texture_copy(dst, region);
        commands.encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: base + layout.offset,
                    bytes_per_row: Some(bytes_per_row(layout)?),
                    rows_per_image: Some(layout.rows_per_image),
                },
            },
            texture,
            size,
        );
        commands.recorded += 1;
        Ok(())
    }

    fn copy_image_to_buffer(
        &self,
        commands: &mut WgpuCommandList,
        src: &WgpuImage,
        region: &TextureRegion,
        dst: &WgpuBuffer,
        layout: &TexelCopyLayout,
    ) -> Result<(), BackendError> {
        let (buffer, base) = dst.resolve()?;
        let (texture, size) = texture_copy(src, region);
        commands.encoder.copy_texture_to_buffer(
            texture,
            wgpu::TexelCopyBufferInfo {
                buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: base + layout.offset,
                    bytes_per_row: Some(bytes_per_row(layout)?),
                    rows_per_image: Some(layout.rows_per_image),
                },
            },
            size,
        );
        commands.recorded += 1;
        Ok(())
    }

    // WGPU tracks texture usage itself; barriers are implicit.
    fn transition_image(
        &self,
        _commands: &mut WgpuCommandList,
        image: &WgpuImage,
        transition: &StateTransition,
    ) -> Result<(), BackendError> {
        log::trace!(
            "WgpuBackend: texture {} {:?} {} -> {}",
            image.id(),
            transition.subresource,
            transition.old_state,
            transition.new_state
        );
        Ok(())
    }

    fn blit_mip_level(
        &self,
        _commands: &mut WgpuCommandList,
        _image: &WgpuImage,
        _base_layer: u32,
        _num_layers: u32,
        _src_level: u32,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("mip blits on the wgpu backend".to_owned()))
    }

    fn supports_mip_blit(&self) -> bool {
        false
    }

    fn submit_and_wait(&self, commands: WgpuCommandList) -> Result<(), BackendError> {
        let recorded = commands.recorded;
        self.context.queue.submit(Some(commands.encoder.finish()));
        self.wait_idle()?;
        log::trace!("WgpuBackend: executed {recorded} command(s)");
        Ok(())
    }
}
