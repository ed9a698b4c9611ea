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

use super::resources::{Binding, HeadlessBuffer, HeadlessImage, ImageInfo};
use super::HeadlessBackend;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use strata_core::math::Extent3D;
use strata_core::renderer::api::image::downsample_box;
use strata_core::renderer::api::*;
use strata_core::renderer::{BackendError, CommandRecorder};

/// An image as captured by a recorded command.
#[derive(Debug, Clone)]
struct ImageTarget {
    id: u64,
    info: ImageInfo,
    binding: Binding,
    layouts: Arc<Mutex<Vec<ResourceState>>>,
}

#[derive(Debug)]
enum Command {
    CopyBuffer {
        src: Binding,
        src_offset: u64,
        dst: Binding,
        dst_offset: u64,
        size: u64,
    },
    BufferToImage {
        src: Binding,
        layout: TexelCopyLayout,
        dst: ImageTarget,
        region: TextureRegion,
    },
    ImageToBuffer {
        src: ImageTarget,
        region: TextureRegion,
        dst: Binding,
        layout: TexelCopyLayout,
    },
    Transition {
        image: ImageTarget,
        transition: StateTransition,
    },
    Blit {
        image: ImageTarget,
        base_layer: u32,
        num_layers: u32,
        src_level: u32,
    },
}

/// Commands recorded for the headless backend. Nothing runs before submission.
#[derive(Debug)]
pub struct HeadlessCommandList {
    label: Option<String>,
    commands: Vec<Command>,
}

impl HeadlessCommandList {
    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn buffer_binding(buffer: &HeadlessBuffer, needed: BufferUsage) -> Result<Binding, BackendError> {
    if !buffer.usage.contains(needed) {
        return Err(BackendError::InvalidUsage(format!(
            "buffer {} lacks {needed:?} usage",
            buffer.id
        )));
    }
    buffer
        .binding
        .clone()
        .ok_or_else(|| BackendError::InvalidUsage(format!("buffer {} has no memory bound", buffer.id)))
}

fn check_buffer_range(buffer: &HeadlessBuffer, offset: u64, size: u64) -> Result<(), BackendError> {
    if offset.checked_add(size).map_or(true, |end| end > buffer.size) {
        return Err(BackendError::InvalidUsage(format!(
            "{size} byte(s) at offset {offset} exceed buffer {} of {} byte(s)",
            buffer.id, buffer.size
        )));
    }
    Ok(())
}

fn image_target(image: &HeadlessImage, needed: TextureUsage) -> Result<ImageTarget, BackendError> {
    if !image.info.usage.contains(needed) {
        return Err(BackendError::InvalidUsage(format!(
            "image {} lacks {needed:?} usage",
            image.id
        )));
    }
    let binding = image
        .binding
        .clone()
        .ok_or_else(|| BackendError::InvalidUsage(format!("image {} has no memory bound", image.id)))?;
    Ok(ImageTarget {
        id: image.id,
        info: image.info,
        binding,
        layouts: Arc::clone(&image.layouts),
    })
}

fn check_subresource(info: &ImageInfo, subresource: &TextureSubresource) -> Result<(), BackendError> {
    if subresource.is_empty()
        || subresource.mip_range().end > info.mip_levels
        || subresource.layer_range().end > info.array_layers
    {
        return Err(BackendError::InvalidUsage(format!(
            "subresource {subresource:?} outside an image of {} mip(s) and {} layer(s)",
            info.mip_levels, info.array_layers
        )));
    }
    Ok(())
}

/// Validates a buffer/image copy and returns the buffer bytes it covers.
fn check_texel_copy(
    info: &ImageInfo,
    region: &TextureRegion,
    layout: &TexelCopyLayout,
    row_alignment: u32,
) -> Result<u64, BackendError> {
    check_subresource(info, &region.subresource)?;
    if region.subresource.num_mip_levels != 1 {
        return Err(BackendError::InvalidUsage(
            "texel copies address exactly one mip level".to_owned(),
        ));
    }
    let level = info.mip_extent(region.subresource.base_mip_level);
    let origin = region.offset;
    let fits = |origin: u32, size: u32, limit: u32| origin.checked_add(size).is_some_and(|end| end <= limit);
    if region.extent.is_empty()
        || !fits(origin.x, region.extent.width, level.width)
        || !fits(origin.y, region.extent.height, level.height)
        || !fits(origin.z, region.extent.depth, level.depth)
    {
        return Err(BackendError::InvalidUsage(format!(
            "copy region {region:?} outside mip level of extent {level:?}"
        )));
    }
    let (block_width, block_height) = info.format.block_extent();
    if origin.x % block_width != 0 || origin.y % block_height != 0 {
        return Err(BackendError::InvalidUsage(format!(
            "copy origin {origin:?} is not aligned to {block_width}x{block_height} blocks"
        )));
    }
    let row_size = info.format.row_size(region.extent.width);
    let alignment = u64::from(row_alignment.max(1));
    if layout.bytes_per_row < row_size || layout.bytes_per_row % alignment != 0 {
        return Err(BackendError::InvalidUsage(format!(
            "{} bytes per row cannot hold {row_size} byte rows aligned to {alignment}",
            layout.bytes_per_row
        )));
    }
    if layout.rows_per_image < info.format.block_rows(region.extent.height) {
        return Err(BackendError::InvalidUsage(format!(
            "{} rows per image cannot hold {} block rows",
            layout.rows_per_image,
            info.format.block_rows(region.extent.height)
        )));
    }
    Ok(layout.offset + layout.required_size(region.extent.depth, region.subresource.num_array_layers))
}

/// Calls `f(buffer_offset, image_offset, row_bytes)` for every block row of a copy.
fn for_each_row(
    info: &ImageInfo,
    region: &TextureRegion,
    layout: &TexelCopyLayout,
    mut f: impl FnMut(u64, u64, u64) -> Result<(), BackendError>,
) -> Result<(), BackendError> {
    let format = info.format;
    let mip = region.subresource.base_mip_level;
    let level = info.mip_extent(mip);
    let level_row = format.row_size(level.width);
    let level_slice = level_row * format.block_rows(level.height) as u64;
    let (block_width, block_height) = format.block_extent();
    let x_bytes = (region.offset.x / block_width) as u64 * format.block_size() as u64;
    let first_row = (region.offset.y / block_height) as u64;
    let row_bytes = format.row_size(region.extent.width);
    let rows = format.block_rows(region.extent.height) as u64;

    for (i, layer) in region.subresource.layer_range().enumerate() {
        let layer_base = info.subresource_offset(mip, layer);
        let buffer_layer = layout.offset + layout.layer_stride(region.extent.depth) * i as u64;
        for z in 0..region.extent.depth as u64 {
            let image_slice = layer_base + (region.offset.z as u64 + z) * level_slice;
            let buffer_slice = buffer_layer + z * layout.bytes_per_row * layout.rows_per_image as u64;
            for row in 0..rows {
                f(
                    buffer_slice + row * layout.bytes_per_row,
                    image_slice + (first_row + row) * level_row + x_bytes,
                    row_bytes,
                )?;
            }
        }
    }
    Ok(())
}

impl ImageTarget {
    fn expect_layout(&self, subresource: &TextureSubresource, expected: ResourceState) -> Result<(), BackendError> {
        let layouts = self.lock_layouts()?;
        for mip in subresource.mip_range() {
            for layer in subresource.layer_range() {
                let current = layouts[self.info.layout_index(mip, layer)];
                if current != expected {
                    return Err(BackendError::InvalidUsage(format!(
                        "image {} mip {mip} layer {layer} is {current} but {expected} is required",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }

    fn lock_layouts(&self) -> Result<std::sync::MutexGuard<'_, Vec<ResourceState>>, BackendError> {
        self.layouts
            .lock()
            .map_err(|e| BackendError::DeviceLost(format!("layouts of image {} poisoned: {e}", self.id)))
    }

    fn block_write(&self, image_offset: u64, data: &[u8]) -> Result<(), BackendError> {
        self.binding.block.write(self.binding.offset + image_offset, data)
    }

    fn texel_offset(&self, mip: u32, layer: u32, level: Extent3D, x: u32, y: u32, z: u32) -> u64 {
        let texel = self.info.format.block_size() as u64;
        let row = level.width as u64 * texel;
        self.binding.offset
            + self.info.subresource_offset(mip, layer)
            + (z as u64 * level.height as u64 + y as u64) * row
            + x as u64 * texel
    }
}

impl HeadlessBackend {
    fn execute(&self, command: Command) -> Result<(), BackendError> {
        match command {
            Command::CopyBuffer {
                src,
                src_offset,
                dst,
                dst_offset,
                size,
            } => {
                let bytes = src.block.read_vec(src.offset + src_offset, size)?;
                dst.block.write(dst.offset + dst_offset, &bytes)?;
                self.counters.copies.fetch_add(1, Ordering::Relaxed);
            }
            Command::BufferToImage {
                src,
                layout,
                dst,
                region,
            } => {
                dst.expect_layout(&region.subresource, ResourceState::TransferDst)?;
                for_each_row(&dst.info, &region, &layout, |buffer_offset, image_offset, len| {
                    let row = src.block.read_vec(src.offset + buffer_offset, len)?;
                    dst.block_write(image_offset, &row)
                })?;
                self.counters.copies.fetch_add(1, Ordering::Relaxed);
            }
            Command::ImageToBuffer {
                src,
                region,
                dst,
                layout,
            } => {
                src.expect_layout(&region.subresource, ResourceState::TransferSrc)?;
                for_each_row(&src.info, &region, &layout, |buffer_offset, image_offset, len| {
                    let row = src.binding.block.read_vec(src.binding.offset + image_offset, len)?;
                    dst.block.write(dst.offset + buffer_offset, &row)
                })?;
                self.counters.copies.fetch_add(1, Ordering::Relaxed);
            }
            Command::Transition { image, transition } => {
                let mut layouts = image.lock_layouts()?;
                let subresource = &transition.subresource;
                for mip in subresource.mip_range() {
                    for layer in subresource.layer_range() {
                        let index = image.info.layout_index(mip, layer);
                        let current = layouts[index];
                        if transition.old_state != ResourceState::Undefined && current != transition.old_state {
                            return Err(BackendError::InvalidUsage(format!(
                                "barrier on image {} expects mip {mip} layer {layer} in {} but it is {current}",
                                image.id, transition.old_state
                            )));
                        }
                        layouts[index] = transition.new_state;
                    }
                }
                self.counters.transitions.fetch_add(1, Ordering::Relaxed);
            }
            Command::Blit {
                image,
                base_layer,
                num_layers,
                src_level,
            } => {
                let layers = TextureSubresource::new(base_layer, num_layers, src_level, 1);
                image.expect_layout(&layers, ResourceState::TransferSrc)?;
                image.expect_layout(
                    &TextureSubresource::new(base_layer, num_layers, src_level + 1, 1),
                    ResourceState::TransferDst,
                )?;
                for layer in layers.layer_range() {
                    self.blit_layer(&image, layer, src_level)?;
                }
                self.counters.blits.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Box-filters one layer of `src_level` into the next level.
    fn blit_layer(&self, image: &ImageTarget, layer: u32, src_level: u32) -> Result<(), BackendError> {
        let src_extent = image.info.mip_extent(src_level);
        let dst_extent = image.info.mip_extent(src_level + 1);

        let src_start = image.texel_offset(src_level, layer, src_extent, 0, 0, 0);
        let src = image
            .binding
            .block
            .read_vec(src_start, image.info.layer_size(src_level))?;
        let dst = downsample_box(image.info.format, src_extent, dst_extent, 1, &src);

        let dst_start = image.texel_offset(src_level + 1, layer, dst_extent, 0, 0, 0);
        image.binding.block.write(dst_start, &dst)
    }
}

impl CommandRecorder for HeadlessBackend {
    type CommandList = HeadlessCommandList;

    fn begin_commands(&self, label: Option<&str>) -> Result<HeadlessCommandList, BackendError> {
        if self.is_device_lost() {
            return Err(BackendError::DeviceLost("headless device was lost".to_owned()));
        }
        Ok(HeadlessCommandList {
            label: label.map(str::to_owned),
            commands: Vec::new(),
        })
    }

    fn copy_buffer(
        &self,
        commands: &mut HeadlessCommandList,
        src: &HeadlessBuffer,
        src_offset: u64,
        dst: &HeadlessBuffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), BackendError> {
        let src_binding = buffer_binding(src, BufferUsage::TRANSFER_SRC)?;
        let dst_binding = buffer_binding(dst, BufferUsage::TRANSFER_DST)?;
        check_buffer_range(src, src_offset, size)?;
        check_buffer_range(dst, dst_offset, size)?;
        let alignment = self.config.limits.buffer_copy_alignment.max(1);
        if src_offset % alignment != 0 || dst_offset % alignment != 0 || size % alignment != 0 {
            return Err(BackendError::InvalidUsage(format!(
                "buffer copy of {size} byte(s) from {src_offset} to {dst_offset} is not {alignment}-byte aligned"
            )));
        }
        commands.commands.push(Command::CopyBuffer {
            src: src_binding,
            src_offset,
            dst: dst_binding,
            dst_offset,
            size,
        });
        Ok(())
    }

    fn copy_buffer_to_image(
        &self,
        commands: &mut HeadlessCommandList,
        src: &HeadlessBuffer,
        layout: &TexelCopyLayout,
        dst: &HeadlessImage,
        region: &TextureRegion,
    ) -> Result<(), BackendError> {
        let src_binding = buffer_binding(src, BufferUsage::TRANSFER_SRC)?;
        let target = image_target(dst, TextureUsage::TRANSFER_DST)?;
        let needed = check_texel_copy(&target.info, region, layout, self.config.limits.row_pitch_alignment)?;
        check_buffer_range(src, 0, needed)?;
        commands.commands.push(Command::BufferToImage {
            src: src_binding,
            layout: *layout,
            dst: target,
            region: *region,
        });
        Ok(())
    }

    fn copy_image_to_buffer(
        &self,
        commands: &mut HeadlessCommandList,
        src: &HeadlessImage,
        region: &TextureRegion,
        dst: &HeadlessBuffer,
        layout: &TexelCopyLayout,
    ) -> Result<(), BackendError> {
        let target = image_target(src, TextureUsage::TRANSFER_SRC)?;
        let dst_binding = buffer_binding(dst, BufferUsage::TRANSFER_DST)?;
        let needed = check_texel_copy(&target.info, region, layout, self.config.limits.row_pitch_alignment)?;
        check_buffer_range(dst, 0, needed)?;
        commands.commands.push(Command::ImageToBuffer {
            src: target,
            region: *region,
            dst: dst_binding,
            layout: *layout,
        });
        Ok(())
    }

    fn transition_image(
        &self,
        commands: &mut HeadlessCommandList,
        image: &HeadlessImage,
        transition: &StateTransition,
    ) -> Result<(), BackendError> {
        check_subresource(&image.info, &transition.subresource)?;
        let target = image_target(image, TextureUsage::EMPTY)?;
        commands.commands.push(Command::Transition {
            image: target,
            transition: *transition,
        });
        Ok(())
    }

    fn blit_mip_level(
        &self,
        commands: &mut HeadlessCommandList,
        image: &HeadlessImage,
        base_layer: u32,
        num_layers: u32,
        src_level: u32,
    ) -> Result<(), BackendError> {
        let format = image.info.format;
        if !format.is_convertible() || format.is_depth_or_stencil() {
            return Err(BackendError::Unsupported(format!("blits of {format:?} images")));
        }
        let target = image_target(image, TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST)?;
        check_subresource(
            &target.info,
            &TextureSubresource::new(base_layer, num_layers, src_level, 2),
        )?;
        commands.commands.push(Command::Blit {
            image: target,
            base_layer,
            num_layers,
            src_level,
        });
        Ok(())
    }

    fn submit_and_wait(&self, commands: HeadlessCommandList) -> Result<(), BackendError> {
        if self.is_device_lost() {
            return Err(BackendError::DeviceLost("headless device was lost".to_owned()));
        }
        let count = commands.commands.len();
        for command in commands.commands {
            self.execute(command)?;
        }
        self.counters.submits.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "Headless: executed {count} command(s) of {}",
            commands.label.as_deref().unwrap_or("<unlabeled>")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::math::Origin3D;
    use strata_core::renderer::{DeviceMemory, NativeResourceFactory};

    fn bound_buffer(backend: &HeadlessBackend, size: u64, usage: BufferUsage) -> HeadlessBuffer {
        let mut buffer = backend
            .create_buffer(&NativeBufferDescriptor {
                label: None,
                size,
                usage,
                host_visible: true,
            })
            .unwrap();
        let requirements = backend.buffer_memory_requirements(&buffer);
        let memory = backend.allocate_memory(requirements.size, 1).unwrap();
        backend.map_memory(&memory, 0, requirements.size).unwrap();
        backend.bind_buffer_memory(&mut buffer, &memory, 0).unwrap();
        buffer
    }

    fn bound_image(backend: &HeadlessBackend, extent: Extent3D, mips: u32) -> HeadlessImage {
        let mut image = backend
            .create_image(&NativeImageDescriptor {
                label: None,
                texture_type: TextureType::Texture2D,
                format: Format::RGBA8UNorm,
                extent,
                array_layers: 1,
                mip_levels: mips,
                samples: 1,
                usage: TextureUsage::TRANSFER_SRC | TextureUsage::TRANSFER_DST,
            })
            .unwrap();
        let requirements = backend.image_memory_requirements(&image);
        let memory = backend.allocate_memory(requirements.size, 0).unwrap();
        backend.bind_image_memory(&mut image, &memory, 0).unwrap();
        image
    }

    fn transition(mip: u32, old_state: ResourceState, new_state: ResourceState) -> StateTransition {
        StateTransition {
            subresource: TextureSubresource::single(0, mip),
            old_state,
            new_state,
        }
    }

    fn region(extent: Extent3D, mip: u32) -> TextureRegion {
        TextureRegion {
            subresource: TextureSubresource::single(0, mip),
            offset: Origin3D::ZERO,
            extent,
        }
    }

    #[test]
    fn commands_run_only_on_submit() {
        // --- 1. ARRANGE ---
        let backend = HeadlessBackend::new();
        let src = bound_buffer(&backend, 16, BufferUsage::TRANSFER_SRC);
        let dst = bound_buffer(&backend, 16, BufferUsage::TRANSFER_DST);
        src.binding.as_ref().unwrap().block.write(0, &[7; 16]).unwrap();

        // --- 2. ACT ---
        let mut commands = backend.begin_commands(Some("copy")).unwrap();
        backend.copy_buffer(&mut commands, &src, 4, &dst, 0, 8).unwrap();
        let before = dst.binding.as_ref().unwrap().block.read_vec(0, 8).unwrap();
        backend.submit_and_wait(commands).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(before, vec![0; 8]);
        assert_eq!(dst.binding.as_ref().unwrap().block.read_vec(0, 8).unwrap(), vec![7; 8]);
        assert_eq!(backend.stats().copies, 1);
        assert_eq!(backend.stats().submits, 1);
    }

    #[test]
    fn copy_into_image_requires_transfer_dst_layout() {
        let backend = HeadlessBackend::new();
        let src = bound_buffer(&backend, 64, BufferUsage::TRANSFER_SRC);
        let image = bound_image(&backend, Extent3D::new(4, 4, 1), 1);
        let layout = TexelCopyLayout::for_extent(Format::RGBA8UNorm, Extent3D::new(4, 4, 1), 1);

        let mut commands = backend.begin_commands(None).unwrap();
        backend
            .copy_buffer_to_image(&mut commands, &src, &layout, &image, &region(Extent3D::new(4, 4, 1), 0))
            .unwrap();
        let err = backend.submit_and_wait(commands).unwrap_err();

        assert!(matches!(err, BackendError::InvalidUsage(_)));
    }

    #[test]
    fn upload_then_read_back_round_trips_texels() {
        // --- 1. ARRANGE ---
        let backend = HeadlessBackend::new();
        let extent = Extent3D::new(2, 2, 1);
        let upload = bound_buffer(&backend, 16, BufferUsage::TRANSFER_SRC);
        let readback = bound_buffer(&backend, 16, BufferUsage::TRANSFER_DST);
        let image = bound_image(&backend, extent, 1);
        let texels: Vec<u8> = (0..16).collect();
        upload.binding.as_ref().unwrap().block.write(0, &texels).unwrap();
        let layout = TexelCopyLayout::for_extent(Format::RGBA8UNorm, extent, 1);

        // --- 2. ACT ---
        let mut commands = backend.begin_commands(None).unwrap();
        backend
            .transition_image(&mut commands, &image, &transition(0, ResourceState::Undefined, ResourceState::TransferDst))
            .unwrap();
        backend
            .copy_buffer_to_image(&mut commands, &upload, &layout, &image, &region(extent, 0))
            .unwrap();
        backend
            .transition_image(&mut commands, &image, &transition(0, ResourceState::TransferDst, ResourceState::TransferSrc))
            .unwrap();
        backend
            .copy_image_to_buffer(&mut commands, &image, &region(extent, 0), &readback, &layout)
            .unwrap();
        backend.submit_and_wait(commands).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(readback.binding.as_ref().unwrap().block.read_vec(0, 16).unwrap(), texels);
        assert_eq!(image.layout(0, 0), Some(ResourceState::TransferSrc));
        assert_eq!(backend.stats().transitions, 2);
    }

    #[test]
    fn blit_averages_two_by_two_blocks() {
        let backend = HeadlessBackend::new();
        let image = bound_image(&backend, Extent3D::new(2, 2, 1), 2);
        let block = &image.binding.as_ref().unwrap().block;
        block
            .write(0, &[0, 0, 0, 255, 100, 0, 0, 255, 0, 200, 0, 255, 100, 200, 40, 255])
            .unwrap();

        let mut commands = backend.begin_commands(None).unwrap();
        backend
            .transition_image(&mut commands, &image, &transition(0, ResourceState::Undefined, ResourceState::TransferSrc))
            .unwrap();
        backend
            .transition_image(&mut commands, &image, &transition(1, ResourceState::Undefined, ResourceState::TransferDst))
            .unwrap();
        backend.blit_mip_level(&mut commands, &image, 0, 1, 0).unwrap();
        backend.submit_and_wait(commands).unwrap();

        assert_eq!(block.read_vec(16, 4).unwrap(), vec![50, 100, 10, 255]);
        assert_eq!(backend.stats().blits, 1);
    }

    #[test]
    fn mismatched_barrier_is_rejected() {
        let backend = HeadlessBackend::new();
        let image = bound_image(&backend, Extent3D::new(2, 2, 1), 1);

        let mut commands = backend.begin_commands(None).unwrap();
        backend
            .transition_image(&mut commands, &image, &transition(0, ResourceState::TransferSrc, ResourceState::ShaderReadOnly))
            .unwrap();

        assert!(backend.submit_and_wait(commands).is_err());
    }

    #[test]
    fn lost_device_fails_submission() {
        let backend = HeadlessBackend::new();
        let commands = backend.begin_commands(None).unwrap();
        backend.lose_device();

        let err = backend.submit_and_wait(commands).unwrap_err();

        assert!(matches!(err, BackendError::DeviceLost(_)));
        assert_eq!(backend.stats().submits, 0);
    }
}
