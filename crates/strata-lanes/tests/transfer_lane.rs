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

use std::sync::Arc;
use strata_core::math::{Extent3D, Origin3D};
use strata_core::renderer::api::{
    AllocatorConfig, BindFlags, BufferDescriptor, ClearValue, CpuAccessFlags, DataType, DeviceLimits,
    DstImageDescriptor, Format, ImageFormat, MiscFlags, ResourceState, SrcImageDescriptor,
    TextureDescriptor, TextureRegion, TextureSubresource, TextureType,
};
use strata_core::renderer::{ErrorKind, RenderError};
use strata_core::telemetry::ResourceMonitor;
use strata_data::DeviceMemoryAllocator;
use strata_infra::{HeadlessBackend, HeadlessConfig};
use strata_lanes::{BlitMipGenerator, CpuMipGenerator, MipGenerator, TransferLane};

const RED: [u8; 4] = [255, 0, 0, 255];

fn lane_with(config: HeadlessConfig) -> TransferLane<HeadlessBackend> {
    let device = Arc::new(HeadlessBackend::with_config(config));
    TransferLane::new(Arc::new(DeviceMemoryAllocator::new(device, AllocatorConfig::default())))
}

fn lane() -> TransferLane<HeadlessBackend> {
    lane_with(HeadlessConfig::default())
}

fn full_level(width: u32, height: u32, mip: u32) -> TextureRegion {
    TextureRegion {
        subresource: TextureSubresource::single(0, mip),
        offset: Origin3D::ZERO,
        extent: Extent3D::new(width, height, 1),
    }
}

fn read_rgba8(
    lane: &TransferLane<HeadlessBackend>,
    texture: &mut strata_data::TextureResource<HeadlessBackend>,
    region: &TextureRegion,
) -> Vec<[u8; 4]> {
    let mut out = vec![0u8; region.extent.volume() as usize * 4 * region.subresource.num_array_layers as usize];
    lane.read_texture(texture, region, &mut DstImageDescriptor::native(Format::RGBA8UNorm, &mut out))
        .unwrap();
    out.chunks_exact(4).map(|texel| [texel[0], texel[1], texel[2], texel[3]]).collect()
}

#[test]
fn buffer_created_with_data_reads_back_the_same_bytes() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let data: Vec<u8> = (0..=255).collect();

    // --- 2. ACT ---
    let buffer = lane
        .create_buffer(&BufferDescriptor::new(256, BindFlags::VERTEX_BUFFER), Some(&data))
        .unwrap();
    let mut out = vec![0u8; 256];
    lane.read_buffer(&buffer, 0, &mut out).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(out, data);
    assert!(buffer.staging().is_none());
    lane.release_buffer(buffer);
}

#[test]
fn writes_at_offsets_read_back_unchanged() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let mut buffer = lane
        .create_buffer(&BufferDescriptor::new(64, BindFlags::STORAGE), None)
        .unwrap();

    // --- 2. ACT ---
    lane.write_buffer(&mut buffer, 10, &[1, 2, 3, 4, 5]).unwrap();
    lane.write_buffer(&mut buffer, 60, &[9, 9, 9, 9]).unwrap();
    let mut middle = [0u8; 5];
    lane.read_buffer(&buffer, 10, &mut middle).unwrap();
    let mut tail = [0u8; 6];
    lane.read_buffer(&buffer, 58, &mut tail).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(middle, [1, 2, 3, 4, 5]);
    assert_eq!(tail, [0, 0, 9, 9, 9, 9]);
    lane.release_buffer(buffer);
}

#[test]
fn unaligned_buffer_ranges_round_trip_on_four_byte_copy_alignment() {
    // --- 1. ARRANGE ---
    let lane = lane_with(HeadlessConfig {
        limits: DeviceLimits {
            buffer_copy_alignment: 4,
            ..DeviceLimits::default()
        },
        ..HeadlessConfig::default()
    });
    let data: Vec<u8> = (0..10).collect();
    let descriptors = [
        BufferDescriptor::new(10, BindFlags::STORAGE),
        BufferDescriptor {
            cpu_access_flags: CpuAccessFlags::READ | CpuAccessFlags::WRITE,
            ..BufferDescriptor::new(10, BindFlags::STORAGE)
        },
    ];

    for desc in &descriptors {
        // --- 2. ACT ---
        let mut buffer = lane.create_buffer(desc, Some(&data)).unwrap();
        lane.write_buffer(&mut buffer, 3, &[100, 101, 102, 103, 104]).unwrap();
        let mut middle = [0u8; 7];
        lane.read_buffer(&buffer, 1, &mut middle).unwrap();
        let mut whole = [0u8; 10];
        lane.read_buffer(&buffer, 0, &mut whole).unwrap();

        // --- 3. ASSERT ---
        assert_eq!(middle, [1, 2, 100, 101, 102, 103, 104]);
        assert_eq!(whole, [0, 1, 2, 100, 101, 102, 103, 104, 8, 9]);
        lane.release_buffer(buffer);
    }
}

#[test]
fn cpu_write_buffer_keeps_its_staging_buffer() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = BufferDescriptor {
        cpu_access_flags: CpuAccessFlags::WRITE,
        ..BufferDescriptor::new(256, BindFlags::CONSTANT_BUFFER)
    };
    let mut buffer = lane.create_buffer(&desc, None).unwrap();
    let staging_id = buffer.staging().map(|staging| staging.id());
    assert!(staging_id.is_some());

    // --- 2. ACT ---
    lane.write_buffer(&mut buffer, 0, &[0x11; 256]).unwrap();
    let mut out = [0u8; 256];
    lane.read_buffer(&buffer, 0, &mut out).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(out, [0x11; 256]);
    assert_eq!(buffer.staging().map(|staging| staging.id()), staging_id);
    lane.release_buffer(buffer);
}

#[test]
fn releasing_a_buffer_frees_primary_and_staging_regions() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = BufferDescriptor {
        cpu_access_flags: CpuAccessFlags::READ,
        ..BufferDescriptor::new(128, BindFlags::STORAGE)
    };
    let buffer = lane.create_buffer(&desc, Some(&[3; 128])).unwrap();
    assert_eq!(lane.allocator().stats().live_regions, 2);

    // --- 2. ACT ---
    lane.release_buffer(buffer);

    // --- 3. ASSERT ---
    let stats = lane.allocator().stats();
    assert_eq!(stats.live_regions, 0);
    assert_eq!(stats.used_bytes, 0);
    assert_eq!(lane.device().stats().live_buffers, 0);
}

#[test]
fn solid_red_texture_reads_back_as_red() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let pixels = [RED; 16];
    let data: &[u8] = bytemuck::cast_slice(&pixels);
    let desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4);

    // --- 2. ACT ---
    let mut texture = lane
        .create_texture(&desc, Some(&SrcImageDescriptor::native(Format::RGBA8UNorm, data)), &BlitMipGenerator)
        .unwrap();
    let texels = read_rgba8(&lane, &mut texture, &full_level(4, 4, 0));

    // --- 3. ASSERT ---
    assert_eq!(texels.len(), 16);
    assert!(texels.iter().all(|texel| *texel == RED));
    assert_eq!(texture.tracker().state(0, 0), Some(ResourceState::ShaderReadOnly));
    lane.release_texture(texture);
}

#[test]
fn textures_without_data_are_filled_with_the_clear_color() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = TextureDescriptor {
        mip_levels: 0,
        clear_value: ClearValue {
            color: [0.0, 0.5, 1.0, 1.0],
            ..ClearValue::default()
        },
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 2)
    };

    // --- 2. ACT ---
    let mut texture = lane.create_texture(&desc, None, &BlitMipGenerator).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(texture.info().mip_levels, 3);
    for (mip, (width, height)) in [(4, 2), (2, 1), (1, 1)].into_iter().enumerate() {
        let texels = read_rgba8(&lane, &mut texture, &full_level(width, height, mip as u32));
        assert!(texels.iter().all(|texel| *texel == [0, 128, 255, 255]), "mip {mip}: {texels:?}");
    }
    lane.release_texture(texture);
}

#[test]
fn mismatched_image_data_fails_without_device_copies() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4);
    let short = [0u8; 60];
    let before = lane.device().stats();

    // --- 2. ACT ---
    let err = lane
        .create_texture(&desc, Some(&SrcImageDescriptor::native(Format::RGBA8UNorm, &short)), &BlitMipGenerator)
        .unwrap_err();

    // --- 3. ASSERT ---
    assert_eq!(err.kind(), ErrorKind::ImageDataSizeMismatch);
    assert!(matches!(err, RenderError::ImageDataSizeMismatch { expected: 64, actual: 60 }));
    let after = lane.device().stats();
    assert_eq!(after.copies, before.copies);
    assert_eq!(after.live_images, 0);
    assert_eq!(lane.allocator().stats().live_regions, 0);
}

#[test]
fn mip_counts_beyond_the_full_chain_are_rejected() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = TextureDescriptor {
        mip_levels: 40,
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4)
    };

    // --- 2. ACT ---
    let err = lane.create_texture(&desc, None, &BlitMipGenerator).unwrap_err();

    // --- 3. ASSERT ---
    assert!(matches!(err, RenderError::InvalidArgument(_)), "{err:?}");
    assert_eq!(lane.device().stats().live_images, 0);
    assert_eq!(lane.allocator().stats().live_regions, 0);
}

#[test]
fn region_written_to_one_layer_leaves_the_other_untouched() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let desc = TextureDescriptor {
        texture_type: TextureType::Texture2DArray,
        array_layers: 2,
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4)
    };
    let mut texture = lane.create_texture(&desc, None, &BlitMipGenerator).unwrap();
    let region = TextureRegion {
        subresource: TextureSubresource::single(1, 0),
        offset: Origin3D::new(1, 1, 0),
        extent: Extent3D::new(2, 2, 1),
    };
    let pixels = [RED; 4];

    // --- 2. ACT ---
    lane.write_texture(
        &mut texture,
        &region,
        &SrcImageDescriptor::native(Format::RGBA8UNorm, bytemuck::cast_slice(&pixels)),
    )
    .unwrap();
    let both_layers = TextureRegion {
        subresource: TextureSubresource::new(0, 2, 0, 1),
        ..full_level(4, 4, 0)
    };
    let texels = read_rgba8(&lane, &mut texture, &both_layers);

    // --- 3. ASSERT ---
    let (layer0, layer1) = texels.split_at(16);
    assert!(layer0.iter().all(|texel| *texel == [0, 0, 0, 0]));
    for y in 0..4 {
        for x in 0..4 {
            let inside = (1..3).contains(&x) && (1..3).contains(&y);
            let expected = if inside { RED } else { [0, 0, 0, 0] };
            assert_eq!(layer1[y * 4 + x], expected, "texel ({x}, {y})");
        }
    }
    lane.release_texture(texture);
}

#[test]
fn read_back_converts_to_the_requested_layout() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let rgb = [255u8, 0, 0].repeat(4);
    let mut texture = lane
        .create_texture(
            &TextureDescriptor::new_2d(Format::RGBA8UNorm, 2, 2),
            Some(&SrcImageDescriptor::new(ImageFormat::RGB, DataType::UInt8, &rgb)),
            &BlitMipGenerator,
        )
        .unwrap();
    let mut out = vec![0u8; 4 * 4 * 4];

    // --- 2. ACT ---
    lane.read_texture(
        &mut texture,
        &full_level(2, 2, 0),
        &mut DstImageDescriptor::new(ImageFormat::RGBA, DataType::Float32, &mut out),
    )
    .unwrap();

    // --- 3. ASSERT ---
    let floats: Vec<f32> = out.chunks_exact(4).map(bytemuck::pod_read_unaligned).collect();
    for texel in floats.chunks_exact(4) {
        assert_eq!(texel, [1.0, 0.0, 0.0, 1.0]);
    }
    lane.release_texture(texture);
}

#[test]
fn too_small_read_back_destination_is_rejected() {
    let lane = lane();
    let mut texture = lane
        .create_texture(&TextureDescriptor::new_2d(Format::RGBA8UNorm, 2, 2), None, &BlitMipGenerator)
        .unwrap();
    let copies = lane.device().stats().copies;

    let mut out = [0u8; 15];
    let err = lane
        .read_texture(&mut texture, &full_level(2, 2, 0), &mut DstImageDescriptor::native(Format::RGBA8UNorm, &mut out))
        .unwrap_err();

    assert!(matches!(err, RenderError::ImageDataSizeMismatch { expected: 16, actual: 15 }));
    assert_eq!(lane.device().stats().copies, copies);
    lane.release_texture(texture);
}

#[test]
fn padded_staging_rows_stay_invisible_to_callers() {
    // --- 1. ARRANGE ---
    let lane = lane_with(HeadlessConfig {
        limits: DeviceLimits {
            row_pitch_alignment: 256,
            ..DeviceLimits::default()
        },
        ..HeadlessConfig::default()
    });
    let pixels: Vec<[u8; 4]> = (0..12u8).map(|i| [i, i * 2, i * 3, 255]).collect();

    // --- 2. ACT ---
    let mut texture = lane
        .create_texture(
            &TextureDescriptor::new_2d(Format::RGBA8UNorm, 3, 4),
            Some(&SrcImageDescriptor::native(Format::RGBA8UNorm, bytemuck::cast_slice(&pixels))),
            &BlitMipGenerator,
        )
        .unwrap();
    let texels = read_rgba8(&lane, &mut texture, &full_level(3, 4, 0));

    // --- 3. ASSERT ---
    assert_eq!(texels, pixels);
    lane.release_texture(texture);
}

#[test]
fn blit_and_cpu_mip_generation_agree() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let pixels: Vec<[u8; 4]> = (0..16u8).map(|i| [i * 16, 255 - i * 16, i, 255]).collect();
    let desc = TextureDescriptor {
        mip_levels: 0,
        misc_flags: MiscFlags::GENERATE_MIPS,
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4)
    };
    let src = SrcImageDescriptor::native(Format::RGBA8UNorm, bytemuck::cast_slice(&pixels));
    let generators: [&dyn MipGenerator<HeadlessBackend>; 2] = [&BlitMipGenerator, &CpuMipGenerator];

    // --- 2. ACT ---
    let mut levels = Vec::new();
    for generator in generators {
        let mut texture = lane.create_texture(&desc, Some(&src), generator).unwrap();
        levels.push((
            read_rgba8(&lane, &mut texture, &full_level(2, 2, 1)),
            read_rgba8(&lane, &mut texture, &full_level(1, 1, 2)),
        ));
        let range = texture.info().full_range();
        assert_eq!(texture.tracker().uniform_state(&range), Some(ResourceState::ShaderReadOnly));
        lane.release_texture(texture);
    }

    // --- 3. ASSERT ---
    assert_eq!(levels[0], levels[1]);
    let (level1, _) = &levels[0];
    // Red of texels 0, 1, 4 and 5 is 0, 16, 64 and 80.
    assert_eq!(level1[0][0], 40);
}

#[test]
fn compressed_textures_skip_mip_generation() {
    let lane = lane();
    let desc = TextureDescriptor {
        mip_levels: 2,
        misc_flags: MiscFlags::GENERATE_MIPS,
        ..TextureDescriptor::new_2d(Format::BC1UNorm, 8, 8)
    };
    let blocks = [0xAAu8; 32];
    let blits = lane.device().stats().blits;

    let texture = lane
        .create_texture(&desc, Some(&SrcImageDescriptor::native(Format::BC1UNorm, &blocks)), &BlitMipGenerator)
        .unwrap();

    assert_eq!(lane.device().stats().blits, blits);
    lane.release_texture(texture);
}

#[test]
fn lost_device_is_fatal_and_leaves_state_untouched() {
    // --- 1. ARRANGE ---
    let lane = lane();
    let mut texture = lane
        .create_texture(&TextureDescriptor::new_2d(Format::RGBA8UNorm, 2, 2), None, &BlitMipGenerator)
        .unwrap();
    lane.device().lose_device();

    // --- 2. ACT ---
    let err = lane
        .write_texture(
            &mut texture,
            &full_level(2, 2, 0),
            &SrcImageDescriptor::native(Format::RGBA8UNorm, &[0u8; 16]),
        )
        .unwrap_err();

    // --- 3. ASSERT ---
    assert_eq!(err.kind(), ErrorKind::DeviceLost);
    assert!(err.is_fatal());
    assert_eq!(texture.tracker().state(0, 0), Some(ResourceState::ShaderReadOnly));
    assert_eq!(lane.staging().get_usage_report().current_bytes, 0);
    lane.release_texture(texture);
}
