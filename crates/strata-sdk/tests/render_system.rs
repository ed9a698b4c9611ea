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

use std::borrow::Cow;
use strata_core::telemetry::ResourceMonitor;
use strata_sdk::prelude::*;

const RED: [u8; 4] = [255, 0, 0, 255];

fn system() -> RenderSystem<HeadlessBackend> {
    strata_sdk::headless_render_system(RenderSystemConfig::default(), HeadlessConfig::default())
}

fn debug_system() -> RenderSystem<HeadlessBackend> {
    let config = RenderSystemConfig {
        debug_layer: true,
        ..Default::default()
    };
    strata_sdk::headless_render_system(config, HeadlessConfig::default())
}

fn rgba8_texture(width: u32, height: u32, bind_flags: BindFlags) -> TextureDescriptor<'static> {
    TextureDescriptor {
        bind_flags,
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, width, height)
    }
}

fn read_rgba8(system: &mut RenderSystem<HeadlessBackend>, id: TextureId, region: &TextureRegion) -> Vec<[u8; 4]> {
    let mut out = vec![0u8; region.extent.volume() as usize * 4];
    system
        .read_texture(id, region, &mut DstImageDescriptor::native(Format::RGBA8UNorm, &mut out))
        .unwrap();
    out.chunks_exact(4).map(|texel| [texel[0], texel[1], texel[2], texel[3]]).collect()
}

fn shader(system: &mut RenderSystem<HeadlessBackend>, shader_type: ShaderType) -> ShaderId {
    system
        .create_shader(&ShaderDescriptor {
            label: None,
            shader_type,
            source: ShaderSource::Code(Cow::Borrowed("fn main() {}")),
            entry_point: Cow::Borrowed("main"),
        })
        .unwrap()
}

fn binding(slot: u32, binding_type: BindingType) -> BindingDescriptor {
    BindingDescriptor {
        slot,
        binding_type,
        stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
        array_size: 1,
    }
}

#[test]
fn buffer_round_trips_through_the_render_system() {
    // --- 1. ARRANGE ---
    let mut system = debug_system();
    let data: Vec<u8> = (0..64).collect();
    let buffer = system
        .create_buffer(&BufferDescriptor::new(64, BindFlags::STORAGE), Some(&data))
        .unwrap();

    // --- 2. ACT ---
    system.write_buffer(buffer, 8, &[0xAA; 4]).unwrap();
    let mut out = vec![0u8; 16];
    system.read_buffer(buffer, 0, &mut out).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(&out[..8], &data[..8]);
    assert_eq!(&out[8..12], &[0xAA; 4]);
    assert_eq!(&out[12..], &data[12..16]);
    assert!(system.buffer(buffer).unwrap().is_initialized());
    assert_eq!(system.buffer_info(buffer).unwrap().size, 64);
}

#[test]
fn cpu_write_constant_buffer_keeps_its_staging_id() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = BufferDescriptor {
        cpu_access_flags: CpuAccessFlags::WRITE,
        ..BufferDescriptor::new(256, BindFlags::CONSTANT_BUFFER)
    };
    let buffer = system.create_buffer(&desc, None).unwrap();
    let staging_id = system.buffer(buffer).unwrap().staging().map(|staging| staging.id());

    // --- 2. ACT ---
    system.write_buffer(buffer, 0, &[7; 256]).unwrap();
    let mut out = [0u8; 256];
    system.read_buffer(buffer, 0, &mut out).unwrap();

    // --- 3. ASSERT ---
    assert!(staging_id.is_some());
    assert_eq!(out, [7; 256]);
    assert_eq!(
        system.buffer(buffer).unwrap().staging().map(|staging| staging.id()),
        staging_id
    );
}

#[test]
fn default_services_generate_mips_on_a_shared_device() {
    // --- 1. ARRANGE ---
    let device = std::sync::Arc::new(HeadlessBackend::new());
    let mut system = RenderSystem::with_defaults(std::sync::Arc::clone(&device));
    let desc = TextureDescriptor {
        mip_levels: 0,
        misc_flags: MiscFlags::GENERATE_MIPS,
        ..rgba8_texture(4, 4, BindFlags::SAMPLED)
    };

    // --- 2. ACT ---
    let texture = system
        .create_texture(&desc, Some(&SrcImageDescriptor::native(Format::RGBA8UNorm, &[200u8; 64])))
        .unwrap();
    let smallest = read_rgba8(&mut system, texture, &TextureRegion::whole_level(&desc, 2));

    // --- 3. ASSERT ---
    assert_eq!(smallest, vec![[200; 4]]);
    assert!(device.stats().blits > 0);
}

#[test]
fn mapped_buffer_writes_reach_the_device_on_unmap() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = BufferDescriptor {
        cpu_access_flags: CpuAccessFlags::READ | CpuAccessFlags::WRITE,
        ..BufferDescriptor::new(16, BindFlags::STORAGE)
    };
    let buffer = system.create_buffer(&desc, Some(&[1; 16])).unwrap();

    // --- 2. ACT ---
    let mut mapped = system
        .map_buffer(buffer, CpuAccessFlags::READ | CpuAccessFlags::WRITE, Some(4..8))
        .unwrap();
    let mut before = [0u8; 4];
    mapped.read(0, &mut before).unwrap();
    mapped.write(0, &[9, 9, 9, 9]).unwrap();
    RenderSystem::unmap_buffer(mapped).unwrap();
    let mut out = [0u8; 16];
    system.read_buffer(buffer, 0, &mut out).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(before, [1; 4]);
    assert_eq!(&out[..4], &[1; 4]);
    assert_eq!(&out[4..8], &[9; 4]);
    assert_eq!(&out[8..], &[1; 8]);
    let gpu_only = system
        .create_buffer(&BufferDescriptor::new(16, BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let err = system.map_buffer(gpu_only, CpuAccessFlags::WRITE, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAccess);
}

#[test]
fn red_texture_reads_back_red() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let pixels: Vec<u8> = RED.repeat(16);
    let image = SrcImageDescriptor::native(Format::RGBA8UNorm, &pixels);

    // --- 2. ACT ---
    let texture = system
        .create_texture(&rgba8_texture(4, 4, BindFlags::SAMPLED), Some(&image))
        .unwrap();
    let region = TextureRegion::whole_level(&rgba8_texture(4, 4, BindFlags::SAMPLED), 0);
    let texels = read_rgba8(&mut system, texture, &region);

    // --- 3. ASSERT ---
    assert_eq!(texels, vec![RED; 16]);
    assert_eq!(
        system.texture(texture).unwrap().tracker().state(0, 0),
        Some(ResourceState::ShaderReadOnly)
    );
}

#[test]
fn texture_without_data_is_filled_with_its_clear_color() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = TextureDescriptor {
        clear_value: ClearValue {
            color: [0.0, 0.0, 1.0, 1.0],
            ..Default::default()
        },
        ..rgba8_texture(2, 2, BindFlags::SAMPLED)
    };

    // --- 2. ACT ---
    let texture = system.create_texture(&desc, None).unwrap();
    let texels = read_rgba8(&mut system, texture, &TextureRegion::whole_level(&desc, 0));

    // --- 3. ASSERT ---
    assert_eq!(texels, vec![[0, 0, 255, 255]; 4]);
}

#[test]
fn short_image_data_is_rejected_before_any_copy() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = rgba8_texture(4, 4, BindFlags::SAMPLED);
    let texture = system.create_texture(&desc, None).unwrap();
    let copies_before = system.device().stats().copies;

    // --- 2. ACT ---
    let short = [0u8; 8];
    let result = system.write_texture(
        texture,
        &TextureRegion::whole_level(&desc, 0),
        &SrcImageDescriptor::native(Format::RGBA8UNorm, &short),
    );

    // --- 3. ASSERT ---
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ImageDataSizeMismatch);
    assert_eq!(system.device().stats().copies, copies_before);
}

#[test]
fn generate_mips_fills_every_level_from_the_base() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = TextureDescriptor {
        mip_levels: 0,
        bind_flags: BindFlags::SAMPLED | BindFlags::COLOR_ATTACHMENT,
        ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 4)
    };
    let texture = system.create_texture(&desc, None).unwrap();
    let pixels = RED.repeat(16);
    system
        .write_texture(
            texture,
            &TextureRegion::whole_level(&desc, 0),
            &SrcImageDescriptor::native(Format::RGBA8UNorm, &pixels),
        )
        .unwrap();

    // --- 2. ACT ---
    system.generate_mips(texture).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(system.texture_info(texture).unwrap().mip_levels, 3);
    let smallest = read_rgba8(&mut system, texture, &TextureRegion::whole_level(&desc, 2));
    assert_eq!(smallest, vec![RED]);
}

#[test]
fn invalid_descriptors_do_no_device_work() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let stats_before = system.device().stats();

    // --- 2. ACT ---
    let empty_buffer = system.create_buffer(&BufferDescriptor::new(0, BindFlags::VERTEX_BUFFER), None);
    let mixed_flags = system.create_buffer(
        &BufferDescriptor::new(16, BindFlags::VERTEX_BUFFER | BindFlags::COLOR_ATTACHMENT),
        None,
    );
    let cube = system.create_texture(
        &TextureDescriptor {
            texture_type: TextureType::TextureCube,
            array_layers: 6,
            ..TextureDescriptor::new_2d(Format::RGBA8UNorm, 4, 2)
        },
        None,
    );
    let sampler = system.create_sampler(&SamplerDescriptor {
        lod_min_clamp: 4.0,
        lod_max_clamp: 1.0,
        ..Default::default()
    });

    // --- 3. ASSERT ---
    for result in [empty_buffer.map(|_| ()), mixed_flags.map(|_| ())] {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    }
    assert_eq!(cube.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(sampler.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(system.device().stats(), stats_before);
    assert_eq!(system.allocator().stats().live_regions, 0);
}

#[test]
fn released_handles_are_invalid() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let buffer = system
        .create_buffer(&BufferDescriptor::new(16, BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let sampler = system.create_sampler(&SamplerDescriptor::default()).unwrap();

    // --- 2. ACT ---
    system.release_buffer(buffer).unwrap();
    system.release_sampler(sampler).unwrap();

    // --- 3. ASSERT ---
    let write = system.write_buffer(buffer, 0, &[1]).unwrap_err();
    assert!(matches!(
        write,
        RenderError::InvalidHandle { kind: ObjectKind::Buffer, .. }
    ));
    assert_eq!(write.kind(), ErrorKind::InvalidUsage);
    assert!(system.release_buffer(buffer).is_err());
    assert!(system.release_sampler(sampler).is_err());
    assert_eq!(system.object_count(ObjectKind::Buffer), 0);
    assert_eq!(system.device().stats().live_buffers, 0);
    assert_eq!(system.device().stats().live_objects, 0);
}

#[test]
fn render_target_allocates_and_releases_its_depth_stencil() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let color = system
        .create_texture(&rgba8_texture(64, 32, BindFlags::SAMPLED | BindFlags::COLOR_ATTACHMENT), None)
        .unwrap();
    let pass = system
        .create_render_pass(&RenderPassDescriptor {
            color_attachments: vec![AttachmentFormatDescriptor {
                format: Format::RGBA8UNorm,
                load_op: AttachmentLoadOp::Clear,
                store_op: AttachmentStoreOp::Store,
            }],
            ..Default::default()
        })
        .unwrap();

    // --- 2. ACT ---
    let target = system
        .create_render_target(&RenderTargetDescriptor {
            label: Some("main".into()),
            render_pass: Some(pass),
            resolution: Extent2D::new(64, 32),
            samples: 1,
            attachments: vec![
                AttachmentDescriptor::color(color),
                AttachmentDescriptor::internal_depth_stencil(),
            ],
        })
        .unwrap();

    // --- 3. ASSERT ---
    let depth = system.render_target_depth_stencil(target).unwrap().unwrap();
    assert_eq!(depth.info().format, Format::D24UNormS8UInt);
    assert_eq!(depth.info().extent, Extent3D::new(64, 32, 1));
    assert_eq!(system.render_target_resolution(target).unwrap(), Extent2D::new(64, 32));
    assert_eq!(system.device().stats().live_images, 2);

    system.release_render_target(target).unwrap();
    assert_eq!(system.device().stats().live_images, 1);
    assert_eq!(system.object_count(ObjectKind::Texture), 1);
}

#[test]
fn render_target_rejects_mismatched_attachments() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let sampled_only = system
        .create_texture(&rgba8_texture(16, 16, BindFlags::SAMPLED), None)
        .unwrap();
    let small = system
        .create_texture(&rgba8_texture(8, 8, BindFlags::COLOR_ATTACHMENT), None)
        .unwrap();
    let target = |texture| RenderTargetDescriptor {
        resolution: Extent2D::new(16, 16),
        attachments: vec![AttachmentDescriptor::color(texture)],
        ..Default::default()
    };

    // --- 2. ACT ---
    let wrong_flags = system.create_render_target(&target(sampled_only));
    let too_small = system.create_render_target(&target(small));
    let two_depths = system.create_render_target(&RenderTargetDescriptor {
        resolution: Extent2D::new(16, 16),
        attachments: vec![
            AttachmentDescriptor::internal_depth_stencil(),
            AttachmentDescriptor::internal_depth_stencil(),
        ],
        ..Default::default()
    });

    // --- 3. ASSERT ---
    assert!(matches!(wrong_flags, Err(RenderError::InvalidState(_))));
    assert_eq!(too_small.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(two_depths.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(system.object_count(ObjectKind::RenderTarget), 0);
    assert_eq!(system.device().stats().live_images, 2);
}

#[test]
fn pipeline_states_check_their_shaders_and_layout() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let vertex = shader(&mut system, ShaderType::Vertex);
    let fragment = shader(&mut system, ShaderType::Fragment);
    let compute = shader(&mut system, ShaderType::Compute);
    let layout = system
        .create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bindings: vec![binding(0, BindingType::ConstantBuffer)],
        })
        .unwrap();

    // --- 2. ACT ---
    let graphics = system.create_pipeline_state(&PipelineStateDescriptor::Graphics(
        GraphicsPipelineDescriptor {
            layout: Some(layout),
            vertex_shader: Some(vertex),
            fragment_shader: Some(fragment),
            ..Default::default()
        },
    ));
    let swapped = system.create_pipeline_state(&PipelineStateDescriptor::Graphics(
        GraphicsPipelineDescriptor {
            vertex_shader: Some(fragment),
            ..Default::default()
        },
    ));
    let compute_pso = system.create_pipeline_state(&PipelineStateDescriptor::Compute(
        ComputePipelineDescriptor {
            compute_shader: Some(compute),
            ..Default::default()
        },
    ));
    system.release_shader(compute).unwrap();
    let stale = system.create_pipeline_state(&PipelineStateDescriptor::Compute(
        ComputePipelineDescriptor {
            compute_shader: Some(compute),
            ..Default::default()
        },
    ));

    // --- 3. ASSERT ---
    assert!(graphics.is_ok());
    assert_eq!(swapped.unwrap_err().kind(), ErrorKind::Validation);
    assert!(compute_pso.is_ok());
    assert!(matches!(
        stale,
        Err(RenderError::InvalidHandle { kind: ObjectKind::Shader, .. })
    ));
    assert_eq!(system.object_count(ObjectKind::PipelineState), 2);
}

#[test]
fn resource_heaps_validate_and_update_their_views() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let layout = system
        .create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bindings: vec![binding(0, BindingType::ConstantBuffer), binding(1, BindingType::Sampler)],
        })
        .unwrap();
    let constants = system
        .create_buffer(&BufferDescriptor::new(256, BindFlags::CONSTANT_BUFFER), None)
        .unwrap();
    let vertices = system
        .create_buffer(&BufferDescriptor::new(256, BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let sampler = system.create_sampler(&SamplerDescriptor::default()).unwrap();
    let other_sampler = system.create_sampler(&SamplerDescriptor::default()).unwrap();

    // --- 2. ACT ---
    let heap = system
        .create_resource_heap(&ResourceHeapDescriptor {
            label: None,
            pipeline_layout: layout,
            num_resource_views: 4,
            initial_views: Vec::new(),
        })
        .unwrap();
    let written = system
        .write_resource_heap(
            heap,
            0,
            &[
                ResourceViewDescriptor::whole(ResourceRef::Buffer(constants)),
                ResourceViewDescriptor::whole(ResourceRef::Sampler(sampler)),
            ],
        )
        .unwrap();
    system
        .write_resource_heap(heap, 3, &[ResourceViewDescriptor::whole(ResourceRef::Sampler(other_sampler))])
        .unwrap();
    let wrong_flags = system.write_resource_heap(
        heap,
        2,
        &[ResourceViewDescriptor::whole(ResourceRef::Buffer(vertices))],
    );
    let out_of_range = system.write_resource_heap(
        heap,
        3,
        &[
            ResourceViewDescriptor::whole(ResourceRef::Sampler(sampler)),
            ResourceViewDescriptor::whole(ResourceRef::Sampler(sampler)),
        ],
    );
    let odd_size = system.create_resource_heap(&ResourceHeapDescriptor {
        label: None,
        pipeline_layout: layout,
        num_resource_views: 3,
        initial_views: Vec::new(),
    });

    // --- 3. ASSERT ---
    assert_eq!(written, 2);
    let views = system.resource_heap_views(heap).unwrap();
    assert_eq!(views.len(), 4);
    assert_eq!(views[1], Some(ResourceViewDescriptor::whole(ResourceRef::Sampler(sampler))));
    assert_eq!(views[2], None);
    assert_eq!(views[3], Some(ResourceViewDescriptor::whole(ResourceRef::Sampler(other_sampler))));
    assert_eq!(wrong_flags.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(out_of_range.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(odd_size.unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn buffer_arrays_need_a_shared_binding_category() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let a = system
        .create_buffer(&BufferDescriptor::new(64, BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let b = system
        .create_buffer(&BufferDescriptor::new(64, BindFlags::VERTEX_BUFFER | BindFlags::COPY_DST), None)
        .unwrap();
    let index = system
        .create_buffer(&BufferDescriptor::new(64, BindFlags::INDEX_BUFFER), None)
        .unwrap();

    // --- 2. ACT ---
    let array = system.create_buffer_array(&[a, b]).unwrap();
    let mixed = system.create_buffer_array(&[a, index]);
    let empty = system.create_buffer_array(&[]);

    // --- 3. ASSERT ---
    assert_eq!(system.buffer_array_buffers(array).unwrap(), &[a, b]);
    assert_eq!(system.buffer_array_bind_flags(array).unwrap(), BindFlags::VERTEX_BUFFER);
    assert_eq!(mixed.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(empty.unwrap_err().kind(), ErrorKind::Validation);

    system.release_buffer_array(array).unwrap();
    assert_eq!(system.object_count(ObjectKind::Buffer), 3);
}

#[test]
fn execution_objects_validate_their_flags() {
    // --- 1. ARRANGE ---
    let mut system = system();

    // --- 2. ACT ---
    let queries = system
        .create_query_heap(&QueryHeapDescriptor {
            query_type: QueryType::TimeElapsed,
            num_queries: 8,
            ..Default::default()
        })
        .unwrap();
    let bad_condition = system.create_query_heap(&QueryHeapDescriptor {
        query_type: QueryType::TimeElapsed,
        render_condition: true,
        ..Default::default()
    });
    let commands = system
        .create_command_buffer(&CommandBufferDescriptor {
            flags: CommandBufferFlags::MULTI_SUBMIT,
            ..Default::default()
        })
        .unwrap();
    let bad_commands = system.create_command_buffer(&CommandBufferDescriptor {
        flags: CommandBufferFlags::IMMEDIATE_SUBMIT | CommandBufferFlags::SECONDARY,
        ..Default::default()
    });
    let fence = system.create_fence(&FenceDescriptor::default()).unwrap();
    let swap_chain = system.create_swap_chain(&SwapChainDescriptor::default()).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(system.query_heap_info(queries).unwrap(), (QueryType::TimeElapsed, 8));
    assert_eq!(bad_condition.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(system.command_buffer_flags(commands).unwrap(), CommandBufferFlags::MULTI_SUBMIT);
    assert_eq!(bad_commands.unwrap_err().kind(), ErrorKind::Validation);
    system.release_fence(fence).unwrap();
    system.release_swap_chain(swap_chain).unwrap();
    assert_eq!(system.device().stats().live_objects, 2);
}

#[test]
fn shutdown_releases_everything_once() {
    // --- 1. ARRANGE ---
    let mut system = debug_system();
    let buffer = system
        .create_buffer(&BufferDescriptor::new(64, BindFlags::CONSTANT_BUFFER), None)
        .unwrap();
    let texture = system
        .create_texture(&rgba8_texture(8, 8, BindFlags::SAMPLED | BindFlags::COLOR_ATTACHMENT), None)
        .unwrap();
    let vertex = shader(&mut system, ShaderType::Vertex);
    let layout = system
        .create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bindings: vec![binding(0, BindingType::ConstantBuffer)],
        })
        .unwrap();
    system
        .create_pipeline_state(&PipelineStateDescriptor::Graphics(GraphicsPipelineDescriptor {
            layout: Some(layout),
            vertex_shader: Some(vertex),
            ..Default::default()
        }))
        .unwrap();
    system
        .create_render_target(&RenderTargetDescriptor {
            resolution: Extent2D::new(8, 8),
            attachments: vec![
                AttachmentDescriptor::color(texture),
                AttachmentDescriptor::internal_depth_stencil(),
            ],
            ..Default::default()
        })
        .unwrap();
    system
        .create_resource_heap(&ResourceHeapDescriptor {
            label: None,
            pipeline_layout: layout,
            num_resource_views: 0,
            initial_views: vec![ResourceViewDescriptor::whole(ResourceRef::Buffer(buffer))],
        })
        .unwrap();
    system.create_buffer_array(&[buffer]).unwrap();

    // --- 2. ACT ---
    system.shutdown();
    system.shutdown();

    // --- 3. ASSERT ---
    assert!(system.is_shut_down());
    for kind in ObjectKind::ALL {
        assert_eq!(system.object_count(kind), 0, "{kind} left after shutdown");
    }
    let stats = system.device().stats();
    assert_eq!(stats.live_buffers, 0);
    assert_eq!(stats.live_images, 0);
    assert_eq!(stats.live_objects, 0);
    assert_eq!(stats.live_allocations, 0);
    let late = system.create_buffer(&BufferDescriptor::new(16, BindFlags::VERTEX_BUFFER), None);
    assert!(matches!(late, Err(RenderError::InvalidState(_))));
    assert!(system.release_buffer(buffer).is_err());
}

#[test]
fn resource_monitors_report_device_and_staging_memory() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let monitors = system.resource_monitors();
    let desc = BufferDescriptor {
        cpu_access_flags: CpuAccessFlags::READ,
        ..BufferDescriptor::new(1024, BindFlags::STORAGE)
    };

    // --- 2. ACT ---
    let buffer = system.create_buffer(&desc, None).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(monitors.len(), 2);
    for monitor in &monitors {
        assert!(monitor.get_usage_report().current_bytes >= 1024, "{}", monitor.monitor_id());
    }
    system.release_buffer(buffer).unwrap();
    assert_eq!(monitors[1].get_usage_report().current_bytes, 0);
}

#[test]
fn typed_constants_survive_a_dynamic_buffer() {
    // --- 1. ARRANGE ---
    let mut system = system();
    let desc = BufferDescriptor {
        misc_flags: MiscFlags::DYNAMIC_USAGE,
        ..BufferDescriptor::new(64, BindFlags::CONSTANT_BUFFER)
    };
    let buffer = system.create_buffer(&desc, None).unwrap();
    let matrix: [f32; 16] = std::array::from_fn(|i| i as f32 * 0.5);

    // --- 2. ACT ---
    system.write_buffer(buffer, 0, bytemuck::cast_slice(&matrix)).unwrap();
    let mut out = [0f32; 16];
    system.read_buffer(buffer, 0, bytemuck::cast_slice_mut(&mut out)).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(out, matrix);
}
