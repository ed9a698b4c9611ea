use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use strata_core::renderer::api::{AllocatorConfig, MemoryPropertyFlags, MemoryRequirements};
use strata_data::DeviceMemoryAllocator;
use strata_infra::headless::HeadlessBackend;

fn requirements(size: u64) -> MemoryRequirements {
    MemoryRequirements {
        size,
        alignment: 256,
        memory_type_bits: !0,
        prefers_dedicated: false,
        driver_managed: false,
    }
}

fn bench_allocator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Device Memory Allocator");

    for reduce_fragmentation in [false, true] {
        let allocator = DeviceMemoryAllocator::new(
            Arc::new(HeadlessBackend::new()),
            AllocatorConfig {
                min_chunk_size: 4 * 1024 * 1024,
                reduce_fragmentation,
            },
        );
        let name = if reduce_fragmentation {
            "Allocate/Release 256 regions (merging)"
        } else {
            "Allocate/Release 256 regions (split)"
        };

        group.bench_function(name, |b| {
            b.iter(|| {
                let regions: Vec<_> = (0..256u64)
                    .filter_map(|i| {
                        allocator
                            .allocate(&requirements(512 + (i % 7) * 1024), MemoryPropertyFlags::DEVICE_LOCAL)
                            .ok()
                    })
                    .collect();
                black_box(regions.len());
                for region in regions {
                    allocator.release(region);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_allocator);
criterion_main!(benches);
