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

//! The transfer lane: staging-buffer mediated uploads and read-backs.
//!
//! Every transfer follows the same template: allocate staging memory, copy
//! the caller's bytes in, record the layout transitions and the device copy,
//! record the transitions back to the resting state, submit and wait, copy
//! the bytes out and release the staging memory. One-shot staging buffers are
//! held by [`ScopedStaging`](strata_data::ScopedStaging) guards, so they are
//! released on error paths too.

mod buffer;
mod image_data;
mod mapping;
mod texture;

pub use mapping::MappedBuffer;

use std::fmt;
use std::sync::Arc;
use strata_core::renderer::api::{ResourceState, TextureSubresource};
use strata_core::renderer::{RenderBackend, RenderError};
use strata_data::{BufferResource, DeviceMemoryAllocator, StagingBufferFactory, TextureResource};

/// Moves data between the CPU and device resources of one backend.
pub struct TransferLane<B: RenderBackend> {
    staging: Arc<StagingBufferFactory<B>>,
}

impl<B: RenderBackend> TransferLane<B> {
    /// Creates a lane drawing device and staging memory from `allocator`.
    pub fn new(allocator: Arc<DeviceMemoryAllocator<B>>) -> Self {
        Self {
            staging: Arc::new(StagingBufferFactory::new(allocator)),
        }
    }

    /// The allocator resources and staging buffers live in.
    pub fn allocator(&self) -> &Arc<DeviceMemoryAllocator<B>> {
        self.staging.allocator()
    }

    /// The staging buffer factory of the lane.
    pub fn staging(&self) -> &Arc<StagingBufferFactory<B>> {
        &self.staging
    }

    /// The backend device.
    pub fn device(&self) -> &B {
        self.staging.allocator().device()
    }

    /// Starts a command list.
    pub fn begin(&self, label: &str) -> Result<B::CommandList, RenderError> {
        Ok(self.device().begin_commands(Some(label))?)
    }

    /// Submits `commands` and blocks until the device executed them.
    /// ## Errors
    /// * `RenderError::DeviceLost` - If the device stopped responding. Fatal.
    pub fn submit(&self, commands: B::CommandList) -> Result<(), RenderError> {
        self.device().submit_and_wait(commands).map_err(|err| {
            let err = RenderError::from(err);
            if err.is_fatal() {
                log::error!("Transfer submission failed: {err}");
            }
            err
        })
    }

    /// Records the barriers that move `range` of `texture` into `state` and
    /// commits them to the texture's tracker.
    ///
    /// Subresources already in `state` get no barrier.
    pub fn record_transition(
        &self,
        commands: &mut B::CommandList,
        texture: &mut TextureResource<B>,
        range: &TextureSubresource,
        state: ResourceState,
    ) -> Result<(), RenderError> {
        let device = self.device();
        let (image, tracker) = texture.image_and_tracker();
        let transitions = tracker.plan_transition(range, state)?;
        for transition in &transitions {
            log::trace!(
                "Transition mips {:?} layers {:?}: {} -> {}",
                transition.subresource.mip_range(),
                transition.subresource.layer_range(),
                transition.old_state,
                transition.new_state
            );
            device.transition_image(commands, image, transition)?;
        }
        tracker.apply(&transitions)
    }

    /// Releases a buffer: memory regions first, then the native buffer.
    pub fn release_buffer(&self, buffer: BufferResource<B>) {
        buffer.release(&self.staging);
    }

    /// Releases a texture: its memory region first, then the native image.
    pub fn release_texture(&self, texture: TextureResource<B>) {
        texture.release(self.allocator());
    }
}

impl<B: RenderBackend> fmt::Debug for TransferLane<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferLane")
            .field("staging", &self.staging)
            .finish()
    }
}
