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

use super::resource_factory::NativeResourceFactory;
use crate::renderer::api::{StateTransition, TexelCopyLayout, TextureRegion};
use crate::renderer::error::BackendError;

/// Records transfer commands and submits them to the device.
///
/// Commands are recorded into a [`CommandRecorder::CommandList`] and take effect
/// only when the list is submitted. Image commands expect the addressed
/// subresources to be in the state the preceding transitions put them in:
/// `TransferDst` for copy destinations, `TransferSrc` for copy sources.
pub trait CommandRecorder: NativeResourceFactory {
    /// A list of recorded commands.
    type CommandList: Send;

    /// Starts a new command list.
    fn begin_commands(&self, label: Option<&str>) -> Result<Self::CommandList, BackendError>;

    /// Records a copy of `size` bytes between two buffers.
    fn copy_buffer(
        &self,
        commands: &mut Self::CommandList,
        src: &Self::Buffer,
        src_offset: u64,
        dst: &Self::Buffer,
        dst_offset: u64,
        size: u64,
    ) -> Result<(), BackendError>;

    /// Records a copy from buffer texels laid out as `layout` into `region` of `dst`.
    fn copy_buffer_to_image(
        &self,
        commands: &mut Self::CommandList,
        src: &Self::Buffer,
        layout: &TexelCopyLayout,
        dst: &Self::Image,
        region: &TextureRegion,
    ) -> Result<(), BackendError>;

    /// Records a copy from `region` of `src` into buffer texels laid out as `layout`.
    fn copy_image_to_buffer(
        &self,
        commands: &mut Self::CommandList,
        src: &Self::Image,
        region: &TextureRegion,
        dst: &Self::Buffer,
        layout: &TexelCopyLayout,
    ) -> Result<(), BackendError>;

    /// Records a layout transition barrier.
    fn transition_image(
        &self,
        commands: &mut Self::CommandList,
        image: &Self::Image,
        transition: &StateTransition,
    ) -> Result<(), BackendError>;

    /// Records a filtered blit of mip `src_level` into mip `src_level + 1`
    /// for the given layers. The source level must be in `TransferSrc`, the
    /// destination level in `TransferDst`.
    fn blit_mip_level(
        &self,
        commands: &mut Self::CommandList,
        image: &Self::Image,
        base_layer: u32,
        num_layers: u32,
        src_level: u32,
    ) -> Result<(), BackendError>;

    /// Returns `true` if [`CommandRecorder::blit_mip_level`] is available.
    fn supports_mip_blit(&self) -> bool {
        true
    }

    /// Submits the commands and blocks until the device executed them.
    /// ## Errors
    /// * `BackendError::DeviceLost` - If the device stopped responding. Not retryable.
    fn submit_and_wait(&self, commands: Self::CommandList) -> Result<(), BackendError>;
}
