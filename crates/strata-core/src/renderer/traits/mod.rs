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

//! Defines the capability traits a graphics backend implements.
//!
//! The resource manager and the transfer pipeline are written once against
//! these contracts:
//!
//! - [`DeviceMemory`]: memory types, allocation and host mapping.
//! - [`NativeResourceFactory`]: native buffers, images and opaque objects.
//! - [`CommandRecorder`]: copies, layout transitions, blits and submission.
//! - [`RenderBackend`]: the union of the three, what a render system needs.

mod command_recorder;
mod device_memory;
mod render_backend;
mod resource_factory;

pub use self::command_recorder::CommandRecorder;
pub use self::device_memory::DeviceMemory;
pub use self::render_backend::RenderBackend;
pub use self::resource_factory::NativeResourceFactory;
