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

//! Backend-agnostic resource API.
//!
//! Plain data only: descriptors, handles, flags, and the format collaborator.
//!
//! - **Resources**: [`buffer`], [`texture`], [`sampler`], [`resource_heap`].
//! - **Pipeline objects**: [`shader`], [`pipeline`], [`render_pass`], [`render_target`].
//! - **Execution objects**: [`command`], [`query`], [`swap_chain`].
//! - **Memory and state**: [`memory`], [`state`], [`format`], [`image`].
//! - **Infrastructure**: [`backend`], [`object`], [`settings`].

pub mod backend;
pub mod buffer;
pub mod command;
pub mod flags;
pub mod format;
pub mod image;
pub mod memory;
pub mod object;
pub mod pipeline;
pub mod query;
pub mod render_pass;
pub mod render_target;
pub mod resource_heap;
pub mod sampler;
pub mod settings;
pub mod shader;
pub mod state;
pub mod swap_chain;
pub mod texture;

pub use self::backend::*;
pub use self::buffer::*;
pub use self::command::*;
pub use self::flags::*;
pub use self::format::*;
pub use self::image::{DstImageDescriptor, SrcImageDescriptor};
pub use self::memory::*;
pub use self::object::*;
pub use self::pipeline::*;
pub use self::query::*;
pub use self::render_pass::*;
pub use self::render_target::*;
pub use self::resource_heap::*;
pub use self::sampler::*;
pub use self::settings::*;
pub use self::shader::*;
pub use self::state::*;
pub use self::swap_chain::*;
pub use self::texture::*;
