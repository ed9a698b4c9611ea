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

//! Command buffer and fence descriptors.

use crate::strata_bitflags;
use std::borrow::Cow;

strata_bitflags! {
    /// Creation flags of a command buffer.
    pub struct CommandBufferFlags: u32 {
        /// Recorded once and executed from a primary command buffer.
        const SECONDARY = 1 << 0;
        /// Can be submitted more than once after recording.
        const MULTI_SUBMIT = 1 << 1;
        /// Submitted automatically at the end of recording.
        const IMMEDIATE_SUBMIT = 1 << 2;
    }
}

/// A descriptor used to create a command buffer.
#[derive(Debug, Clone)]
pub struct CommandBufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Creation flags.
    pub flags: CommandBufferFlags,
    /// Number of native command buffers cycled through. Must be greater than zero.
    pub num_native_buffers: u32,
}

impl Default for CommandBufferDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            flags: CommandBufferFlags::EMPTY,
            num_native_buffers: 2,
        }
    }
}

/// An opaque handle to a command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandBufferId(pub usize);

/// A descriptor used to create a fence.
#[derive(Debug, Clone, Default)]
pub struct FenceDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The fence starts in the signaled state.
    pub signaled: bool,
}

/// An opaque handle to a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceId(pub usize);
