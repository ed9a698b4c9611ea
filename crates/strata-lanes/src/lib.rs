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

//! # Strata Lanes
//!
//! Hot-path execution pipelines of the device resource layer.
//!
//! - [`transfer_lane`]: every byte moving between the CPU and device-local
//!   buffers and textures, through staging buffers and tracked layout
//!   transitions.
//! - [`mip_lane`]: mip-chain generation, as a service owned by the render
//!   system and handed to the transfer lane when a texture needs it.

#![warn(missing_docs)]

pub mod mip_lane;
pub mod transfer_lane;

pub use mip_lane::{default_mip_generator, BlitMipGenerator, CpuMipGenerator, MipGenerator};
pub use transfer_lane::{MappedBuffer, TransferLane};
