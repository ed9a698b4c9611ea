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

//! Information a backend reports about itself.

/// A backend-agnostic representation of a graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsBackendType {
    /// The software backend without a device.
    Headless,
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// OpenGL API.
    OpenGL,
    /// WebGPU API.
    WebGpu,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// Who manages the device memory of buffers and images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryModel {
    /// Memory is allocated explicitly and bound to resources by the allocator.
    Explicit,
    /// The driver allocates memory of device-local resources itself.
    DriverManaged,
}

/// Description of a backend and its device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Short name of the backend implementation.
    pub name: String,
    /// The graphics API driven by the backend.
    pub backend_type: GraphicsBackendType,
    /// Name of the device.
    pub device_name: String,
    /// The memory model of the backend.
    pub memory_model: MemoryModel,
}
