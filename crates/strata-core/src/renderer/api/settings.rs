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

//! Configuration of a render system.

use serde::{Deserialize, Serialize};

/// Configuration of the device memory allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Smallest chunk requested from the device. Larger requests get a
    /// dedicated chunk.
    pub min_chunk_size: u64,
    /// Merge adjacent free blocks on release and return empty chunks to the
    /// device immediately.
    pub reduce_fragmentation: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: 1024 * 1024,
            reduce_fragmentation: false,
        }
    }
}

/// Configuration of a render system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSystemConfig {
    /// Name used in log messages.
    pub label: String,
    /// Device memory allocator settings.
    pub allocator: AllocatorConfig,
    /// Log warnings about suspicious but legal usage.
    pub debug_layer: bool,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            label: "strata".to_owned(),
            allocator: AllocatorConfig::default(),
            debug_layer: false,
        }
    }
}

impl RenderSystemConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            RenderSystemConfig::from_json_str(r#"{ "allocator": { "reduce_fragmentation": true } }"#)
                .unwrap();
        assert!(config.allocator.reduce_fragmentation);
        assert_eq!(config.allocator.min_chunk_size, 1024 * 1024);
        assert_eq!(config.label, "strata");
        assert!(!config.debug_layer);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(RenderSystemConfig::from_json_str("{ not json").is_err());
    }
}
