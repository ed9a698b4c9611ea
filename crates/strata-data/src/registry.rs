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

//! Typed ownership tables for the objects of a render system.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use strata_core::renderer::api::*;
use strata_core::renderer::RenderError;

/// A handle type stored in an [`ObjectRegistry`].
pub trait RegistryKey: Copy + Eq + Hash + Debug {
    /// The kind of object the handle refers to.
    const KIND: ObjectKind;

    /// Builds a handle from its raw value.
    fn from_raw(raw: usize) -> Self;

    /// The raw value of the handle.
    fn raw(self) -> usize;
}

macro_rules! registry_keys {
    ($($id:ident => $kind:ident),* $(,)?) => {
        $(
            impl RegistryKey for $id {
                const KIND: ObjectKind = ObjectKind::$kind;

                fn from_raw(raw: usize) -> Self {
                    $id(raw)
                }

                fn raw(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

registry_keys! {
    BufferId => Buffer,
    TextureId => Texture,
    SamplerId => Sampler,
    RenderPassId => RenderPass,
    RenderTargetId => RenderTarget,
    ShaderId => Shader,
    PipelineLayoutId => PipelineLayout,
    PipelineStateId => PipelineState,
    QueryHeapId => QueryHeap,
    FenceId => Fence,
    BufferArrayId => BufferArray,
    ResourceHeapId => ResourceHeap,
    CommandBufferId => CommandBuffer,
    SwapChainId => SwapChain,
}

/// Maps handles of one kind to the records that own the native objects.
///
/// Handles come from a counter starting at 1 and are never reused, so a
/// handle becomes invalid exactly when its record is released.
#[derive(Debug)]
pub struct ObjectRegistry<K, V> {
    entries: BTreeMap<usize, V>,
    next_id: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K: RegistryKey, V> ObjectRegistry<K, V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
            _key: PhantomData,
        }
    }

    fn invalid(id: K) -> RenderError {
        RenderError::InvalidHandle {
            kind: K::KIND,
            id: id.raw(),
        }
    }

    /// Stores `value` and returns its new handle.
    pub fn take_ownership(&mut self, value: V) -> K {
        let raw = self.next_id;
        self.next_id += 1;
        self.entries.insert(raw, value);
        K::from_raw(raw)
    }

    /// Returns the record of `id`.
    pub fn get(&self, id: K) -> Result<&V, RenderError> {
        self.entries.get(&id.raw()).ok_or_else(|| Self::invalid(id))
    }

    /// Returns the record of `id` mutably.
    pub fn get_mut(&mut self, id: K) -> Result<&mut V, RenderError> {
        self.entries.get_mut(&id.raw()).ok_or_else(|| Self::invalid(id))
    }

    /// Returns `true` if `id` refers to a live record.
    pub fn contains(&self, id: K) -> bool {
        self.entries.contains_key(&id.raw())
    }

    /// Removes and returns the record of `id`.
    /// ## Errors
    /// * `RenderError::InvalidHandle` - If `id` is unknown or already released.
    pub fn release(&mut self, id: K) -> Result<V, RenderError> {
        self.entries.remove(&id.raw()).ok_or_else(|| Self::invalid(id))
    }

    /// Removes every record in creation order.
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(raw, value)| (K::from_raw(raw), value))
    }

    /// Iterates over live records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.entries.iter().map(|(raw, value)| (K::from_raw(*raw), value))
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no record is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: RegistryKey, V> Default for ObjectRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
