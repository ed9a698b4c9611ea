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

//! Per-subresource state tracking of textures.
//!
//! Every texture owns one [`ResourceStateTracker`]. The tracker plans the
//! minimal set of barriers needed to move a subresource range into a new
//! state; the caller records them and then commits them with
//! [`ResourceStateTracker::apply`].

use strata_core::renderer::api::{BindFlags, ResourceState, StateTransition, TextureSubresource};
use strata_core::renderer::RenderError;

/// The state a texture rests in between transfers.
///
/// Sampled textures rest in `ShaderReadOnly`; attachment-only textures rest
/// in their attachment state. `TransferSrc` is never a resting state.
pub fn steady_state(bind_flags: BindFlags) -> ResourceState {
    if bind_flags.contains(BindFlags::SAMPLED) || bind_flags.contains(BindFlags::STORAGE) {
        ResourceState::ShaderReadOnly
    } else if bind_flags.contains(BindFlags::DEPTH_STENCIL_ATTACHMENT) {
        ResourceState::DepthStencilAttachment
    } else if bind_flags.contains(BindFlags::COLOR_ATTACHMENT) {
        ResourceState::ColorAttachment
    } else {
        ResourceState::ShaderReadOnly
    }
}

/// Tracks the [`ResourceState`] of every (mip level, array layer) pair of a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStateTracker {
    mip_levels: u32,
    array_layers: u32,
    /// Indexed by `mip * array_layers + layer`.
    states: Vec<ResourceState>,
}

impl ResourceStateTracker {
    /// Creates a tracker with every subresource `Undefined`.
    pub fn new(mip_levels: u32, array_layers: u32) -> Self {
        Self {
            mip_levels,
            array_layers,
            states: vec![ResourceState::Undefined; (mip_levels * array_layers) as usize],
        }
    }

    /// Number of tracked mip levels.
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Number of tracked array layers.
    pub fn array_layers(&self) -> u32 {
        self.array_layers
    }

    /// The range covering every tracked subresource.
    pub fn full_range(&self) -> TextureSubresource {
        TextureSubresource::new(0, self.array_layers, 0, self.mip_levels)
    }

    fn index(&self, mip_level: u32, array_layer: u32) -> usize {
        (mip_level * self.array_layers + array_layer) as usize
    }

    /// The state of one subresource, `None` if out of range.
    pub fn state(&self, mip_level: u32, array_layer: u32) -> Option<ResourceState> {
        if mip_level < self.mip_levels && array_layer < self.array_layers {
            Some(self.states[self.index(mip_level, array_layer)])
        } else {
            None
        }
    }

    /// The common state of a range, `None` if the range is mixed.
    pub fn uniform_state(&self, range: &TextureSubresource) -> Option<ResourceState> {
        let mut states = range
            .mip_range()
            .flat_map(|mip| range.layer_range().map(move |layer| (mip, layer)))
            .filter_map(|(mip, layer)| self.state(mip, layer));
        let first = states.next()?;
        states.all(|s| s == first).then_some(first)
    }

    fn check_range(&self, range: &TextureSubresource) -> Result<(), RenderError> {
        if range.is_empty()
            || range.mip_range().end > self.mip_levels
            || range.layer_range().end > self.array_layers
        {
            return Err(RenderError::InvalidArgument(format!(
                "subresource range {range:?} exceeds {} mip level(s) and {} layer(s)",
                self.mip_levels, self.array_layers
            )));
        }
        Ok(())
    }

    /// Computes the barriers that move `range` into `new_state`: one per mip
    /// level and contiguous run of layers sharing an old state. Subresources
    /// already in `new_state` are skipped.
    /// ## Errors
    /// * `RenderError::InvalidArgument` - If the range is out of bounds or
    ///   `new_state` is `Undefined`.
    pub fn plan_transition(
        &self,
        range: &TextureSubresource,
        new_state: ResourceState,
    ) -> Result<Vec<StateTransition>, RenderError> {
        if new_state == ResourceState::Undefined {
            return Err(RenderError::InvalidArgument(
                "cannot transition a subresource into the undefined state".to_owned(),
            ));
        }
        self.check_range(range)?;

        let mut transitions = Vec::new();
        for mip in range.mip_range() {
            let mut run: Option<(u32, ResourceState)> = None;
            for layer in range.layer_range() {
                let old_state = self.states[self.index(mip, layer)];
                match run {
                    Some((_, run_state)) if run_state == old_state => {}
                    _ => {
                        if let Some((start, run_state)) = run.take() {
                            push_run(&mut transitions, mip, start, layer, run_state, new_state);
                        }
                        run = Some((layer, old_state));
                    }
                }
            }
            if let Some((start, run_state)) = run {
                push_run(&mut transitions, mip, start, range.layer_range().end, run_state, new_state);
            }
        }
        Ok(transitions)
    }

    /// Commits recorded transitions.
    /// ## Errors
    /// * `RenderError::InvalidState` - If a subresource is not in the
    ///   transition's old state. Nothing is committed in that case.
    pub fn apply(&mut self, transitions: &[StateTransition]) -> Result<(), RenderError> {
        for transition in transitions {
            self.require(&transition.subresource, transition.old_state)?;
        }
        for transition in transitions {
            for mip in transition.subresource.mip_range() {
                for layer in transition.subresource.layer_range() {
                    let index = self.index(mip, layer);
                    self.states[index] = transition.new_state;
                }
            }
            log::trace!(
                "{} -> {} for mips {:?}, layers {:?}",
                transition.old_state,
                transition.new_state,
                transition.subresource.mip_range(),
                transition.subresource.layer_range()
            );
        }
        Ok(())
    }

    /// Verifies every subresource of `range` is in `state`.
    /// ## Errors
    /// * `RenderError::InvalidState` - If one is not.
    pub fn require(&self, range: &TextureSubresource, state: ResourceState) -> Result<(), RenderError> {
        self.check_range(range)?;
        for mip in range.mip_range() {
            for layer in range.layer_range() {
                let current = self.states[self.index(mip, layer)];
                if current != state {
                    return Err(RenderError::InvalidState(format!(
                        "mip {mip} layer {layer} is {current} but {state} is required"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn push_run(
    transitions: &mut Vec<StateTransition>,
    mip: u32,
    start: u32,
    end: u32,
    old_state: ResourceState,
    new_state: ResourceState,
) {
    if old_state != new_state {
        transitions.push(StateTransition {
            subresource: TextureSubresource::new(start, end - start, mip, 1),
            old_state,
            new_state,
        });
    }
}
