//! Multiband saturation engine with a lock-free cross-instance modulation
//! bus. Every instance runs its own oversampled 6-band signal path; instances
//! in the same process talk to each other through [`SignalBus`], so a kick
//! track can duck, gate or excite the saturation of a bass track without any
//! routing in the host.
//!
//! The host-facing surface is small: [`Engine::prepare`], [`Engine::process`],
//! [`Engine::latency_samples`] and a handful of metering getters. Parameter
//! binding, preset storage and visuals live outside this crate.

pub mod engine {
  pub mod band;
  pub mod bus;
  pub mod dsp;
  pub mod filterbank;
  pub mod fir_design;
  pub mod interaction;
  pub mod loudness;
  pub mod mix;
  pub mod netlink;
  pub mod oversampler;
  pub mod params;
  pub mod processor;
  pub mod tap;
}

pub use engine::bus::{process_bus, SignalBus, MAX_GROUPS, MAX_INSTANCES, NUM_BANDS};
pub use engine::dsp::shaper::ShaperAlg;
pub use engine::filterbank::{CrossoverProfile, MaterialType, PhaseMode, ProfileManager};
pub use engine::interaction::{
  configuration, modulation_targets, process_morph, DualShaperConfig, InteractionMode,
  ModulationTargets,
};
pub use engine::params::{ControlSnapshot, Role};
pub use engine::processor::Engine;
