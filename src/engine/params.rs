use serde::{Deserialize, Serialize};

use super::dsp::shaper::ShaperAlg;
use super::interaction::InteractionMode;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Role {
  Listener,
  Reference,
}

/// Immutable per-block control values. Built once per block by the host
/// binding layer from its parameter store and borrowed by the engine; the
/// engine never mutates or keeps it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControlSnapshot {
  // main controls
  pub drive: f32,       // 0..100 (%)
  pub mix: f32,         // 0..1
  pub output_gain: f32, // linear

  pub algorithm: ShaperAlg,
  pub cascade: bool,      // output-transformer stage after shaping
  pub delta_listen: bool, // audition mixed - dry

  // tone shaping
  pub tighten_hz: f32, // pre high-pass cutoff
  pub smooth_hz: f32,  // post low-pass cutoff
  pub dynamics: f32,   // 0..1, transient protection amount

  // punch & mojo
  pub punch: f32, // -1..1
  pub heat: f32,
  pub drift: f32,
  pub variance: f32,
  pub entropy: f32,
  pub noise: f32,
  pub focus: f32, // -1 (mid) .. +1 (side)

  // network
  pub mode: InteractionMode,
  pub role: Role,
  pub group: usize,
  pub depth: f32,       // 0..1
  pub sensitivity: f32, // 0..2
  pub smoothing: f32,   // 0..1
}

impl Default for ControlSnapshot {
  fn default() -> Self {
    Self {
      drive: 0.0,
      mix: 1.0,
      output_gain: 1.0,
      algorithm: ShaperAlg::GoldenRatio,
      cascade: false,
      delta_listen: false,
      tighten_hz: 10.0,
      smooth_hz: 22_000.0,
      dynamics: 0.5,
      punch: 0.0,
      heat: 0.0,
      drift: 0.0,
      variance: 0.0,
      entropy: 0.0,
      noise: 0.0,
      focus: 0.0,
      mode: InteractionMode::Ducking,
      role: Role::Listener,
      group: 0,
      depth: 1.0,
      sensitivity: 1.0,
      smoothing: 0.1,
    }
  }
}

impl ControlSnapshot {
  // "Clean zero" drive law. Below 20% the input gain stays at unity and the
  // clean/shaped blend fades in, so drive = 0 is bit-transparent; above 20%
  // the blend is pinned at 1 and the input gain ramps 1x..10x (+20 dB).
  pub fn drive_gain(&self) -> f32 {
    let d = self.drive.clamp(0.0, 100.0);
    if d < 20.0 {
      1.0
    } else {
      1.0 + ((d - 20.0) / 80.0) * 9.0
    }
  }

  pub fn saturation_blend(&self) -> f32 {
    let d = self.drive.clamp(0.0, 100.0);
    if d < 20.0 { d / 20.0 } else { 1.0 }
  }

  /// Listener smoothing time for bus values, mapped from the knob.
  pub fn network_smoothing_ms(&self) -> f32 {
    2.0 + self.smoothing.clamp(0.0, 1.0) * 48.0
  }
}
