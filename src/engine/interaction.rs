use serde::{Deserialize, Serialize};

use super::dsp::shaper::{shape, ShaperAlg};

/// How a Listener reacts to the group's Reference signal. Closed set;
/// dispatch is a plain match everywhere.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InteractionMode {
  Ducking,        // reference loud -> listener backs off
  Following,      // reference loud -> listener saturates harder
  Gating,         // reference loud -> listener goes quiet
  StereoBloom,    // reference loud -> listener widens
  Sympathetic,    // reference loud -> listener rings with harmonics
  TransientClone, // reference hits -> listener borrows the attack
  SpectralSculpt, // reference loud -> listener tightens its spectrum
  VoltageStarve,  // reference loud -> listener's supply sags
  EntropyStorm,   // reference active -> listener gets chaos
  HarmonicShield, // reference loud -> listener gets CLEANER
}

/// Per-block parameter deltas computed from the bus envelope. Each field is
/// a signed offset applied on top of the corresponding knob.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModulationTargets {
  pub drive_mod: f32,
  pub volume_mod: f32,
  pub punch_mod: f32,
  pub filter_mod: f32,
  pub mojo_mod: f32,
  pub blend_mod: f32,
}

impl ModulationTargets {
  pub fn is_active(&self) -> bool {
    self.drive_mod.abs() > 0.001
      || self.volume_mod.abs() > 0.001
      || self.punch_mod.abs() > 0.001
      || self.filter_mod.abs() > 0.001
      || self.mojo_mod.abs() > 0.001
      || self.blend_mod.abs() > 0.001
  }
}

/// Maps (mode, bus envelope, sensitivity) to parameter deltas.
/// envelope: 0..1 from the Reference side of the group.
pub fn modulation_targets(mode: InteractionMode, envelope: f32, sensitivity: f32) -> ModulationTargets {
  let mut t = ModulationTargets::default();
  let signal = envelope * sensitivity;

  match mode {
    InteractionMode::Ducking => {
      t.drive_mod = -0.5 * signal;
      t.volume_mod = -1.0 * signal;
    }
    InteractionMode::Following => {
      t.drive_mod = 1.0 * signal;
    }
    InteractionMode::Gating => {
      t.volume_mod = -1.0 * signal;
    }
    InteractionMode::StereoBloom => {
      // the widening itself happens in the mix stage; here only drive
      t.drive_mod = 0.3 * signal;
    }
    InteractionMode::Sympathetic => {
      t.drive_mod = 0.8 * signal;
      t.mojo_mod = 0.5 * signal;
    }
    InteractionMode::TransientClone => {
      t.punch_mod = 1.0 * signal;
    }
    InteractionMode::SpectralSculpt => {
      t.filter_mod = 1.0 * signal;
    }
    InteractionMode::VoltageStarve => {
      t.mojo_mod = 1.0 * signal;
      t.drive_mod = 0.2 * signal;
    }
    InteractionMode::EntropyStorm => {
      t.mojo_mod = 1.0 * signal;
    }
    InteractionMode::HarmonicShield => {
      t.blend_mod = -1.0 * signal;
    }
  }

  t
}

/// Rest/triggered shaper pair for one band. Ephemeral: recomputed per band
/// per block, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualShaperConfig {
  pub rest_alg: ShaperAlg,
  pub rest_drive: f32,
  pub triggered_alg: ShaperAlg,
  pub triggered_drive: f32,
}

impl DualShaperConfig {
  fn rest_only(alg: ShaperAlg) -> Self {
    Self { rest_alg: alg, rest_drive: 1.0, triggered_alg: alg, triggered_drive: 1.0 }
  }
}

/// Picks the rest/triggered configuration for a band. The rest state is
/// always the user's algorithm at unity scale; the triggered state is what
/// the mode pulls the band toward at full modulation. Band-limited modes
/// leave the other bands identical in both states.
pub fn configuration(mode: InteractionMode, band: usize, user_alg: ShaperAlg) -> DualShaperConfig {
  let mut cfg = DualShaperConfig::rest_only(user_alg);

  match mode {
    InteractionMode::Ducking => {
      // only the low bands soften their character; the level duck is global
      if band <= 2 {
        cfg.triggered_drive = 0.4;
      }
    }
    InteractionMode::Following => {
      cfg.triggered_drive = 1.6;
    }
    InteractionMode::Gating => {
      // purely a volume mode; the shaper stays put
    }
    InteractionMode::StereoBloom => {
      if band >= 3 {
        cfg.triggered_drive = 1.2;
      }
    }
    InteractionMode::Sympathetic => {
      if (1..=4).contains(&band) {
        cfg.triggered_alg = ShaperAlg::GoldenRatio;
        cfg.triggered_drive = 1.5;
      }
    }
    InteractionMode::TransientClone => {
      cfg.triggered_drive = 1.3;
    }
    InteractionMode::SpectralSculpt => {
      if band >= 3 {
        cfg.triggered_alg = ShaperAlg::EulerTube;
        cfg.triggered_drive = 1.25;
      } else {
        cfg.triggered_drive = 0.9;
      }
    }
    InteractionMode::VoltageStarve => {
      cfg.triggered_alg = ShaperAlg::EulerTube;
      cfg.triggered_drive = 1.4;
    }
    InteractionMode::EntropyStorm => {
      cfg.triggered_alg = ShaperAlg::Fibonacci;
      cfg.triggered_drive = 1.3;
    }
    InteractionMode::HarmonicShield => {
      cfg.triggered_alg = ShaperAlg::Clean;
    }
  }

  cfg
}

const MORPH_EPSILON: f32 = 0.01;

/// Cross-fades the rest and triggered shapers by `modulation` in 0..1.
/// Within MORPH_EPSILON of either endpoint only one branch is evaluated,
/// and the endpoints reproduce the single-shaper output exactly.
#[inline]
pub fn process_morph(input: f32, base_drive: f32, modulation: f32, cfg: &DualShaperConfig) -> f32 {
  let m = modulation.clamp(0.0, 1.0);

  if m < MORPH_EPSILON {
    return shape(input, base_drive * cfg.rest_drive, cfg.rest_alg);
  }
  if m > 1.0 - MORPH_EPSILON {
    return shape(input, base_drive * cfg.triggered_drive, cfg.triggered_alg);
  }

  let rest = shape(input, base_drive * cfg.rest_drive, cfg.rest_alg);
  let triggered = shape(input, base_drive * cfg.triggered_drive, cfg.triggered_alg);
  rest + m * (triggered - rest)
}
