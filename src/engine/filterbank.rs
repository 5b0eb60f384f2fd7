use serde::{Deserialize, Serialize};

use super::bus::NUM_BANDS;
use super::dsp::fir::Fir;
use super::fir_design;

/// Latency/quality trade-off of the crossover FIR set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PhaseMode {
  /// 128 taps cut from the linear design, 64 samples of latency.
  TruncatedLinear,
  /// Full 256-tap linear phase, 128 samples, best phase accuracy.
  FullLinear,
  /// 128-tap minimum-phase equivalent, lowest latency, non-flat phase.
  MinimumPhase,
}

impl PhaseMode {
  pub fn taps(self) -> usize {
    match self {
      PhaseMode::TruncatedLinear => 128,
      PhaseMode::FullLinear => 256,
      PhaseMode::MinimumPhase => 128,
    }
  }

  /// Reported latency at the bank's own rate.
  pub fn latency_samples(self) -> usize {
    match self {
      PhaseMode::TruncatedLinear => 64,
      PhaseMode::FullLinear => 128,
      PhaseMode::MinimumPhase => 32,
    }
  }

  // Tap index of the unit impulse in the complementary high band. The band
  // sum telescopes to a delta at exactly this tap.
  fn impulse_tap(self) -> usize {
    match self {
      PhaseMode::TruncatedLinear => 64,
      PhaseMode::FullLinear => 128,
      PhaseMode::MinimumPhase => 63,
    }
  }
}

/// Crossover frequency presets. With the prepare-time builder the non-default
/// sets are honored instead of collapsing to the default table.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CrossoverProfile {
  Default,
  BassHeavy,
  Vocal,
  Bright,
  Percussive,
  Synthetic,
  CymbalHeavy,
  MixComplex,
}

impl CrossoverProfile {
  pub fn frequencies(self) -> [f32; 5] {
    match self {
      CrossoverProfile::Default => [125.0, 300.0, 800.0, 2500.0, 5000.0],
      CrossoverProfile::BassHeavy => [80.0, 250.0, 600.0, 2200.0, 6000.0],
      CrossoverProfile::Vocal => [150.0, 400.0, 900.0, 3000.0, 8000.0],
      CrossoverProfile::Bright => [200.0, 600.0, 1200.0, 4000.0, 10_000.0],
      CrossoverProfile::Percussive => [100.0, 300.0, 700.0, 2800.0, 7000.0],
      CrossoverProfile::Synthetic => [180.0, 600.0, 1500.0, 5000.0, 12_000.0],
      CrossoverProfile::CymbalHeavy => [250.0, 800.0, 1600.0, 6000.0, 14_000.0],
      CrossoverProfile::MixComplex => [160.0, 500.0, 1000.0, 3500.0, 9000.0],
    }
  }
}

/// Broad material classes an external analyzer may report. The analyzer
/// itself lives outside the core; only the mapping to a crossover profile
/// is our business.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum MaterialType {
  Auto,
  KickHeavy,
  SnareHeavy,
  CymbalHeavy,
  VocalHeavy,
  BassHeavy,
  Percussive,
  Synthetic,
  MixComplex,
}

fn material_to_profile(material: MaterialType) -> CrossoverProfile {
  match material {
    MaterialType::KickHeavy | MaterialType::BassHeavy => CrossoverProfile::BassHeavy,
    MaterialType::SnareHeavy | MaterialType::Percussive => CrossoverProfile::Percussive,
    MaterialType::CymbalHeavy => CrossoverProfile::CymbalHeavy,
    MaterialType::VocalHeavy => CrossoverProfile::Vocal,
    MaterialType::Synthetic => CrossoverProfile::Synthetic,
    MaterialType::Auto | MaterialType::MixComplex => CrossoverProfile::MixComplex,
  }
}

/// Maps analyzed material to a crossover profile with hysteresis, so a
/// classifier that flickers between two classes cannot make the bank
/// rebuild its coefficients every block.
pub struct ProfileManager {
  current: CrossoverProfile,
  hysteresis: f32,
}

impl ProfileManager {
  pub fn new() -> Self {
    Self { current: CrossoverProfile::Default, hysteresis: 0.7 }
  }

  pub fn current(&self) -> CrossoverProfile { self.current }

  /// Feeds one classification; returns the profile to use.
  pub fn update(&mut self, material: MaterialType, confidence: f32) -> CrossoverProfile {
    if material == MaterialType::Auto {
      return self.current;
    }
    let proposed = material_to_profile(material);
    let switch = if confidence > 0.9 {
      true
    } else if confidence < 0.5 {
      false
    } else {
      confidence > self.hysteresis && proposed != self.current
    };
    if switch {
      self.current = proposed;
    }
    self.current
  }
}

impl Default for ProfileManager {
  fn default() -> Self { Self::new() }
}

#[derive(Clone, Copy, Debug)]
pub struct FilterBankConfig {
  pub phase_mode: PhaseMode,
  pub profile: CrossoverProfile,
  /// Rate the bank actually runs at (the oversampled rate in the engine).
  pub sample_rate: f32,
  pub max_block_size: usize,
  pub num_bands: usize,
}

impl Default for FilterBankConfig {
  fn default() -> Self {
    Self {
      phase_mode: PhaseMode::TruncatedLinear,
      profile: CrossoverProfile::Default,
      sample_rate: 48_000.0,
      max_block_size: 512,
      num_bands: NUM_BANDS,
    }
  }
}

/// 6-band complementary crossover. Band 0 = LP(f1), band i = LP(f_{i+1}) -
/// LP(f_i), band 5 = unit impulse - LP(f5); summing the bands reproduces the
/// input delayed by the impulse tap, to design tolerance.
pub struct FilterBank {
  config: FilterBankConfig,
  firs: [[Fir; NUM_BANDS]; 2],
  latency: usize,
}

impl FilterBank {
  pub fn new() -> Self {
    Self {
      config: FilterBankConfig::default(),
      firs: std::array::from_fn(|_| std::array::from_fn(|_| Fir::new())),
      latency: 0,
    }
  }

  pub fn prepare(&mut self, config: FilterBankConfig) {
    self.config = config;
    self.build();
  }

  pub fn config(&self) -> &FilterBankConfig { &self.config }

  /// Deterministic per-mode value, at the bank's rate.
  pub fn latency_samples(&self) -> usize { self.latency }

  /// Clears filter history without touching coefficients or allocating.
  pub fn reset(&mut self) {
    for ch in self.firs.iter_mut() {
      for f in ch.iter_mut() {
        f.reset();
      }
    }
  }

  fn build(&mut self) {
    let mode = self.config.phase_mode;
    let taps = mode.taps();
    let center = mode.impulse_tap();
    let freqs = self.config.profile.frequencies();
    let sr = self.config.sample_rate;

    // One linear-phase prototype per crossover point; the minimum-phase set
    // is folded from the same prototypes so magnitudes match across modes.
    let mut lp: Vec<Vec<f32>> = Vec::with_capacity(freqs.len());
    for &f in freqs.iter() {
      let linear = match mode {
        PhaseMode::FullLinear | PhaseMode::TruncatedLinear => {
          fir_design::design_lowpass(taps, center, f, sr)
        }
        PhaseMode::MinimumPhase => {
          let proto = fir_design::design_lowpass(taps, taps / 2, f, sr);
          fir_design::minimum_phase(&proto, taps)
        }
      };
      lp.push(linear);
    }

    let mut band = vec![0.0f32; taps];
    for ch in 0..2 {
      // band 0: plain lowpass at the first crossover
      self.firs[ch][0].set_coefficients(&lp[0]);

      // bands 1..4: difference of adjacent lowpasses
      for b in 1..NUM_BANDS - 1 {
        for i in 0..taps {
          band[i] = lp[b][i] - lp[b - 1][i];
        }
        self.firs[ch][b].set_coefficients(&band);
      }

      // band 5: complementary highpass, delta at the center tap minus the
      // top lowpass -- this is what makes the band sum telescope exactly
      for i in 0..taps {
        band[i] = if i == center { 1.0 - lp[4][i] } else { -lp[4][i] };
      }
      self.firs[ch][NUM_BANDS - 1].set_coefficients(&band);
    }

    self.latency = mode.latency_samples();
  }

  /// Splits `input` (channel-major, up to 2 channels) into `bands`. Blocks
  /// larger than the prepared maximum are processed only up to that size.
  pub fn split_into_bands(
    &mut self,
    input: &[&[f32]],
    bands: &mut [[Vec<f32>; 2]],
    num_samples: usize,
  ) {
    let num_ch = input.len().min(2);
    if num_ch == 0 {
      return;
    }

    let mut num = num_samples;
    if num > self.config.max_block_size {
      log::warn!(
        "filter bank got {} samples but was prepared for {}; clamping",
        num, self.config.max_block_size
      );
      num = self.config.max_block_size;
    }
    let num = num.min(input[0].len());

    for ch in 0..num_ch {
      let src = input[ch];
      for b in 0..self.config.num_bands.min(NUM_BANDS) {
        let dst = &mut bands[b][ch];
        dst[..num].copy_from_slice(&src[..num]);
        self.firs[ch][b].process_inplace(&mut dst[..num]);
      }
    }
  }
}

impl Default for FilterBank {
  fn default() -> Self { Self::new() }
}
