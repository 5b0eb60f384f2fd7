use super::dsp::fir::Fir;
use super::fir_design;

pub const FACTOR: usize = 4;

// Half-band tap counts for the two x2 stages. Stage A runs at 2x (the
// steep one), stage B at 4x where the transition band is relaxed. Both
// counts are chosen so every decimation boundary lands on an even group
// delay and the round trip comes out to a whole number of base samples.
const STAGE_A_TAPS: usize = 63;
const STAGE_B_TAPS: usize = 29;

/// x4 oversampler built from a linear-phase half-band pair, mirrored on the
/// way down. Raises the rate before the nonlinear stages so their harmonics
/// land below Nyquist instead of aliasing back.
pub struct Oversampler {
  up_a: [Fir; 2],
  up_b: [Fir; 2],
  down_b: [Fir; 2],
  down_a: [Fir; 2],
  buf2x: [Vec<f32>; 2],
  max_block: usize,
  channels: usize,
  latency: f32,
}

impl Oversampler {
  pub fn new() -> Self {
    Self {
      up_a: std::array::from_fn(|_| Fir::new()),
      up_b: std::array::from_fn(|_| Fir::new()),
      down_b: std::array::from_fn(|_| Fir::new()),
      down_a: std::array::from_fn(|_| Fir::new()),
      buf2x: [Vec::new(), Vec::new()],
      max_block: 0,
      channels: 2,
      latency: 0.0,
    }
  }

  /// Rebuilds filters and scratch buffers. Not audio-thread safe; call from
  /// prepare() only.
  pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, channels: usize) {
    let sr = sample_rate.max(1.0);
    self.max_block = max_block_size.max(1);
    self.channels = channels.clamp(1, 2);

    // Half-band cutoff sits at a quarter of the rate each stage runs at.
    let a = fir_design::design_lowpass(STAGE_A_TAPS, (STAGE_A_TAPS - 1) / 2, sr / 2.0, sr * 2.0);
    let b = fir_design::design_lowpass(STAGE_B_TAPS, (STAGE_B_TAPS - 1) / 2, sr, sr * 4.0);

    // Interpolators get 2x gain to restore the energy zero-stuffing removes
    let a_up: Vec<f32> = a.iter().map(|&v| v * 2.0).collect();
    let b_up: Vec<f32> = b.iter().map(|&v| v * 2.0).collect();

    for ch in 0..2 {
      self.up_a[ch].set_coefficients(&a_up);
      self.up_b[ch].set_coefficients(&b_up);
      self.down_b[ch].set_coefficients(&b);
      self.down_a[ch].set_coefficients(&a);
      self.buf2x[ch].clear();
      self.buf2x[ch].resize(self.max_block * 2, 0.0);
    }

    // Group delay of the four symmetric stages, in base-rate samples:
    // stage A contributes (taps-1)/2 at 2x per pass, stage B at 4x.
    let a_delay = (STAGE_A_TAPS - 1) as f32 / 2.0 / 2.0;
    let b_delay = (STAGE_B_TAPS - 1) as f32 / 2.0 / 4.0;
    self.latency = 2.0 * (a_delay + b_delay);
  }

  pub fn reset(&mut self) {
    for ch in 0..2 {
      self.up_a[ch].reset();
      self.up_b[ch].reset();
      self.down_b[ch].reset();
      self.down_a[ch].reset();
      for v in self.buf2x[ch].iter_mut() { *v = 0.0; }
    }
  }

  /// Up/down round-trip latency in base-rate samples.
  pub fn latency_samples(&self) -> f32 { self.latency }

  /// Upsamples `num` input samples per channel into `output` (4*num samples).
  pub fn upsample(&mut self, input: &[&[f32]], output: &mut [Vec<f32>], num: usize) {
    let num = num.min(self.max_block);
    for ch in 0..input.len().min(self.channels) {
      let src = input[ch];
      let up_a = &mut self.up_a[ch];
      let mid = &mut self.buf2x[ch];
      for i in 0..num {
        mid[2 * i] = up_a.process(src[i]);
        mid[2 * i + 1] = up_a.process(0.0);
      }
      let up_b = &mut self.up_b[ch];
      let dst = &mut output[ch];
      for i in 0..num * 2 {
        dst[2 * i] = up_b.process(mid[i]);
        dst[2 * i + 1] = up_b.process(0.0);
      }
    }
  }

  /// Downsamples `num * 4` samples per channel from `input` back into
  /// `output` (num samples).
  pub fn downsample(&mut self, input: &[Vec<f32>], output: &mut [Vec<f32>], num: usize) {
    let num = num.min(self.max_block);
    for ch in 0..output.len().min(self.channels) {
      let src = &input[ch];
      let down_b = &mut self.down_b[ch];
      let mid = &mut self.buf2x[ch];
      for i in 0..num * 2 {
        let y0 = down_b.process(src[2 * i]);
        let _ = down_b.process(src[2 * i + 1]);
        mid[i] = y0;
      }
      let down_a = &mut self.down_a[ch];
      let dst = &mut output[ch];
      for i in 0..num {
        let y0 = down_a.process(mid[2 * i]);
        let _ = down_a.process(mid[2 * i + 1]);
        dst[i] = y0;
      }
    }
  }
}

impl Default for Oversampler {
  fn default() -> Self { Self::new() }
}
