use super::dsp::dc::DcBlocker;
use super::dsp::delay_line::DelayLine;
use super::dsp::smooth::Smooth;
use super::loudness::LoudnessMatcher;

const SQRT2_INV: f32 = std::f32::consts::FRAC_1_SQRT_2;

// Soft-knee limiter constants: -0.1 dBFS threshold, 10:1 above it, 0.5 "dB"
// of knee in linear terms.
const LIMIT_THRESHOLD: f32 = 0.989;
const LIMIT_KNEE: f32 = 0.5;
const LIMIT_RATIO: f32 = 10.0;

fn soft_limit(mut x: f32) -> f32 {
  if x > LIMIT_THRESHOLD {
    let over = x - LIMIT_THRESHOLD;
    if over < LIMIT_KNEE {
      let ratio_adj = 1.0 + (LIMIT_RATIO - 1.0) * (over / LIMIT_KNEE);
      x = LIMIT_THRESHOLD + over / ratio_adj;
    } else {
      x = LIMIT_THRESHOLD + LIMIT_KNEE / LIMIT_RATIO + (over - LIMIT_KNEE) / LIMIT_RATIO;
    }
  } else if x < -LIMIT_THRESHOLD {
    let over = -x - LIMIT_THRESHOLD;
    if over < LIMIT_KNEE {
      let ratio_adj = 1.0 + (LIMIT_RATIO - 1.0) * (over / LIMIT_KNEE);
      x = -LIMIT_THRESHOLD - over / ratio_adj;
    } else {
      x = -(LIMIT_THRESHOLD + LIMIT_KNEE / LIMIT_RATIO + (over - LIMIT_KNEE) / LIMIT_RATIO);
    }
  }
  x
}

// Mid/side drive scalars for the focus knob, -1 (mid only) .. +1 (side only),
// with make-up on whichever side stays dominant.
fn focus_scalars(f: f32) -> (f32, f32) {
  let mut m = 1.0;
  let mut s = 1.0;
  if f < 0.0 {
    s = 1.0 + f;
  } else if f > 0.0 {
    m = 1.0 - f;
  }
  if f != 0.0 {
    let make_up = 1.0 + f.abs() * 0.5;
    if m > 0.5 { m *= make_up; }
    if s > 0.5 { s *= make_up; }
  }
  (m.max(0.0), s.max(0.0))
}

/// Final stage: delay-compensated dry blend, loudness-matched wet, optional
/// mid/side focus, DC cleanup and the hard safety clamp.
pub struct MixEngine {
  dry_delay: [DelayLine; 2],
  matcher: LoudnessMatcher,
  dc: [DcBlocker; 2],
  smooth_mix: Smooth,
  smooth_gain: Smooth,
  smooth_focus: Smooth,
  delay_samples: f32,
  initialized: bool,
}

impl MixEngine {
  pub fn new(sample_rate: f32, max_delay: usize) -> Self {
    let sr = sample_rate.max(1.0);
    Self {
      dry_delay: [DelayLine::new(max_delay), DelayLine::new(max_delay)],
      matcher: LoudnessMatcher::new(sr),
      dc: [DcBlocker::new(sr); 2],
      smooth_mix: Smooth::new(sr, 20.0),
      smooth_gain: Smooth::new(sr, 20.0),
      smooth_focus: Smooth::new(sr, 20.0),
      delay_samples: 0.0,
      initialized: false,
    }
  }

  /// Re-sizes the dry delay (1 s of headroom at the new rate) and resets
  /// everything. Allocates, so prepare-time only.
  pub fn prepare(&mut self, sample_rate: f32, max_delay: usize) {
    let sr = sample_rate.max(1.0);
    self.dry_delay = [DelayLine::new(max_delay), DelayLine::new(max_delay)];
    self.matcher.prepare(sr);
    for d in self.dc.iter_mut() { d.set_sample_rate(sr); d.reset(); }
    self.smooth_mix.set_tau(sr, 20.0);
    self.smooth_gain.set_tau(sr, 20.0);
    self.smooth_focus.set_tau(sr, 20.0);
    self.reset();
  }

  pub fn reset(&mut self) {
    for d in self.dry_delay.iter_mut() { d.reset(); }
    self.matcher.reset();
    for d in self.dc.iter_mut() { d.reset(); }
    self.initialized = false;
  }

  /// Pushed by the latency calibrator whenever the budget changes.
  pub fn set_latency_samples(&mut self, samples: f32) {
    let samples = samples.max(0.0);
    log::debug!("dry delay set to {samples:.3} samples");
    self.delay_samples = samples;
    for d in self.dry_delay.iter_mut() { d.set_delay(samples); }
  }

  pub fn latency_samples(&self) -> f32 { self.delay_samples }

  /// Blends the delayed dry reference into the wet buffer in place.
  #[allow(clippy::too_many_arguments)]
  pub fn process(
    &mut self,
    wet: &mut [Vec<f32>],
    dry: &[&[f32]],
    num_samples: usize,
    num_channels: usize,
    target_mix: f32,
    target_gain: f32,
    target_focus: f32,
    delta_listen: bool,
  ) {
    let num_ch = num_channels.clamp(1, 2).min(wet.len()).min(dry.len());
    if num_ch == 0 { return; }
    let num = num_samples.min(wet[0].len()).min(dry[0].len());

    if !self.initialized {
      self.smooth_mix.snap(target_mix);
      self.smooth_gain.snap(target_gain);
      self.smooth_focus.snap(target_focus);
      self.initialized = true;
    } else if (self.smooth_gain.y - target_gain).abs() > 0.1 {
      // big output jumps (automation, tests) snap instead of fading
      self.smooth_gain.snap(target_gain);
    }

    for i in 0..num {
      let mix = self.smooth_mix.next(target_mix).clamp(0.0, 1.0);
      let gain = self.smooth_gain.next(target_gain);
      let focus = self.smooth_focus.next(target_focus).clamp(-1.0, 1.0);

      let dry_l = self.dry_delay[0].process(dry[0][i]);
      let dry_r = if num_ch > 1 { self.dry_delay[1].process(dry[1][i]) } else { dry_l };

      let mut wet_l = wet[0][i];
      let mut wet_r = if num_ch > 1 { wet[1][i] } else { wet_l };

      // loudness match the wet path against the time-aligned dry
      let compensation = self.matcher.process(dry_l, dry_r, wet_l, wet_r);
      wet_l *= compensation;
      wet_r *= compensation;

      let (mut out_l, mut out_r) = if delta_listen {
        // what the engine adds: the mix result minus the dry reference
        (mix * (wet_l - dry_l), mix * (wet_r - dry_r))
      } else {
        (
          dry_l * (1.0 - mix) + wet_l * mix,
          dry_r * (1.0 - mix) + wet_r * mix,
        )
      };

      if focus.abs() > 0.001 && num_ch > 1 {
        // orthonormal M/S keeps energy: L^2 + R^2 == M^2 + S^2
        let mid = (out_l + out_r) * SQRT2_INV;
        let side = (out_l - out_r) * SQRT2_INV;
        let (m_scale, s_scale) = focus_scalars(focus);
        let mid = mid * m_scale;
        let side = side * s_scale;
        out_l = (mid + side) * SQRT2_INV;
        out_r = (mid - side) * SQRT2_INV;
      }

      out_l = self.dc[0].process(out_l);
      if num_ch > 1 { out_r = self.dc[1].process(out_r); }

      out_l *= gain;
      out_r *= gain;

      // last safety net
      out_l = soft_limit(out_l).clamp(-1.0, 1.0);
      out_r = soft_limit(out_r).clamp(-1.0, 1.0);

      wet[0][i] = out_l;
      if num_ch > 1 { wet[1][i] = out_r; }
    }
  }
}
