use std::f32::consts::TAU;

#[derive(Clone, Copy)]
pub struct DriftValues {
  pub drive_mult_l: f32,
  pub drive_mult_r: f32,
}

// Slow, non-synchronous per-channel drive wobble. The two LFO rates are
// deliberately non-integer multiples (0.1 Hz / 0.143 Hz) so the channels
// never lock step. At full depth the multiplier floats +/-5%.
#[derive(Clone, Copy)]
pub struct StereoVariance {
  phase_l: f32,
  phase_r: f32,
  inc_l: f32,
  inc_r: f32,
}

impl StereoVariance {
  pub fn new(sr: f32) -> Self {
    let mut v = Self { phase_l: 0.0, phase_r: 0.0, inc_l: 0.0, inc_r: 0.0 };
    v.prepare(sr);
    v
  }

  pub fn prepare(&mut self, sr: f32) {
    let sr = sr.max(1.0);
    self.inc_l = TAU * 0.1 / sr;
    self.inc_r = TAU * 0.143 / sr;
    self.phase_l = 0.0;
    self.phase_r = 2.0; // start offset so the channels diverge immediately
  }

  #[inline]
  pub fn drift(&mut self, amount: f32) -> DriftValues {
    self.phase_l += self.inc_l;
    if self.phase_l > TAU { self.phase_l -= TAU; }
    self.phase_r += self.inc_r;
    if self.phase_r > TAU { self.phase_r -= TAU; }

    let scale = 0.05 * amount;
    DriftValues {
      drive_mult_l: 1.0 + self.phase_l.sin() * scale,
      drive_mult_r: 1.0 + self.phase_r.sin() * scale,
    }
  }

  // Cross-channel bleed, max 1% leakage. Glues the stereo image the way
  // current leakage between channels of one unit does.
  #[inline]
  pub fn apply_crosstalk(l: &mut f32, r: &mut f32, amount: f32) {
    if amount < 0.01 { return; }
    let bleed = amount * 0.01;
    let old_l = *l;
    let old_r = *r;
    *l = old_l * (1.0 - bleed) + old_r * bleed;
    *r = old_r * (1.0 - bleed) + old_l * bleed;
  }
}
