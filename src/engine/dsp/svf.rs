use std::f32::consts::PI;

/// TPT state-variable filter, one channel. Stable under per-sample cutoff
/// modulation, which is why the tone-shaping stage uses it.
#[derive(Clone)]
pub struct Svf {
  ic1eq: f32,
  ic2eq: f32,
  g: f32,
  k: f32,
}

impl Svf {
  pub fn new() -> Self { Self { ic1eq: 0.0, ic2eq: 0.0, g: 0.1, k: 1.0 } }

  pub fn reset(&mut self) { self.ic1eq = 0.0; self.ic2eq = 0.0; }

  pub fn set_params(&mut self, cutoff: f32, q: f32, sr: f32) {
    let fc = (cutoff / sr).clamp(1.0e-5, 0.49);
    self.g = (PI * fc).tan();
    self.k = 1.0 / q.max(0.001);
  }

  /// Returns (lp, hp).
  #[inline]
  pub fn process(&mut self, x: f32) -> (f32, f32) {
    let g = self.g; let k = self.k;
    let v1 = (self.ic1eq + g * (x - self.ic2eq)) / (1.0 + g * (g + k));
    let v2 = self.ic2eq + g * v1;
    self.ic1eq = 2.0 * v1 - self.ic1eq;
    self.ic2eq = 2.0 * v2 - self.ic2eq;
    let lp = v2;
    let hp = x - k * v1 - lp;
    (lp, hp)
  }

  #[inline]
  pub fn lowpass(&mut self, x: f32) -> f32 { self.process(x).0 }
  #[inline]
  pub fn highpass(&mut self, x: f32) -> f32 { self.process(x).1 }
}
