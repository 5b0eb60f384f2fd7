use std::f32::consts::PI;

// RBJ biquad, transposed direct form II
#[derive(Clone, Copy)]
pub struct Biquad {
  b0: f32,
  b1: f32,
  b2: f32,
  a1: f32,
  a2: f32,
  z1: f32,
  z2: f32,
}

impl Biquad {
  pub fn new() -> Self { Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0, z1: 0.0, z2: 0.0 } }

  pub fn reset(&mut self) { self.z1 = 0.0; self.z2 = 0.0; }

  fn apply(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
    self.b0 = b0 / a0;
    self.b1 = b1 / a0;
    self.b2 = b2 / a0;
    self.a1 = a1 / a0;
    self.a2 = a2 / a0;
  }

  pub fn set_highpass(&mut self, sr: f32, freq: f32, q: f32) {
    let w0 = 2.0 * PI * (freq / sr).clamp(1.0e-5, 0.49);
    let alpha = w0.sin() / (2.0 * q.max(0.1));
    let cosw0 = w0.cos();
    let b1 = -(1.0 + cosw0);
    let b0 = -b1 * 0.5;
    self.apply(b0, b1, b0, 1.0 + alpha, -2.0 * cosw0, 1.0 - alpha);
  }

  pub fn set_lowpass(&mut self, sr: f32, freq: f32, q: f32) {
    let w0 = 2.0 * PI * (freq / sr).clamp(1.0e-5, 0.49);
    let alpha = w0.sin() / (2.0 * q.max(0.1));
    let cosw0 = w0.cos();
    let b1 = 1.0 - cosw0;
    let b0 = b1 * 0.5;
    self.apply(b0, b1, b0, 1.0 + alpha, -2.0 * cosw0, 1.0 - alpha);
  }

  // gain is linear amplitude of the shelf plateau
  pub fn set_high_shelf(&mut self, sr: f32, freq: f32, q: f32, gain: f32) {
    let a = gain.max(1.0e-3).sqrt();
    let w0 = 2.0 * PI * (freq / sr).clamp(1.0e-5, 0.49);
    let cosw0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q.max(0.1));
    let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
    let b0 = a * ((a + 1.0) + (a - 1.0) * cosw0 + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cosw0);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cosw0 - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cosw0 + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cosw0);
    let a2 = (a + 1.0) - (a - 1.0) * cosw0 - two_sqrt_a_alpha;
    self.apply(b0, b1, b2, a0, a1, a2);
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    let y = self.b0 * x + self.z1;
    self.z1 = self.b1 * x - self.a1 * y + self.z2;
    self.z2 = self.b2 * x - self.a2 * y;
    y
  }
}
