// Instant attack, exponential release. The release default (150 ms) is tuned
// for modulation-feel rather than metering accuracy.
#[derive(Clone, Copy)]
pub struct EnvelopeFollower {
  value: f32,
  release: f32,
}

impl EnvelopeFollower {
  pub fn new(sr: f32) -> Self {
    let mut e = Self { value: 0.0, release: 0.0 };
    e.reset(sr);
    e
  }

  pub fn reset(&mut self, sr: f32) {
    self.release = (-1.0 / (0.15 * sr.max(1.0))).exp();
    self.value = 0.0;
  }

  #[inline]
  pub fn process(&mut self, input: f32) -> f32 {
    let abs_in = input.abs();
    if abs_in > self.value {
      self.value = abs_in;
    } else {
      self.value = self.value * self.release + abs_in * (1.0 - self.release);
    }
    self.value
  }

  pub fn current(&self) -> f32 { self.value }
}
