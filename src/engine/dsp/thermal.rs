// One-pole "tube temperature": heats with signal energy, cools over ~250 ms.
// A hot tube shifts the operating point, which reads as even harmonics after
// the shaper. Temperature is clamped so no input can run it away.
#[derive(Clone, Copy)]
pub struct ThermalModel {
  cooling: f32,
  heating: f32,
  temperature: f32,
}

const MAX_TEMPERATURE: f32 = 1.0;
const BIAS_SCALE: f32 = 0.15;

impl ThermalModel {
  pub fn new(sr: f32) -> Self {
    let mut t = Self { cooling: 0.0, heating: 0.05, temperature: 0.0 };
    t.prepare(sr);
    t
  }

  pub fn prepare(&mut self, sr: f32) {
    self.cooling = (-1.0 / (0.25 * sr.max(1.0))).exp();
    self.heating = 0.05;
    self.temperature = 0.0;
  }

  pub fn reset(&mut self) { self.temperature = 0.0; }

  // Returns the bias offset for the current sample
  #[inline]
  pub fn process(&mut self, input: f32) -> f32 {
    let energy = input.abs();
    self.temperature += energy * self.heating;
    self.temperature *= self.cooling;
    if self.temperature > MAX_TEMPERATURE { self.temperature = MAX_TEMPERATURE; }
    self.temperature * BIAS_SCALE
  }

  pub fn temperature(&self) -> f32 { self.temperature }
}
