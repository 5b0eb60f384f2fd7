// Supply-rail sag from session-wide load. Sag builds fast (10 ms) and
// recovers slow (100 ms), like capacitor reserve draining. The returned
// multiplier raises effective drive: starved rails clip earlier.
#[derive(Clone, Copy)]
pub struct VoltageRegulator {
  attack: f32,
  release: f32,
  sag: f32,
}

impl VoltageRegulator {
  pub fn new(sr: f32) -> Self {
    let mut v = Self { attack: 0.0, release: 0.0, sag: 0.0 };
    v.prepare(sr);
    v
  }

  pub fn prepare(&mut self, sr: f32) {
    let sr = sr.max(1.0);
    self.attack = (-1.0 / (0.01 * sr)).exp();
    self.release = (-1.0 / (0.1 * sr)).exp();
    self.sag = 0.0;
  }

  pub fn reset(&mut self) { self.sag = 0.0; }

  // global_heat: summed energy of every live instance (1.0 ~ one track at 0 dB)
  // amount: 0..1 depth knob
  #[inline]
  pub fn process(&mut self, global_heat: f32, amount: f32) -> f32 {
    let target = global_heat * 0.1;
    if target > self.sag {
      self.sag = self.sag * self.attack + target * (1.0 - self.attack);
    } else {
      self.sag = self.sag * self.release + target * (1.0 - self.release);
    }
    let starvation = 1.0 + self.sag * amount * 0.5;
    starvation.min(1.5)
  }
}
