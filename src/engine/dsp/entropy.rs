// Xorshift32: lock-free, constant-time, good enough for audio texture.
#[derive(Clone, Copy)]
pub struct Xorshift32 { state: u32 }

impl Xorshift32 {
  pub fn new(seed: u32) -> Self { Self { state: if seed == 0 { 0xCAFE_BABE } else { seed } } }

  #[inline]
  pub fn next_u32(&mut self) -> u32 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    self.state = x;
    x
  }

  /// Uniform in -1..1.
  #[inline]
  pub fn next_bipolar(&mut self) -> f32 {
    let f = self.next_u32() as f32 * 2.3283064365386963e-10;
    f * 2.0 - 1.0
  }
}

// Smoothed random-walk DC drift. The target moves every ~5-10 ms (randomized
// interval so it never turns periodic), then gets low-passed to ~20 ms. The
// output is a small operating-point wander, not audible noise by itself.
#[derive(Clone, Copy)]
pub struct EntropyDrift {
  rng: Xorshift32,
  smoothing: f32,
  current: f32,
  target: f32,
  steps: u32,
  interval: u32,
}

const DRIFT_SCALE: f32 = 0.15;

impl EntropyDrift {
  pub fn new(sr: f32, seed: u32) -> Self {
    let mut d = Self {
      rng: Xorshift32::new(seed),
      smoothing: 0.0,
      current: 0.0,
      target: 0.0,
      steps: 0,
      interval: 256,
    };
    d.prepare(sr);
    d
  }

  pub fn prepare(&mut self, sr: f32) {
    self.smoothing = (-1.0 / (0.02 * sr.max(1.0))).exp();
    self.current = 0.0;
    self.target = 0.0;
    self.steps = 0;
  }

  pub fn reset(&mut self) { self.current = 0.0; self.target = 0.0; }

  // amount: 0..1, returns the DC offset to add
  #[inline]
  pub fn process(&mut self, amount: f32) -> f32 {
    if amount < 0.001 { return 0.0; }

    self.steps += 1;
    if self.steps > self.interval {
      let noise = self.rng.next_bipolar();
      // random walk: the new target leans on the old one so it never jumps
      self.target = self.target * 0.5 + noise * 0.5;
      self.interval = 200 + (self.rng.next_u32() & 127); // 200..327 samples
      self.steps = 0;
    }

    self.current = self.current * self.smoothing + self.target * (1.0 - self.smoothing);
    self.current * DRIFT_SCALE * amount
  }
}
