// Fractional delay line with linear-interpolated reads. The delay length is
// settable at runtime (the latency calibrator pushes a new value at prepare),
// capacity is fixed after new().
pub struct DelayLine {
  buf: Vec<f32>,
  len: usize,
  wr: usize,
  delay: f32,
}

impl DelayLine {
  pub fn new(max_samples: usize) -> Self {
    let len = max_samples.max(64) + 2;
    Self { buf: vec![0.0; len], len, wr: 0, delay: 0.0 }
  }

  pub fn reset(&mut self) {
    for v in self.buf.iter_mut() { *v = 0.0; }
    self.wr = 0;
  }

  pub fn set_delay(&mut self, samples: f32) {
    self.delay = samples.clamp(0.0, (self.len - 2) as f32);
  }

  pub fn delay(&self) -> f32 { self.delay }

  #[inline]
  fn wrap(len: usize, i: i64) -> usize {
    let m = len as i64;
    let mut k = i % m;
    if k < 0 { k += m; }
    k as usize
  }

  #[inline]
  fn lerp(buf: &[f32], idx: f32, len: usize) -> f32 {
    let i0 = idx.floor() as i64;
    let frac = idx - i0 as f32;
    let s0 = buf[Self::wrap(len, i0)];
    let s1 = buf[Self::wrap(len, i0 + 1)];
    s0 + (s1 - s0) * frac
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    self.buf[self.wr] = x;
    let rd = self.wr as f32 - self.delay;
    let y = Self::lerp(&self.buf, rd, self.len);
    self.wr += 1;
    if self.wr >= self.len { self.wr = 0; }
    y
  }
}
