// FIR filter with a ring history. Coefficients are swapped in whole at
// prepare time; processing never reallocates.
#[derive(Clone, Default)]
pub struct Fir {
  coeffs: Vec<f32>,
  hist: Vec<f32>,
  pos: usize,
}

impl Fir {
  pub fn new() -> Self { Self::default() }

  /// Replaces the coefficient set. Allocates only when the tap count changes;
  /// call from prepare(), never from the audio thread.
  pub fn set_coefficients(&mut self, coeffs: &[f32]) {
    if self.coeffs.len() != coeffs.len() {
      self.coeffs = coeffs.to_vec();
      self.hist = vec![0.0; coeffs.len().max(1)];
    } else {
      self.coeffs.copy_from_slice(coeffs);
    }
    self.reset();
  }

  pub fn reset(&mut self) {
    for v in self.hist.iter_mut() { *v = 0.0; }
    self.pos = 0;
  }

  pub fn len(&self) -> usize { self.coeffs.len() }
  pub fn is_empty(&self) -> bool { self.coeffs.is_empty() }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    let n = self.coeffs.len();
    if n == 0 { return x; }

    self.hist[self.pos] = x;
    let mut acc = 0.0;
    let mut idx = self.pos;
    for k in 0..n {
      acc += self.coeffs[k] * self.hist[idx];
      idx = if idx == 0 { n - 1 } else { idx - 1 };
    }
    self.pos += 1;
    if self.pos >= n { self.pos = 0; }
    acc
  }

  pub fn process_inplace(&mut self, buf: &mut [f32]) {
    for v in buf.iter_mut() { *v = self.process(*v); }
  }
}
