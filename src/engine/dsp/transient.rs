#[derive(Clone, Copy)]
pub struct Split {
  pub transient: f32,
  pub body: f32,
}

// Splits a sample into transient and body parts. A slow envelope (20 ms
// attack, 200 ms release) tracks the sustained level; the instantaneous
// excess over it, curved and clamped, is the transient fraction.
// Invariant: transient + body == input exactly, so phase is preserved.
#[derive(Clone, Copy)]
pub struct TransientSplitter {
  envelope: f32,
  slew_attack: f32,
  slew_release: f32,
}

impl TransientSplitter {
  pub fn new(sr: f32) -> Self {
    let mut s = Self { envelope: 0.0, slew_attack: 0.0, slew_release: 0.0 };
    s.prepare(sr);
    s
  }

  pub fn prepare(&mut self, sr: f32) {
    let sr = sr.max(1.0);
    self.slew_attack = (-1.0 / (0.02 * sr)).exp();
    self.slew_release = (-1.0 / (0.20 * sr)).exp();
    self.envelope = 0.0;
  }

  pub fn reset(&mut self) { self.envelope = 0.0; }

  #[inline]
  pub fn process(&mut self, input: f32) -> Split {
    let abs_in = input.abs();

    if abs_in > self.envelope {
      self.envelope = self.envelope * self.slew_attack + abs_in * (1.0 - self.slew_attack);
    } else {
      self.envelope = self.envelope * self.slew_release + abs_in * (1.0 - self.slew_release);
    }

    let mut ratio = 0.0;
    if abs_in > 1.0e-5 {
      let diff = (abs_in - self.envelope).max(0.0);
      ratio = diff / abs_in;
    }

    // Sharpen the cut between click and sustain
    ratio = ratio.powf(1.5).clamp(0.0, 1.0);

    Split { transient: input * ratio, body: input * (1.0 - ratio) }
  }
}
