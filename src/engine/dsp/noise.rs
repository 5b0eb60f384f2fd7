use super::biquad::Biquad;
use super::entropy::Xorshift32;

// Ducked noise floor. White noise colored to 300 Hz..8 kHz, hidden while the
// program material is loud (instant attack) and breathing back up over 500 ms
// in the gaps. Base level is very quiet; amount = 1.0 lands around -40 dB.
pub struct NoiseBreather {
  rng: Xorshift32,
  lpf: Biquad,
  hpf: Biquad,
  envelope: f32,
  release: f32,
}

impl NoiseBreather {
  pub fn new(sr: f32) -> Self {
    let mut n = Self {
      rng: Xorshift32::new(0xDEAD_BEEF),
      lpf: Biquad::new(),
      hpf: Biquad::new(),
      envelope: 0.0,
      release: 0.0,
    };
    n.prepare(sr);
    n
  }

  pub fn prepare(&mut self, sr: f32) {
    let sr = sr.max(1.0);
    self.lpf.set_lowpass(sr, 8000.0, 0.707);
    self.lpf.reset();
    self.hpf.set_highpass(sr, 300.0, 0.707);
    self.hpf.reset();
    self.envelope = 0.0;
    self.release = (-1.0 / (0.5 * sr)).exp();
  }

  pub fn reset(&mut self) {
    self.lpf.reset();
    self.hpf.reset();
    self.envelope = 0.0;
  }

  // signal_level: program loudness for the sidechain duck
  #[inline]
  pub fn sample(&mut self, signal_level: f32, amount: f32) -> f32 {
    if amount <= 0.001 { return 0.0; }

    let white = self.rng.next_bipolar();
    let colored = self.hpf.process(self.lpf.process(white));

    if signal_level > self.envelope {
      self.envelope = signal_level;
    } else {
      self.envelope = self.envelope * self.release + signal_level * (1.0 - self.release);
    }

    // *4 makes the duck aggressive: any real signal pushes the noise away
    let ducking = (1.0 - (self.envelope * 4.0).min(1.0)).max(0.0);
    let level = amount * 0.01;

    colored * ducking * level
  }
}
