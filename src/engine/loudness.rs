use super::dsp::biquad::Biquad;
use super::dsp::smooth::Smooth;

// Perceptual weighting: a +4 dB high shelf above ~1.5 kHz (ear sensitivity)
// followed by a 100 Hz high-pass (so bass doesn't pump the measurement).
const SHELF_HZ: f32 = 1500.0;
const SHELF_GAIN: f32 = 1.58; // ~+4 dB
const HP_HZ: f32 = 100.0;

// -60 dB power floor: below this on either side the gain just holds.
const SILENCE_FLOOR: f32 = 1.0e-6;

// Compensation window: -20 dB .. +12 dB.
const GAIN_MIN: f32 = 0.1;
const GAIN_MAX: f32 = 4.0;

/// Keeps the subjective loudness of the wet path pinned to the dry path.
/// Both sides are mono-summed, ear-weighted, squared and integrated over
/// ~400 ms ("momentary loudness"); the corrective gain is the power ratio,
/// clamped and smoothed like a VU needle before it touches audio.
pub struct LoudnessMatcher {
  shelf_dry: Biquad,
  shelf_wet: Biquad,
  hp_dry: Biquad,
  hp_wet: Biquad,
  integrated_dry: f32,
  integrated_wet: f32,
  integration: f32,
  gain: Smooth,
  held_target: f32,
}

impl LoudnessMatcher {
  pub fn new(sample_rate: f32) -> Self {
    let mut m = Self {
      shelf_dry: Biquad::new(),
      shelf_wet: Biquad::new(),
      hp_dry: Biquad::new(),
      hp_wet: Biquad::new(),
      integrated_dry: 0.0,
      integrated_wet: 0.0,
      integration: 0.01,
      gain: Smooth::new(sample_rate.max(1.0), 400.0),
      held_target: 1.0,
    };
    m.prepare(sample_rate);
    m
  }

  pub fn prepare(&mut self, sample_rate: f32) {
    let sr = sample_rate.max(1.0);
    self.shelf_dry.set_high_shelf(sr, SHELF_HZ, 1.0, SHELF_GAIN);
    self.shelf_wet.set_high_shelf(sr, SHELF_HZ, 1.0, SHELF_GAIN);
    self.hp_dry.set_highpass(sr, HP_HZ, 0.707);
    self.hp_wet.set_highpass(sr, HP_HZ, 0.707);
    self.integration = 1.0 - (-1.0 / (0.4 * sr)).exp();
    self.gain.set_tau(sr, 400.0);
    self.reset();
  }

  pub fn reset(&mut self) {
    self.shelf_dry.reset();
    self.shelf_wet.reset();
    self.hp_dry.reset();
    self.hp_wet.reset();
    self.integrated_dry = 0.0;
    self.integrated_wet = 0.0;
    self.held_target = 1.0;
    self.gain.snap(1.0);
  }

  /// Feeds one stereo sample pair of each side, returns the gain to apply
  /// to the wet signal right now.
  #[inline]
  pub fn process(&mut self, dry_l: f32, dry_r: f32, wet_l: f32, wet_r: f32) -> f32 {
    let dry_mono = (dry_l + dry_r) * 0.5;
    let wet_mono = (wet_l + wet_r) * 0.5;

    let dry_w = self.hp_dry.process(self.shelf_dry.process(dry_mono));
    let wet_w = self.hp_wet.process(self.shelf_wet.process(wet_mono));

    self.integrated_dry += (dry_w * dry_w - self.integrated_dry) * self.integration;
    self.integrated_wet += (wet_w * wet_w - self.integrated_wet) * self.integration;

    if self.integrated_dry > SILENCE_FLOOR && self.integrated_wet > SILENCE_FLOOR {
      let target = (self.integrated_dry / self.integrated_wet).sqrt();
      self.held_target = target.clamp(GAIN_MIN, GAIN_MAX);
    }
    // in silence the held value rides through, no jumps when audio returns

    self.gain.next(self.held_target)
  }
}
