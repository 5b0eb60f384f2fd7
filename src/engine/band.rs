use super::dsp::dc::DcBlocker;
use super::dsp::entropy::EntropyDrift;
use super::dsp::shaper::{shape, ShaperAlg};
use super::dsp::smooth::Smooth;
use super::dsp::thermal::ThermalModel;
use super::dsp::transient::TransientSplitter;
use super::dsp::variance::StereoVariance;
use super::interaction::{process_morph, DualShaperConfig};

/// Per-block inputs for one band, assembled by the engine from the snapshot,
/// the bus modulation and the interaction targets.
#[derive(Clone, Copy)]
pub struct BandParams {
  pub base_drive: f32, // drive gain x tilt x starvation x drive delta
  pub blend: f32,      // 0..1 clean/shaped crossfade
  pub punch: f32,      // -1..1 after punch delta
  pub dynamics: f32,   // 0..1 transient protection
  pub drift: f32,
  pub entropy: f32,
  pub variance: f32,
  pub band_gain: f32, // from the volume delta, ducking et al.
  pub algorithm: ShaperAlg,
  pub cascade: bool,
  pub modulation: f32, // bus morph amount 0..1
  pub config: DualShaperConfig,
}

/// One band of the crossover: transient/body split, analog imperfection
/// model, dual-shaper morph, DC cleanup. Runs at the oversampled rate.
pub struct BandProcessor {
  splitters: [TransientSplitter; 2],
  thermal: [ThermalModel; 2],
  entropy: [EntropyDrift; 2],
  variance: StereoVariance,
  dc: [DcBlocker; 2],
  drive_smooth: Smooth,
  punch_smooth: Smooth,
  first_block: bool,
  gain_reduction: f32,
}

impl BandProcessor {
  pub fn new(sample_rate: f32, band_index: usize) -> Self {
    let sr = sample_rate.max(1.0);
    // distinct entropy seeds per band and channel so the walks never correlate
    let seed = 0x9E37_79B9u32.wrapping_mul(band_index as u32 + 1);
    Self {
      splitters: [TransientSplitter::new(sr); 2],
      thermal: [ThermalModel::new(sr); 2],
      entropy: [
        EntropyDrift::new(sr, seed),
        EntropyDrift::new(sr, seed.wrapping_add(0x6A09_E667)),
      ],
      variance: StereoVariance::new(sr),
      dc: [DcBlocker::new(sr); 2],
      drive_smooth: Smooth::new(sr, 20.0),
      punch_smooth: Smooth::new(sr, 1.0),
      first_block: true,
      gain_reduction: 1.0,
    }
  }

  pub fn prepare(&mut self, sample_rate: f32) {
    let sr = sample_rate.max(1.0);
    for s in self.splitters.iter_mut() { s.prepare(sr); }
    for t in self.thermal.iter_mut() { t.prepare(sr); }
    for e in self.entropy.iter_mut() { e.prepare(sr); }
    self.variance.prepare(sr);
    for d in self.dc.iter_mut() { d.set_sample_rate(sr); d.reset(); }
    self.drive_smooth.set_tau(sr, 20.0);
    self.punch_smooth.set_tau(sr, 1.0);
    self.first_block = true;
    self.gain_reduction = 1.0;
  }

  pub fn reset(&mut self) {
    for s in self.splitters.iter_mut() { s.reset(); }
    for t in self.thermal.iter_mut() { t.reset(); }
    for e in self.entropy.iter_mut() { e.reset(); }
    for d in self.dc.iter_mut() { d.reset(); }
    self.first_block = true;
    self.gain_reduction = 1.0;
  }

  /// Output/input level ratio of the last block, clamped to 0..2.
  pub fn gain_reduction(&self) -> f32 { self.gain_reduction }

  /// Mean tube temperature across channels, 0..1.
  pub fn temperature(&self) -> f32 {
    (self.thermal[0].temperature() + self.thermal[1].temperature()) * 0.5
  }

  /// Processes one band in place; returns the peak transient activation.
  pub fn process(
    &mut self,
    left: &mut [f32],
    right: &mut [f32],
    num_samples: usize,
    num_channels: usize,
    p: &BandParams,
  ) -> f32 {
    let num = num_samples.min(left.len());
    let num_ch = num_channels.clamp(1, 2);

    if self.first_block {
      self.drive_smooth.snap(p.base_drive);
      self.punch_smooth.snap(p.punch);
      self.first_block = false;
    }

    // the DC stage only earns its phase shift when something can produce DC
    let dc_active = p.blend > 1.0e-3 || p.drift > 1.0e-3 || p.entropy > 1.0e-3;

    let mut max_transient = 0.0f32;
    let mut energy_in = 0.0f64;
    let mut energy_out = 0.0f64;

    for i in 0..num {
      let drive = self.drive_smooth.next(p.base_drive);
      let punch = self.punch_smooth.next(p.punch).clamp(-1.0, 1.0);
      let drift_mult = self.variance.drift(p.variance);
      let neutral_punch = punch.abs() < 0.01;

      for ch in 0..num_ch {
        let x = if ch == 0 { left[i] } else { right[i] };
        energy_in += (x * x) as f64;

        // analog imperfections: thermal bias and entropy wander move the
        // operating point before the shaper sees the sample
        let bias = self.thermal[ch].process(x) * p.drift;
        let wander = self.entropy[ch].process(p.entropy);
        let biased = x + bias + wander;

        let ch_drive = drive
          * if ch == 0 { drift_mult.drive_mult_l } else { drift_mult.drive_mult_r };

        let mut shaped = if neutral_punch {
          // no split needed, shape the whole sample
          process_morph(biased, ch_drive, p.modulation, &p.config)
        } else {
          let split = self.splitters[ch].process(biased);
          let abs_trans = split.transient.abs();
          if abs_trans > max_transient { max_transient = abs_trans; }

          let body = process_morph(split.body, ch_drive, p.modulation, &p.config);

          let trans = if punch > 0.0 {
            // dirty attack: same algorithm, pushed harder
            shape(split.transient, ch_drive * (1.0 + punch * 2.0), p.algorithm)
          } else {
            // clean attack: backed-off drive through the tube curve
            shape(split.transient, ch_drive * (1.0 - punch.abs() * 0.8), ShaperAlg::EulerTube)
          };
          // transient protection: the knob pulls the attack back toward
          // its untouched form
          let trans = trans + (split.transient - trans) * p.dynamics.clamp(0.0, 1.0);

          body + trans
        };

        if p.cascade {
          // output transformer: bounded cubic with a touch of make-up
          let t = shaped.clamp(-1.0, 1.0);
          shaped = t * (1.5 - 0.5 * t * t) * 1.1;
        }

        // blend against the raw input so blend = 0 is bit-exact clean
        let mut out = x + p.blend * (shaped - x);
        out *= p.band_gain;

        if dc_active {
          out = self.dc[ch].process(out);
        }

        energy_out += (out * out) as f64;
        if ch == 0 { left[i] = out; } else { right[i] = out; }
      }

      if num_ch == 2 && p.variance > 0.0 {
        let (mut l, mut r) = (left[i], right[i]);
        StereoVariance::apply_crosstalk(&mut l, &mut r, p.variance);
        left[i] = l;
        right[i] = r;
      }
    }

    self.gain_reduction = if energy_in > 1.0e-10 {
      ((energy_out / energy_in).sqrt() as f32).clamp(0.0, 2.0)
    } else {
      1.0
    };

    max_transient
  }
}
