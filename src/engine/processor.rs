use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use no_denormals::no_denormals;

use super::band::{BandParams, BandProcessor};
use super::bus::{process_bus, SignalBus, NUM_BANDS};
use super::dsp::envelope::EnvelopeFollower;
use super::dsp::noise::NoiseBreather;
use super::dsp::smooth::Smooth;
use super::dsp::svf::Svf;
use super::dsp::voltage::VoltageRegulator;
use super::filterbank::{CrossoverProfile, FilterBank, FilterBankConfig, PhaseMode};
use super::fir_design::snap_sample_rate;
use super::interaction::{configuration, modulation_targets, InteractionMode};
use super::mix::MixEngine;
use super::netlink::NetworkLink;
use super::oversampler::{Oversampler, FACTOR};
use super::params::ControlSnapshot;
use super::tap::TapSink;

// Per-band drive tilt: less dirt in the lows, a bit more sparkle on top.
// Hand-tuned by ear on the reference chain; recalibration candidates, not
// contractual values.
const BAND_DRIVE_TILT: [f32; NUM_BANDS] = [0.5, 0.75, 1.0, 1.0, 1.1, 1.25];

// Summing 6 bands that stop being correlated after shaping gains energy;
// -9 dB pulls the sum back to the input level. Same caveat as the tilt.
const BAND_SUM_COMPENSATION: f32 = 0.35;

// The minimum-phase bank keeps its complementary impulse at tap 63 while
// reporting 32 samples; the 31 high-rate samples of difference are 7.75 at
// the base rate. Measured by impulse alignment against this crate's own
// coefficient builder; re-measure if the builder changes.
const MIN_PHASE_DELAY_CORRECTION: f32 = 7.75;

// The tone-shaping SVFs are IIR and contribute no bulk delay.
const TONE_FILTER_LATENCY: f32 = 0.0;

const TIGHTEN_BYPASS_HZ: f32 = 20.0;
const SMOOTH_BYPASS_HZ: f32 = 20_000.0;

// f32 metric published to whatever thread polls the getters
struct MeterCell(AtomicU32);

impl MeterCell {
  fn new() -> Self { Self(AtomicU32::new(0)) }
  fn set(&self, v: f32) { self.0.store(v.to_bits(), Ordering::Relaxed); }
  fn get(&self) -> f32 { f32::from_bits(self.0.load(Ordering::Relaxed)) }
}

struct Meters {
  input_rms: MeterCell,
  output_rms: MeterCell,
  transient: MeterCell,
  last_modulation: MeterCell,
  modulation_depth: MeterCell,
  temperature: MeterCell,
  gain_reduction: [MeterCell; NUM_BANDS],
}

impl Meters {
  fn new() -> Self {
    Self {
      input_rms: MeterCell::new(),
      output_rms: MeterCell::new(),
      transient: MeterCell::new(),
      last_modulation: MeterCell::new(),
      modulation_depth: MeterCell::new(),
      temperature: MeterCell::new(),
      gain_reduction: std::array::from_fn(|_| MeterCell::new()),
    }
  }

  fn clear(&self) {
    self.input_rms.set(0.0);
    self.output_rms.set(0.0);
    self.transient.set(0.0);
    self.last_modulation.set(0.0);
    self.modulation_depth.set(0.0);
    self.temperature.set(0.0);
    for g in self.gain_reduction.iter() { g.set(1.0); }
  }
}

/// The whole signal path: bus link, x4 oversampling, 6-band crossover,
/// per-band shaping, loudness-matched mix, analytic latency budget.
///
/// `prepare()` before the first `process()`; `process()` is real-time safe
/// (no allocation, no locks) and degrades to safe defaults instead of
/// erroring.
pub struct Engine {
  netlink: NetworkLink,
  oversampler: Oversampler,
  filter_bank: FilterBank,
  bands: Vec<BandProcessor>,
  mix: MixEngine,
  voltage: VoltageRegulator,
  breather: NoiseBreather,
  breather_env: EnvelopeFollower,
  pre_filters: [Svf; 2],
  post_filters: [Svf; 2],
  smooth_tighten: Smooth,
  smooth_cutoff: Smooth,
  tap: TapSink,

  os_buf: Vec<Vec<f32>>,
  band_bufs: Vec<[Vec<f32>; 2]>,

  phase_mode: PhaseMode,
  profile: CrossoverProfile,
  sample_rate: f32,
  effective_rate: f32,
  max_block: usize,
  channels: usize,
  prepared: bool,
  latency: f32,

  meters: Meters,
}

impl Engine {
  /// Joins the process-wide bus.
  pub fn new() -> Self {
    Self::with_bus(process_bus())
  }

  /// Joins an explicit bus; tests hand in their own so nothing leaks
  /// between cases.
  pub fn with_bus(bus: Arc<SignalBus>) -> Self {
    Self {
      netlink: NetworkLink::new(bus),
      oversampler: Oversampler::new(),
      filter_bank: FilterBank::new(),
      bands: (0..NUM_BANDS).map(|b| BandProcessor::new(192_000.0, b)).collect(),
      mix: MixEngine::new(48_000.0, 48_000),
      voltage: VoltageRegulator::new(48_000.0),
      breather: NoiseBreather::new(48_000.0),
      breather_env: EnvelopeFollower::new(48_000.0),
      pre_filters: [Svf::new(), Svf::new()],
      post_filters: [Svf::new(), Svf::new()],
      smooth_tighten: Smooth::new(192_000.0, 50.0),
      smooth_cutoff: Smooth::new(192_000.0, 50.0),
      tap: TapSink::new(),
      os_buf: Vec::new(),
      band_bufs: Vec::new(),
      phase_mode: PhaseMode::TruncatedLinear,
      profile: CrossoverProfile::Default,
      sample_rate: 0.0,
      effective_rate: 48_000.0,
      max_block: 0,
      channels: 2,
      prepared: false,
      latency: 0.0,
      meters: Meters::new(),
    }
  }

  /// (Re)allocates everything for the given configuration. Must run before
  /// the first `process()` and again whenever the host changes rate or
  /// block size. Never call from the audio thread.
  pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize, channel_count: usize) {
    if sample_rate <= 0.0 {
      log::warn!("prepare ignored: non-positive sample rate {sample_rate}");
      return;
    }

    self.sample_rate = sample_rate;
    self.effective_rate = snap_sample_rate(sample_rate);
    if (self.effective_rate - sample_rate).abs() > 0.5 {
      log::info!(
        "sample rate {sample_rate} Hz not in the coefficient set, snapping to {} Hz",
        self.effective_rate
      );
    }

    self.max_block = max_block_size.max(1);
    self.channels = channel_count.clamp(1, 2);

    let high_rate = self.effective_rate * FACTOR as f32;
    let high_block = self.max_block * FACTOR;

    self.os_buf = (0..2).map(|_| vec![0.0; high_block]).collect();
    self.band_bufs = (0..NUM_BANDS)
      .map(|_| [vec![0.0; high_block], vec![0.0; high_block]])
      .collect();

    self.oversampler.prepare(self.effective_rate, self.max_block, self.channels);
    self.filter_bank.prepare(FilterBankConfig {
      phase_mode: self.phase_mode,
      profile: self.profile,
      sample_rate: high_rate,
      max_block_size: high_block,
      num_bands: NUM_BANDS,
    });
    for band in self.bands.iter_mut() {
      band.prepare(high_rate);
    }

    for f in self.pre_filters.iter_mut() { f.reset(); }
    for f in self.post_filters.iter_mut() { f.reset(); }
    self.smooth_tighten.set_tau(high_rate, 50.0);
    self.smooth_cutoff.set_tau(high_rate, 50.0);

    self.mix.prepare(self.effective_rate, self.effective_rate as usize);
    self.netlink.prepare(self.effective_rate);
    self.voltage.prepare(self.effective_rate);
    self.breather.prepare(self.effective_rate);
    self.breather_env.reset(self.effective_rate);

    self.calibrate_latency();
    self.meters.clear();
    self.prepared = true;
  }

  /// Clears every history without reallocating. Safe on transport jumps.
  pub fn reset(&mut self) {
    self.oversampler.reset();
    self.filter_bank.reset();
    for band in self.bands.iter_mut() { band.reset(); }
    self.mix.reset();
    self.netlink.reset();
    self.voltage.reset();
    self.breather.reset();
    self.breather_env.reset(self.effective_rate);
    for f in self.pre_filters.iter_mut() { f.reset(); }
    for f in self.post_filters.iter_mut() { f.reset(); }
    self.meters.clear();
  }

  /// Coefficient sets rebuild immediately (outside the audio thread); the
  /// dry delay follows through the latency calibrator.
  pub fn set_phase_mode(&mut self, mode: PhaseMode) {
    if self.phase_mode == mode { return; }
    self.phase_mode = mode;
    if self.prepared {
      self.rebuild_filter_bank();
    }
  }

  pub fn phase_mode(&self) -> PhaseMode { self.phase_mode }

  pub fn set_crossover_profile(&mut self, profile: CrossoverProfile) {
    if self.profile == profile { return; }
    self.profile = profile;
    if self.prepared {
      self.rebuild_filter_bank();
    }
  }

  pub fn crossover_profile(&self) -> CrossoverProfile { self.profile }

  fn rebuild_filter_bank(&mut self) {
    let high_rate = self.effective_rate * FACTOR as f32;
    self.filter_bank.prepare(FilterBankConfig {
      phase_mode: self.phase_mode,
      profile: self.profile,
      sample_rate: high_rate,
      max_block_size: self.max_block * FACTOR,
      num_bands: NUM_BANDS,
    });
    self.calibrate_latency();
  }

  // Analytic only: nothing probes the signal. Evaluated at prepare time and
  // pushed straight into the dry delay.
  fn calibrate_latency(&mut self) {
    let os = self.oversampler.latency_samples();
    let fb = self.filter_bank.latency_samples() as f32 / FACTOR as f32;
    let correction = if self.phase_mode == PhaseMode::MinimumPhase {
      MIN_PHASE_DELAY_CORRECTION
    } else {
      0.0
    };
    self.latency = os + fb + TONE_FILTER_LATENCY + correction;
    self.mix.set_latency_samples(self.latency);
    log::debug!(
      "latency budget: os={os:.2} fb={fb:.2} correction={correction:.2} total={:.2}",
      self.latency
    );
  }

  /// Fixed per-block latency reported to the host; constant until the next
  /// prepare() or phase-mode change.
  pub fn latency_samples(&self) -> usize { self.latency.round() as usize }

  /// Same budget before rounding; the dry delay uses this exact value.
  pub fn latency(&self) -> f32 { self.latency }

  /// The rate the host asked for, before snapping.
  pub fn sample_rate(&self) -> f32 { self.sample_rate }

  /// The sample rate coefficients were actually built for.
  pub fn effective_sample_rate(&self) -> f32 { self.effective_rate }

  pub fn bus(&self) -> &Arc<SignalBus> { self.netlink.bus() }

  /// Creates the write-only analysis tap; the returned consumer belongs to
  /// the UI/analysis thread. Post-mix mono samples, dropped when full.
  pub fn create_tap(&mut self, capacity: usize) -> rtrb::Consumer<f32> {
    self.tap.attach(capacity)
  }

  // --- diagnostics ---------------------------------------------------------

  pub fn input_rms(&self) -> f32 { self.meters.input_rms.get() }
  pub fn output_rms(&self) -> f32 { self.meters.output_rms.get() }
  pub fn transient_level(&self) -> f32 { self.meters.transient.get() }
  pub fn last_modulation(&self) -> f32 { self.meters.last_modulation.get() }
  pub fn modulation_depth(&self) -> f32 { self.meters.modulation_depth.get() }
  pub fn average_temperature(&self) -> f32 { self.meters.temperature.get() }

  pub fn gain_reduction(&self) -> [f32; NUM_BANDS] {
    std::array::from_fn(|b| self.meters.gain_reduction[b].get())
  }

  /// Processes `io` in place against the unprocessed `dry` reference.
  /// Returns the peak cross-band transient activation for metering.
  ///
  /// Degradation rules: not prepared, zero channels or more than two all
  /// clear the buffer and return a neutral level; blocks longer than the
  /// prepared maximum are processed only up to that size.
  pub fn process(
    &mut self,
    io: &mut [Vec<f32>],
    dry: &[Vec<f32>],
    snapshot: &ControlSnapshot,
  ) -> f32 {
    if !self.prepared || io.is_empty() || io.len() > 2 || dry.len() < io.len() {
      for ch in io.iter_mut() {
        for v in ch.iter_mut() { *v = 0.0; }
      }
      return 0.0;
    }

    let num_ch = io.len().min(self.channels);
    let mut num = io.iter().map(|c| c.len()).min().unwrap_or(0);
    num = num.min(dry.iter().map(|c| c.len()).min().unwrap_or(0));
    if num == 0 { return 0.0; }
    if num > self.max_block {
      log::warn!("block of {num} samples exceeds prepared {}; processing the prefix", self.max_block);
      num = self.max_block;
    }

    no_denormals(|| self.process_inner(io, dry, snapshot, num, num_ch))
  }

  fn process_inner(
    &mut self,
    io: &mut [Vec<f32>],
    dry: &[Vec<f32>],
    snapshot: &ControlSnapshot,
    num: usize,
    num_ch: usize,
  ) -> f32 {
    let depth = snapshot.depth.clamp(0.0, 1.0);
    let sens = snapshot.sensitivity.clamp(0.0, 2.0);
    let mode = snapshot.mode;

    let dry_slices: [&[f32]; 2] = [
      &dry[0][..num],
      if num_ch > 1 { &dry[1][..num] } else { &dry[0][..num] },
    ];
    let dry_view = &dry_slices[..num_ch];

    self.meters.input_rms.set(rms_of(dry_view));

    // --- network -----------------------------------------------------------
    let raw_mods = self.netlink.process(dry_view, num, snapshot);
    self.meters.last_modulation.set(self.netlink.last_modulation());

    let mut morph_mods = [0.0f32; NUM_BANDS];
    let mut mean_morph = 0.0f32;
    let mut mean_filter = 0.0f32;
    let mut mean_mojo = 0.0f32;
    let targets = std::array::from_fn::<_, NUM_BANDS, _>(|b| {
      let t = modulation_targets(mode, raw_mods[b], sens);
      morph_mods[b] = (raw_mods[b] * sens).min(1.0) * depth;
      mean_morph += morph_mods[b] / NUM_BANDS as f32;
      mean_filter += t.filter_mod / NUM_BANDS as f32;
      mean_mojo += t.mojo_mod / NUM_BANDS as f32;
      t
    });

    // --- global modifiers --------------------------------------------------
    let drive_gain = snapshot.drive_gain();
    let blend_base = snapshot.saturation_blend();
    let heat_eff = (snapshot.heat + mean_mojo * depth).clamp(0.0, 1.0);
    let starvation = self.voltage.process(self.netlink.bus().heat(), heat_eff);

    // --- up to 4x ----------------------------------------------------------
    let num4 = num * FACTOR;
    {
      let io_slices: [&[f32]; 2] = [
        &io[0][..num],
        if num_ch > 1 { &io[1][..num] } else { &io[0][..num] },
      ];
      self.oversampler.upsample(&io_slices[..num_ch], &mut self.os_buf, num);
    }

    let high_rate = self.effective_rate * FACTOR as f32;

    // --- pre tone shaping (tighten) ----------------------------------------
    let tighten_eff = (snapshot.tighten_hz * (1.0 + 3.0 * mean_filter * depth))
      .clamp(10.0, 8000.0);
    if tighten_eff > TIGHTEN_BYPASS_HZ {
      for i in 0..num4 {
        let cutoff = self.smooth_tighten.next(tighten_eff);
        for ch in 0..num_ch {
          self.pre_filters[ch].set_params(cutoff, 0.707, high_rate);
          let v = self.os_buf[ch][i];
          self.os_buf[ch][i] = self.pre_filters[ch].highpass(v);
        }
      }
    } else {
      self.smooth_tighten.snap(tighten_eff);
    }

    // --- split -------------------------------------------------------------
    {
      let os_slices: [&[f32]; 2] = [&self.os_buf[0][..num4], &self.os_buf[1][..num4]];
      self.filter_bank.split_into_bands(&os_slices[..num_ch], &mut self.band_bufs, num4);
    }

    // --- per band ----------------------------------------------------------
    let mut max_transient = 0.0f32;
    let mut temperature = 0.0f32;
    let mut total_activity = 0.0f32;

    for b in 0..NUM_BANDS {
      let t = &targets[b];
      let params = BandParams {
        base_drive: drive_gain
          * starvation
          * BAND_DRIVE_TILT[b]
          * (1.0 + t.drive_mod * depth).max(0.0),
        blend: (blend_base + t.blend_mod * depth).clamp(0.0, 1.0),
        punch: (snapshot.punch + t.punch_mod * depth).clamp(-1.0, 1.0),
        dynamics: snapshot.dynamics,
        drift: (snapshot.drift + t.mojo_mod * depth * 0.5).clamp(0.0, 1.0),
        entropy: (snapshot.entropy + t.mojo_mod * depth * 0.5).clamp(0.0, 1.0),
        variance: (snapshot.variance + t.mojo_mod * depth * 0.25).clamp(0.0, 1.0),
        band_gain: (1.0 + t.volume_mod * depth).clamp(0.0, 1.5),
        algorithm: snapshot.algorithm,
        cascade: snapshot.cascade,
        modulation: morph_mods[b],
        config: configuration(mode, b, snapshot.algorithm),
      };

      let [left, right] = &mut self.band_bufs[b];
      let transient = self.bands[b].process(
        &mut left[..num4],
        &mut right[..num4],
        num4,
        num_ch,
        &params,
      );
      if transient > max_transient { max_transient = transient; }

      let gr = self.bands[b].gain_reduction();
      self.meters.gain_reduction[b].set(gr);
      total_activity += (1.0 - gr).abs();
      temperature += self.bands[b].temperature() / NUM_BANDS as f32;
    }

    self.meters.transient.set(max_transient);
    self.meters.modulation_depth.set(total_activity.min(1.0));
    self.meters.temperature.set(temperature);

    // --- sum bands ---------------------------------------------------------
    // sum compensation plus the predictable 1/sqrt(drive) power trade
    let comp = BAND_SUM_COMPENSATION / drive_gain.max(1.0e-6).sqrt();
    for ch in 0..num_ch {
      let dst = &mut self.os_buf[ch];
      for i in 0..num4 {
        let mut acc = 0.0f32;
        for b in 0..NUM_BANDS {
          acc += self.band_bufs[b][ch][i];
        }
        dst[i] = acc * comp;
      }
    }

    // --- post tone shaping (smooth) ----------------------------------------
    let smooth_eff = snapshot.smooth_hz.clamp(200.0, 22_000.0);
    if smooth_eff < SMOOTH_BYPASS_HZ {
      for i in 0..num4 {
        let cutoff = self.smooth_cutoff.next(smooth_eff);
        for ch in 0..num_ch {
          self.post_filters[ch].set_params(cutoff, 0.707, high_rate);
          let v = self.os_buf[ch][i];
          self.os_buf[ch][i] = self.post_filters[ch].lowpass(v);
        }
      }
    } else {
      self.smooth_cutoff.snap(smooth_eff);
    }

    // --- back to base rate -------------------------------------------------
    self.oversampler.downsample(&self.os_buf, io, num);

    // --- noise floor -------------------------------------------------------
    if snapshot.noise > 0.001 {
      for i in 0..num {
        let mono = if num_ch > 1 { 0.5 * (io[0][i] + io[1][i]) } else { io[0][i] };
        let level = self.breather_env.process(mono);
        let n = self.breather.sample(level, snapshot.noise);
        io[0][i] += n;
        if num_ch > 1 { io[1][i] += n; }
      }
    }

    // --- mix ---------------------------------------------------------------
    let focus_eff = if mode == InteractionMode::StereoBloom {
      (snapshot.focus + mean_morph * 0.5).clamp(-1.0, 1.0)
    } else {
      snapshot.focus
    };

    self.mix.process(
      io,
      dry_view,
      num,
      num_ch,
      snapshot.mix,
      snapshot.output_gain,
      focus_eff,
      snapshot.delta_listen,
    );

    // --- metering / tap ----------------------------------------------------
    {
      let out_slices: [&[f32]; 2] = [
        &io[0][..num],
        if num_ch > 1 { &io[1][..num] } else { &io[0][..num] },
      ];
      self.meters.output_rms.set(rms_of(&out_slices[..num_ch]));
    }
    for i in 0..num {
      let mono = if num_ch > 1 { 0.5 * (io[0][i] + io[1][i]) } else { io[0][i] };
      self.tap.push(mono);
    }

    // channels beyond the prepared count carry no signal
    for ch in io.iter_mut().skip(num_ch) {
      for v in ch.iter_mut() { *v = 0.0; }
    }

    max_transient
  }
}

impl Default for Engine {
  fn default() -> Self { Self::new() }
}

fn rms_of(channels: &[&[f32]]) -> f32 {
  let mut acc = 0.0f64;
  let mut count = 0usize;
  for ch in channels.iter() {
    for &v in ch.iter() {
      acc += (v * v) as f64;
      count += 1;
    }
  }
  if count == 0 { 0.0 } else { (acc / count as f64).sqrt() as f32 }
}
