use std::sync::Arc;

use super::bus::{SignalBus, NUM_BANDS};
use super::dsp::envelope::EnvelopeFollower;
use super::params::{ControlSnapshot, Role};

/// One engine's attachment to the shared bus: publishes the block envelope
/// when the instance is a Reference, pulls and smooths the group's envelope
/// when it is a Listener, and always reports block energy for global heat.
pub struct NetworkLink {
  bus: Arc<SignalBus>,
  slot: Option<usize>,
  follower: EnvelopeFollower,
  received: [f32; NUM_BANDS],
  sample_rate: f32,
  last_raw: f32,
}

impl NetworkLink {
  pub fn new(bus: Arc<SignalBus>) -> Self {
    let slot = bus.register();
    Self {
      bus,
      slot,
      follower: EnvelopeFollower::new(48_000.0),
      received: [0.0; NUM_BANDS],
      sample_rate: 48_000.0,
      last_raw: 0.0,
    }
  }

  pub fn bus(&self) -> &Arc<SignalBus> { &self.bus }

  pub fn prepare(&mut self, sample_rate: f32) {
    self.sample_rate = sample_rate.max(1.0);
    self.follower.reset(self.sample_rate);
    self.received = [0.0; NUM_BANDS];
  }

  pub fn reset(&mut self) {
    self.follower.reset(self.sample_rate);
    self.received = [0.0; NUM_BANDS];
    self.last_raw = 0.0;
  }

  /// Highest raw (pre-sensitivity) modulation seen in the last block.
  pub fn last_modulation(&self) -> f32 { self.last_raw }

  /// Runs one block of bus traffic. Returns the smoothed raw per-band
  /// envelopes in 0..1; sensitivity and depth are applied by the caller.
  pub fn process(
    &mut self,
    dry: &[&[f32]],
    num_samples: usize,
    snapshot: &ControlSnapshot,
  ) -> [f32; NUM_BANDS] {
    // everyone contributes to global heat, whatever the role
    if let Some(slot) = self.slot {
      self.bus.set_energy(slot, block_rms(dry, num_samples));
    }

    if snapshot.role == Role::Reference {
      // block peak is enough for a ducking trigger and cheaper than RMS
      let magnitude = block_peak(dry, num_samples);
      let envelope = self.follower.process(magnitude);
      if envelope > 0.001 {
        // broadband trigger: the same envelope lands in every band slot
        for b in 0..NUM_BANDS {
          self.bus.write(snapshot.group, b, envelope);
        }
      }
    }

    let mut mods = [0.0f32; NUM_BANDS];
    if snapshot.role == Role::Listener {
      // bus values arrive once per block; smooth the steps away with a
      // block-length-aware one-pole so they cannot zipper
      let tau_samples = snapshot.network_smoothing_ms() * 0.001 * self.sample_rate;
      let k = (-(num_samples.max(1) as f32) / tau_samples.max(1.0)).exp();

      let mut max_raw = 0.0f32;
      for b in 0..NUM_BANDS {
        let raw = self.bus.read(snapshot.group, b).clamp(0.0, 1.0);
        self.received[b] = self.received[b] * k + raw * (1.0 - k);
        if self.received[b] > max_raw { max_raw = self.received[b]; }
        mods[b] = self.received[b];
      }
      self.last_raw = max_raw;
    } else {
      self.last_raw = 0.0;
    }

    mods
  }
}

impl Drop for NetworkLink {
  fn drop(&mut self) {
    if let Some(slot) = self.slot.take() {
      self.bus.unregister(slot);
    }
  }
}

fn block_peak(channels: &[&[f32]], num: usize) -> f32 {
  let mut peak = 0.0f32;
  for ch in channels.iter() {
    for &v in ch.iter().take(num) {
      let a = v.abs();
      if a > peak { peak = a; }
    }
  }
  peak
}

fn block_rms(channels: &[&[f32]], num: usize) -> f32 {
  if channels.is_empty() || num == 0 { return 0.0; }
  let mut acc = 0.0f64;
  let mut count = 0usize;
  for ch in channels.iter() {
    for &v in ch.iter().take(num) {
      acc += (v * v) as f64;
      count += 1;
    }
  }
  if count == 0 { 0.0 } else { (acc / count as f64).sqrt() as f32 }
}
