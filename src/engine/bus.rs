use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

pub const MAX_GROUPS: usize = 8;
pub const NUM_BANDS: usize = 6;
pub const MAX_INSTANCES: usize = 64;

// f32 stored through its bit pattern; every access is a single relaxed
// atomic op. The bus carries a smoothed perceptual control signal, so
// "eventually visible" is the whole contract.
struct AtomicF32 {
  bits: AtomicU32,
}

impl AtomicF32 {
  const fn zero() -> Self { Self { bits: AtomicU32::new(0) } }

  #[inline]
  fn store(&self, v: f32) { self.bits.store(v.to_bits(), Ordering::Relaxed); }

  #[inline]
  fn load(&self) -> f32 { f32::from_bits(self.bits.load(Ordering::Relaxed)) }
}

/// Shared modulation bus. One per host process, injected into every engine
/// instance by handle; tests construct their own so nothing leaks between
/// cases. Reference-role instances write per-(group, band) envelope energy,
/// Listener-role instances read it. All instances additionally publish their
/// block energy into a slot table whose sum is the session's "global heat".
pub struct SignalBus {
  band_signals: [[AtomicF32; NUM_BANDS]; MAX_GROUPS],
  slot_occupied: [AtomicBool; MAX_INSTANCES],
  slot_energy: [AtomicF32; MAX_INSTANCES],
}

impl SignalBus {
  pub fn new() -> Self {
    Self {
      band_signals: std::array::from_fn(|_| std::array::from_fn(|_| AtomicF32::zero())),
      slot_occupied: std::array::from_fn(|_| AtomicBool::new(false)),
      slot_energy: std::array::from_fn(|_| AtomicF32::zero()),
    }
  }

  /// Stores a band energy. Out-of-range indices are a no-op, not a fault.
  #[inline]
  pub fn write(&self, group: usize, band: usize, value: f32) {
    if group < MAX_GROUPS && band < NUM_BANDS {
      self.band_signals[group][band].store(value);
    }
  }

  /// Loads a band energy; 0.0 for out-of-range indices.
  #[inline]
  pub fn read(&self, group: usize, band: usize) -> f32 {
    if group < MAX_GROUPS && band < NUM_BANDS {
      self.band_signals[group][band].load()
    } else {
      0.0
    }
  }

  /// Claims an instance slot for heat reporting. None when all 64 are taken.
  pub fn register(&self) -> Option<usize> {
    for i in 0..MAX_INSTANCES {
      if self.slot_occupied[i]
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
        .is_ok()
      {
        self.slot_energy[i].store(0.0);
        return Some(i);
      }
    }
    None
  }

  pub fn unregister(&self, id: usize) {
    if id < MAX_INSTANCES {
      // clear energy first so a freed slot never contributes stale heat
      self.slot_energy[id].store(0.0);
      self.slot_occupied[id].store(false, Ordering::Release);
    }
  }

  #[inline]
  pub fn set_energy(&self, id: usize, energy: f32) {
    if id < MAX_INSTANCES {
      self.slot_energy[id].store(energy);
    }
  }

  /// Raw sum over occupied slots. 1.0 ~ one track at 0 dB, 10.0 ~ ten.
  pub fn heat(&self) -> f32 {
    let mut total = 0.0;
    for i in 0..MAX_INSTANCES {
      if self.slot_occupied[i].load(Ordering::Acquire) {
        total += self.slot_energy[i].load();
      }
    }
    total
  }

  pub fn active_instances(&self) -> usize {
    (0..MAX_INSTANCES)
      .filter(|&i| self.slot_occupied[i].load(Ordering::Acquire))
      .count()
  }
}

impl Default for SignalBus {
  fn default() -> Self { Self::new() }
}

static PROCESS_BUS: Lazy<Arc<SignalBus>> = Lazy::new(|| Arc::new(SignalBus::new()));

/// The process-wide bus every engine joins unless handed an explicit one.
pub fn process_bus() -> Arc<SignalBus> {
  PROCESS_BUS.clone()
}
