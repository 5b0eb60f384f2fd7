use satmesh::engine::filterbank::{FilterBank, FilterBankConfig};
use satmesh::{CrossoverProfile, PhaseMode, NUM_BANDS};

fn noise(state: &mut u32, num: usize) -> Vec<f32> {
  (0..num)
    .map(|_| {
      let mut x = *state;
      x ^= x << 13;
      x ^= x >> 17;
      x ^= x << 5;
      *state = x;
      x as f32 * 2.3283064365386963e-10 * 2.0 - 1.0
    })
    .collect()
}

fn band_buffers(len: usize) -> Vec<[Vec<f32>; 2]> {
  (0..NUM_BANDS).map(|_| [vec![0.0; len], vec![0.0; len]]).collect()
}

fn reconstruction_error(mode: PhaseMode, delay: usize) -> f32 {
  const LEN: usize = 8192;
  let mut bank = FilterBank::new();
  bank.prepare(FilterBankConfig {
    phase_mode: mode,
    profile: CrossoverProfile::Default,
    sample_rate: 192_000.0,
    max_block_size: LEN,
    num_bands: NUM_BANDS,
  });

  let mut rng = 0xBAD5_EEDu32;
  let input = noise(&mut rng, LEN);
  let mut bands = band_buffers(LEN);
  bank.split_into_bands(&[input.as_slice()], &mut bands, LEN);

  let mut max_err = 0.0f32;
  for n in delay..LEN {
    let mut sum = 0.0f32;
    for b in 0..NUM_BANDS {
      sum += bands[b][0][n];
    }
    let err = (sum - input[n - delay]).abs();
    if err > max_err { max_err = err; }
  }
  max_err
}

// Summing all six bands must reproduce the input delayed by the bank's
// group delay, because the coefficient assembly telescopes to a unit
// impulse. Holds for every phase mode.
#[test]
fn band_sum_reconstructs_the_input() {
  assert!(reconstruction_error(PhaseMode::TruncatedLinear, 64) < 1.0e-3);
  assert!(reconstruction_error(PhaseMode::FullLinear, 128) < 1.0e-3);
  // the minimum-phase set keeps its impulse at tap 63, not at the reported
  // latency; reconstruction is still exact at that tap
  assert!(reconstruction_error(PhaseMode::MinimumPhase, 63) < 1.0e-3);
}

#[test]
fn latency_per_phase_mode() {
  let mut bank = FilterBank::new();
  for (mode, expected) in [
    (PhaseMode::TruncatedLinear, 64),
    (PhaseMode::FullLinear, 128),
    (PhaseMode::MinimumPhase, 32),
  ] {
    bank.prepare(FilterBankConfig {
      phase_mode: mode,
      profile: CrossoverProfile::Default,
      sample_rate: 192_000.0,
      max_block_size: 1024,
      num_bands: NUM_BANDS,
    });
    assert_eq!(bank.latency_samples(), expected);
  }
}

#[test]
fn oversized_blocks_process_only_the_prepared_prefix() {
  const PREPARED: usize = 256;
  let mut bank = FilterBank::new();
  bank.prepare(FilterBankConfig {
    phase_mode: PhaseMode::TruncatedLinear,
    profile: CrossoverProfile::Default,
    sample_rate: 192_000.0,
    max_block_size: PREPARED,
    num_bands: NUM_BANDS,
  });

  let mut rng = 7u32;
  let input = noise(&mut rng, 512);
  let mut bands = band_buffers(512);
  const SENTINEL: f32 = 123.456;
  for band in bands.iter_mut() {
    for ch in band.iter_mut() {
      for v in ch.iter_mut() { *v = SENTINEL; }
    }
  }

  bank.split_into_bands(&[input.as_slice()], &mut bands, 512);

  // prefix was written, the rest was never touched
  for band in bands.iter() {
    assert!(band[0][..PREPARED].iter().any(|&v| v != SENTINEL));
    assert!(band[0][PREPARED..].iter().all(|&v| v == SENTINEL));
  }
}

#[test]
fn reset_clears_history_between_runs() {
  const LEN: usize = 1024;
  let mut bank = FilterBank::new();
  bank.prepare(FilterBankConfig {
    phase_mode: PhaseMode::TruncatedLinear,
    profile: CrossoverProfile::Default,
    sample_rate: 192_000.0,
    max_block_size: LEN,
    num_bands: NUM_BANDS,
  });

  let mut rng = 99u32;
  let input = noise(&mut rng, LEN);
  let mut first = band_buffers(LEN);
  bank.split_into_bands(&[input.as_slice()], &mut first, LEN);

  bank.reset();
  let mut second = band_buffers(LEN);
  bank.split_into_bands(&[input.as_slice()], &mut second, LEN);

  for b in 0..NUM_BANDS {
    for n in 0..LEN {
      assert_eq!(first[b][0][n], second[b][0][n]);
    }
  }
}

#[test]
fn profile_manager_switches_with_hysteresis() {
  use satmesh::{MaterialType, ProfileManager};

  let mut manager = ProfileManager::new();
  assert_eq!(manager.current(), CrossoverProfile::Default);

  // low confidence never switches
  assert_eq!(manager.update(MaterialType::KickHeavy, 0.3), CrossoverProfile::Default);
  // marginal confidence stays put as well
  assert_eq!(manager.update(MaterialType::KickHeavy, 0.6), CrossoverProfile::Default);
  // confident classification switches
  assert_eq!(manager.update(MaterialType::KickHeavy, 0.95), CrossoverProfile::BassHeavy);
  // and flicker back at low confidence is ignored
  assert_eq!(manager.update(MaterialType::CymbalHeavy, 0.4), CrossoverProfile::BassHeavy);
  // Auto leaves whatever is active alone
  assert_eq!(manager.update(MaterialType::Auto, 1.0), CrossoverProfile::BassHeavy);
}

#[test]
fn profiles_change_the_crossover_frequencies() {
  assert_ne!(
    CrossoverProfile::Default.frequencies(),
    CrossoverProfile::CymbalHeavy.frequencies()
  );
  for profile in [
    CrossoverProfile::Default,
    CrossoverProfile::BassHeavy,
    CrossoverProfile::Vocal,
    CrossoverProfile::Bright,
    CrossoverProfile::Percussive,
    CrossoverProfile::Synthetic,
    CrossoverProfile::CymbalHeavy,
    CrossoverProfile::MixComplex,
  ] {
    let f = profile.frequencies();
    for w in f.windows(2) {
      assert!(w[0] < w[1], "crossovers must ascend in {profile:?}");
    }
  }
}
