use satmesh::engine::dsp::dc::DcBlocker;
use satmesh::engine::dsp::entropy::{EntropyDrift, Xorshift32};
use satmesh::engine::dsp::envelope::EnvelopeFollower;
use satmesh::engine::dsp::shaper::shape;
use satmesh::engine::dsp::thermal::ThermalModel;
use satmesh::engine::dsp::transient::TransientSplitter;
use satmesh::engine::fir_design::{design_lowpass, minimum_phase, snap_sample_rate};
use satmesh::engine::loudness::LoudnessMatcher;
use satmesh::engine::oversampler::Oversampler;
use satmesh::ShaperAlg;

const TAU: f32 = std::f32::consts::TAU;

#[test]
fn transient_and_body_sum_to_the_input_exactly() {
  let mut splitter = TransientSplitter::new(48_000.0);
  let mut rng = Xorshift32::new(42);
  for _ in 0..10_000 {
    let x = rng.next_bipolar() * 0.8;
    let split = splitter.process(x);
    assert_eq!(split.transient + split.body, x);
  }
}

#[test]
fn thermal_bias_is_clamped_for_any_input() {
  let mut tube = ThermalModel::new(48_000.0);
  for _ in 0..100_000 {
    let bias = tube.process(1.0e6);
    assert!(bias.is_finite());
    assert!(bias >= 0.0 && bias <= 0.151);
  }
  assert!(tube.temperature() <= 1.0);
}

#[test]
fn entropy_drift_is_bounded_and_silent_at_zero() {
  let mut drift = EntropyDrift::new(48_000.0, 7);
  for _ in 0..50_000 {
    assert_eq!(drift.process(0.0), 0.0);
  }
  for _ in 0..50_000 {
    let v = drift.process(1.0);
    assert!(v.abs() <= 0.151);
  }
}

#[test]
fn shapers_stay_bounded_under_absurd_drive() {
  let algs = [
    ShaperAlg::Clean,
    ShaperAlg::GoldenRatio,
    ShaperAlg::EulerTube,
    ShaperAlg::PiFold,
    ShaperAlg::Fibonacci,
    ShaperAlg::SuperEllipse,
    ShaperAlg::HardClip,
    ShaperAlg::Rectifier,
  ];
  let mut rng = Xorshift32::new(1);
  for alg in algs {
    for _ in 0..5_000 {
      let x = rng.next_bipolar() * 2.0;
      let drive = rng.next_bipolar().abs() * 50.0;
      let y = shape(x, drive, alg);
      assert!(y.is_finite());
      assert!(y.abs() <= 4.0, "{alg:?} produced {y} for x={x} drive={drive}");
    }
  }
}

#[test]
fn clean_shaper_is_transparent() {
  for &x in &[-1.0f32, -0.5, 0.0, 0.3, 0.99] {
    assert_eq!(shape(x, 10.0, ShaperAlg::Clean), x);
  }
}

#[test]
fn dc_blocker_removes_a_constant_offset() {
  let mut dc = DcBlocker::new(48_000.0);
  let mut last = 1.0;
  for _ in 0..96_000 {
    last = dc.process(1.0);
  }
  assert!(last.abs() < 1.0e-2);
}

#[test]
fn envelope_follower_attacks_instantly_and_releases_slowly() {
  let mut env = EnvelopeFollower::new(48_000.0);
  assert_eq!(env.process(0.8), 0.8);
  let mut v = 0.8;
  for _ in 0..4800 {
    v = env.process(0.0);
  }
  // 100 ms into a 150 ms release: clearly below the peak, clearly not gone
  assert!(v < 0.6);
  assert!(v > 0.2);
}

#[test]
fn sample_rate_snapping_picks_the_nearest_supported_rate() {
  assert_eq!(snap_sample_rate(44_100.0), 44_100.0);
  assert_eq!(snap_sample_rate(48_000.0), 48_000.0);
  assert_eq!(snap_sample_rate(44_000.0), 44_100.0);
  assert_eq!(snap_sample_rate(50_000.0), 48_000.0);
  assert_eq!(snap_sample_rate(70_000.0), 88_200.0);
  assert_eq!(snap_sample_rate(192_000.0), 96_000.0);
  assert_eq!(snap_sample_rate(-1.0), 48_000.0);
}

#[test]
fn lowpass_design_has_unity_dc_gain() {
  let h = design_lowpass(256, 128, 1000.0, 48_000.0);
  let sum: f32 = h.iter().sum();
  assert!((sum - 1.0).abs() < 1.0e-4);
}

#[test]
fn minimum_phase_keeps_dc_gain_and_front_loads_energy() {
  let linear = design_lowpass(128, 64, 2500.0, 192_000.0);
  let min = minimum_phase(&linear, 128);

  let dc_lin: f32 = linear.iter().sum();
  let dc_min: f32 = min.iter().sum();
  assert!((dc_lin - dc_min).abs() < 0.02, "dc gain drifted: {dc_lin} vs {dc_min}");

  let total: f32 = min.iter().map(|v| v * v).sum();
  let front: f32 = min.iter().take(64).map(|v| v * v).sum();
  assert!(front / total > 0.9, "energy not front-loaded: {}", front / total);
}

// The oversampler's reported latency must match its measured group delay:
// a sine pushed up and straight back down comes out 38 samples late.
#[test]
fn oversampler_round_trip_matches_reported_latency() {
  const SR: f32 = 48_000.0;
  const BLOCK: usize = 512;
  const BLOCKS: usize = 8;

  let mut os = Oversampler::new();
  os.prepare(SR, BLOCK, 1);
  let latency = os.latency_samples();
  assert_eq!(latency.fract(), 0.0, "round trip latency must be whole samples");
  let delay = latency as usize;

  let mut input = Vec::new();
  let mut output = Vec::new();
  let mut high = vec![vec![0.0f32; BLOCK * 4], vec![0.0f32; BLOCK * 4]];
  let mut down = vec![vec![0.0f32; BLOCK], vec![0.0f32; BLOCK]];
  let mut phase = 0.0f32;

  for _ in 0..BLOCKS {
    let block: Vec<f32> = (0..BLOCK)
      .map(|_| {
        let v = (TAU * phase).sin() * 0.5;
        phase = (phase + 997.0 / SR) % 1.0;
        v
      })
      .collect();
    os.upsample(&[block.as_slice()], &mut high, BLOCK);
    os.downsample(&high, &mut down, BLOCK);
    input.extend_from_slice(&block);
    output.extend_from_slice(&down[0][..BLOCK]);
  }

  // skip the first blocks while the filters fill up
  let start = BLOCK * 2;
  let mut max_err = 0.0f32;
  for n in start..input.len() {
    let err = (output[n] - input[n - delay]).abs();
    if err > max_err { max_err = err; }
  }
  assert!(max_err < 2.0e-3, "round trip error {max_err}");
}

#[test]
fn loudness_matcher_converges_to_the_power_ratio() {
  const SR: f32 = 48_000.0;
  let mut matcher = LoudnessMatcher::new(SR);
  let mut phase = 0.0f32;
  let mut gain = 1.0;
  for _ in 0..(SR as usize * 4) {
    let dry = (TAU * phase).sin() * 0.5;
    phase = (phase + 500.0 / SR) % 1.0;
    let wet = dry * 0.5; // wet runs 6 dB quiet
    gain = matcher.process(dry, dry, wet, wet);
  }
  assert!((gain - 2.0).abs() < 0.05, "gain settled at {gain}");
}

#[test]
fn loudness_matcher_holds_its_gain_through_silence() {
  const SR: f32 = 48_000.0;
  let mut matcher = LoudnessMatcher::new(SR);
  let mut phase = 0.0f32;
  for _ in 0..(SR as usize * 4) {
    let dry = (TAU * phase).sin() * 0.5;
    phase = (phase + 500.0 / SR) % 1.0;
    matcher.process(dry, dry, dry * 0.5, dry * 0.5);
  }
  let before = matcher.process(0.0, 0.0, 0.0, 0.0);
  for _ in 0..(SR as usize) {
    matcher.process(0.0, 0.0, 0.0, 0.0);
  }
  let after = matcher.process(0.0, 0.0, 0.0, 0.0);
  assert!((before - after).abs() < 0.05, "gain drifted in silence: {before} -> {after}");
}
