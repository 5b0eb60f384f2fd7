use satmesh::engine::dsp::shaper::shape;
use satmesh::{configuration, modulation_targets, process_morph, InteractionMode, ShaperAlg};

#[test]
fn ducking_is_zero_at_rest() {
  let t = modulation_targets(InteractionMode::Ducking, 0.0, 1.0);
  assert_eq!(t.drive_mod, 0.0);
  assert_eq!(t.volume_mod, 0.0);
  assert!(!t.is_active());
}

#[test]
fn ducking_pulls_drive_and_volume_down_monotonically() {
  let mut prev_drive = 0.0;
  let mut prev_volume = 0.0;
  for step in 1..=10 {
    let envelope = step as f32 / 10.0;
    let t = modulation_targets(InteractionMode::Ducking, envelope, 1.0);
    assert!(t.drive_mod <= 0.0);
    assert!(t.volume_mod <= 0.0);
    assert!(t.drive_mod < prev_drive, "drive delta not strictly decreasing at {envelope}");
    assert!(t.volume_mod < prev_volume, "volume delta not strictly decreasing at {envelope}");
    prev_drive = t.drive_mod;
    prev_volume = t.volume_mod;
  }
}

// The minimum acceptance test for the cross-instance modulation contract.
#[test]
fn ducking_concrete_scenario() {
  let t = modulation_targets(InteractionMode::Ducking, 0.8, 1.0);
  assert!(t.drive_mod < 0.0);
  assert!(t.volume_mod < 0.0);

  let zero = modulation_targets(InteractionMode::Ducking, 0.0, 1.0);
  assert_eq!(zero.drive_mod, 0.0);
  assert_eq!(zero.volume_mod, 0.0);
}

#[test]
fn sensitivity_scales_the_reaction() {
  let half = modulation_targets(InteractionMode::Following, 0.5, 1.0);
  let double = modulation_targets(InteractionMode::Following, 0.5, 2.0);
  assert!((double.drive_mod - 2.0 * half.drive_mod).abs() < 1.0e-6);
}

#[test]
fn mode_targets_have_expected_signs() {
  let s = 0.7;
  assert!(modulation_targets(InteractionMode::Following, s, 1.0).drive_mod > 0.0);
  assert!(modulation_targets(InteractionMode::Gating, s, 1.0).volume_mod < 0.0);
  assert!(modulation_targets(InteractionMode::TransientClone, s, 1.0).punch_mod > 0.0);
  assert!(modulation_targets(InteractionMode::SpectralSculpt, s, 1.0).filter_mod > 0.0);
  assert!(modulation_targets(InteractionMode::EntropyStorm, s, 1.0).mojo_mod > 0.0);
  assert!(modulation_targets(InteractionMode::HarmonicShield, s, 1.0).blend_mod < 0.0);
}

#[test]
fn morph_endpoints_reproduce_single_shapers_exactly() {
  let cfg = configuration(InteractionMode::VoltageStarve, 2, ShaperAlg::GoldenRatio);
  for &x in &[-0.9f32, -0.3, 0.0, 0.2, 0.7] {
    for &drive in &[0.5f32, 1.0, 4.0] {
      let rest = shape(x, drive * cfg.rest_drive, cfg.rest_alg);
      let triggered = shape(x, drive * cfg.triggered_drive, cfg.triggered_alg);
      assert_eq!(process_morph(x, drive, 0.0, &cfg), rest);
      assert_eq!(process_morph(x, drive, 1.0, &cfg), triggered);
    }
  }
}

#[test]
fn morph_interpolates_between_endpoints() {
  let cfg = configuration(InteractionMode::Following, 0, ShaperAlg::EulerTube);
  let x = 0.5;
  let drive = 2.0;
  let rest = process_morph(x, drive, 0.0, &cfg);
  let triggered = process_morph(x, drive, 1.0, &cfg);
  let mid = process_morph(x, drive, 0.5, &cfg);
  let expected = rest + 0.5 * (triggered - rest);
  assert!((mid - expected).abs() < 1.0e-6);
}

#[test]
fn band_limited_modes_leave_other_bands_at_rest() {
  // ducking only reshapes the low bands; upper bands stay identical in both
  // states so modulation cannot change their tone
  for band in 3..6 {
    let cfg = configuration(InteractionMode::Ducking, band, ShaperAlg::PiFold);
    assert_eq!(cfg.rest_alg, cfg.triggered_alg);
    assert_eq!(cfg.rest_drive, cfg.triggered_drive);
  }
  for band in 0..3 {
    let cfg = configuration(InteractionMode::Ducking, band, ShaperAlg::PiFold);
    assert!(cfg.triggered_drive < cfg.rest_drive);
  }
}

#[test]
fn rest_state_is_always_the_user_algorithm() {
  for &mode in &[
    InteractionMode::Ducking,
    InteractionMode::Following,
    InteractionMode::Gating,
    InteractionMode::StereoBloom,
    InteractionMode::Sympathetic,
    InteractionMode::TransientClone,
    InteractionMode::SpectralSculpt,
    InteractionMode::VoltageStarve,
    InteractionMode::EntropyStorm,
    InteractionMode::HarmonicShield,
  ] {
    for band in 0..6 {
      let cfg = configuration(mode, band, ShaperAlg::SuperEllipse);
      assert_eq!(cfg.rest_alg, ShaperAlg::SuperEllipse);
      assert_eq!(cfg.rest_drive, 1.0);
    }
  }
}
