use std::sync::Arc;

use satmesh::{ControlSnapshot, Engine, InteractionMode, Role, SignalBus, MAX_GROUPS, NUM_BANDS};

#[test]
fn write_then_read_roundtrips() {
  let bus = SignalBus::new();
  bus.write(0, 0, 0.25);
  bus.write(3, 5, 0.75);
  assert_eq!(bus.read(0, 0), 0.25);
  assert_eq!(bus.read(3, 5), 0.75);
  assert_eq!(bus.read(0, 1), 0.0);
}

#[test]
fn out_of_range_indices_are_noops() {
  let bus = SignalBus::new();
  bus.write(MAX_GROUPS, 0, 1.0);
  bus.write(0, NUM_BANDS, 1.0);
  bus.write(usize::MAX, usize::MAX, 1.0);
  assert_eq!(bus.read(MAX_GROUPS, 0), 0.0);
  assert_eq!(bus.read(0, NUM_BANDS), 0.0);
  // nothing leaked into valid cells either
  for g in 0..MAX_GROUPS {
    for b in 0..NUM_BANDS {
      assert_eq!(bus.read(g, b), 0.0);
    }
  }
}

#[test]
fn instance_slots_register_and_release() {
  let bus = SignalBus::new();
  let a = bus.register().expect("slot");
  let b = bus.register().expect("slot");
  assert_ne!(a, b);
  assert_eq!(bus.active_instances(), 2);

  bus.set_energy(a, 0.5);
  bus.set_energy(b, 0.25);
  assert!((bus.heat() - 0.75).abs() < 1.0e-6);

  bus.unregister(a);
  assert_eq!(bus.active_instances(), 1);
  assert!((bus.heat() - 0.25).abs() < 1.0e-6);

  // freed slot is reusable and starts cold
  let c = bus.register().expect("slot");
  assert_eq!(c, a);
  assert!((bus.heat() - 0.25).abs() < 1.0e-6);
}

#[test]
fn concurrent_access_smoke() {
  let bus = Arc::new(SignalBus::new());
  let writer = {
    let bus = bus.clone();
    std::thread::spawn(move || {
      for i in 0..10_000u32 {
        bus.write(1, (i % 6) as usize, (i % 100) as f32 / 100.0);
      }
    })
  };
  let reader = {
    let bus = bus.clone();
    std::thread::spawn(move || {
      let mut acc = 0.0f32;
      for _ in 0..10_000 {
        for b in 0..NUM_BANDS {
          let v = bus.read(1, b);
          assert!((0.0..=1.0).contains(&v));
          acc += v;
        }
      }
      acc
    })
  };
  writer.join().unwrap();
  let _ = reader.join().unwrap();
}

fn sine_block(freq: f32, sr: f32, phase: &mut f32, num: usize, amp: f32) -> Vec<f32> {
  (0..num)
    .map(|_| {
      let v = (std::f32::consts::TAU * *phase).sin() * amp;
      *phase = (*phase + freq / sr) % 1.0;
      v
    })
    .collect()
}

fn noise_block(state: &mut u32, num: usize, amp: f32) -> Vec<f32> {
  (0..num)
    .map(|_| {
      let mut x = *state;
      x ^= x << 13;
      x ^= x >> 17;
      x ^= x << 5;
      *state = x;
      (x as f32 * 2.3283064365386963e-10 * 2.0 - 1.0) * amp
    })
    .collect()
}

// A Reference instance feeding the bus must both raise the Listener's
// modulation meter and audibly duck it in Ducking mode.
#[test]
fn reference_ducks_listener_through_shared_bus() {
  const SR: f32 = 48_000.0;
  const BLOCK: usize = 512;

  let bus = Arc::new(SignalBus::new());
  let mut reference = Engine::with_bus(bus.clone());
  let mut listener = Engine::with_bus(bus.clone());
  reference.prepare(SR, BLOCK, 1);
  listener.prepare(SR, BLOCK, 1);

  let ref_snapshot = ControlSnapshot { role: Role::Reference, ..Default::default() };
  let listen_snapshot = ControlSnapshot {
    role: Role::Listener,
    mode: InteractionMode::Ducking,
    sensitivity: 1.0,
    depth: 1.0,
    ..Default::default()
  };

  let mut phase = 0.0f32;
  let mut rng = 0x1234_5678u32;

  let run_phase = |reference: &mut Engine,
                   listener: &mut Engine,
                   phase: &mut f32,
                   rng: &mut u32,
                   reference_loud: bool|
   -> f32 {
    let blocks = (2.5 * SR / BLOCK as f32) as usize;
    let measure_from = (blocks as f32 * 0.8) as usize;
    let mut acc = 0.0f64;
    let mut count = 0usize;
    for blk in 0..blocks {
      let ref_amp = if reference_loud { 0.9 } else { 0.0 };
      let ref_in = vec![noise_block(rng, BLOCK, ref_amp)];
      let mut ref_io = ref_in.clone();
      reference.process(&mut ref_io, &ref_in, &ref_snapshot);

      let listen_in = vec![sine_block(440.0, SR, phase, BLOCK, 0.5)];
      let mut listen_io = listen_in.clone();
      listener.process(&mut listen_io, &listen_in, &listen_snapshot);

      if blk >= measure_from {
        for &v in listen_io[0].iter() {
          acc += (v * v) as f64;
          count += 1;
        }
      }
    }
    (acc / count as f64).sqrt() as f32
  };

  let rms_quiet = run_phase(&mut reference, &mut listener, &mut phase, &mut rng, false);
  assert!(listener.last_modulation() < 0.05);

  let rms_ducked = run_phase(&mut reference, &mut listener, &mut phase, &mut rng, true);
  assert!(listener.last_modulation() > 0.3, "listener never saw the reference envelope");
  assert!(
    rms_ducked < rms_quiet * 0.8,
    "ducking had no audible effect: quiet {rms_quiet}, ducked {rms_ducked}"
  );
}
