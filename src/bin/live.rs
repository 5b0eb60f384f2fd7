// Live runner: a generated bass loop through the engine to the default
// output device, with knob changes typed on stdin.
//
//   drive 60        mix 0.8       punch 0.4
//   mode following  role reference
//   quit

use std::f32::consts::TAU;
use std::io::BufRead;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use satmesh::{ControlSnapshot, Engine, InteractionMode, Role};

const BLOCK: usize = 512;

enum Msg {
  Set { name: String, value: f32 },
  Mode(InteractionMode),
  Role(Role),
  Quit,
}

fn apply_msg(snapshot: &mut ControlSnapshot, msg: Msg, running: &mut bool) {
  match msg {
    Msg::Set { name, value } => match name.as_str() {
      "drive" => snapshot.drive = value.clamp(0.0, 100.0),
      "mix" => snapshot.mix = value.clamp(0.0, 1.0),
      "punch" => snapshot.punch = value.clamp(-1.0, 1.0),
      "heat" => snapshot.heat = value.clamp(0.0, 1.0),
      "drift" => snapshot.drift = value.clamp(0.0, 1.0),
      "entropy" => snapshot.entropy = value.clamp(0.0, 1.0),
      "noise" => snapshot.noise = value.clamp(0.0, 1.0),
      "focus" => snapshot.focus = value.clamp(-1.0, 1.0),
      "sens" => snapshot.sensitivity = value.clamp(0.0, 2.0),
      _ => eprintln!("unknown param: {name}"),
    },
    Msg::Mode(mode) => snapshot.mode = mode,
    Msg::Role(role) => snapshot.role = role,
    Msg::Quit => *running = false,
  }
}

fn parse_line(line: &str) -> Option<Msg> {
  let mut parts = line.split_whitespace();
  let head = parts.next()?;
  match head {
    "quit" => Some(Msg::Quit),
    "mode" => {
      let mode = match parts.next()? {
        "ducking" => InteractionMode::Ducking,
        "following" => InteractionMode::Following,
        "gating" => InteractionMode::Gating,
        "bloom" => InteractionMode::StereoBloom,
        "sympathetic" => InteractionMode::Sympathetic,
        "clone" => InteractionMode::TransientClone,
        "sculpt" => InteractionMode::SpectralSculpt,
        "starve" => InteractionMode::VoltageStarve,
        "storm" => InteractionMode::EntropyStorm,
        "shield" => InteractionMode::HarmonicShield,
        other => {
          eprintln!("unknown mode: {other}");
          return None;
        }
      };
      Some(Msg::Mode(mode))
    }
    "role" => match parts.next()? {
      "reference" => Some(Msg::Role(Role::Reference)),
      "listener" => Some(Msg::Role(Role::Listener)),
      other => {
        eprintln!("unknown role: {other}");
        None
      }
    },
    name => {
      let value: f32 = parts.next()?.parse().ok()?;
      Some(Msg::Set { name: name.to_string(), value })
    }
  }
}

// Two-oscillator bass loop with a percussive tick every half second, enough
// material to hear the transient path and the saturator work.
struct Loop {
  phase_a: f32,
  phase_b: f32,
  clock: usize,
  sr: f32,
}

impl Loop {
  fn new(sr: f32) -> Self { Self { phase_a: 0.0, phase_b: 0.0, clock: 0, sr } }

  fn next(&mut self) -> f32 {
    self.phase_a = (self.phase_a + 55.0 / self.sr) % 1.0;
    self.phase_b = (self.phase_b + 110.5 / self.sr) % 1.0;
    let saw = 2.0 * (self.phase_a - 0.5);
    let sine = (TAU * self.phase_b).sin();

    let tick_len = (self.sr * 0.02) as usize;
    let period = (self.sr * 0.5) as usize;
    let in_tick = self.clock % period < tick_len;
    let tick = if in_tick {
      let t = (self.clock % period) as f32 / tick_len as f32;
      (1.0 - t) * (TAU * 2000.0 * t / 60.0).sin()
    } else {
      0.0
    };
    self.clock += 1;

    0.3 * saw + 0.2 * sine + 0.6 * tick
  }
}

fn run(rx: Receiver<Msg>, quit_rx: Receiver<()>) -> Result<()> {
  let host = cpal::default_host();
  let device = host
    .default_output_device()
    .ok_or_else(|| anyhow!("no output device"))?;
  let config = device.default_output_config()?;
  let mut cfg: cpal::StreamConfig = config.into();
  cfg.buffer_size = cpal::BufferSize::Fixed(BLOCK as u32);
  let sr = cfg.sample_rate.0 as f32;
  let channels = cfg.channels as usize;

  let mut engine = Engine::new();
  engine.prepare(sr, BLOCK, 2);
  println!(
    "running at {} Hz, latency {} samples",
    engine.effective_sample_rate(),
    engine.latency_samples()
  );

  let mut snapshot = ControlSnapshot { drive: 40.0, ..Default::default() };
  let mut source = Loop::new(sr);
  let mut io: Vec<Vec<f32>> = vec![vec![0.0; BLOCK]; 2];
  let mut dry: Vec<Vec<f32>> = vec![vec![0.0; BLOCK]; 2];
  let mut running = true;

  let err_fn = |e: cpal::StreamError| eprintln!("stream error: {e}");
  let stream = device.build_output_stream(
    &cfg,
    move |data: &mut [f32], _| {
      // drain control messages without blocking, capped so audio never starves
      let mut drained = 0usize;
      loop {
        match rx.try_recv() {
          Ok(msg) => apply_msg(&mut snapshot, msg, &mut running),
          Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
        drained += 1;
        if drained >= 24 { break; }
      }

      for frame in data.chunks_mut(channels * BLOCK) {
        let frames = frame.len() / channels;
        for i in 0..BLOCK {
          let s = if running && i < frames { source.next() } else { 0.0 };
          io[0][i] = s;
          io[1][i] = s;
          dry[0][i] = s;
          dry[1][i] = s;
        }
        engine.process(&mut io, &dry, &snapshot);
        for i in 0..frames {
          frame[i * channels] = io[0][i];
          if channels > 1 {
            frame[i * channels + 1] = io[1][i];
          }
          for c in 2..channels {
            frame[i * channels + c] = 0.0;
          }
        }
      }
    },
    err_fn,
    None,
  )?;
  stream.play()?;

  // park until the stdin thread says quit
  let _ = quit_rx.recv();
  Ok(())
}

fn main() -> Result<()> {
  let (tx, rx) = unbounded();
  let (quit_tx, quit_rx) = unbounded();
  std::thread::spawn(move || {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
      let Ok(line) = line else { break };
      if let Some(msg) = parse_line(&line) {
        let quit = matches!(msg, Msg::Quit);
        let _ = tx.send(msg);
        if quit { break; }
      }
    }
    let _ = quit_tx.send(());
  });
  run(rx, quit_rx)
}
