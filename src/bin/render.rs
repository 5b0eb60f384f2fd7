// Offline render: push a WAV through one engine and write the result.
// Usage: render <input.wav> <output.wav> [snapshot.json]

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use satmesh::{ControlSnapshot, Engine};

const BLOCK: usize = 512;

fn main() -> Result<()> {
  let args: Vec<String> = env::args().collect();
  if args.len() < 3 {
    bail!("usage: render <input.wav> <output.wav> [snapshot.json]");
  }

  let snapshot: ControlSnapshot = if let Some(path) = args.get(3) {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
  } else {
    ControlSnapshot { drive: 35.0, ..Default::default() }
  };

  let mut reader = hound::WavReader::open(&args[1]).with_context(|| format!("opening {}", args[1]))?;
  let spec = reader.spec();
  let channels = (spec.channels as usize).min(2);
  let sr = spec.sample_rate as f32;

  // deinterleave into per-channel buffers
  let samples: Vec<f32> = match spec.sample_format {
    hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    hound::SampleFormat::Int => {
      let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
      reader.samples::<i32>().map(|s| s.map(|v| v as f32 * scale)).collect::<Result<_, _>>()?
    }
  };
  let frames = samples.len() / spec.channels as usize;
  let mut input: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
  for f in 0..frames {
    for ch in 0..channels {
      input[ch].push(samples[f * spec.channels as usize + ch]);
    }
  }

  let mut engine = Engine::new();
  engine.prepare(sr, BLOCK, channels);
  println!("latency: {} samples at {} Hz", engine.latency_samples(), engine.effective_sample_rate());

  let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
  let mut io: Vec<Vec<f32>> = vec![vec![0.0; BLOCK]; channels];
  let mut dry: Vec<Vec<f32>> = vec![vec![0.0; BLOCK]; channels];

  let mut pos = 0;
  while pos < frames {
    let n = BLOCK.min(frames - pos);
    for ch in 0..channels {
      io[ch][..n].copy_from_slice(&input[ch][pos..pos + n]);
      io[ch][n..].fill(0.0);
      dry[ch].copy_from_slice(&io[ch]);
    }
    engine.process(&mut io, &dry, &snapshot);
    for ch in 0..channels {
      output[ch].extend_from_slice(&io[ch][..n]);
    }
    pos += n;
  }

  let out_spec = hound::WavSpec {
    channels: channels as u16,
    sample_rate: spec.sample_rate,
    bits_per_sample: 32,
    sample_format: hound::SampleFormat::Float,
  };
  let mut writer = hound::WavWriter::create(&args[2], out_spec)
    .with_context(|| format!("creating {}", args[2]))?;
  for f in 0..frames {
    for ch in 0..channels {
      writer.write_sample(output[ch][f])?;
    }
  }
  writer.finalize()?;

  println!(
    "rendered {} frames, in rms {:.4}, out rms {:.4}",
    frames,
    engine.input_rms(),
    engine.output_rms()
  );
  Ok(())
}
