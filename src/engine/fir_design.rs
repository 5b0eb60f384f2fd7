use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

pub const SUPPORTED_RATES: [f32; 4] = [44_100.0, 48_000.0, 88_200.0, 96_000.0];

/// Snaps any positive rate to the nearest rate we ship coefficient designs
/// for. The caller logs when the snap actually changed something.
pub fn snap_sample_rate(sr: f32) -> f32 {
  let sr = if sr > 0.0 { sr } else { 48_000.0 };
  let mut best = SUPPORTED_RATES[0];
  for &r in SUPPORTED_RATES.iter() {
    if (sr - r).abs() < (sr - best).abs() {
      best = r;
    }
  }
  best
}

// Blackman weight at distance d from the center, half-width h
fn window(d: f64, h: f64) -> f64 {
  if d.abs() > h { return 0.0; }
  0.42 + 0.5 * (PI * d / h).cos() + 0.08 * (2.0 * PI * d / h).cos()
}

/// Windowed-sinc linear-phase lowpass: `taps` coefficients with the impulse
/// peak at `center`, normalized to unity DC gain. Runs only in prepare();
/// the audio thread sees finished tables.
pub fn design_lowpass(taps: usize, center: usize, cutoff_hz: f32, sample_rate: f32) -> Vec<f32> {
  let wc = 2.0 * PI * (cutoff_hz as f64 / sample_rate as f64).clamp(1.0e-5, 0.499);
  let c = center as f64;
  let half = c.max(taps as f64 - 1.0 - c).max(1.0);

  let mut h = vec![0.0f64; taps];
  for (n, v) in h.iter_mut().enumerate() {
    let d = n as f64 - c;
    let sinc = if d.abs() < 1.0e-9 { wc / PI } else { (wc * d).sin() / (PI * d) };
    *v = sinc * window(d, half);
  }

  let sum: f64 = h.iter().sum();
  let norm = if sum.abs() > 1.0e-12 { 1.0 / sum } else { 1.0 };
  h.iter().map(|&v| (v * norm) as f32).collect()
}

/// Minimum-phase equivalent of a linear-phase prototype via the real-cepstrum
/// fold. Same magnitude response, energy packed toward t = 0. f64 all the way
/// through the FFTs; the result is truncated to `out_taps`.
pub fn minimum_phase(linear: &[f32], out_taps: usize) -> Vec<f32> {
  let nfft = (linear.len() * 8).next_power_of_two().max(2048);
  let mut planner = FftPlanner::<f64>::new();
  let fft = planner.plan_fft_forward(nfft);
  let ifft = planner.plan_fft_inverse(nfft);

  let mut buf: Vec<Complex<f64>> = linear
    .iter()
    .map(|&v| Complex::new(v as f64, 0.0))
    .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
    .take(nfft)
    .collect();

  // log-magnitude spectrum (floored so log never sees zero)
  fft.process(&mut buf);
  for v in buf.iter_mut() {
    let mag = v.norm().max(1.0e-9);
    *v = Complex::new(mag.ln(), 0.0);
  }

  // real cepstrum
  ifft.process(&mut buf);
  let scale = 1.0 / nfft as f64;
  for v in buf.iter_mut() { *v *= scale; }

  // fold the anti-causal half onto the causal half
  for n in 1..nfft / 2 {
    buf[n] *= 2.0;
  }
  for n in nfft / 2 + 1..nfft {
    buf[n] = Complex::new(0.0, 0.0);
  }

  // back to the spectrum, exponentiate, back to time
  fft.process(&mut buf);
  for v in buf.iter_mut() {
    *v = v.exp();
  }
  ifft.process(&mut buf);
  for v in buf.iter_mut() { *v *= scale; }

  buf.iter().take(out_taps).map(|v| v.re as f32).collect()
}
