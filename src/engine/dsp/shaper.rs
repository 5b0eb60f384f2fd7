use serde::{Deserialize, Serialize};

/// Closed set of shaping transfer curves. The variant set is fixed, so
/// dispatch stays a plain match instead of anything virtual.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ShaperAlg {
  Clean,
  GoldenRatio,  // Chebyshev blend weighted down the golden spiral
  EulerTube,    // logistic sigmoid, thicker than tanh
  PiFold,       // trigonometric foldback
  Fibonacci,    // fractal level steps at inverse-Fibonacci thresholds
  SuperEllipse, // Lame curve, flat-top without hard corners
  HardClip,
  Rectifier,    // foldback octave-up ghost harmonics
}

const PHI: f32 = 1.618_034;
const PI: f32 = std::f32::consts::PI;

/// Applies `alg` to `input` at the given drive. Every branch is bounded:
/// no drive value can make the output diverge.
#[inline]
pub fn shape(input: f32, drive: f32, alg: ShaperAlg) -> f32 {
  let x = input * drive;
  match alg {
    ShaperAlg::Clean => input,

    ShaperAlg::GoldenRatio => {
      // Soft-clip first so the polynomials stay in range
      let sat = x.tanh();
      let t1 = sat;
      let t2 = 2.0 * sat * sat - 1.0;
      let t3 = 4.0 * sat * sat * sat - 3.0 * sat;
      let mut out = t1 + t2 * (1.0 / PHI) * 0.2 + t3 * (1.0 / (PHI * PHI)) * 0.1;
      // T2 is even and leaves a DC pedestal; pull it back out
      out -= (1.0 / PHI) * 0.2 * 0.5;
      out
    }

    ShaperAlg::EulerTube => {
      let safe_x = x.clamp(-10.0, 10.0);
      2.0 / (1.0 + (-2.0 * safe_x).exp()) - 1.0
    }

    ShaperAlg::PiFold => {
      let out = if x.abs() < 1.0 {
        (x * (PI / 2.0)).sin()
      } else {
        let sign = if x > 0.0 { 1.0 } else { -1.0 };
        let overflow = x - sign;
        sign * (overflow * PI).cos()
      };
      // Keep a sliver of tanh so the attack survives the fold
      out * 0.8 + x.tanh() * 0.2
    }

    ShaperAlg::Fibonacci => {
      let sign = if x > 0.0 { 1.0 } else { -1.0 };
      let mut ax = x.abs();
      let f1 = 1.0;
      let f2 = 0.5;
      let f3 = 1.0 / 3.0;
      let f4 = 0.2;
      if ax > f1 {
        ax = f1 + (ax - f1).tanh() * 0.1; // soft ceiling
      } else if ax > f2 {
        ax += (ax - f2) * 0.5; // expansion
      } else if ax > f3 {
        // linear
      } else if ax > f4 {
        ax -= (ax - f4) * 0.2; // compression
      }
      ax.min(1.2) * sign
    }

    ShaperAlg::SuperEllipse => {
      let n = 2.0 + drive.abs() * 0.5;
      let sign = if x > 0.0 { 1.0 } else { -1.0 };
      if x.abs() > 1.0 {
        sign
      } else {
        let ax = x.abs().min(1.0);
        let curve = 1.0 - (1.0 - ax.powf(n)).powf(1.0 / n);
        curve * sign
      }
    }

    ShaperAlg::HardClip => x.clamp(-1.0, 1.0),

    ShaperAlg::Rectifier => {
      // Foldback instead of a pure rectifier: keeps more energy, still
      // produces the octave
      let mut folding = x.abs();
      if folding > 1.0 {
        folding = 2.0 - folding.rem_euclid(2.0);
        if folding > 1.0 { folding = 2.0 - folding; }
      }
      (folding - 0.5) * 2.5
    }
  }
}
