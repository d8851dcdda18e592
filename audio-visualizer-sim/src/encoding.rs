//! Byte formats of visualizer capture data.
//!
//! Waveform: 8-bit unsigned PCM, 128 is silence.
//!
//! FFT: 8-bit signed fixed point, packed for an `n`-point transform as
//! ```text
//! [0]       Re(0)        DC
//! [1]       Re(n/2)      Nyquist
//! [2k]      Re(k)        k = 1..n/2
//! [2k+1]    Im(k)
//! ```

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Convert `[-1.0, 1.0]` samples to unsigned 8-bit waveform bytes.
///
/// Clamps out-of-range values.
pub fn waveform_bytes(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|&s| ((s.clamp(-1.0, 1.0) * 127.0).round() as i16 + 128) as u8)
        .collect()
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Forward FFT of waveform bytes into the packed 8-bit layout.
///
/// One encoder per capture size; the plan and scratch buffer are reused
/// across ticks.
pub struct FftEncoder {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl FftEncoder {
    /// `size` must be a power of two, at least 2.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self {
            size,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Encode `waveform` (exactly `size` bytes). A 1-point transform yields DC only.
    pub fn encode(&mut self, waveform: &[u8]) -> Vec<u8> {
        let n = self.size;
        for (slot, &byte) in self.buffer.iter_mut().zip(waveform) {
            *slot = Complex::new(byte as f32 - 128.0, 0.0);
        }
        self.fft.process(&mut self.buffer);

        // A full-scale sine lands at ±127 in its bin.
        let scale = 2.0 / n as f32;
        let quantize = |v: f32| (v * scale).round().clamp(-128.0, 127.0) as i8 as u8;

        let mut out = vec![0u8; n];
        out[0] = quantize(self.buffer[0].re);
        if n < 2 {
            return out;
        }
        out[1] = quantize(self.buffer[n / 2].re);
        for k in 1..n / 2 {
            out[2 * k] = quantize(self.buffer[k].re);
            out[2 * k + 1] = quantize(self.buffer[k].im);
        }
        out
    }
}
