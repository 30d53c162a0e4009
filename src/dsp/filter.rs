//! Zero-phase single-pole low-pass filter.
//!
//! ## Algorithm
//!
//! 1. `RC = 1 / (2π·cutoff)`, `dt = 1 / rate`, `α = dt / (RC + dt)`.
//! 2. Forward pass: `y[0] = x[0]`, `y[i] = y[i-1] + α·(x[i] − y[i-1])`.
//! 3. Backward pass over `y`: `z[n-1] = y[n-1]`,
//!    `z[i] = z[i+1] + α·(y[i] − z[i+1])`.
//!
//! Running the same pole in both directions cancels the phase lag of a single
//! pass, so transients stay aligned with the unfiltered signal.

use std::f32::consts::PI;

/// Smoothing coefficient for a single-pole RC low-pass.
fn alpha(sample_rate: u32, cutoff_hz: f32) -> f32 {
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let dt = 1.0 / sample_rate as f32;
    dt / (rc + dt)
}

/// Bidirectional low-pass. Output length equals input length.
///
/// Empty input yields empty output.
pub fn low_pass(samples: &[f32], sample_rate: u32, cutoff_hz: f32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let a = alpha(sample_rate.max(1), cutoff_hz);

    let mut forward = Vec::with_capacity(samples.len());
    let mut prev = samples[0];
    forward.push(prev);
    for &x in &samples[1..] {
        prev += a * (x - prev);
        forward.push(prev);
    }

    let mut out = vec![0.0_f32; forward.len()];
    let last = forward.len() - 1;
    let mut next = forward[last];
    out[last] = next;
    for i in (0..last).rev() {
        next += a * (forward[i] - next);
        out[i] = next;
    }
    out
}
