//! SPH smoothing kernels.
//!
//! Both kernels have compact support: they evaluate to exactly zero at and
//! beyond the interaction radius and are continuous at the boundary.

use glam::Vec3;
use std::f32::consts::PI;

/// Poly6 density kernel.
/// W(r, h) = (315 / 64πh⁹) (h² − r²)³ for r ≤ h
#[inline]
pub fn poly6(r_sq: f32, h: f32) -> f32 {
    let h_sq = h * h;
    if r_sq >= h_sq {
        return 0.0;
    }
    let diff = h_sq - r_sq;
    315.0 / (64.0 * PI * h.powi(9)) * diff * diff * diff
}

/// Gradient of the Spiky kernel, used for constraint gradients.
/// ∇W(r, h) = −(45 / πh⁶) (h − |r|)² r̂ for 0 < r ≤ h
///
/// The zero-distance guard avoids an undefined direction when two particles
/// coincide.
#[inline]
pub fn spiky_gradient(r: Vec3, h: f32) -> Vec3 {
    let r_len = r.length();
    if r_len >= h || r_len < 1e-6 {
        return Vec3::ZERO;
    }
    let diff = h - r_len;
    -45.0 / (PI * h.powi(6)) * diff * diff * (r / r_len)
}
