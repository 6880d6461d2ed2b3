//─────────────────────────────────────────────────────────────────────────────
// resolution-invariant metrics (SAD/px, PSNR) for progress reporting
//─────────────────────────────────────────────────────────────────────────────

use super::FITNESS_CHANNELS;

/// PSNR (peak signal-to-noise ratio) in decibels.
/// - `mse`: mean squared error (or pseudo-MSE from SAD)
/// - `peak`: 255.0 for 8-bit images
/// higher is better; ~30 dB is acceptable, 40+ dB very good
#[inline]
pub fn psnr_from_mse(mse: f64, peak: f64) -> f64 {
    let mse = mse.max(1e-12);
    10.0 * ((peak * peak) / mse).log10()
}

/// cached snapshot of resolution-invariant metrics, derived from raw RGB SAD
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub sad_per_px: f64,
    pub psnr: f64,
}

impl MetricsSnapshot {
    /// treats L1 per pixel per channel as if it were MSE ("pseudo-PSNR")
    pub fn from_sad(sad: u64, num_pixels: usize) -> Self {
        let n = num_pixels.max(1) as f64;
        let sad = sad as f64;
        let pseudo_mse = sad / (n * FITNESS_CHANNELS);
        Self {
            sad_per_px: sad / n,
            psnr: psnr_from_mse(pseudo_mse, 255.0),
        }
    }

    /// invert `fitness_from_sad` so reports can be built from a cached score
    pub fn from_fitness(fitness: f64, width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        let sad = ((1.0 - fitness) * pixels as f64 * FITNESS_CHANNELS * super::CHANNEL_SPAN)
            .round()
            .max(0.0) as u64;
        Self::from_sad(sad, pixels)
    }
}
