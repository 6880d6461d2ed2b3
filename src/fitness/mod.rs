// Fitness module organization
// sad: raw pixel difference, metrics: human-readable views of it

pub mod metrics;
pub mod sad;

pub use metrics::MetricsSnapshot;
pub use sad::sad_rgb;

use crate::dna::Chromosome;
use crate::error::ImageError;
use crate::render::{Canvas, TargetImage};

/// per-channel normalizer. 256 (not 255) keeps the worst case strictly above zero,
/// and scores from earlier runs were computed with it.
pub const CHANNEL_SPAN: f64 = 256.0;

/// color channels that take part in the comparison (alpha is skipped)
pub const FITNESS_CHANNELS: f64 = 3.0;

/// map an RGB SAD onto a score where 1.0 is an exact match and lower is worse
#[inline]
pub fn fitness_from_sad(sad: u64, width: u32, height: u32) -> f64 {
    let pixels = width as f64 * height as f64;
    1.0 - sad as f64 / (pixels * FITNESS_CHANNELS * CHANNEL_SPAN)
}

/// working canvas and reference must agree on size
pub fn check_dimensions(target: &TargetImage, canvas: &Canvas) -> Result<(), ImageError> {
    if target.width() != canvas.width() || target.height() != canvas.height() {
        return Err(ImageError::DimensionMismatch {
            canvas_w: canvas.width(),
            canvas_h: canvas.height(),
            ref_w: target.width(),
            ref_h: target.height(),
        });
    }
    Ok(())
}

impl Chromosome {
    /// render onto `canvas` and score against `target`. always re-renders;
    /// the canvas is scratch and its old contents never leak into the score.
    pub fn evaluate(&self, target: &TargetImage, canvas: &mut Canvas) -> Result<f64, ImageError> {
        profiling::scope!("Chromosome::evaluate");
        check_dimensions(target, canvas)?;
        self.draw(canvas);
        let sad = sad_rgb(target.rgba(), canvas.data());
        Ok(fitness_from_sad(sad, target.width(), target.height()))
    }

    /// like `evaluate`, but remembers the score together with the reference's
    /// fingerprint. scoring against a different reference re-renders and leaves
    /// the first cached score in place.
    pub fn fitness(&self, target: &TargetImage, canvas: &mut Canvas) -> Result<f64, ImageError> {
        check_dimensions(target, canvas)?;
        match self.fitness.get() {
            Some(&(fingerprint, score)) if fingerprint == target.fingerprint() => Ok(score),
            Some(_) => self.evaluate(target, canvas),
            None => {
                let score = self.evaluate(target, canvas)?;
                let &(_, cached) = self.fitness.get_or_init(|| (target.fingerprint(), score));
                Ok(cached)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Polygon;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> TargetImage {
        let buf = rgba.repeat((width * height) as usize);
        TargetImage::new(width, height, buf).unwrap()
    }

    #[test]
    fn test_white_reference_with_no_polygons_scores_one() {
        let target = solid(12, 9, [255, 255, 255, 255]);
        let mut canvas = target.blank_canvas().unwrap();
        let empty = Chromosome::new(Vec::new()).unwrap();
        assert_eq!(empty.fitness(&target, &mut canvas).unwrap(), 1.0);
    }

    #[test]
    fn test_covering_white_polygon_scores_one() {
        let target = solid(10, 10, [255, 255, 255, 255]);
        let mut canvas = target.blank_canvas().unwrap();
        let cover = Polygon::from_data(vec![1.0, 1.0, 1.0, 1.0, -0.5, -0.5, 1.5, -0.5, 1.5, 1.5, -0.5, 1.5]).unwrap();
        let chromosome = Chromosome::new(vec![cover]).unwrap();
        assert_eq!(chromosome.evaluate(&target, &mut canvas).unwrap(), 1.0);
    }

    #[test]
    fn test_reference_alpha_is_ignored() {
        let target = solid(4, 4, [255, 255, 255, 0]);
        let mut canvas = target.blank_canvas().unwrap();
        let empty = Chromosome::new(Vec::new()).unwrap();
        assert_eq!(empty.evaluate(&target, &mut canvas).unwrap(), 1.0);
    }

    #[test]
    fn test_black_reference_worst_case_stays_positive() {
        let target = solid(5, 5, [0, 0, 0, 255]);
        let mut canvas = target.blank_canvas().unwrap();
        let score = Chromosome::new(Vec::new()).unwrap().evaluate(&target, &mut canvas).unwrap();
        assert_eq!(score, 1.0 - 255.0 / 256.0);
        assert!(score > 0.0);
    }

    #[test]
    fn test_flipped_components_lower_fitness_monotonically() {
        let (w, h) = (6u32, 5u32);
        let mut canvas = Canvas::new(w, h).unwrap();
        let empty = Chromosome::new(Vec::new()).unwrap();

        let mut previous = f64::INFINITY;
        for flipped in 0..(w * h * 3) as usize {
            let mut buf = vec![255u8; (w * h * 4) as usize];
            // flip the first `flipped` color components, skipping alpha slots
            let color_slots = (0..buf.len()).filter(|i| i % 4 != 3).take(flipped).collect::<Vec<_>>();
            for i in color_slots {
                buf[i] = 0;
            }
            let target = TargetImage::new(w, h, buf).unwrap();
            let score = empty.evaluate(&target, &mut canvas).unwrap();
            let expected = 1.0 - (flipped as f64 * 255.0) / (w as f64 * h as f64 * 3.0 * 256.0);
            assert!((score - expected).abs() < 1e-12);
            assert!(score < previous || flipped == 0);
            previous = score;
        }
    }

    #[test]
    fn test_first_component_counts() {
        let mut buf = vec![255u8; 4 * 4 * 4];
        buf[0] = 0;
        let target = TargetImage::new(4, 4, buf).unwrap();
        let mut canvas = target.blank_canvas().unwrap();
        let score = Chromosome::new(Vec::new()).unwrap().evaluate(&target, &mut canvas).unwrap();
        assert!(score < 1.0);
    }

    #[test]
    fn test_fitness_is_pure_and_cached() {
        let mut rng = Pcg32::seed_from_u64(99);
        let target = solid(24, 16, [40, 120, 200, 255]);
        let mut canvas = target.blank_canvas().unwrap();
        let chromosome = Chromosome::random(&mut rng, 5, 10);

        let a = chromosome.evaluate(&target, &mut canvas).unwrap();
        // dirty the canvas in between
        Chromosome::random(&mut rng, 3, 4).draw(&mut canvas);
        let b = chromosome.evaluate(&target, &mut canvas).unwrap();
        assert_eq!(a, b);

        assert_eq!(chromosome.cached_fitness(), None);
        assert_eq!(chromosome.fitness(&target, &mut canvas).unwrap(), a);
        assert_eq!(chromosome.cached_fitness(), Some(a));
        assert_eq!(chromosome.clone().cached_fitness(), Some(a));
    }

    #[test]
    fn test_cached_score_not_reused_for_another_reference() {
        let white = solid(2, 2, [255, 255, 255, 255]);
        let black = solid(2, 2, [0, 0, 0, 255]);
        let mut canvas = white.blank_canvas().unwrap();
        let empty = Chromosome::new(Vec::new()).unwrap();

        assert_eq!(empty.fitness(&white, &mut canvas).unwrap(), 1.0);
        assert_eq!(empty.fitness(&black, &mut canvas).unwrap(), 1.0 - 255.0 / 256.0);
        // first reference keeps its cached score
        assert_eq!(empty.cached_fitness(), Some(1.0));
        assert_eq!(empty.fitness(&white, &mut canvas).unwrap(), 1.0);
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let target = solid(8, 8, [0, 0, 0, 255]);
        let mut canvas = Canvas::new(8, 7).unwrap();
        let err = Chromosome::new(Vec::new()).unwrap().fitness(&target, &mut canvas).unwrap_err();
        assert!(matches!(err, ImageError::DimensionMismatch { canvas_h: 7, ref_h: 8, .. }));
    }
}
