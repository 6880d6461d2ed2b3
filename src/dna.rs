use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tiny_skia as sk;

use crate::error::GenomeError;

/// floor applied to freshly drawn alpha so no polygon starts invisible
pub const MIN_SEED_ALPHA: f32 = 0.2;

/// leading color slots in the packed layout
const COLOR_LEN: usize = 4;

/// a semi-transparent polygon, packed as one flat vector:
///
/// | index      | data          |
/// |------------|---------------|
/// | 0..4       | r, g, b, a    |
/// | 4 + 2k     | x of vertex k |
/// | 5 + 2k     | y of vertex k |
///
/// colors are un-premultiplied in 0..1. vertices are in unit canvas space and may sit
/// outside 0..1 (shapes hanging off the canvas edge). the fill path is cached in unit
/// space since the vertices never change after construction.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Polygon {
    data: Vec<f32>,

    pub(crate) cached_path: OnceLock<Option<sk::Path>>,
}

// cache is rebuilt lazily, never copied
impl Clone for Polygon {
    fn clone(&self) -> Self {
        Self::from_raw(self.data.clone())
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl TryFrom<Vec<f32>> for Polygon {
    type Error = GenomeError;

    fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
        Self::from_data(data)
    }
}

impl From<Polygon> for Vec<f32> {
    fn from(poly: Polygon) -> Self {
        poly.data
    }
}

impl Polygon {
    fn from_raw(data: Vec<f32>) -> Self {
        Self { data, cached_path: OnceLock::new() }
    }

    /// build a polygon from its packed representation
    pub fn from_data(data: Vec<f32>) -> Result<Self, GenomeError> {
        let len = data.len();
        if len < COLOR_LEN + 2 * 3 || (len - COLOR_LEN) % 2 != 0 {
            return Err(GenomeError::PackedLength(len));
        }
        // NaN coordinates trip tiny-skia's scanline fill
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(GenomeError::NonFinite { index });
        }
        if let Some((index, &value)) = data[..COLOR_LEN]
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(GenomeError::ColorRange { index, value });
        }
        Ok(Self::from_raw(data))
    }

    /// draw a random polygon: uniform rgb, alpha skewed low (product of two draws,
    /// floored at `MIN_SEED_ALPHA`), vertices jittered by up to 0.5 around a random centroid.
    ///
    /// `vertex_count` must be at least 3 (checked up front by `RunSettings::validate`);
    /// smaller polygons can't be read back through `from_data`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, vertex_count: usize) -> Self {
        profiling::scope!("Polygon::random");
        debug_assert!(vertex_count >= 3, "polygons need at least 3 vertices (got {vertex_count})");
        let mut data = Vec::with_capacity(COLOR_LEN + 2 * vertex_count);

        let r = rng.random::<f32>();
        let g = rng.random::<f32>();
        let b = rng.random::<f32>();
        let a = MIN_SEED_ALPHA.max(rng.random::<f32>() * rng.random::<f32>());
        data.extend_from_slice(&[r, g, b, a]);

        let cx = rng.random::<f32>();
        let cy = rng.random::<f32>();
        for _ in 0..vertex_count {
            let x = cx + (rng.random::<f32>() - 0.5);
            let y = cy + (rng.random::<f32>() - 0.5);
            data.push(x);
            data.push(y);
        }

        Self::from_raw(data)
    }

    /// return a perturbed copy. each scalar (color and coordinates alike) is picked with
    /// probability `rate`; a picked value gets uniform noise in `[-amount, amount]` and is
    /// then clamped to 0..1. values that aren't picked are copied untouched, so an
    /// off-canvas vertex only moves back toward the unit square once it's picked.
    ///
    /// `rate` is expected in 0..1 and `amount` >= 0; other values are not normalized.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, rate: f32, amount: f32) -> Polygon {
        self.try_mutate(rng, rate, amount)
            .unwrap_or_else(|| self.clone())
    }

    /// like `mutate`, but returns `None` when no field was picked so callers can keep
    /// sharing the original
    pub fn try_mutate<R: Rng + ?Sized>(&self, rng: &mut R, rate: f32, amount: f32) -> Option<Polygon> {
        profiling::scope!("Polygon::try_mutate");
        debug_assert!((0.0..=1.0).contains(&rate), "mutation rate {rate} outside [0, 1]");
        debug_assert!(amount >= 0.0, "negative mutation amount {amount}");

        let mut mutated: Option<Vec<f32>> = None;
        for i in 0..self.data.len() {
            if rng.random::<f32>() < rate {
                let noise = rng.random::<f32>() * amount * 2.0 - amount;
                let data = mutated.get_or_insert_with(|| self.data.clone());
                data[i] = (data[i] + noise).clamp(0.0, 1.0);
            }
        }
        mutated.map(Self::from_raw)
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn rgba(&self) -> [f32; 4] {
        [self.data[0], self.data[1], self.data[2], self.data[3]]
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        (self.data.len() - COLOR_LEN) / 2
    }

    /// vertices in unit canvas space, in path order
    pub fn points(&self) -> impl ExactSizeIterator<Item = (f32, f32)> + '_ {
        self.data[COLOR_LEN..].chunks_exact(2).map(|p| (p[0], p[1]))
    }
}

/// one candidate image: an ordered stack of polygons painted bottom to top.
///
/// polygons sit behind `Arc` so clones and mutated siblings can share the ones
/// that didn't change. nothing mutates a polygon once it's shared.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Polygon>", into = "Vec<Polygon>")]
pub struct Chromosome {
    polys: Vec<Arc<Polygon>>,

    // (reference fingerprint, score)
    pub(crate) fitness: OnceLock<(u64, f64)>,
}

impl PartialEq for Chromosome {
    fn eq(&self, other: &Self) -> bool {
        self.polys == other.polys
    }
}

impl TryFrom<Vec<Polygon>> for Chromosome {
    type Error = GenomeError;

    fn try_from(polys: Vec<Polygon>) -> Result<Self, Self::Error> {
        Self::new(polys)
    }
}

impl From<Chromosome> for Vec<Polygon> {
    fn from(chromosome: Chromosome) -> Self {
        chromosome.polys.into_iter().map(Arc::unwrap_or_clone).collect()
    }
}

impl Chromosome {
    /// wrap an ordered polygon list. every polygon must have the same vertex count
    pub fn new(polys: Vec<Polygon>) -> Result<Self, GenomeError> {
        if let Some(first) = polys.first() {
            let expected = first.vertex_count();
            if let Some(odd) = polys.iter().find(|p| p.vertex_count() != expected) {
                return Err(GenomeError::MixedArity { expected, found: odd.vertex_count() });
            }
        }
        Ok(Self::from_shared(polys.into_iter().map(Arc::new).collect()))
    }

    fn from_shared(polys: Vec<Arc<Polygon>>) -> Self {
        Self { polys, fitness: OnceLock::new() }
    }

    /// `polygon_count` independent random polygons, kept in draw order.
    /// same `vertex_count >= 3` requirement as `Polygon::random`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, vertex_count: usize, polygon_count: usize) -> Self {
        profiling::scope!("Chromosome::random");
        debug_assert!(vertex_count >= 3, "polygons need at least 3 vertices (got {vertex_count})");
        let polys = (0..polygon_count)
            .map(|_| Arc::new(Polygon::random(rng, vertex_count)))
            .collect();
        Self::from_shared(polys)
    }

    /// sibling chromosome with every polygon passed through `Polygon::mutate`.
    /// untouched polygons are shared with `self`; the sibling starts unscored.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, rate: f32, amount: f32) -> Chromosome {
        profiling::scope!("Chromosome::mutate");
        let polys = self
            .polys
            .iter()
            .map(|poly| match poly.try_mutate(rng, rate, amount) {
                Some(mutated) => Arc::new(mutated),
                None => Arc::clone(poly),
            })
            .collect();
        Self::from_shared(polys)
    }

    #[inline]
    pub fn polygons(&self) -> &[Arc<Polygon>] {
        &self.polys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.polys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }

    /// fitness from an earlier `fitness` call, if any
    #[inline]
    pub fn cached_fitness(&self) -> Option<f64> {
        self.fitness.get().map(|&(_, score)| score)
    }
}
