use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::dna::Chromosome;
use crate::error::{ImageError, Result};
use crate::fitness::MetricsSnapshot;
use crate::render::{with_scratch_canvas, Canvas, TargetImage};
use crate::settings::RunSettings;
use crate::stats::{FitnessStats, SharedFitnessStats};

/// what one `Engine::step` observed
#[derive(Clone, Copy, Debug)]
pub struct GenerationReport {
    pub generation: u64,
    /// best fitness ever observed in this run (including this generation)
    pub best_fitness: f64,
    /// best fitness within this generation
    pub generation_best: f64,
    pub stats: FitnessStats,
    /// metrics of the overall best
    pub metrics: MetricsSnapshot,
}

/// minimal elitist driver: score everyone in parallel, keep the top `elitism`,
/// refill with mutated copies of tournament winners.
///
/// each offspring gets its own `Pcg32` seeded from the engine's stream, so a run
/// is reproducible for a given seed no matter how rayon schedules the work.
pub struct Engine {
    rng: Pcg32,
    settings: RunSettings,
    target: TargetImage,
    population: Vec<Chromosome>,
    best: Option<Chromosome>,
    evaluations: SharedFitnessStats, // every fresh evaluation in the run
    pub generation: u64,
}

impl Engine {
    pub fn new(target: TargetImage, settings: RunSettings) -> Result<Self> {
        profiling::scope!("Engine::new");
        settings.validate()?;

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let population = (0..settings.population_size)
            .map(|_| Chromosome::random(&mut rng, settings.vertex_count, settings.polygon_count))
            .collect();

        log::info!(
            "engine ready: {}x{} target, {} chromosomes of {} polygons x {} vertices",
            target.width(),
            target.height(),
            settings.population_size,
            settings.polygon_count,
            settings.vertex_count
        );

        Ok(Self {
            rng,
            settings,
            target,
            population,
            best: None,
            evaluations: SharedFitnessStats::new(),
            generation: 0,
        })
    }

    #[inline]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    #[inline]
    pub fn target(&self) -> &TargetImage {
        &self.target
    }

    #[inline]
    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// best chromosome ever observed
    #[inline]
    pub fn best(&self) -> Option<&Chromosome> {
        self.best.as_ref()
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().and_then(Chromosome::cached_fitness)
    }

    /// summary over every chromosome scored so far (elites are counted once)
    pub fn evaluation_stats(&self) -> FitnessStats {
        self.evaluations.snapshot()
    }

    /// render the best chromosome at the target's resolution
    pub fn render_best(&self) -> Result<Option<Canvas>> {
        let Some(best) = &self.best else {
            return Ok(None);
        };
        let mut canvas = self.target.blank_canvas()?;
        best.draw(&mut canvas);
        Ok(Some(canvas))
    }

    /// score the population, record the best, and breed the next generation
    pub fn step(&mut self) -> Result<GenerationReport> {
        profiling::scope!("Engine::step");
        let scores = self.score_population()?;

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));

        // population_size >= 2 is validated, so there is always a leader
        let leader = ranked[0];
        let generation_best = scores[leader];
        if self.best_fitness().map_or(true, |best| generation_best > best) {
            log::info!("gen {}: new best fitness {:.6}", self.generation, generation_best);
            self.best = Some(self.population[leader].clone());
        }

        let best_fitness = self.best_fitness().unwrap_or(generation_best);
        let report = GenerationReport {
            generation: self.generation,
            best_fitness,
            generation_best,
            stats: FitnessStats::from_values(&scores),
            metrics: MetricsSnapshot::from_fitness(best_fitness, self.target.width(), self.target.height()),
        };
        log::debug!(
            "gen {}: best {:.6}, mean {:.6}, sd {:.6}",
            report.generation,
            report.generation_best,
            report.stats.mean(),
            report.stats.std_dev()
        );

        self.population = self.breed(&scores, &ranked);
        self.generation += 1;
        Ok(report)
    }

    /// step `generations` times, handing each report to `on_report`
    pub fn run<F>(&mut self, generations: u64, mut on_report: F) -> Result<Option<GenerationReport>>
    where
        F: FnMut(&GenerationReport),
    {
        let mut last = None;
        for _ in 0..generations {
            let report = self.step()?;
            on_report(&report);
            last = Some(report);
        }
        Ok(last)
    }

    fn score_population(&self) -> Result<Vec<f64>, ImageError> {
        profiling::scope!("score_population");
        let (w, h) = (self.target.width(), self.target.height());
        let target = &self.target;
        let evaluations = &self.evaluations;

        // one scratch canvas per rayon worker
        self.population
            .par_iter()
            .map(|chromosome| -> Result<f64, ImageError> {
                let fresh = chromosome.cached_fitness().is_none();
                let score = with_scratch_canvas(w, h, |canvas| chromosome.fitness(target, canvas))??;
                if fresh {
                    evaluations.add_value(score);
                }
                Ok(score)
            })
            .collect()
    }

    fn breed(&mut self, scores: &[f64], ranked: &[usize]) -> Vec<Chromosome> {
        profiling::scope!("breed");
        let settings = &self.settings;
        let population = &self.population;

        let mut next: Vec<Chromosome> = ranked
            .iter()
            .take(settings.elitism)
            .map(|&i| population[i].clone())
            .collect();

        let seeds: Vec<u64> = (next.len()..settings.population_size)
            .map(|_| self.rng.random())
            .collect();

        let offspring: Vec<Chromosome> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = Pcg32::seed_from_u64(seed);
                let parent = tournament(&mut rng, scores, settings.tournament_size);
                population[parent].mutate(&mut rng, settings.mutation_rate, settings.mutation_amount)
            })
            .collect();

        next.extend(offspring);
        next
    }
}

/// index of the fittest among `size` uniformly drawn contestants
fn tournament<R: Rng + ?Sized>(rng: &mut R, scores: &[f64], size: usize) -> usize {
    let mut winner = rng.random_range(0..scores.len());
    for _ in 1..size {
        let challenger = rng.random_range(0..scores.len());
        if scores[challenger] > scores[winner] {
            winner = challenger;
        }
    }
    winner
}
