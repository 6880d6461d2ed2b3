//! Evolve an approximation of a raster image out of semi-transparent polygons.
//!
//! - **Genome** (`dna`): `Polygon` (packed color + vertices) and `Chromosome`
//!   (ordered polygon stack), random generation and copy-on-mutate operators
//! - **Rendering** (`render`): paints a chromosome onto a tiny-skia backed `Canvas`
//! - **Fitness** (`fitness`): RGB sum of absolute differences against a `TargetImage`,
//!   mapped to a score where 1.0 is an exact match
//! - **Driver** (`engine`): a small elitist loop used to exercise the core
//!
//! All randomness is passed in explicitly as an `rand::Rng`; nothing here keeps
//! global state, so candidates can be scored in parallel as long as each worker
//! uses its own canvas.
//!
//! ```rust,no_run
//! use polytrace::{Chromosome, TargetImage};
//! use rand::SeedableRng;
//!
//! let target = TargetImage::open("reference.png")?;
//! let mut canvas = target.blank_canvas()?;
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
//!
//! let parent = Chromosome::random(&mut rng, 6, 50);
//! let child = parent.mutate(&mut rng, 0.01, 0.15);
//! println!("parent {:.4}, child {:.4}",
//!     parent.fitness(&target, &mut canvas)?,
//!     child.fitness(&target, &mut canvas)?);
//! # Ok::<(), polytrace::PolytraceError>(())
//! ```

pub mod dna;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod render;
pub mod settings;
pub mod stats;

pub use dna::{Chromosome, Polygon};
pub use engine::{Engine, GenerationReport};
pub use error::{ConfigError, GenomeError, ImageError, PolytraceError, Result};
pub use render::{Canvas, TargetImage};
pub use settings::RunSettings;
pub use stats::FitnessStats;
