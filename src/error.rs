/// error types for polytrace. each concern gets its own enum; `PolytraceError`
/// aggregates them for callers that just want to bubble everything up.

/// run configuration rejected at setup time
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Polygons need at least 3 vertices (got {0})")]
    VertexCount(usize),
    #[error("Chromosomes need at least 1 polygon (got {0})")]
    PolygonCount(usize),
    #[error("Mutation rate must lie in [0, 1] (got {0})")]
    MutationRate(f32),
    #[error("Mutation amount must be finite and non-negative (got {0})")]
    MutationAmount(f32),
    #[error("Population size must be at least 2 (got {0})")]
    PopulationSize(usize),
    #[error("Elitism ({elitism}) must be smaller than the population size ({population})")]
    Elitism { elitism: usize, population: usize },
    #[error("Tournament size must be at least 1")]
    TournamentSize,
}

/// reference image / working canvas problems
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Canvas dimensions must be non-zero (got {width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("RGBA buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Canvas is {canvas_w}x{canvas_h} but the reference image is {ref_w}x{ref_h}")]
    DimensionMismatch {
        canvas_w: u32,
        canvas_h: u32,
        ref_w: u32,
        ref_h: u32,
    },
    #[error("Image codec failure: {0}")]
    Codec(#[from] image::ImageError),
}

/// packed polygon data that doesn't describe a valid polygon
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GenomeError {
    #[error("Packed polygon length {0} is not 4 + 2*k with k >= 3")]
    PackedLength(usize),
    #[error("Packed polygon value at index {index} is not finite")]
    NonFinite { index: usize },
    #[error("Color component {index} is {value}, outside [0, 1]")]
    ColorRange { index: usize, value: f32 },
    #[error("Polygons in one chromosome must share a vertex count ({expected} vs {found})")]
    MixedArity { expected: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PolytraceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Genome(#[from] GenomeError),
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = PolytraceError> = std::result::Result<T, E>;
