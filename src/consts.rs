// Runtime parameters
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_AA_SAMPLES: usize = 50;
pub const DEFAULT_AA_DEPTH: usize = 3;

// Floating point comparisons
pub const EPSILON: f64 = 1e-10;
pub const FEQ_EPSILON: f64 = 1e-4;

// Offset applied to spawned ray origins to avoid self-intersection
pub const DELTA: f64 = 1e-5;

// Recursive shading bounds
pub const MAX_CALC_COLOR_LEVEL: usize = 10;
pub const MIN_CALC_COLOR_K: f64 = 0.001;
