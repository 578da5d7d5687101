use thiserror::Error;

/// Everything that can go wrong while assembling a renderable scene.
///
/// All of these are construction-time failures; once a scene and camera
/// have been built successfully, rendering itself cannot fail.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("camera `to` and `up` directions must be orthogonal")]
    NonOrthogonalBasis,

    #[error("{what} must be positive (got {value})")]
    NonPositive { what: &'static str, value: f64 },

    #[error("triangle vertices are collinear")]
    DegenerateTriangle,

    #[error("a glossy beam needs at least one ray")]
    ZeroRayCount,

    #[error("`{what}` must be a non-zero vector")]
    ZeroVector { what: &'static str },

    #[error("scene `{ty}` entry is missing field `{field}`")]
    SceneField { ty: String, field: &'static str },

    #[error("unknown {what} type `{ty}` in scene description")]
    UnknownType { what: &'static str, ty: String },

    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scene file: {0}")]
    Json(#[from] serde_json::Error),
}
