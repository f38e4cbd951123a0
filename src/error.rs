//! Error types

use thiserror::Error;

/// Errors surfaced by configuration loading and entity construction
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse svg: {0}")]
    Svg(#[from] roxmltree::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wavefront needs a positive lifespan and at least one point (lifespan {lifespan}, points {num_points})")]
    InvalidWavefront { lifespan: f32, num_points: usize },
}

pub type Result<T> = std::result::Result<T, SimError>;
