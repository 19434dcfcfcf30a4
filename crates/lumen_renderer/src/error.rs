use thiserror::Error;

use crate::bvh::BvhError;

/// Errors surfaced to the host application.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("BVH build failed: {0}")]
    Bvh(#[from] BvhError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
