use std::sync::Arc;

/// A read-only string type.
pub type ReadOnlyString = Arc<str>;

pub mod error;
pub mod graphics;

pub use error::ShaderError;
pub use graphics::{
    context::ShaderContext,
    shader::{Shader, ShaderSources, UniformRef},
};
