use std::path::PathBuf;

use crate::graphics::lowlevel::ShaderStage;

/// Errors raised while building a shader or validating one of its uniforms.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A single stage failed to compile.
    #[error("Shader compile error:\n{log}{}", code_section(.code))]
    Compile {
        stage: ShaderStage,
        code: String,
        log: String,
    },

    /// All stages compiled but the program failed to link.
    #[error("Shader link error:\n{log}")]
    Link { log: String },

    #[error("Shader uniform error: Uniform not of correct type!")]
    UniformType,

    #[error("Shader uniform error: Shader must be bound!")]
    UniformBind,

    #[error("Shader uniform error: Uniform handle is invalid!")]
    UniformShader,

    /// No stage carried any source text.
    #[error("Shader has no stage sources")]
    EmptySources,

    /// The driver refused to allocate a program or stage object.
    #[error("Shader backend error: {0}")]
    Backend(String),

    #[error("Failed to read shader source {path:?}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

fn code_section(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    format!("\n    -- SHADER CODE --\n{code}")
}
