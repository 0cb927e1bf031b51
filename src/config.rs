use std::path::PathBuf;

use clap::{Parser, builder::BoolishValueParser};

/// Compiles a GLSL program, reports its uniforms and draws it for a few frames.
#[derive(Clone, Debug, PartialEq, Parser)]
#[command(name = "shadercraft")]
#[command(version)]
pub struct DemoConfig {
    /// Directory to load `<shader_name>.<stage>` files from. Built-in sources are used if unset.
    pub shader_dir: Option<PathBuf>,

    /// Base name of the stage files (`basic` loads `basic.vert`, `basic.frag`, ...).
    #[arg(default_value = "basic")]
    pub shader_name: String,

    /// Skip window creation and run against the null backend.
    #[arg(long = "null", env = "SHADERCRAFT_NULL", value_parser = BoolishValueParser::new())]
    pub null_backend: bool,

    /// Number of frames to draw before exiting.
    #[arg(long, env = "SHADERCRAFT_FRAMES", default_value_t = 60)]
    pub frames: u32,

    /// Show the window while drawing.
    #[arg(long, env = "SHADERCRAFT_VISIBLE", value_parser = BoolishValueParser::new())]
    pub visible: bool,

    #[arg(long, default_value_t = 800)]
    pub width: u32,

    #[arg(long, default_value_t = 600)]
    pub height: u32,

    #[arg(long, default_value = "Shadercraft")]
    pub title: String,
}
