use std::time::Instant;

use anyhow::Context;
use engine::{Shader, ShaderContext, ShaderSources, graphics::lowlevel::UniformLocation};
use glow::HasContext;
use log::info;

use crate::window::GlfwWindow;

pub mod config;
mod window;

pub use config::DemoConfig;

/// Sources used when no shader directory is configured.
pub fn builtin_sources() -> ShaderSources {
    ShaderSources::new()
        .vertex(include_str!("../shaders/basic.vert"))
        .fragment(include_str!("../shaders/basic.frag"))
}

fn load_sources(config: &DemoConfig) -> anyhow::Result<ShaderSources> {
    let Some(dir) = &config.shader_dir else {
        return Ok(builtin_sources());
    };

    let sources = ShaderSources::load(dir, &config.shader_name).with_context(|| {
        format!(
            "Failed to load shader {:?} from {:?}",
            config.shader_name, dir
        )
    })?;
    if sources.is_empty() {
        anyhow::bail!(
            "No stage files named {:?} found in {:?}",
            config.shader_name,
            dir
        );
    }
    Ok(sources)
}

fn log_uniforms(shader: &Shader) {
    let mut uniforms: Vec<_> = shader.uniforms().iter().collect();
    uniforms.sort_by(|a, b| a.name.cmp(&b.name));
    for uniform in uniforms {
        info!(
            "  {} : {:?}[{}] @ {:?}",
            uniform.name, uniform.ty, uniform.size, uniform.location
        );
    }
}

/// Builds the configured shader and reports what the driver made of it.
pub fn run(config: &DemoConfig) -> anyhow::Result<()> {
    info!("Starting shadercraft");
    let sources = load_sources(config)?;

    if config.null_backend {
        let context = ShaderContext::null();
        let shader = Shader::new(&context, &sources).context("Failed to build shader")?;
        shader.bind();
        info!(
            "Null backend: program {:?}, bound = {}, active = {:?}",
            shader.program(),
            shader.is_bound(),
            shader.context().active_program()
        );
        return Ok(());
    }

    let mut window = GlfwWindow::new(config)?;
    let context = ShaderContext::from_glow(window.gl.clone());
    let shader = Shader::new(&context, &sources).context("Failed to build shader")?;

    info!(
        "Program {:?} has {} active uniforms",
        shader.program(),
        shader.uniforms().len()
    );
    log_uniforms(&shader);

    render(&mut window, &shader, config.frames)
}

fn render(window: &mut GlfwWindow, shader: &Shader, frames: u32) -> anyhow::Result<()> {
    let gl = window.gl.clone();
    let vertex_array = unsafe { gl.create_vertex_array() }
        .map_err(|e| anyhow::anyhow!("Failed to create vertex array: {}", e))?;

    let start = Instant::now();
    let mut frame = 0;
    while frame < frames && !window.should_close() {
        window.poll_events();
        let (width, height) = window.framebuffer_size();

        shader.bind();
        let time = shader.uniform("u_time");
        let color = shader.uniform("u_color");

        unsafe {
            gl.viewport(0, 0, width, height);
            gl.clear_color(0.1, 0.1, 0.1, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);

            if let Ok(entry) = time.expect_value::<f32>() {
                let seconds = start.elapsed().as_secs_f32();
                gl.uniform_1_f32(location(entry.location).as_ref(), seconds);
            }
            if let Ok(entry) = color.expect_value::<glam::Vec4>() {
                gl.uniform_4_f32(location(entry.location).as_ref(), 1.0, 0.8, 0.6, 1.0);
            }

            gl.bind_vertex_array(Some(vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
        }

        window.swap_buffers();
        frame += 1;
    }

    unsafe { gl.delete_vertex_array(vertex_array) };
    info!("Rendered {} frames", frame);
    Ok(())
}

fn location(location: UniformLocation) -> Option<glow::NativeUniformLocation> {
    location
        .is_active()
        .then(|| glow::NativeUniformLocation(location.0 as u32))
}
