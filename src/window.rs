use std::sync::Arc;

use glfw::{Context, Glfw, GlfwReceiver, PWindow};
use glow::HasContext;
use log::*;

use crate::config::DemoConfig;

/// A GLFW window with a current OpenGL 4.1 core context.
pub struct GlfwWindow {
    glfw: Glfw,
    window: PWindow,
    _event_receiver: GlfwReceiver<(f64, glfw::WindowEvent)>,
    /// The GL function table loaded for this window's context.
    pub gl: Arc<glow::Context>,
}

impl GlfwWindow {
    pub fn new(config: &DemoConfig) -> anyhow::Result<Self> {
        let mut glfw = glfw::init(handle_glfw_error)
            .map_err(|e| anyhow::anyhow!("Failed to initialize GLFW: {}", e))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(4, 1));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Visible(config.visible));

        let (mut window, event_receiver) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or_else(|| anyhow::anyhow!("Failed to create GLFW window"))?;

        window.make_current();

        let gl = unsafe {
            glow::Context::from_loader_function(|name| window.get_proc_address(name).map_or(std::ptr::null(), |f| f as *const _))
        };
        info!("Loaded OpenGL {:?}", gl.version());

        Ok(GlfwWindow {
            glfw,
            window,
            _event_receiver: event_receiver,
            gl: Arc::new(gl),
        })
    }

    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Gets the current framebuffer size of the window.
    pub fn framebuffer_size(&self) -> (i32, i32) {
        self.window.get_framebuffer_size()
    }
}

fn handle_glfw_error(error: glfw::Error, description: String) {
    error!("GLFW error {:?}: {}", error, description);
}
