//! OpenGL backend on top of `glow`.

use std::{
    cell::RefCell,
    fmt::Debug,
    rc::Rc,
    sync::{Arc, Weak},
};

use glow::HasContext;
use log::{debug, trace};

use crate::{
    ShaderError,
    graphics::lowlevel::{
        ActiveUniform, BindTracker, ProgramId, ShaderBackend, ShaderStage, StageId,
        UniformLocation,
    },
};

thread_local! {
    /// One tracker per GL context driven from this thread.
    static TRACKERS: RefCell<Vec<(Weak<glow::Context>, Rc<BindTracker>)>> =
        const { RefCell::new(Vec::new()) };
}

/// Returns the tracker for `gl`, creating it on first use.
fn tracker_for(gl: &Arc<glow::Context>) -> Rc<BindTracker> {
    TRACKERS.with_borrow_mut(|trackers| {
        trackers.retain(|(context, _)| context.strong_count() > 0);

        if let Some((_, tracker)) = trackers
            .iter()
            .find(|(context, _)| std::ptr::eq(context.as_ptr(), Arc::as_ptr(gl)))
        {
            return tracker.clone();
        }

        debug!("New bind tracker for GL context {:p}", Arc::as_ptr(gl));
        let tracker = Rc::new(BindTracker::new());
        trackers.push((Arc::downgrade(gl), tracker.clone()));
        tracker
    })
}

/// A [`ShaderBackend`] that issues real GL calls.
///
/// The wrapped context must be current on the calling thread for every call. Every backend
/// created on one thread over the same `glow::Context` shares a single [`BindTracker`].
#[derive(Clone)]
pub struct GlowBackend {
    gl: Arc<glow::Context>,
    tracker: Rc<BindTracker>,
}

impl GlowBackend {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        let tracker = tracker_for(&gl);
        Self { gl, tracker }
    }
}

impl Debug for GlowBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowBackend")
            .field("version", self.gl.version())
            .finish()
    }
}

fn program(id: ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.0)
}

fn shader(id: StageId) -> glow::NativeShader {
    glow::NativeShader(id.0)
}

// Safety for every block below: ids only ever come from this backend's own create calls, and
// the caller keeps the context current.
impl ShaderBackend for GlowBackend {
    fn create_program(&self) -> Result<ProgramId, ShaderError> {
        let native = unsafe { self.gl.create_program() }.map_err(ShaderError::Backend)?;
        Ok(ProgramId(native.0))
    }

    fn delete_program(&self, id: ProgramId) {
        unsafe { self.gl.delete_program(program(id)) }
    }

    fn create_stage(&self, stage: ShaderStage) -> Result<StageId, ShaderError> {
        let native =
            unsafe { self.gl.create_shader(stage.gl_enum()) }.map_err(ShaderError::Backend)?;
        Ok(StageId(native.0))
    }

    fn delete_stage(&self, id: StageId) {
        unsafe { self.gl.delete_shader(shader(id)) }
    }

    fn compile_stage(&self, id: StageId, source: &str) {
        unsafe {
            self.gl.shader_source(shader(id), source);
            self.gl.compile_shader(shader(id));
        }
    }

    fn compile_status(&self, id: StageId) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(id)) }
    }

    fn stage_info_log(&self, id: StageId) -> String {
        unsafe { self.gl.get_shader_info_log(shader(id)) }
    }

    fn attach_stage(&self, id: ProgramId, stage: StageId) {
        unsafe { self.gl.attach_shader(program(id), shader(stage)) }
    }

    fn detach_stage(&self, id: ProgramId, stage: StageId) {
        unsafe { self.gl.detach_shader(program(id), shader(stage)) }
    }

    fn link_program(&self, id: ProgramId) {
        unsafe { self.gl.link_program(program(id)) }
    }

    fn link_status(&self, id: ProgramId) -> bool {
        unsafe { self.gl.get_program_link_status(program(id)) }
    }

    fn program_info_log(&self, id: ProgramId) -> String {
        unsafe { self.gl.get_program_info_log(program(id)) }
    }

    fn active_uniform_count(&self, id: ProgramId) -> u32 {
        unsafe { self.gl.get_active_uniforms(program(id)) }
    }

    fn active_uniform(&self, id: ProgramId, index: u32) -> Option<ActiveUniform> {
        let active = unsafe { self.gl.get_active_uniform(program(id), index) }?;
        Some(ActiveUniform {
            name: active.name,
            size: active.size,
            type_tag: active.utype,
        })
    }

    fn uniform_location(&self, id: ProgramId, name: &str) -> UniformLocation {
        unsafe { self.gl.get_uniform_location(program(id), name) }
            .map_or(UniformLocation::NONE, |loc| UniformLocation(loc.0 as i32))
    }

    fn use_program(&self, id: ProgramId) {
        trace!("glUseProgram({:?})", id);
        unsafe { self.gl.use_program(Some(program(id))) }
    }

    fn bind_tracker(&self) -> Option<&BindTracker> {
        Some(&self.tracker)
    }
}
