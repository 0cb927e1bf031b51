use std::{cell::Cell, num::NonZeroU32};

use crate::{
    ShaderError,
    graphics::lowlevel::{
        ActiveUniform, BindTracker, ProgramId, ShaderBackend, ShaderStage, StageId,
        UniformLocation,
    },
};

/// A backend for builds or runs without shader support.
///
/// Every stage compiles and every program links, but no uniforms are ever reported and binding
/// has no effect.
#[derive(Debug, Default)]
pub struct NullBackend {
    next_id: Cell<u32>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> NonZeroU32 {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        NonZeroU32::new(id).unwrap_or(NonZeroU32::MIN)
    }
}

impl ShaderBackend for NullBackend {
    fn create_program(&self) -> Result<ProgramId, ShaderError> {
        Ok(ProgramId(self.allocate()))
    }

    fn delete_program(&self, _program: ProgramId) {}

    fn create_stage(&self, _stage: ShaderStage) -> Result<StageId, ShaderError> {
        Ok(StageId(self.allocate()))
    }

    fn delete_stage(&self, _stage: StageId) {}

    fn compile_stage(&self, _stage: StageId, _source: &str) {}

    fn compile_status(&self, _stage: StageId) -> bool {
        true
    }

    fn stage_info_log(&self, _stage: StageId) -> String {
        String::new()
    }

    fn attach_stage(&self, _program: ProgramId, _stage: StageId) {}

    fn detach_stage(&self, _program: ProgramId, _stage: StageId) {}

    fn link_program(&self, _program: ProgramId) {}

    fn link_status(&self, _program: ProgramId) -> bool {
        true
    }

    fn program_info_log(&self, _program: ProgramId) -> String {
        String::new()
    }

    fn active_uniform_count(&self, _program: ProgramId) -> u32 {
        0
    }

    fn active_uniform(&self, _program: ProgramId, _index: u32) -> Option<ActiveUniform> {
        None
    }

    fn uniform_location(&self, _program: ProgramId, _name: &str) -> UniformLocation {
        UniformLocation::NONE
    }

    fn use_program(&self, _program: ProgramId) {}

    fn bind_tracker(&self) -> Option<&BindTracker> {
        None
    }
}
