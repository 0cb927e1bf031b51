//! Thin seam over the graphics driver.
//!
//! Everything above this module talks to the driver through [`ShaderBackend`], so the same
//! compile/link/introspect code runs on a real OpenGL context, the null backend, or the
//! scripted driver the tests use.

use std::{fmt::Debug, num::NonZeroU32};

mod bind;
#[cfg(feature = "gl")]
mod gl;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
mod null;
pub mod program;
pub mod stage;
pub mod uniform;

pub use bind::BindTracker;
#[cfg(feature = "gl")]
pub use gl::GlowBackend;
pub use null::NullBackend;
pub use stage::ShaderStage;
pub use uniform::{UniformEntry, UniformTable, UniformType};

use crate::ShaderError;

/// A linked (or linking) program object owned by the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub NonZeroU32);

/// A single compiled stage object. Only lives for the duration of a link.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StageId(pub NonZeroU32);

/// A uniform location. `-1` means the driver optimized the uniform out.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    pub const NONE: UniformLocation = UniformLocation(-1);

    /// Returns true if the driver kept this uniform.
    pub fn is_active(&self) -> bool {
        self.0 >= 0
    }
}

/// Metadata for one active uniform, as enumerated by index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveUniform {
    pub name: String,
    pub size: i32,
    /// Raw driver type tag. See [`UniformType::from_gl`].
    pub type_tag: u32,
}

/// The driver calls the shader core relies on.
///
/// Status and log queries never fail; a driver without a log returns an empty string.
pub trait ShaderBackend: Debug {
    fn create_program(&self) -> Result<ProgramId, ShaderError>;
    fn delete_program(&self, program: ProgramId);

    fn create_stage(&self, stage: ShaderStage) -> Result<StageId, ShaderError>;
    fn delete_stage(&self, stage: StageId);
    /// Submits the source text and requests compilation.
    fn compile_stage(&self, stage: StageId, source: &str);
    fn compile_status(&self, stage: StageId) -> bool;
    fn stage_info_log(&self, stage: StageId) -> String;

    fn attach_stage(&self, program: ProgramId, stage: StageId);
    fn detach_stage(&self, program: ProgramId, stage: StageId);
    fn link_program(&self, program: ProgramId);
    fn link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;

    fn active_uniform_count(&self, program: ProgramId) -> u32;
    fn active_uniform(&self, program: ProgramId, index: u32) -> Option<ActiveUniform>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation;

    /// Makes `program` the active program of the context.
    fn use_program(&self, program: ProgramId);

    /// The active-program slot of the driver context behind this backend.
    ///
    /// `None` means binds are not observable: the null backend never binds anything, so shaders
    /// built on it never report as bound.
    fn bind_tracker(&self) -> Option<&BindTracker>;
}
