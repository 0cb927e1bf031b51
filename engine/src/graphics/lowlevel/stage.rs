use log::debug;

use crate::{
    ShaderError,
    graphics::lowlevel::{ShaderBackend, StageId},
};

/// One phase of the programmable pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
}

impl ShaderStage {
    /// Every stage, in the order they are compiled and attached.
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
    ];

    /// Position of the stage in [`ShaderStage::ALL`].
    pub const fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::TessControl => 1,
            ShaderStage::TessEvaluation => 2,
            ShaderStage::Geometry => 3,
            ShaderStage::Fragment => 4,
        }
    }

    /// The GL enum for this stage kind.
    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => 0x8B31,
            ShaderStage::TessControl => 0x8E88,
            ShaderStage::TessEvaluation => 0x8E87,
            ShaderStage::Geometry => 0x8DD9,
            ShaderStage::Fragment => 0x8B30,
        }
    }

    /// Conventional file extension for sources of this stage.
    pub const fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::TessControl => "tesc",
            ShaderStage::TessEvaluation => "tese",
            ShaderStage::Geometry => "geom",
            ShaderStage::Fragment => "frag",
        }
    }
}

/// Compiles a single stage.
///
/// `source` must not be empty; empty slots are skipped by the caller. On failure the stage
/// object is deleted before the error is returned.
pub fn compile(
    backend: &dyn ShaderBackend,
    stage: ShaderStage,
    source: &str,
) -> Result<StageId, ShaderError> {
    let id = backend.create_stage(stage)?;
    backend.compile_stage(id, source);

    if !backend.compile_status(id) {
        let log = backend.stage_info_log(id);
        backend.delete_stage(id);
        return Err(ShaderError::Compile {
            stage,
            code: source.to_owned(),
            log,
        });
    }

    debug!("Compiled {:?} stage {:?}", stage, id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::lowlevel::mock::{Call, MockBackend};

    #[test]
    fn compiles_valid_source() {
        let backend = MockBackend::new();
        let id = compile(&backend, ShaderStage::Vertex, "void main() {}").unwrap();
        assert!(backend.live_stages().contains(&id));
    }

    #[test]
    fn failed_stage_is_deleted() {
        let backend = MockBackend::new();
        let err = compile(&backend, ShaderStage::Fragment, "#error nope").unwrap_err();

        match err {
            ShaderError::Compile { stage, code, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(code, "#error nope");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(backend.live_stages().is_empty());
        assert!(matches!(backend.calls().last(), Some(Call::DeleteStage(_))));
    }

    #[test]
    fn stage_order_matches_index() {
        for (i, stage) in ShaderStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }
}
