use log::{info, warn};

use crate::{
    ShaderError,
    graphics::lowlevel::{ProgramId, ShaderBackend, ShaderStage, StageId, stage},
};

/// Compiles every stage, attaches them to `program` and links it.
///
/// Stages are compiled in the order given, which callers keep as [`ShaderStage::ALL`]. Stage
/// objects are transient: whatever happens, every stage compiled here is deleted before this
/// returns. The program object itself is left to its owner.
pub fn link<'a>(
    backend: &dyn ShaderBackend,
    program: ProgramId,
    stages: impl IntoIterator<Item = (ShaderStage, &'a str)>,
) -> Result<(), ShaderError> {
    let mut compiled: Vec<StageId> = Vec::with_capacity(ShaderStage::ALL.len());

    for (kind, source) in stages {
        match stage::compile(backend, kind, source) {
            Ok(id) => compiled.push(id),
            Err(err) => {
                for id in compiled {
                    backend.delete_stage(id);
                }
                return Err(err);
            }
        }
    }

    for &id in &compiled {
        backend.attach_stage(program, id);
    }
    backend.link_program(program);

    let result = if backend.link_status(program) {
        info!("Linked program {:?} from {} stages", program, compiled.len());
        Ok(())
    } else {
        let log = backend.program_info_log(program);
        if log.is_empty() {
            warn!("Program {:?} failed to link without a diagnostic log", program);
        }
        Err(ShaderError::Link { log })
    };

    for id in compiled {
        backend.detach_stage(program, id);
        backend.delete_stage(id);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::lowlevel::mock::{Call, MockBackend};

    const VERT: &str = "out vec3 v_normal;\nvoid main() {}";
    const FRAG: &str = "in vec3 v_normal;\nvoid main() {}";

    #[test]
    fn links_and_releases_stages() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();

        link(
            &backend,
            program,
            [(ShaderStage::Vertex, VERT), (ShaderStage::Fragment, FRAG)],
        )
        .unwrap();

        assert!(backend.live_stages().is_empty());
        assert!(backend.attached(program).is_empty());
        assert!(backend.link_status(program));
    }

    #[test]
    fn earlier_stages_are_deleted_on_compile_failure() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();

        let err = link(
            &backend,
            program,
            [
                (ShaderStage::Vertex, VERT),
                (ShaderStage::Geometry, "void main() {}"),
                (ShaderStage::Fragment, "#error broken"),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, ShaderError::Compile { stage: ShaderStage::Fragment, .. }));
        assert!(backend.live_stages().is_empty());
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, Call::AttachStage(..) | Call::LinkProgram(_)))
        );
    }

    #[test]
    fn stage_allocation_failure_deletes_earlier_stages() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();
        backend.refuse_stages_after(2);

        let err = link(
            &backend,
            program,
            [
                (ShaderStage::Vertex, VERT),
                (ShaderStage::Geometry, "void main() {}"),
                (ShaderStage::Fragment, FRAG),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, ShaderError::Backend(_)));
        assert!(backend.live_stages().is_empty());
        assert!(
            !backend
                .calls()
                .iter()
                .any(|c| matches!(c, Call::LinkProgram(_)))
        );
    }

    #[test]
    fn link_failure_still_releases_stages() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();

        let err = link(
            &backend,
            program,
            [
                (ShaderStage::Vertex, "out vec2 v_uv;\nvoid main() {}"),
                (ShaderStage::Fragment, FRAG),
            ],
        )
        .unwrap_err();

        match err {
            ShaderError::Link { log } => assert!(log.contains("v_normal")),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(backend.live_stages().is_empty());
    }

    #[test]
    fn link_failure_without_log_is_reported() {
        let backend = MockBackend::new();
        backend.silence_link_log();
        let program = backend.create_program().unwrap();

        let err = link(
            &backend,
            program,
            [
                (ShaderStage::Vertex, "out vec2 v_uv;\nvoid main() {}"),
                (ShaderStage::Fragment, FRAG),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, ShaderError::Link { ref log } if log.is_empty()));
    }

    #[test]
    fn stages_are_attached_in_pipeline_order() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();

        link(
            &backend,
            program,
            [
                (ShaderStage::Vertex, "void main() {}"),
                (ShaderStage::Geometry, "void main() {}"),
                (ShaderStage::Fragment, "void main() {}"),
            ],
        )
        .unwrap();

        let created: Vec<ShaderStage> = backend
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::CreateStage(kind, _) => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]
        );
    }
}
