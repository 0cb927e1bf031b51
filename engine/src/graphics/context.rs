//! Per-context access to the driver backend and its bind tracker.

use std::{fmt::Debug, rc::Rc};

use log::trace;

use crate::graphics::lowlevel::{NullBackend, ProgramId, ShaderBackend};

/// A graphics context as seen by the shader core.
///
/// The active-program slot belongs to the backend, so several `ShaderContext`s over one driver
/// context agree on what is bound. A driver context is bound to the thread that drives it, so
/// `ShaderContext` is neither `Send` nor `Sync`, and two threads driving two contexts never
/// observe each other's binds.
pub struct ShaderContext {
    backend: Rc<dyn ShaderBackend>,
}

impl ShaderContext {
    /// Creates a context on top of `backend`.
    pub fn new(backend: impl ShaderBackend + 'static) -> Rc<Self> {
        Self::with_shared(Rc::new(backend))
    }

    /// Creates a context on top of a backend the caller keeps a handle to.
    pub fn with_shared(backend: Rc<dyn ShaderBackend>) -> Rc<Self> {
        Rc::new(Self { backend })
    }

    /// Creates a context where shaders are disabled.
    pub fn null() -> Rc<Self> {
        Self::new(NullBackend::new())
    }

    /// Creates a context that drives a real OpenGL context.
    #[cfg(feature = "gl")]
    pub fn from_glow(gl: std::sync::Arc<glow::Context>) -> Rc<Self> {
        Self::new(crate::graphics::lowlevel::GlowBackend::new(gl))
    }

    pub fn backend(&self) -> &dyn ShaderBackend {
        self.backend.as_ref()
    }

    /// The program most recently activated on the driver context, if any.
    pub fn active_program(&self) -> Option<ProgramId> {
        self.backend.bind_tracker().and_then(|t| t.active())
    }

    /// Activates `program` unless it already is the active one.
    pub fn bind(&self, program: ProgramId) {
        let Some(tracker) = self.backend.bind_tracker() else {
            return;
        };
        if tracker.active() == Some(program) {
            return;
        }
        trace!("Binding program {:?}", program);
        self.backend.use_program(program);
        tracker.set(program);
    }

    pub fn is_bound(&self, program: ProgramId) -> bool {
        self.active_program() == Some(program)
    }

    /// Forgets `program` if it is the active one. Called once the program is deleted.
    pub fn release(&self, program: ProgramId) {
        if let Some(tracker) = self.backend.bind_tracker() {
            tracker.release(program);
        }
    }
}

impl Debug for ShaderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderContext")
            .field("backend", &self.backend)
            .field("active", &self.active_program())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::graphics::lowlevel::mock::MockBackend;

    fn id(n: u32) -> ProgramId {
        ProgramId(NonZeroU32::new(n).unwrap())
    }

    #[test]
    fn starts_unbound() {
        let ctx = ShaderContext::new(MockBackend::new());
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn rebinding_the_active_program_is_a_no_op() {
        let backend = Rc::new(MockBackend::new());
        let ctx = ShaderContext::with_shared(backend.clone());

        ctx.bind(id(1));
        ctx.bind(id(1));
        assert_eq!(backend.use_count(), 1);

        ctx.bind(id(2));
        assert!(ctx.is_bound(id(2)));
        assert!(!ctx.is_bound(id(1)));
        assert_eq!(backend.use_count(), 2);
    }

    #[test]
    fn contexts_over_one_driver_share_the_active_program() {
        let backend = Rc::new(MockBackend::new());
        let first = ShaderContext::with_shared(backend.clone());
        let second = ShaderContext::with_shared(backend.clone());

        first.bind(id(1));
        second.bind(id(2));
        assert!(!first.is_bound(id(1)));
        assert!(first.is_bound(id(2)));

        first.bind(id(1));
        assert_eq!(backend.active_program(), Some(id(1)));
        assert!(second.is_bound(id(1)));
        assert_eq!(backend.use_count(), 3);
    }

    #[test]
    fn release_only_clears_the_active_program() {
        let ctx = ShaderContext::new(MockBackend::new());
        ctx.bind(id(1));

        ctx.release(id(2));
        assert_eq!(ctx.active_program(), Some(id(1)));

        ctx.release(id(1));
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn null_context_never_binds() {
        let ctx = ShaderContext::null();
        ctx.bind(id(1));
        assert!(!ctx.is_bound(id(1)));
        assert_eq!(ctx.active_program(), None);
    }
}
