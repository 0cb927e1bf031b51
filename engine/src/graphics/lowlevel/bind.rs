use std::cell::Cell;

use crate::graphics::lowlevel::ProgramId;

/// The "currently active program" slot of one driver context.
///
/// Backends own their tracker, so every [`crate::ShaderContext`] built over the same driver
/// context observes the same slot.
#[derive(Debug, Default)]
pub struct BindTracker {
    active: Cell<Option<ProgramId>>,
}

impl BindTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ProgramId> {
        self.active.get()
    }

    pub fn set(&self, program: ProgramId) {
        self.active.set(Some(program));
    }

    /// Forgets `program` if it is the active one. Called when the program is deleted.
    pub fn release(&self, program: ProgramId) {
        if self.active.get() == Some(program) {
            self.active.set(None);
        }
    }
}
