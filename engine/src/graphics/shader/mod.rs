//! Shader programs: compile, link, introspect and bind.

use std::{fmt::Debug, rc::Rc};

use log::{debug, info};

use crate::{
    ShaderError,
    graphics::{
        context::ShaderContext,
        lowlevel::{
            ProgramId, UniformEntry, UniformLocation, UniformTable, UniformType, program,
            uniform::UniformValue,
        },
    },
};

mod sources;

pub use sources::ShaderSources;

/// The linked program and its uniforms. Deleted when the last [`Shader`] referencing it drops.
struct SharedProgram {
    context: Rc<ShaderContext>,
    program: ProgramId,
    uniforms: UniformTable,
}

impl Drop for SharedProgram {
    fn drop(&mut self) {
        debug!("Deleting program {:?}", self.program);
        self.context.backend().delete_program(self.program);
        self.context.release(self.program);
    }
}

/// A handle to a linked shader program.
///
/// Cloning a `Shader` shares the same program; nothing is recompiled.
#[derive(Clone)]
pub struct Shader {
    share: Rc<SharedProgram>,
}

impl Shader {
    /// Compiles and links `sources` and reads back the program's active uniforms.
    ///
    /// Fails on the first stage that does not compile, or if the program does not link. No
    /// driver objects outlive a failed call.
    pub fn new(context: &Rc<ShaderContext>, sources: &ShaderSources) -> Result<Self, ShaderError> {
        if sources.is_empty() {
            return Err(ShaderError::EmptySources);
        }

        let backend = context.backend();
        let mut share = SharedProgram {
            context: context.clone(),
            program: backend.create_program()?,
            uniforms: UniformTable::default(),
        };

        program::link(backend, share.program, sources.iter())?;
        share.uniforms = UniformTable::introspect(backend, share.program);

        info!(
            "Created shader {:?} with {} uniforms",
            share.program,
            share.uniforms.len()
        );
        Ok(Self {
            share: Rc::new(share),
        })
    }

    /// Makes this the active program of its context. Does nothing if it already is.
    pub fn bind(&self) {
        self.share.context.bind(self.share.program);
    }

    /// Returns true if this is the active program of its context.
    pub fn is_bound(&self) -> bool {
        self.share.context.is_bound(self.share.program)
    }

    /// Looks up a uniform by name.
    ///
    /// A missing name is not an error: the returned reference is simply absent.
    pub fn uniform(&self, name: &str) -> UniformRef<'_> {
        UniformRef {
            shader: self,
            entry: self.share.uniforms.get(name),
        }
    }

    /// All active uniforms of the program.
    pub fn uniforms(&self) -> &UniformTable {
        &self.share.uniforms
    }

    /// The driver's identifier for the program.
    pub fn program(&self) -> ProgramId {
        self.share.program
    }

    pub fn context(&self) -> &Rc<ShaderContext> {
        &self.share.context
    }

    /// Returns true if both handles share one program.
    pub fn ptr_eq(&self, other: &Shader) -> bool {
        Rc::ptr_eq(&self.share, &other.share)
    }

    /// Number of handles sharing this program.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.share)
    }
}

impl Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("program", &self.share.program)
            .field("uniforms", &self.share.uniforms.len())
            .finish()
    }
}

/// A uniform of a particular shader, possibly absent.
///
/// Borrows the shader it came from, so it cannot outlive the program's uniform table.
#[derive(Copy, Clone, Debug)]
pub struct UniformRef<'a> {
    shader: &'a Shader,
    entry: Option<&'a UniformEntry>,
}

impl<'a> UniformRef<'a> {
    /// The shader this uniform was looked up on.
    pub fn shader(&self) -> &'a Shader {
        self.shader
    }

    pub fn entry(&self) -> Option<&'a UniformEntry> {
        self.entry
    }

    pub fn is_present(&self) -> bool {
        self.entry.is_some()
    }

    pub fn location(&self) -> Option<UniformLocation> {
        self.entry.map(|e| e.location)
    }

    /// Checks that a value of type `ty` may be written through this handle right now.
    ///
    /// The uniform must exist, its shader must be bound, and its type must be `ty`.
    pub fn expect(&self, ty: UniformType) -> Result<&'a UniformEntry, ShaderError> {
        let entry = self.entry.ok_or(ShaderError::UniformShader)?;
        if !self.shader.is_bound() {
            return Err(ShaderError::UniformBind);
        }
        if entry.ty != ty {
            return Err(ShaderError::UniformType);
        }
        Ok(entry)
    }

    /// Same as [`UniformRef::expect`], with the type taken from a Rust value type.
    pub fn expect_value<T: UniformValue>(&self) -> Result<&'a UniformEntry, ShaderError> {
        self.expect(T::TYPE)
    }
}
