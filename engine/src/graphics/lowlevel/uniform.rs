//! Active uniform introspection.

use std::collections::HashMap;

use log::{debug, warn};
use rustc_hash::FxBuildHasher;

use crate::{
    ReadOnlyString,
    graphics::lowlevel::{ProgramId, ShaderBackend, UniformLocation},
};

/// The data type of a uniform, decoded from the driver's type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    Bool,
    Mat2,
    Mat3,
    Mat4,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler2DShadow,
    Sampler2DArray,
    /// A tag this crate has no name for.
    Other(u32),
}

impl UniformType {
    /// Decodes a raw GL type tag.
    pub const fn from_gl(tag: u32) -> Self {
        match tag {
            0x1406 => UniformType::Float,
            0x8B50 => UniformType::Vec2,
            0x8B51 => UniformType::Vec3,
            0x8B52 => UniformType::Vec4,
            0x1404 => UniformType::Int,
            0x8B53 => UniformType::IVec2,
            0x8B54 => UniformType::IVec3,
            0x8B55 => UniformType::IVec4,
            0x1405 => UniformType::UInt,
            0x8B56 => UniformType::Bool,
            0x8B5A => UniformType::Mat2,
            0x8B5B => UniformType::Mat3,
            0x8B5C => UniformType::Mat4,
            0x8B5D => UniformType::Sampler1D,
            0x8B5E => UniformType::Sampler2D,
            0x8B5F => UniformType::Sampler3D,
            0x8B60 => UniformType::SamplerCube,
            0x8B62 => UniformType::Sampler2DShadow,
            0x8DC1 => UniformType::Sampler2DArray,
            other => UniformType::Other(other),
        }
    }

    /// Encodes the type back into its GL tag.
    pub const fn to_gl(self) -> u32 {
        match self {
            UniformType::Float => 0x1406,
            UniformType::Vec2 => 0x8B50,
            UniformType::Vec3 => 0x8B51,
            UniformType::Vec4 => 0x8B52,
            UniformType::Int => 0x1404,
            UniformType::IVec2 => 0x8B53,
            UniformType::IVec3 => 0x8B54,
            UniformType::IVec4 => 0x8B55,
            UniformType::UInt => 0x1405,
            UniformType::Bool => 0x8B56,
            UniformType::Mat2 => 0x8B5A,
            UniformType::Mat3 => 0x8B5B,
            UniformType::Mat4 => 0x8B5C,
            UniformType::Sampler1D => 0x8B5D,
            UniformType::Sampler2D => 0x8B5E,
            UniformType::Sampler3D => 0x8B5F,
            UniformType::SamplerCube => 0x8B60,
            UniformType::Sampler2DShadow => 0x8B62,
            UniformType::Sampler2DArray => 0x8DC1,
            UniformType::Other(tag) => tag,
        }
    }

    /// Returns true for any of the sampler types.
    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            UniformType::Sampler1D
                | UniformType::Sampler2D
                | UniformType::Sampler3D
                | UniformType::SamplerCube
                | UniformType::Sampler2DShadow
                | UniformType::Sampler2DArray
        )
    }
}

/// A Rust type that can be written to a uniform of a fixed [`UniformType`].
pub trait UniformValue {
    const TYPE: UniformType;
}

macro_rules! impl_uniform_value {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl UniformValue for $ty {
                const TYPE: UniformType = UniformType::$tag;
            }
        )*
    };
}

impl_uniform_value! {
    f32 => Float,
    glam::Vec2 => Vec2,
    glam::Vec3 => Vec3,
    glam::Vec4 => Vec4,
    i32 => Int,
    glam::IVec2 => IVec2,
    glam::IVec3 => IVec3,
    glam::IVec4 => IVec4,
    u32 => UInt,
    bool => Bool,
    glam::Mat2 => Mat2,
    glam::Mat3 => Mat3,
    glam::Mat4 => Mat4,
}

/// One active uniform of a linked program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformEntry {
    pub name: ReadOnlyString,
    /// Number of array elements, 1 for non-array uniforms.
    pub size: i32,
    pub ty: UniformType,
    pub location: UniformLocation,
}

/// All active uniforms of a program, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct UniformTable {
    entries: HashMap<ReadOnlyString, UniformEntry, FxBuildHasher>,
}

impl UniformTable {
    /// Enumerates the active uniforms of `program`.
    ///
    /// Metadata comes from the index-based query and the location from a separate lookup by
    /// name. This never fails: a program the driver reports nothing for yields an empty table.
    pub fn introspect(backend: &dyn ShaderBackend, program: ProgramId) -> Self {
        let count = backend.active_uniform_count(program);
        let mut table = UniformTable::default();

        for index in 0..count {
            let Some(active) = backend.active_uniform(program, index) else {
                warn!("Program {:?} has no uniform at index {}", program, index);
                continue;
            };

            let location = backend.uniform_location(program, &active.name);
            if !location.is_active() {
                warn!("Uniform {} of {:?} was optimized out", active.name, program);
            }

            let entry = UniformEntry {
                name: active.name.as_str().into(),
                size: active.size,
                ty: UniformType::from_gl(active.type_tag),
                location,
            };
            debug!("Uniform {:?}", entry);
            table.insert(entry);
        }

        table
    }

    /// Inserts an entry. An existing entry with the same name is replaced.
    pub fn insert(&mut self, entry: UniformEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Looks up a uniform by name.
    ///
    /// Arrays are reported by drivers as `name[0]`; the bare array name resolves to that entry.
    pub fn get(&self, name: &str) -> Option<&UniformEntry> {
        self.entries
            .get(name)
            .or_else(|| self.entries.get(format!("{name}[0]").as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &UniformEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::lowlevel::{ShaderStage, mock::MockBackend, program};

    fn linked(backend: &MockBackend, frag: &str) -> ProgramId {
        let program = backend.create_program().unwrap();
        program::link(
            backend,
            program,
            [
                (ShaderStage::Vertex, "uniform mat4 u_mvp;\nvoid main() {}"),
                (ShaderStage::Fragment, frag),
            ],
        )
        .unwrap();
        program
    }

    #[test]
    fn introspects_every_active_uniform() {
        let backend = MockBackend::new();
        let program = linked(
            &backend,
            "uniform vec4 u_color;\nuniform sampler2D u_albedo;\nvoid main() {}",
        );

        let table = UniformTable::introspect(&backend, program);
        assert_eq!(table.len(), 3);

        let color = table.get("u_color").unwrap();
        assert_eq!(color.ty, UniformType::Vec4);
        assert_eq!(color.size, 1);
        assert!(color.location.is_active());

        assert_eq!(table.get("u_mvp").unwrap().ty, UniformType::Mat4);
        assert!(table.get("u_albedo").unwrap().ty.is_sampler());
    }

    #[test]
    fn arrays_resolve_by_bare_name() {
        let backend = MockBackend::new();
        let program = linked(&backend, "uniform vec3 u_lights[4];\nvoid main() {}");

        let table = UniformTable::introspect(&backend, program);
        let lights = table.get("u_lights").unwrap();
        assert_eq!(&*lights.name, "u_lights[0]");
        assert_eq!(lights.size, 4);
    }

    #[test]
    fn optimized_out_uniforms_keep_a_negative_location() {
        let backend = MockBackend::new();
        backend.optimize_out("u_unused");
        let program = linked(&backend, "uniform float u_unused;\nvoid main() {}");

        let table = UniformTable::introspect(&backend, program);
        assert_eq!(table.get("u_unused").unwrap().location, UniformLocation::NONE);
    }

    #[test]
    fn unknown_program_yields_empty_table() {
        let backend = MockBackend::new();
        let program = backend.create_program().unwrap();
        assert!(UniformTable::introspect(&backend, program).is_empty());
    }

    #[test]
    fn later_duplicates_replace_earlier_entries() {
        let mut table = UniformTable::default();
        for location in [0, 7] {
            table.insert(UniformEntry {
                name: "u_time".into(),
                size: 1,
                ty: UniformType::Float,
                location: UniformLocation(location),
            });
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("u_time").unwrap().location, UniformLocation(7));
    }

    #[test]
    fn gl_tags_round_trip() {
        assert_eq!(UniformType::from_gl(0x8B5C), UniformType::Mat4);
        assert_eq!(UniformType::from_gl(0xDEAD), UniformType::Other(0xDEAD));
        assert_eq!(<glam::Mat4 as UniformValue>::TYPE, UniformType::Mat4);
    }
}
