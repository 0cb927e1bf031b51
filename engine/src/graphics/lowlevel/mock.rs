//! A scripted in-memory driver.
//!
//! It understands just enough GLSL to be useful in tests:
//! - a stage fails to compile if its source contains `#error`;
//! - a program fails to link if a stage declares an `in` that the previous stage does not
//!   write with a matching `out`;
//! - `uniform <type> <name>;` and `uniform <type> <name>[N];` declarations become active
//!   uniforms.
//!
//! Every driver call is recorded and can be inspected with [`MockBackend::calls`].

use std::{cell::RefCell, collections::HashMap, num::NonZeroU32};

use rustc_hash::{FxBuildHasher, FxHashSet};

use crate::{
    ShaderError,
    graphics::lowlevel::{
        ActiveUniform, BindTracker, ProgramId, ShaderBackend, ShaderStage, StageId,
        UniformLocation, UniformType,
    },
};

/// A driver call, as recorded by [`MockBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateStage(ShaderStage, StageId),
    DeleteStage(StageId),
    CompileStage(StageId),
    AttachStage(ProgramId, StageId),
    DetachStage(ProgramId, StageId),
    LinkProgram(ProgramId),
    UseProgram(ProgramId),
}

#[derive(Debug)]
struct StageRecord {
    kind: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<StageId>,
    linked: bool,
    log: String,
    uniforms: Vec<ActiveUniform>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    stages: HashMap<StageId, StageRecord, FxBuildHasher>,
    programs: HashMap<ProgramId, ProgramRecord, FxBuildHasher>,
    optimized_out: FxHashSet<String>,
    silent_link_log: bool,
    refuse_programs: bool,
    /// Number of stages still allowed before `create_stage` starts failing.
    stage_budget: Option<usize>,
    active: Option<ProgramId>,
    calls: Vec<Call>,
}

impl MockState {
    fn allocate(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN)
    }
}

/// See the [module docs](self).
#[derive(Debug, Default)]
pub struct MockBackend {
    state: RefCell<MockState>,
    tracker: BindTracker,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Stage objects that were created but not yet deleted.
    pub fn live_stages(&self) -> Vec<StageId> {
        self.state.borrow().stages.keys().copied().collect()
    }

    /// Program objects that were created but not yet deleted.
    pub fn live_programs(&self) -> Vec<ProgramId> {
        self.state.borrow().programs.keys().copied().collect()
    }

    /// Stages currently attached to `program`.
    pub fn attached(&self, program: ProgramId) -> Vec<StageId> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    /// The program last passed to `use_program`.
    pub fn active_program(&self) -> Option<ProgramId> {
        self.state.borrow().active
    }

    /// Number of `use_program` calls so far.
    pub fn use_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::UseProgram(_)))
            .count()
    }

    /// Reports `name` with location `-1` from now on.
    pub fn optimize_out(&self, name: &str) {
        self.state.borrow_mut().optimized_out.insert(name.to_owned());
    }

    /// Makes failed links report an empty info log.
    pub fn silence_link_log(&self) {
        self.state.borrow_mut().silent_link_log = true;
    }

    /// Makes every later `create_program` fail.
    pub fn refuse_programs(&self) {
        self.state.borrow_mut().refuse_programs = true;
    }

    /// Lets `count` more stages be created, then makes `create_stage` fail.
    pub fn refuse_stages_after(&self, count: usize) {
        self.state.borrow_mut().stage_budget = Some(count);
    }
}

impl ShaderBackend for MockBackend {
    fn create_program(&self) -> Result<ProgramId, ShaderError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return Err(ShaderError::Backend("out of program objects".to_owned()));
        }
        let id = ProgramId(state.allocate());
        state.programs.insert(id, ProgramRecord::default());
        state.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.calls.push(Call::DeleteProgram(program));
    }

    fn create_stage(&self, stage: ShaderStage) -> Result<StageId, ShaderError> {
        let mut state = self.state.borrow_mut();
        if let Some(left) = state.stage_budget.as_mut() {
            if *left == 0 {
                return Err(ShaderError::Backend("out of shader objects".to_owned()));
            }
            *left -= 1;
        }
        let id = StageId(state.allocate());
        state.stages.insert(
            id,
            StageRecord {
                kind: stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(Call::CreateStage(stage, id));
        Ok(id)
    }

    fn delete_stage(&self, stage: StageId) {
        let mut state = self.state.borrow_mut();
        state.stages.remove(&stage);
        state.calls.push(Call::DeleteStage(stage));
    }

    fn compile_stage(&self, stage: StageId, source: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CompileStage(stage));
        let Some(record) = state.stages.get_mut(&stage) else {
            return;
        };

        record.source = source.to_owned();
        match source.lines().position(|line| line.contains("#error")) {
            Some(line) => {
                record.compiled = false;
                record.log = format!("0:{}: error: #error directive encountered", line + 1);
            }
            None => {
                record.compiled = true;
                record.log.clear();
            }
        }
    }

    fn compile_status(&self, stage: StageId) -> bool {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .is_some_and(|s| s.compiled)
    }

    fn stage_info_log(&self, stage: StageId) -> String {
        self.state
            .borrow()
            .stages
            .get(&stage)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn attach_stage(&self, program: ProgramId, stage: StageId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::AttachStage(program, stage));
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.push(stage);
        }
    }

    fn detach_stage(&self, program: ProgramId, stage: StageId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::DetachStage(program, stage));
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.retain(|&s| s != stage);
        }
    }

    fn link_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::LinkProgram(program));

        let Some(record) = state.programs.get(&program) else {
            return;
        };
        let mut stages: Vec<&StageRecord> = record
            .attached
            .iter()
            .filter_map(|id| state.stages.get(id))
            .collect();
        stages.sort_by_key(|s| s.kind.index());

        let outcome = check_interfaces(&stages).map(|()| collect_uniforms(&stages));
        let silent = state.silent_link_log;

        let Some(record) = state.programs.get_mut(&program) else {
            return;
        };
        match outcome {
            Ok(uniforms) => {
                record.linked = true;
                record.log.clear();
                record.uniforms = uniforms;
            }
            Err(log) => {
                record.linked = false;
                record.log = if silent { String::new() } else { log };
                record.uniforms.clear();
            }
        }
    }

    fn link_status(&self, program: ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn active_uniform_count(&self, program: ProgramId) -> u32 {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |p| p.uniforms.len() as u32)
    }

    fn active_uniform(&self, program: ProgramId, index: u32) -> Option<ActiveUniform> {
        self.state
            .borrow()
            .programs
            .get(&program)?
            .uniforms
            .get(index as usize)
            .cloned()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        let state = self.state.borrow();
        let Some(record) = state.programs.get(&program) else {
            return UniformLocation::NONE;
        };
        let base = name.strip_suffix("[0]").unwrap_or(name);
        if state.optimized_out.contains(base) {
            return UniformLocation::NONE;
        }
        record
            .uniforms
            .iter()
            .position(|u| u.name == name)
            .map_or(UniformLocation::NONE, |i| UniformLocation(i as i32))
    }

    fn use_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.active = Some(program);
        state.calls.push(Call::UseProgram(program));
    }

    fn bind_tracker(&self) -> Option<&BindTracker> {
        Some(&self.tracker)
    }
}

/// A `qualifier type name;` declaration.
struct Declaration<'a> {
    qualifier: &'a str,
    ty: &'a str,
    name: &'a str,
}

fn declarations(source: &str) -> impl Iterator<Item = Declaration<'_>> {
    source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .flat_map(|line| line.split(';'))
        .filter_map(|statement| {
            let mut tokens = statement.split_whitespace();
            let qualifier = tokens.next()?;
            let ty = tokens.next()?;
            let name = tokens.next()?;
            Some(Declaration {
                qualifier,
                ty,
                name,
            })
        })
}

fn check_interfaces(stages: &[&StageRecord]) -> Result<(), String> {
    if stages.is_empty() {
        return Err("error: no shaders attached to the program".to_owned());
    }

    for pair in stages.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let outputs: Vec<Declaration> = declarations(&prev.source)
            .filter(|d| d.qualifier == "out")
            .collect();

        for input in declarations(&next.source).filter(|d| d.qualifier == "in") {
            let matched = outputs
                .iter()
                .any(|out| out.name == input.name && out.ty == input.ty);
            if !matched {
                return Err(format!(
                    "error: {:?} input '{}' of type {} has no matching output in the {:?} stage",
                    next.kind, input.name, input.ty, prev.kind
                ));
            }
        }
    }

    Ok(())
}

fn collect_uniforms(stages: &[&StageRecord]) -> Vec<ActiveUniform> {
    let mut uniforms: Vec<ActiveUniform> = Vec::new();

    for decl in stages
        .iter()
        .flat_map(|s| declarations(&s.source))
        .filter(|d| d.qualifier == "uniform")
    {
        let (name, size) = match decl.name.split_once('[') {
            Some((base, rest)) => {
                let len = rest.trim_end_matches(']').parse::<i32>().unwrap_or(1);
                (format!("{base}[0]"), len)
            }
            None => (decl.name.to_owned(), 1),
        };

        if uniforms.iter().any(|u| u.name == name) {
            continue;
        }
        uniforms.push(ActiveUniform {
            name,
            size,
            type_tag: glsl_type(decl.ty).to_gl(),
        });
    }

    uniforms
}

fn glsl_type(name: &str) -> UniformType {
    match name {
        "float" => UniformType::Float,
        "vec2" => UniformType::Vec2,
        "vec3" => UniformType::Vec3,
        "vec4" => UniformType::Vec4,
        "int" => UniformType::Int,
        "ivec2" => UniformType::IVec2,
        "ivec3" => UniformType::IVec3,
        "ivec4" => UniformType::IVec4,
        "uint" => UniformType::UInt,
        "bool" => UniformType::Bool,
        "mat2" => UniformType::Mat2,
        "mat3" => UniformType::Mat3,
        "mat4" => UniformType::Mat4,
        "sampler1D" => UniformType::Sampler1D,
        "sampler2D" => UniformType::Sampler2D,
        "sampler3D" => UniformType::Sampler3D,
        "samplerCube" => UniformType::SamplerCube,
        "sampler2DShadow" => UniformType::Sampler2DShadow,
        "sampler2DArray" => UniformType::Sampler2DArray,
        _ => UniformType::Other(0),
    }
}
