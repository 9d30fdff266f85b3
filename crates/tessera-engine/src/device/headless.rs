//! In-memory driver.
//!
//! `HeadlessDevice` implements [`Device`] without a GPU. It hands out names,
//! keeps buffer contents, runs a small GLSL sanity check, reflects plain
//! `uniform` declarations at link time and records every command it receives.
//! It backs the crate's tests and is usable by tooling that needs to inspect
//! what a frame would submit.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use glam::Vec4;

use crate::uniform::UniformValue;

use super::backend::Device;
use super::types::{
    BufferTarget, BufferUsage, IndexFormat, ObjectKind, RawId, ShaderStage, TextureTarget,
    UniformLocation, VertexAttribute,
};

/// One recorded driver call with its resolved bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BufferData { buffer: RawId, len: usize },
    BufferSubData { buffer: RawId, offset: usize, len: usize },
    BindBufferBase { slot: u32, buffer: RawId },
    VertexAttribute {
        vertex_array: Option<RawId>,
        buffer: Option<RawId>,
        attribute: VertexAttribute,
    },
    UseProgram(Option<RawId>),
    SetUniform {
        program: Option<RawId>,
        location: UniformLocation,
        value: UniformValue,
    },
    BindTexture { unit: u32, target: TextureTarget, texture: RawId },
    DrawIndexed {
        program: Option<RawId>,
        vertex_array: Option<RawId>,
        count: u32,
        format: IndexFormat,
    },
    DrawArrays {
        program: Option<RawId>,
        vertex_array: Option<RawId>,
        first: u32,
        count: u32,
    },
    Clear(Vec4),
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::DrawIndexed { .. } | Command::DrawArrays { .. })
    }
}

#[derive(Debug)]
struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<RawId>,
    linked: bool,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    next_name: u32,
    live: BTreeMap<RawId, ObjectKind>,
    destroy_calls: usize,
    fail_next: Vec<(ObjectKind, usize)>,

    buffers: HashMap<RawId, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, RawId>,
    element_buffers: HashMap<RawId, RawId>,
    current_vertex_array: Option<RawId>,

    shaders: HashMap<RawId, ShaderRecord>,
    programs: HashMap<RawId, ProgramRecord>,
    current_program: Option<RawId>,
    uniform_values: HashMap<(RawId, UniformLocation), UniformValue>,

    labels: HashMap<RawId, String>,
    commands: Vec<Command>,
}

impl State {
    fn bound(&self, target: BufferTarget) -> Option<RawId> {
        self.bound_buffers.get(&target).copied()
    }
}

/// Deterministic, GPU-less implementation of [`Device`].
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    state: RefCell<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `create` of `kind` fail, simulating driver exhaustion.
    pub fn fail_next_create(&self, kind: ObjectKind) {
        self.fail_create_after(kind, 0);
    }

    /// Lets `skip` creations of `kind` succeed, then fails the following one.
    pub fn fail_create_after(&self, kind: ObjectKind, skip: usize) {
        self.state.borrow_mut().fail_next.push((kind, skip));
    }

    /// Number of live objects of exactly `kind`.
    pub fn live_count(&self, kind: ObjectKind) -> usize {
        self.state.borrow().live.values().filter(|k| **k == kind).count()
    }

    /// Number of live shader objects of any stage.
    pub fn live_shaders(&self) -> usize {
        self.state
            .borrow()
            .live
            .values()
            .filter(|k| matches!(k, ObjectKind::Shader(_)))
            .count()
    }

    /// Total number of live objects.
    pub fn live_objects(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn destroy_calls(&self) -> usize {
        self.state.borrow().destroy_calls
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: RawId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    /// Last value uploaded to `location` of `program`.
    pub fn uniform_value(&self, program: RawId, location: UniformLocation) -> Option<UniformValue> {
        self.state
            .borrow()
            .uniform_values
            .get(&(program, location))
            .cloned()
    }

    pub fn label_of(&self, id: RawId) -> Option<String> {
        self.state.borrow().labels.get(&id).cloned()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Returns and clears the recorded command stream.
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    pub fn draw_calls(&self) -> Vec<Command> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| c.is_draw())
            .cloned()
            .collect()
    }

    fn record(&self, command: Command) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl Device for HeadlessDevice {
    fn create(&self, kind: ObjectKind) -> Result<RawId, String> {
        let mut st = self.state.borrow_mut();
        if let Some(pos) = st.fail_next.iter().position(|(k, _)| *k == kind) {
            if st.fail_next[pos].1 == 0 {
                st.fail_next.remove(pos);
                return Err(format!("out of memory allocating {kind}"));
            }
            st.fail_next[pos].1 -= 1;
        }

        st.next_name += 1;
        let id = RawId::new(st.next_name).ok_or_else(|| "name space exhausted".to_string())?;
        st.live.insert(id, kind);

        match kind {
            ObjectKind::Buffer => {
                st.buffers.insert(id, Vec::new());
            }
            ObjectKind::Shader(stage) => {
                st.shaders.insert(
                    id,
                    ShaderRecord {
                        stage,
                        source: String::new(),
                        compiled: false,
                    },
                );
            }
            ObjectKind::Program => {
                st.programs.insert(id, ProgramRecord::default());
            }
            ObjectKind::VertexArray => {}
        }
        Ok(id)
    }

    fn destroy(&self, kind: ObjectKind, id: RawId) {
        let mut st = self.state.borrow_mut();
        match st.live.remove(&id) {
            Some(live_kind) => debug_assert_eq!(live_kind, kind, "destroy with mismatched kind"),
            None => panic!("double destroy of {kind} {id}"),
        }
        st.destroy_calls += 1;
        st.buffers.remove(&id);
        st.shaders.remove(&id);
        st.programs.remove(&id);
        st.element_buffers.remove(&id);
        st.labels.remove(&id);
        st.uniform_values.retain(|(program, _), _| *program != id);
        st.bound_buffers.retain(|_, bound| *bound != id);
        if st.current_program == Some(id) {
            st.current_program = None;
        }
        if st.current_vertex_array == Some(id) {
            st.current_vertex_array = None;
        }
    }

    fn label(&self, _kind: ObjectKind, id: RawId, label: &str) {
        self.state.borrow_mut().labels.insert(id, label.to_string());
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<RawId>) {
        let mut st = self.state.borrow_mut();
        match buffer {
            Some(id) => {
                st.bound_buffers.insert(target, id);
                if target == BufferTarget::Index {
                    if let Some(vao) = st.current_vertex_array {
                        st.element_buffers.insert(vao, id);
                    }
                }
            }
            None => {
                st.bound_buffers.remove(&target);
            }
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        let mut st = self.state.borrow_mut();
        let Some(buffer) = st.bound(target) else {
            panic!("buffer_data with no buffer bound to {target:?}");
        };
        st.buffers.insert(buffer, data.to_vec());
        st.commands.push(Command::BufferData {
            buffer,
            len: data.len(),
        });
    }

    fn buffer_storage(&self, target: BufferTarget, size: usize, _usage: BufferUsage) {
        let mut st = self.state.borrow_mut();
        let Some(buffer) = st.bound(target) else {
            panic!("buffer_storage with no buffer bound to {target:?}");
        };
        st.buffers.insert(buffer, vec![0; size]);
        st.commands.push(Command::BufferData { buffer, len: size });
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut st = self.state.borrow_mut();
        let Some(buffer) = st.bound(target) else {
            panic!("buffer_sub_data with no buffer bound to {target:?}");
        };
        let contents = st.buffers.entry(buffer).or_default();
        let end = offset + data.len();
        assert!(end <= contents.len(), "buffer_sub_data out of range ({end} > {})", contents.len());
        contents[offset..end].copy_from_slice(data);
        st.commands.push(Command::BufferSubData {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn bind_buffer_base(&self, target: BufferTarget, slot: u32, buffer: RawId) {
        let mut st = self.state.borrow_mut();
        st.bound_buffers.insert(target, buffer);
        st.commands.push(Command::BindBufferBase { slot, buffer });
    }

    fn bind_vertex_array(&self, vertex_array: Option<RawId>) {
        self.state.borrow_mut().current_vertex_array = vertex_array;
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        let (vertex_array, buffer) = {
            let st = self.state.borrow();
            (st.current_vertex_array, st.bound(BufferTarget::Vertex))
        };
        self.record(Command::VertexAttribute {
            vertex_array,
            buffer,
            attribute: *attribute,
        });
    }

    fn compile_shader(&self, shader: RawId, source: &str) -> Result<(), String> {
        let mut st = self.state.borrow_mut();
        let Some(record) = st.shaders.get_mut(&shader) else {
            return Err(format!("{shader} is not a shader object"));
        };
        record.source = source.to_string();
        record.compiled = false;
        glsl::check(source)?;
        record.compiled = true;
        Ok(())
    }

    fn attach_shader(&self, program: RawId, shader: RawId) {
        let mut st = self.state.borrow_mut();
        if let Some(record) = st.programs.get_mut(&program) {
            record.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: RawId, shader: RawId) {
        let mut st = self.state.borrow_mut();
        if let Some(record) = st.programs.get_mut(&program) {
            record.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: RawId) -> Result<(), String> {
        let mut st = self.state.borrow_mut();
        let attached = match st.programs.get(&program) {
            Some(record) => record.attached.clone(),
            None => return Err(format!("{program} is not a program object")),
        };
        if attached.is_empty() {
            return Err("error: program has no attached shaders".to_string());
        }

        let mut stages = Vec::with_capacity(attached.len());
        for shader in &attached {
            let Some(record) = st.shaders.get(shader) else {
                return Err(format!("error: attached shader {shader} was deleted"));
            };
            if !record.compiled {
                return Err(format!("error: {} shader {shader} is not compiled", record.stage));
            }
            stages.push((record.stage, record.source.as_str()));
        }

        let uniforms = glsl::link(&stages)?;
        if let Some(record) = st.programs.get_mut(&program) {
            record.linked = true;
            record.uniforms = uniforms;
        }
        Ok(())
    }

    fn use_program(&self, program: Option<RawId>) {
        self.state.borrow_mut().current_program = program;
        self.record(Command::UseProgram(program));
    }

    fn uniform_location(&self, program: RawId, name: &str) -> Option<UniformLocation> {
        let st = self.state.borrow();
        let record = st.programs.get(&program)?;
        if !record.linked {
            return None;
        }
        record
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let mut st = self.state.borrow_mut();
        let program = st.current_program;
        if let Some(p) = program {
            st.uniform_values.insert((p, location), value.clone());
        }
        st.commands.push(Command::SetUniform {
            program,
            location,
            value: value.clone(),
        });
    }

    fn bind_texture(&self, unit: u32, target: TextureTarget, texture: RawId) {
        self.record(Command::BindTexture {
            unit,
            target,
            texture,
        });
    }

    fn draw_indexed(&self, count: u32, format: IndexFormat) {
        let mut st = self.state.borrow_mut();
        let vertex_array = st.current_vertex_array;
        debug_assert!(
            vertex_array.is_some_and(|vao| st.element_buffers.contains_key(&vao)),
            "indexed draw without an element buffer"
        );
        let program = st.current_program;
        st.commands.push(Command::DrawIndexed {
            program,
            vertex_array,
            count,
            format,
        });
    }

    fn draw_arrays(&self, first: u32, count: u32) {
        let mut st = self.state.borrow_mut();
        let program = st.current_program;
        let vertex_array = st.current_vertex_array;
        st.commands.push(Command::DrawArrays {
            program,
            vertex_array,
            first,
            count,
        });
    }

    fn clear(&self, color: Vec4) {
        self.record(Command::Clear(color));
    }
}

/// Minimal GLSL front end: enough structure to catch missing entry points,
/// unbalanced scopes and unmatched stage interfaces.
mod glsl {
    use super::ShaderStage;

    #[derive(Debug, PartialEq)]
    pub(super) struct Declaration {
        pub qualifier: &'static str,
        pub name: String,
    }

    pub(super) fn check(source: &str) -> Result<(), String> {
        if source.trim().is_empty() {
            return Err("0:1(1): error: empty shader source".to_string());
        }

        let mut depth: i64 = 0;
        for (line_no, line) in source.lines().enumerate() {
            for ch in strip_comment(line).chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
                if depth < 0 {
                    return Err(format!("0:{}(1): error: unexpected '}}'", line_no + 1));
                }
            }
        }
        if depth != 0 {
            return Err("0:0(0): error: unexpected end of file, missing '}'".to_string());
        }

        let has_main = source
            .lines()
            .map(strip_comment)
            .any(|l| l.split_whitespace().collect::<String>().contains("voidmain("));
        if !has_main {
            return Err("0:0(0): error: function `main' is not defined".to_string());
        }
        Ok(())
    }

    /// Validates stage interfaces and returns the reflected uniform names in
    /// location order.
    pub(super) fn link(stages: &[(ShaderStage, &str)]) -> Result<Vec<String>, String> {
        let mut uniforms: Vec<String> = Vec::new();
        let mut outputs: Vec<String> = Vec::new();

        for (stage, source) in stages {
            for decl in declarations(source) {
                match decl.qualifier {
                    "uniform" => {
                        if !uniforms.contains(&decl.name) {
                            uniforms.push(decl.name);
                        }
                    }
                    "out" if *stage != ShaderStage::Fragment => outputs.push(decl.name),
                    _ => {}
                }
            }
        }

        let has_vertex = stages.iter().any(|(s, _)| *s == ShaderStage::Vertex);
        for (stage, source) in stages {
            if *stage != ShaderStage::Fragment || !has_vertex {
                continue;
            }
            for decl in declarations(source) {
                if decl.qualifier == "in" && !outputs.contains(&decl.name) {
                    return Err(format!(
                        "error: fragment shader input `{}' has no matching output in the previous stage",
                        decl.name
                    ));
                }
            }
        }

        Ok(uniforms)
    }

    pub(super) fn declarations(source: &str) -> Vec<Declaration> {
        let cleaned: String = source
            .lines()
            .map(strip_comment)
            .filter(|l| !l.trim_start().starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");

        let mut out = Vec::new();
        for statement in cleaned.split(';') {
            let mut stmt = statement.trim_start_matches(|c: char| c.is_whitespace() || c == '}');
            if stmt.starts_with("layout") {
                match stmt.find(')') {
                    Some(end) => stmt = &stmt[end + 1..],
                    None => continue,
                }
            }
            // Interface blocks have no plain locations.
            if stmt.contains('{') {
                continue;
            }

            let tokens: Vec<&str> = stmt
                .split_whitespace()
                .filter(|t| !matches!(*t, "flat" | "smooth" | "noperspective" | "highp" | "mediump" | "lowp"))
                .collect();
            let qualifier = match tokens.first() {
                Some(&"uniform") => "uniform",
                Some(&"in") => "in",
                Some(&"out") => "out",
                _ => continue,
            };
            if let Some(name) = tokens.get(2) {
                let name = name.split('[').next().unwrap_or(name);
                out.push(Declaration {
                    qualifier,
                    name: name.to_string(),
                });
            }
        }
        out
    }

    fn strip_comment(line: &str) -> &str {
        match line.find("//") {
            Some(i) => &line[..i],
            None => line,
        }
    }
}
