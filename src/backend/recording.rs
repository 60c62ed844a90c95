//! Headless graphics context
//!
//! Tracks resources and binding state the way an OpenGL driver would and
//! records every call. Invalid operations (drawing without a vertex array,
//! uploading to an unbound target, ...) do not panic; they are collected in
//! [`RecordingContext::errors`], the same way GL reports them through
//! `glGetError`.

use crate::backend::traits::*;
use crate::backend::types::*;
use glam::{Mat4, Vec4};
use std::collections::HashMap;

/// A recorded context call
#[derive(Debug, Clone, PartialEq)]
pub enum GlCommand {
    CreateVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferHandle>,
    },
    BufferData {
        target: BufferTarget,
        buffer: Option<BufferHandle>,
        len: usize,
        usage: BufferUsage,
    },
    EnableVertexAttribute(VertexAttribute),
    SetUniformMat4 {
        location: UniformLocation,
        value: Mat4,
    },
    SetUniformVec4 {
        location: UniformLocation,
        value: Vec4,
    },
    DrawIndexed {
        vertex_array: Option<VertexArrayHandle>,
        topology: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
    },
}

/// Attributes and uniforms exposed by a registered program
#[derive(Debug, Clone, Default)]
struct ProgramInterface {
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, UniformLocation>,
}

/// Per vertex array state
#[derive(Debug, Clone, Default)]
struct VertexArrayState {
    element_buffer: Option<BufferHandle>,
    attributes: Vec<(VertexAttribute, Option<BufferHandle>)>,
}

/// In-memory [`GraphicsContext`]
#[derive(Debug, Default)]
pub struct RecordingContext {
    next_id: u64,
    commands: Vec<GlCommand>,
    errors: Vec<String>,

    buffers: HashMap<BufferHandle, Vec<u8>>,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArrayState>,
    programs: HashMap<ProgramHandle, ProgramInterface>,
    uniform_names: HashMap<UniformLocation, String>,
    uniform_values: HashMap<UniformLocation, UniformValue>,

    bound_vertex_array: Option<VertexArrayHandle>,
    bound_array_buffer: Option<BufferHandle>,
    // Element buffer binding used while no vertex array is bound
    default_element_buffer: Option<BufferHandle>,
}

/// Last value written to a uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec4(Vec4),
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Register a program exposing the given attributes and uniforms
    pub fn register_program(&mut self, attributes: &[(&str, u32)], uniforms: &[&str]) -> ProgramHandle {
        let program = ProgramHandle(self.allocate_id());
        let mut interface = ProgramInterface::default();
        for (name, location) in attributes {
            interface.attributes.insert(name.to_string(), *location);
        }
        for name in uniforms {
            let location = UniformLocation(self.allocate_id());
            interface.uniforms.insert(name.to_string(), location);
            self.uniform_names.insert(location, name.to_string());
        }
        self.programs.insert(program, interface);
        program
    }

    /// All calls made so far, in order
    pub fn commands(&self) -> &[GlCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Invalid operations detected so far
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn is_buffer_live(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer)
    }

    pub fn is_vertex_array_live(&self, vertex_array: VertexArrayHandle) -> bool {
        self.vertex_arrays.contains_key(&vertex_array)
    }

    /// Bytes last uploaded into a buffer
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.bound_vertex_array
    }

    /// Buffer currently bound to `target`
    ///
    /// The element-array binding is part of the bound vertex array's state.
    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Array => self.bound_array_buffer,
            BufferTarget::ElementArray => match self.bound_vertex_array {
                Some(vao) => self.vertex_arrays.get(&vao).and_then(|state| state.element_buffer),
                None => self.default_element_buffer,
            },
        }
    }

    /// Element buffer captured by a vertex array
    pub fn vertex_array_element_buffer(&self, vertex_array: VertexArrayHandle) -> Option<BufferHandle> {
        self.vertex_arrays.get(&vertex_array).and_then(|state| state.element_buffer)
    }

    /// Attributes enabled on a vertex array with their source buffers
    pub fn vertex_array_attributes(&self, vertex_array: VertexArrayHandle) -> &[(VertexAttribute, Option<BufferHandle>)] {
        self.vertex_arrays
            .get(&vertex_array)
            .map(|state| state.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Last value written to the named uniform
    pub fn uniform_value(&self, name: &str) -> Option<UniformValue> {
        self.uniform_names
            .iter()
            .find(|(_, uniform)| uniform.as_str() == name)
            .and_then(|(location, _)| self.uniform_values.get(location).copied())
    }

    /// Number of indexed draws recorded since the last `clear_commands`
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, GlCommand::DrawIndexed { .. }))
            .count()
    }

    fn report(&mut self, message: String) {
        log::warn!("RecordingContext: {}", message);
        self.errors.push(message);
    }
}

impl GraphicsContext for RecordingContext {
    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle> {
        let vertex_array = VertexArrayHandle(self.allocate_id());
        self.vertex_arrays.insert(vertex_array, VertexArrayState::default());
        self.commands.push(GlCommand::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.commands.push(GlCommand::DeleteVertexArray(vertex_array));
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            // Deleting an unknown name is silently ignored by GL
            return;
        }
        if self.bound_vertex_array == Some(vertex_array) {
            self.bound_vertex_array = None;
        }
    }

    fn create_buffer(&mut self) -> BackendResult<BufferHandle> {
        let buffer = BufferHandle(self.allocate_id());
        self.buffers.insert(buffer, Vec::new());
        self.commands.push(GlCommand::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(GlCommand::DeleteBuffer(buffer));
        if self.buffers.remove(&buffer).is_none() {
            return;
        }
        if self.bound_array_buffer == Some(buffer) {
            self.bound_array_buffer = None;
        }
        if self.default_element_buffer == Some(buffer) {
            self.default_element_buffer = None;
        }
        // Deleting a buffer detaches it from the bound vertex array only
        if let Some(vao) = self.bound_vertex_array {
            if let Some(state) = self.vertex_arrays.get_mut(&vao) {
                if state.element_buffer == Some(buffer) {
                    state.element_buffer = None;
                }
            }
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        self.commands.push(GlCommand::BindVertexArray(vertex_array));
        if let Some(vao) = vertex_array {
            if !self.vertex_arrays.contains_key(&vao) {
                self.report(format!("bind of unknown vertex array {}", vao.id()));
                return;
            }
        }
        self.bound_vertex_array = vertex_array;
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.commands.push(GlCommand::BindBuffer { target, buffer });
        if let Some(handle) = buffer {
            if !self.buffers.contains_key(&handle) {
                self.report(format!("bind of unknown buffer {}", handle.id()));
                return;
            }
        }
        match target {
            BufferTarget::Array => self.bound_array_buffer = buffer,
            BufferTarget::ElementArray => match self.bound_vertex_array {
                Some(vao) => {
                    if let Some(state) = self.vertex_arrays.get_mut(&vao) {
                        state.element_buffer = buffer;
                    }
                }
                None => self.default_element_buffer = buffer,
            },
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let buffer = self.bound_buffer(target);
        self.commands.push(GlCommand::BufferData {
            target,
            buffer,
            len: data.len(),
            usage,
        });
        match buffer.and_then(|handle| self.buffers.get_mut(&handle)) {
            Some(contents) => *contents = data.to_vec(),
            None => self.report(format!("buffer data upload with no buffer bound to {:?}", target)),
        }
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        match self.programs.get(&program) {
            Some(interface) => interface.attributes.get(name).copied(),
            None => {
                self.report(format!("attribute lookup on unknown program {}", program.id()));
                None
            }
        }
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        match self.programs.get(&program) {
            Some(interface) => interface.uniforms.get(name).copied(),
            None => {
                self.report(format!("uniform lookup on unknown program {}", program.id()));
                None
            }
        }
    }

    fn enable_vertex_attribute(&mut self, attribute: &VertexAttribute) {
        self.commands.push(GlCommand::EnableVertexAttribute(*attribute));
        let source = self.bound_array_buffer;
        if source.is_none() {
            self.report(format!("attribute {} configured with no array buffer bound", attribute.location));
        }
        match self.bound_vertex_array.and_then(|vao| self.vertex_arrays.get_mut(&vao)) {
            Some(state) => {
                state.attributes.retain(|(existing, _)| existing.location != attribute.location);
                state.attributes.push((*attribute, source));
            }
            None => self.report(format!("attribute {} configured with no vertex array bound", attribute.location)),
        }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.commands.push(GlCommand::SetUniformMat4 { location, value: *value });
        self.uniform_values.insert(location, UniformValue::Mat4(*value));
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: Vec4) {
        self.commands.push(GlCommand::SetUniformVec4 { location, value });
        self.uniform_values.insert(location, UniformValue::Vec4(value));
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, count: u32, format: IndexFormat) {
        self.commands.push(GlCommand::DrawIndexed {
            vertex_array: self.bound_vertex_array,
            topology,
            count,
            format,
        });
        let Some(vao) = self.bound_vertex_array else {
            self.report("indexed draw with no vertex array bound".to_string());
            return;
        };
        let Some(element_buffer) = self.vertex_array_element_buffer(vao) else {
            self.report(format!("indexed draw with no element buffer on vertex array {}", vao.id()));
            return;
        };
        let available = self.buffers.get(&element_buffer).map(Vec::len).unwrap_or(0) as u64;
        let required = count as u64 * format.size();
        if required > available {
            self.report(format!(
                "indexed draw reads {} bytes but element buffer {} holds {}",
                required,
                element_buffer.id(),
                available
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_delete_tracks_live_resources() {
        let mut ctx = RecordingContext::new();
        let a = ctx.create_buffer().unwrap();
        let b = ctx.create_buffer().unwrap();
        let vao = ctx.create_vertex_array().unwrap();
        assert_ne!(a, b);
        assert_eq!(ctx.live_buffer_count(), 2);
        assert_eq!(ctx.live_vertex_array_count(), 1);

        ctx.delete_buffer(a);
        ctx.delete_vertex_array(vao);
        assert_eq!(ctx.live_buffer_count(), 1);
        assert_eq!(ctx.live_vertex_array_count(), 0);
        assert!(!ctx.is_buffer_live(a));
        assert!(ctx.is_buffer_live(b));
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn test_buffer_data_goes_to_bound_buffer() {
        let mut ctx = RecordingContext::new();
        let buffer = ctx.create_buffer().unwrap();
        ctx.bind_buffer(BufferTarget::Array, Some(buffer));
        ctx.buffer_data(BufferTarget::Array, &[1, 2, 3, 4], BufferUsage::StaticDraw);
        assert_eq!(ctx.buffer_contents(buffer), Some(&[1u8, 2, 3, 4][..]));

        ctx.bind_buffer(BufferTarget::Array, None);
        ctx.buffer_data(BufferTarget::Array, &[5], BufferUsage::StaticDraw);
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_element_binding_is_vertex_array_state() {
        let mut ctx = RecordingContext::new();
        let vao = ctx.create_vertex_array().unwrap();
        let ebo = ctx.create_buffer().unwrap();

        ctx.bind_vertex_array(Some(vao));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(ebo));
        ctx.bind_vertex_array(None);

        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), None);
        assert_eq!(ctx.vertex_array_element_buffer(vao), Some(ebo));
    }

    #[test]
    fn test_unknown_program_lookups_report_errors() {
        let mut ctx = RecordingContext::new();
        let program = ctx.register_program(&[("inPosition", 0)], &["color"]);
        assert_eq!(ctx.attribute_location(program, "inPosition"), Some(0));
        assert_eq!(ctx.attribute_location(program, "inNormal"), None);
        assert!(ctx.uniform_location(program, "color").is_some());
        assert!(ctx.uniform_location(program, "modelMatrix").is_none());
        assert!(ctx.errors().is_empty());

        let missing = ProgramHandle(999);
        assert_eq!(ctx.attribute_location(missing, "inPosition"), None);
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_draw_without_vertex_array_is_an_error() {
        let mut ctx = RecordingContext::new();
        ctx.draw_indexed(PrimitiveTopology::TriangleList, 3, IndexFormat::Uint32);
        assert_eq!(ctx.draw_call_count(), 1);
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_draw_past_end_of_element_buffer_is_an_error() {
        let mut ctx = RecordingContext::new();
        let vao = ctx.create_vertex_array().unwrap();
        let ebo = ctx.create_buffer().unwrap();
        ctx.bind_vertex_array(Some(vao));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(ebo));
        ctx.buffer_data(BufferTarget::ElementArray, bytemuck::cast_slice::<u32, u8>(&[0, 1, 2]), BufferUsage::StaticDraw);

        ctx.draw_indexed(PrimitiveTopology::TriangleList, 3, IndexFormat::Uint32);
        assert!(ctx.errors().is_empty());

        ctx.draw_indexed(PrimitiveTopology::TriangleList, 6, IndexFormat::Uint32);
        assert_eq!(ctx.errors().len(), 1);
    }
}
