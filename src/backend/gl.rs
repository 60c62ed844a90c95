//! OpenGL context implementation over glow

use crate::backend::traits::*;
use crate::backend::types::*;
use glam::{Mat4, Vec4};
use glow::HasContext;
use std::collections::HashMap;
use std::sync::Arc;

/// [`GraphicsContext`] backed by a live OpenGL context
///
/// Native glow objects are kept in handle maps, so the rest of the crate only
/// ever sees the opaque handle newtypes. Programs are linked by the
/// application and registered here before use.
pub struct GlContext {
    gl: Arc<glow::Context>,

    buffers: HashMap<u64, glow::Buffer>,
    vertex_arrays: HashMap<u64, glow::VertexArray>,
    programs: HashMap<u64, glow::Program>,
    uniforms: UniformTable<glow::UniformLocation>,

    next_id: u64,
}

impl GlContext {
    pub fn new(gl: Arc<glow::Context>) -> Self {
        Self {
            gl,
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            programs: HashMap::new(),
            uniforms: UniformTable::default(),
            next_id: 0,
        }
    }

    /// Access the raw glow context
    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Register a program linked by the application
    pub fn register_program(&mut self, program: glow::Program) -> ProgramHandle {
        let id = self.allocate_id();
        self.programs.insert(id, program);
        ProgramHandle(id)
    }

    /// Native program behind a handle
    pub fn program(&self, program: ProgramHandle) -> BackendResult<glow::Program> {
        self.programs
            .get(&program.0)
            .copied()
            .ok_or(BackendError::UnknownHandle { kind: "program", id: program.0 })
    }

    fn buffer_target(target: BufferTarget) -> u32 {
        match target {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }

    fn buffer_usage(usage: BufferUsage) -> u32 {
        match usage {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
        }
    }

    fn topology(topology: PrimitiveTopology) -> u32 {
        match topology {
            PrimitiveTopology::TriangleList => glow::TRIANGLES,
        }
    }

    fn index_type(format: IndexFormat) -> u32 {
        match format {
            IndexFormat::Uint32 => glow::UNSIGNED_INT,
        }
    }
}

/// Uniform locations keyed by handle id, one id per (program, name)
#[derive(Debug)]
struct UniformTable<L> {
    ids: HashMap<(u64, String), u64>,
    locations: HashMap<u64, L>,
}

impl<L> Default for UniformTable<L> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            locations: HashMap::new(),
        }
    }
}

impl<L> UniformTable<L> {
    fn find(&self, program: u64, name: &str) -> Option<u64> {
        self.ids.get(&(program, name.to_string())).copied()
    }

    fn insert(&mut self, id: u64, program: u64, name: &str, location: L) {
        self.ids.insert((program, name.to_string()), id);
        self.locations.insert(id, location);
    }

    fn get(&self, id: u64) -> Option<&L> {
        self.locations.get(&id)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locations.len()
    }
}

impl GraphicsContext for GlContext {
    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle> {
        let native = unsafe { self.gl.create_vertex_array() }.map_err(|message| {
            BackendError::ResourceCreationFailed { kind: "vertex array", message }
        })?;
        let id = self.allocate_id();
        self.vertex_arrays.insert(id, native);
        Ok(VertexArrayHandle(id))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if let Some(native) = self.vertex_arrays.remove(&vertex_array.0) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn create_buffer(&mut self) -> BackendResult<BufferHandle> {
        let native = unsafe { self.gl.create_buffer() }.map_err(|message| {
            BackendError::ResourceCreationFailed { kind: "buffer", message }
        })?;
        let id = self.allocate_id();
        self.buffers.insert(id, native);
        Ok(BufferHandle(id))
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(native) = self.buffers.remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        let native = vertex_array.and_then(|handle| self.vertex_arrays.get(&handle.0).copied());
        if vertex_array.is_some() && native.is_none() {
            log::warn!("Binding unknown vertex array {:?}", vertex_array);
            return;
        }
        unsafe { self.gl.bind_vertex_array(native) };
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let native = buffer.and_then(|handle| self.buffers.get(&handle.0).copied());
        if buffer.is_some() && native.is_none() {
            log::warn!("Binding unknown buffer {:?}", buffer);
            return;
        }
        unsafe { self.gl.bind_buffer(Self::buffer_target(target), native) };
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(Self::buffer_target(target), data, Self::buffer_usage(usage))
        };
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        let native = self.programs.get(&program.0).copied()?;
        unsafe { self.gl.get_attrib_location(native, name) }
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let native = self.programs.get(&program.0).copied()?;
        if let Some(id) = self.uniforms.find(program.0, name) {
            return Some(UniformLocation(id));
        }
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let id = self.allocate_id();
        self.uniforms.insert(id, program.0, name, location);
        Some(UniformLocation(id))
    }

    fn enable_vertex_attribute(&mut self, attribute: &VertexAttribute) {
        unsafe {
            self.gl.enable_vertex_attrib_array(attribute.location);
            self.gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.format.components() as i32,
                glow::FLOAT,
                false,
                attribute.stride as i32,
                attribute.offset as i32,
            );
        }
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        let Some(native) = self.uniforms.get(location.0) else {
            return;
        };
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(native), false, &value.to_cols_array())
        };
    }

    fn set_uniform_vec4(&mut self, location: UniformLocation, value: Vec4) {
        let Some(native) = self.uniforms.get(location.0) else {
            return;
        };
        unsafe { self.gl.uniform_4_f32(Some(native), value.x, value.y, value.z, value.w) };
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, count: u32, format: IndexFormat) {
        unsafe {
            self.gl.draw_elements(
                Self::topology(topology),
                count as i32,
                Self::index_type(format),
                0,
            )
        };
    }
}
