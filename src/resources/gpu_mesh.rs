//! GPU-side resources of a mesh

use crate::backend::*;
use crate::resources::MeshBuffer;
use glam::{Mat4, Vec4};

/// Names the mesh looks up in the shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderNames {
    pub position_attribute: String,
    pub view_matrix: String,
    pub projection_matrix: String,
    pub model_matrix: String,
    pub color: String,
}

impl Default for ShaderNames {
    fn default() -> Self {
        Self {
            position_attribute: "inPosition".to_string(),
            view_matrix: "viewMatrix".to_string(),
            projection_matrix: "projMatrix".to_string(),
            model_matrix: "modelMatrix".to_string(),
            color: "color".to_string(),
        }
    }
}

/// Uniform locations resolved from the program, `None` when not exposed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformLocations {
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
    pub model: Option<UniformLocation>,
    pub color: Option<UniformLocation>,
}

/// Vertex array, vertex buffer and index buffer of one mesh
///
/// The handles are released by [`GpuMesh::destroy`] and before every
/// re-creation. Dropping a mesh that still owns handles leaks them, since
/// releasing needs the context.
#[derive(Debug, Default)]
pub struct GpuMesh {
    vertex_array: Option<VertexArrayHandle>,
    vertex_buffer: Option<BufferHandle>,
    index_buffer: Option<BufferHandle>,
    index_count: u32,
    position_location: Option<u32>,
    uniforms: UniformLocations,
}

impl GpuMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }

    pub fn vertex_buffer(&self) -> Option<BufferHandle> {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Number of indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Attribute location of the vertex position, if the program exposes it
    pub fn position_location(&self) -> Option<u32> {
        self.position_location
    }

    pub fn uniforms(&self) -> &UniformLocations {
        &self.uniforms
    }

    /// Whether any GPU resource is currently owned
    pub fn is_created(&self) -> bool {
        self.vertex_array.is_some() || self.vertex_buffer.is_some() || self.index_buffer.is_some()
    }

    /// Upload vertices and indices into fresh buffers
    ///
    /// Previously owned buffers are released first, together with any vertex
    /// array describing them; call `bind_layout` again before drawing.
    pub fn create_buffers<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        mesh: &MeshBuffer,
    ) -> BackendResult<()> {
        self.release_layout(ctx);
        self.release_buffers(ctx);

        // Element-array binds below must not land in someone else's vertex array
        ctx.bind_vertex_array(None);

        let vertex_buffer = ctx.create_buffer()?;
        self.vertex_buffer = Some(vertex_buffer);
        ctx.bind_buffer(BufferTarget::Array, Some(vertex_buffer));
        ctx.buffer_data(BufferTarget::Array, mesh.vertex_bytes(), BufferUsage::StaticDraw);
        ctx.bind_buffer(BufferTarget::Array, None);

        let index_buffer = ctx.create_buffer()?;
        self.index_buffer = Some(index_buffer);
        ctx.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
        ctx.buffer_data(BufferTarget::ElementArray, mesh.index_bytes(), BufferUsage::StaticDraw);
        ctx.bind_buffer(BufferTarget::ElementArray, None);

        self.index_count = mesh.index_count() as u32;

        log::debug!(
            "Uploaded mesh '{}': {} vertex bytes, {} index bytes",
            mesh.name,
            mesh.vertex_bytes().len(),
            mesh.index_bytes().len()
        );
        Ok(())
    }

    /// Create the vertex array describing the buffers for `program`
    ///
    /// A program without the position attribute still gets a vertex array;
    /// the attribute setup is skipped. On return nothing is left bound: the
    /// vertex array is unbound first so it keeps its element buffer, then
    /// both buffer targets are cleared.
    pub fn bind_layout<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        program: ProgramHandle,
        names: &ShaderNames,
    ) -> BackendResult<()> {
        let vertex_buffer = self.vertex_buffer.ok_or(BackendError::MissingResource("vertex buffer"))?;
        let index_buffer = self.index_buffer.ok_or(BackendError::MissingResource("index buffer"))?;

        self.release_layout(ctx);
        let vertex_array = ctx.create_vertex_array()?;
        self.vertex_array = Some(vertex_array);

        self.position_location = ctx.attribute_location(program, &names.position_attribute);

        {
            let mut bound = VertexArrayBinding::new(ctx, vertex_array);
            bound.bind_buffer(BufferTarget::ElementArray, Some(index_buffer));
            bound.bind_buffer(BufferTarget::Array, Some(vertex_buffer));

            match self.position_location {
                Some(location) => bound.enable_vertex_attribute(&Vertex::position_attribute(location)),
                None => log::debug!(
                    "Program has no '{}' attribute, skipping position layout",
                    names.position_attribute
                ),
            }
        }
        ctx.bind_buffer(BufferTarget::Array, None);
        ctx.bind_buffer(BufferTarget::ElementArray, None);

        self.uniforms = UniformLocations {
            view: ctx.uniform_location(program, &names.view_matrix),
            projection: ctx.uniform_location(program, &names.projection_matrix),
            model: ctx.uniform_location(program, &names.model_matrix),
            color: ctx.uniform_location(program, &names.color),
        };

        Ok(())
    }

    /// Upload view and projection matrices where the program exposes them
    pub fn upload_camera<C: GraphicsContext + ?Sized>(&self, ctx: &mut C, view: &Mat4, projection: &Mat4) {
        if let Some(location) = self.uniforms.view {
            ctx.set_uniform_mat4(location, view);
        }
        if let Some(location) = self.uniforms.projection {
            ctx.set_uniform_mat4(location, projection);
        }
    }

    /// Draw the whole index buffer as a triangle list
    pub fn draw<C: GraphicsContext + ?Sized>(&self, ctx: &mut C, model: &Mat4, color: Vec4) {
        let Some(vertex_array) = self.vertex_array else {
            log::warn!("GpuMesh::draw() called before bind_layout(), nothing drawn");
            return;
        };

        let mut bound = VertexArrayBinding::new(ctx, vertex_array);
        if let Some(location) = self.uniforms.model {
            bound.set_uniform_mat4(location, model);
        }
        if let Some(location) = self.uniforms.color {
            bound.set_uniform_vec4(location, color);
        }
        bound.draw_indexed(PrimitiveTopology::TriangleList, self.index_count, IndexFormat::Uint32);
    }

    /// Release every owned GPU resource
    ///
    /// Does nothing for resources that were never created, so it is safe to
    /// call more than once.
    pub fn destroy<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        self.release_layout(ctx);
        self.release_buffers(ctx);
    }

    fn release_layout<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        if let Some(vertex_array) = self.vertex_array.take() {
            ctx.delete_vertex_array(vertex_array);
        }
        self.position_location = None;
        self.uniforms = UniformLocations::default();
    }

    fn release_buffers<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        if let Some(buffer) = self.index_buffer.take() {
            ctx.delete_buffer(buffer);
        }
        if let Some(buffer) = self.vertex_buffer.take() {
            ctx.delete_buffer(buffer);
        }
        self.index_count = 0;
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        if self.is_created() {
            log::warn!("GpuMesh dropped without destroy(); its GPU resources are leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_program(ctx: &mut RecordingContext) -> ProgramHandle {
        ctx.register_program(
            &[("inPosition", 0)],
            &["viewMatrix", "projMatrix", "modelMatrix", "color"],
        )
    }

    fn uploaded(ctx: &mut RecordingContext) -> GpuMesh {
        let mut gpu = GpuMesh::new();
        gpu.create_buffers(ctx, &MeshBuffer::cube()).unwrap();
        gpu
    }

    #[test]
    fn test_create_buffers_uploads_verbatim() {
        let mut ctx = RecordingContext::new();
        let mesh = MeshBuffer::cube();
        let mut gpu = GpuMesh::new();
        gpu.create_buffers(&mut ctx, &mesh).unwrap();

        let vertex_buffer = gpu.vertex_buffer().unwrap();
        let index_buffer = gpu.index_buffer().unwrap();
        assert_eq!(ctx.buffer_contents(vertex_buffer), Some(mesh.vertex_bytes()));
        assert_eq!(ctx.buffer_contents(index_buffer), Some(mesh.index_bytes()));
        assert_eq!(gpu.index_count(), 36);
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), None);
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), None);
        assert!(ctx.errors().is_empty());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_create_buffers_releases_previous_buffers() {
        let mut ctx = RecordingContext::new();
        let mut gpu = uploaded(&mut ctx);
        let old_vertex = gpu.vertex_buffer().unwrap();
        let old_index = gpu.index_buffer().unwrap();

        gpu.create_buffers(&mut ctx, &MeshBuffer::cube()).unwrap();
        assert!(!ctx.is_buffer_live(old_vertex));
        assert!(!ctx.is_buffer_live(old_index));
        assert_eq!(ctx.live_buffer_count(), 2);

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_bind_layout_configures_position_attribute() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();

        let vertex_array = gpu.vertex_array().unwrap();
        let attributes = ctx.vertex_array_attributes(vertex_array);
        assert_eq!(attributes.len(), 1);
        let (attribute, source) = attributes[0];
        assert_eq!(attribute.location, 0);
        assert_eq!(attribute.format, VertexFormat::Float32x3);
        assert_eq!(attribute.stride, 12);
        assert_eq!(attribute.offset, 0);
        assert_eq!(source, gpu.vertex_buffer());
        assert_eq!(ctx.vertex_array_element_buffer(vertex_array), gpu.index_buffer());

        let uniforms = gpu.uniforms();
        assert!(uniforms.view.is_some());
        assert!(uniforms.projection.is_some());
        assert!(uniforms.model.is_some());
        assert!(uniforms.color.is_some());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_bind_layout_leaves_nothing_bound() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();

        assert_eq!(ctx.bound_vertex_array(), None);
        assert_eq!(ctx.bound_buffer(BufferTarget::Array), None);
        assert_eq!(ctx.bound_buffer(BufferTarget::ElementArray), None);
        // The vertex array still owns its element buffer
        assert_eq!(ctx.vertex_array_element_buffer(gpu.vertex_array().unwrap()), gpu.index_buffer());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_bind_layout_without_position_attribute_is_skipped() {
        let mut ctx = RecordingContext::new();
        let program = ctx.register_program(&[], &["modelMatrix"]);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();

        assert_eq!(gpu.position_location(), None);
        assert!(ctx.vertex_array_attributes(gpu.vertex_array().unwrap()).is_empty());
        assert!(gpu.uniforms().model.is_some());
        assert!(gpu.uniforms().color.is_none());
        assert!(ctx.errors().is_empty());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_bind_layout_requires_buffers() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = GpuMesh::new();
        let err = gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap_err();
        assert!(matches!(err, BackendError::MissingResource("vertex buffer")));
        assert_eq!(ctx.live_vertex_array_count(), 0);
    }

    #[test]
    fn test_bind_layout_replaces_previous_vertex_array() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();
        let first = gpu.vertex_array().unwrap();

        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();
        assert!(!ctx.is_vertex_array_live(first));
        assert_eq!(ctx.live_vertex_array_count(), 1);

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_draw_issues_one_indexed_draw() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();
        ctx.clear_commands();

        let model = Mat4::from_translation(glam::Vec3::X);
        gpu.draw(&mut ctx, &model, Vec4::ONE);

        assert_eq!(ctx.draw_call_count(), 1);
        assert!(ctx.commands().contains(&GlCommand::DrawIndexed {
            vertex_array: gpu.vertex_array(),
            topology: PrimitiveTopology::TriangleList,
            count: 36,
            format: IndexFormat::Uint32,
        }));
        assert_eq!(ctx.uniform_value("modelMatrix"), Some(UniformValue::Mat4(model)));
        assert_eq!(ctx.uniform_value("color"), Some(UniformValue::Vec4(Vec4::ONE)));
        assert_eq!(ctx.bound_vertex_array(), None);
        assert!(ctx.errors().is_empty());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_draw_before_layout_draws_nothing() {
        let mut ctx = RecordingContext::new();
        let mut gpu = uploaded(&mut ctx);
        gpu.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        assert_eq!(ctx.draw_call_count(), 0);
        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_create_buffers_drops_stale_layout() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();
        let stale = gpu.vertex_array().unwrap();

        gpu.create_buffers(&mut ctx, &MeshBuffer::cube()).unwrap();
        assert_eq!(gpu.vertex_array(), None);
        assert!(!ctx.is_vertex_array_live(stale));
        assert_eq!(gpu.uniforms().model, None);

        gpu.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        assert_eq!(ctx.draw_call_count(), 0);
        assert!(ctx.errors().is_empty());

        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();
        gpu.draw(&mut ctx, &Mat4::IDENTITY, Vec4::ONE);
        assert_eq!(ctx.draw_call_count(), 1);
        assert!(ctx.errors().is_empty());

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_upload_camera_skips_missing_uniforms() {
        let mut ctx = RecordingContext::new();
        let program = ctx.register_program(&[("inPosition", 0)], &["viewMatrix"]);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();

        let view = Mat4::from_translation(glam::Vec3::Z);
        gpu.upload_camera(&mut ctx, &view, &Mat4::IDENTITY);
        assert_eq!(ctx.uniform_value("viewMatrix"), Some(UniformValue::Mat4(view)));
        assert_eq!(ctx.uniform_value("projMatrix"), None);

        gpu.destroy(&mut ctx);
    }

    #[test]
    fn test_destroy_releases_everything_and_is_repeatable() {
        let mut ctx = RecordingContext::new();
        let program = full_program(&mut ctx);
        let mut gpu = uploaded(&mut ctx);
        gpu.bind_layout(&mut ctx, program, &ShaderNames::default()).unwrap();

        gpu.destroy(&mut ctx);
        assert!(!gpu.is_created());
        assert_eq!(ctx.live_buffer_count(), 0);
        assert_eq!(ctx.live_vertex_array_count(), 0);

        ctx.clear_commands();
        gpu.destroy(&mut ctx);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_destroy_never_created_is_noop() {
        let mut ctx = RecordingContext::new();
        let mut gpu = GpuMesh::new();
        gpu.destroy(&mut ctx);
        assert!(ctx.commands().is_empty());
    }
}
