//! Scoped binding guards

use crate::backend::traits::{GraphicsContext, VertexArrayHandle};
use std::ops::{Deref, DerefMut};

/// Keeps a vertex array bound for the lifetime of the guard
///
/// The context is reachable through `Deref`, so calls that depend on the
/// binding are made through the guard. Dropping it unbinds the vertex array.
pub struct VertexArrayBinding<'a, C: GraphicsContext + ?Sized> {
    ctx: &'a mut C,
    vertex_array: VertexArrayHandle,
}

impl<'a, C: GraphicsContext + ?Sized> VertexArrayBinding<'a, C> {
    pub fn new(ctx: &'a mut C, vertex_array: VertexArrayHandle) -> Self {
        ctx.bind_vertex_array(Some(vertex_array));
        Self { ctx, vertex_array }
    }

    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }
}

impl<C: GraphicsContext + ?Sized> Deref for VertexArrayBinding<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: GraphicsContext + ?Sized> DerefMut for VertexArrayBinding<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: GraphicsContext + ?Sized> Drop for VertexArrayBinding<'_, C> {
    fn drop(&mut self) {
        self.ctx.bind_vertex_array(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingContext;

    #[test]
    fn test_guard_unbinds_on_drop() {
        let mut ctx = RecordingContext::new();
        let vao = ctx.create_vertex_array().unwrap();
        {
            let guard = VertexArrayBinding::new(&mut ctx, vao);
            assert_eq!(guard.bound_vertex_array(), Some(vao));
            assert_eq!(guard.vertex_array(), vao);
        }
        assert_eq!(ctx.bound_vertex_array(), None);
    }

    #[test]
    fn test_guard_unbinds_on_early_return() {
        fn bind_and_bail(ctx: &mut RecordingContext, vao: VertexArrayHandle) -> Result<(), ()> {
            let _guard = VertexArrayBinding::new(ctx, vao);
            Err(())
        }

        let mut ctx = RecordingContext::new();
        let vao = ctx.create_vertex_array().unwrap();
        assert!(bind_and_bail(&mut ctx, vao).is_err());
        assert_eq!(ctx.bound_vertex_array(), None);
    }
}
