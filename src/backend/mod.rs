//! Graphics context abstraction layer
//!
//! Provides the context trait and handle types, a headless recording context
//! and, with the `gl` feature, an OpenGL context over glow.

pub mod binding;
pub mod recording;
pub mod traits;
pub mod types;

#[cfg(feature = "gl")]
pub mod gl;

pub use binding::*;
pub use recording::*;
pub use traits::*;
pub use types::*;

#[cfg(feature = "gl")]
pub use gl::GlContext;
