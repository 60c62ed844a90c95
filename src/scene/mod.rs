//! Marker state: selection status, position, color and transform

mod selection;
mod transform;

pub use selection::*;
pub use transform::*;
