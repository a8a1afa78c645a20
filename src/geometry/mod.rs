//! Geometry and dimensions
//!
//! Raw metrics of the rendered document and the provider that queries them
//! from the rendering surface.

mod dimensions;
mod provider;
mod types;

pub use dimensions::{ContentDimensions, DIMENSIONS_SCRIPT};
pub use provider::DimensionsProvider;
pub use types::{Point, Rect};
