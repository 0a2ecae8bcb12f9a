//! Post bodies: a block document stored as one serialized JSON string,
//! and its conversion into render-ready nodes.

mod document;
mod render;

pub use document::*;
pub use render::*;
