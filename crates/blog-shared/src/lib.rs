pub mod api;
pub mod content;
mod lenient;
pub mod models;
pub mod thread;

pub use models::*;
