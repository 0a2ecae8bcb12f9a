mod comment;
mod ids;
mod post;
mod time;
mod user;

pub use comment::*;
pub use ids::*;
pub use post::*;
pub use user::*;
