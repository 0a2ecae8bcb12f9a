mod auth;
mod client;

pub use auth::TokenStore;
pub use client::{ApiClient, ApiError};
