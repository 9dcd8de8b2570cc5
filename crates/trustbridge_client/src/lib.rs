pub mod auth;
pub mod client;
pub mod context;
pub mod error;

pub use auth::AuthService;
pub use client::{ApiClient, ClientConfig, DEFAULT_BACKEND_URL, DEFAULT_TIMEOUT};
pub use context::{AppContext, ContextSettings};
pub use error::ClientError;
