pub mod fixtures;
pub mod service;

pub use service::{MockApiService, MockLatency};
