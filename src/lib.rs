pub mod analysis;
pub mod config;
pub mod error;
pub mod gemini;
pub mod server;
pub mod video;

pub use error::{Error, Result};
