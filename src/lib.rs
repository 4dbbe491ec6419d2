pub mod config;
pub mod error;
pub mod flow;
pub mod photo;
pub mod server;

pub use error::{Error, Result};
