pub mod commands;
pub mod config;
pub mod error;
pub mod inbound;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod publish;
pub mod store;
pub mod utils;
pub mod validation;

pub use error::{Error, ErrorKind, Result};
