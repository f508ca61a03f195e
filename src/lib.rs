pub mod config;
pub mod db;
pub mod eos;
pub mod error;
pub mod migrate;

pub use crate::config::AppConfig;
pub use crate::error::{Error, Result};
