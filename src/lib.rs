pub mod app;
pub mod chart;
pub mod cli;
pub mod error;
pub mod pump;
pub mod render;
pub mod sampler;

pub use error::{Error, Result};
