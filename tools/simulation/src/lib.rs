//! Synthetic tick-archive generator
//!
//! Produces realistic-looking, fully deterministic tick archives so the
//! decode-and-aggregate pipeline can be exercised without exchange data.
//!
//! # Modules
//! - `generator`: Seeded random-walk tick records over trading sessions
//! - `archive`: Encoding and on-disk layout of generated files

pub mod archive;
pub mod generator;

pub use archive::{encode_file, file_name, write_asset_archive, write_period_file};
pub use generator::{GeneratorConfig, TickGenerator};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
