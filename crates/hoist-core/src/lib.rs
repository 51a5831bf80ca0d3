//! Core types and configuration for hoist.
//!
//! This crate defines the `hoist.toml` schema ([`HoistConfig`]), layered
//! configuration resolution ([`Settings`]), the remote image reference shared
//! by every phase ([`ImageReference`]), typed existence probes, and shared
//! error types.

pub mod config;
pub mod error;
pub mod image;
pub mod probe;
pub mod settings;

pub use config::{AwsConfig, CONFIG_FILE, FunctionConfig, HoistConfig, ImageConfig};
pub use error::{Error, Result};
pub use image::ImageReference;
pub use probe::{ProbeErrorPolicy, ProbeOutcome};
pub use settings::Settings;
