//! Govlens Common - Shared configuration and logging for the govlens services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Logging setup and noise filtering

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;

pub use config::{
    AnalysisConfig, Config, ModelConfig, ObservabilityConfig, OutputConfig, SecretsConfig,
    ServerConfig,
};
pub use logging::init_logging;
