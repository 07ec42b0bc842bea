//! Govlens Model - text-generation backends for the govlens pipeline.
//!
//! This crate provides:
//! - The [`ModelGateway`] trait that analysis components depend on
//! - An Anthropic Messages API implementation
//! - JSON extraction from free-text model responses

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod anthropic;
pub mod extract;
pub mod gateway;

pub use anthropic::AnthropicGateway;
pub use extract::extract_json;
pub use gateway::{CompletionRequest, GatewayError, ModelGateway};
