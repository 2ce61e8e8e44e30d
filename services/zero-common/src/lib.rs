//! Zero Common - Shared configuration and utilities for the Zero ecosystem.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Configuration validation
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod logging;
pub mod validation;

pub use config::{Config, ObservabilityConfig, ScreenerServiceConfig};
pub use validation::{Validate, ValidationError, ValidationResult};
