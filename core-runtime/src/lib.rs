//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the photo bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the capability wiring, upstream limits, and logging
//! conventions used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
