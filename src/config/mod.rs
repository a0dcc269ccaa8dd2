//! # Configuration Module
//!
//! This module provides configuration structures and validation for background generation.

pub mod config;

pub use config::BoothConfig;
