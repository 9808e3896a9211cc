//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and transforms
//! - Frame timing and fixed-step accumulation
//! - The engine logging service

pub mod logging;
pub mod math;
pub mod time;
