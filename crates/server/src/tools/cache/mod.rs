//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and invalidating the in-memory
//! query cache shared by every browse tool.

pub mod invalidate;
pub mod status;

pub use invalidate::{CacheInvalidateParams, invalidate_impl};
pub use status::status_impl;
