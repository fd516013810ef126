//! Storage Engine Module
//!
//! This module re-exports the cross-platform filesystem interface and utilities.
//! The actual implementations are in dedicated modules for better organization.

pub use crate::fs_interface::{FilesystemInterface, FilesystemStats};
pub use crate::path_utils;
pub use crate::mount;
