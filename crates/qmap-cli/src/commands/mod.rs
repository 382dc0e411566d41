//! CLI command implementations.

pub mod common;
pub mod device;
pub mod route;
pub mod version;
