//! Common test utilities for media-dl integration tests

#[allow(dead_code)]
pub mod adapters;
#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod config;

#[allow(unused_imports)]
pub use adapters::*;
#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use config::*;
