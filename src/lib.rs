// src/lib.rs
pub mod azure;
pub mod cli;
pub mod logging;
pub mod report;
pub mod repro;

pub use repro::{Repro, ReproSettings};
